//! Image configurations list the bundles an installable image is made of.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageConfig {
	#[serde(rename = "Bundles", default)]
	pub bundles: Vec<String>,
}

impl ImageConfig {
	pub fn parse(json: &[u8]) -> crate::Result<Self> {
		Ok(serde_json::from_slice(json)?)
	}
}

/// Downloads the configuration of `image` for `config`'s release.
///
/// # Errors
/// - [`NotFound`](crate::Error::NotFound) when the release has no such image.
pub fn fetch_image_config(config: &crate::Config, image: &str) -> crate::Result<ImageConfig> {
	let url = config.image_config_url(image);
	log::info!("Fetching image config from {}", url);

	let response = reqwest::blocking::get(&url)?;
	match response.status() {
		s if s.is_success() => ImageConfig::parse(&response.bytes()?),
		reqwest::StatusCode::NOT_FOUND => Err(crate::Error::NotFound(format!("image \"{}\" for version {}", image, config.version()))),
		s => Err(crate::Error::DataUnavailable(format!("image config request to {} failed with {}", url, s))),
	}
}

//! Reading bundle definitions out of a release tarball.

use std::io::Read;

use once_cell::sync::Lazy;
use regex::Regex;

use super::*;

/// Matches the path of a bundle definition inside the upstream archive, capturing the bundle name.
static BUNDLE_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"clr-bundles-[1-9].*/bundles/(.*)").expect("bundle entry pattern is valid"));

/// Extracts the bundle name from an archive entry path, `None` for anything that isn't a bundle definition.
pub fn bundle_name_from_path(path: &str) -> Option<&str> {
	BUNDLE_ENTRY.captures(path)
		.and_then(|c| c.get(1))
		.map(|m| m.as_str())
		.filter(|name| !name.is_empty() && !name.contains('/'))
}

impl BundleStore {
	/// Builds a store from an uncompressed tar archive.
	///
	/// # Errors
	/// - [`DataUnavailable`](crate::Error::DataUnavailable) when the archive or one of its entries can't be read.
	pub fn from_archive<R: Read>(archive: &mut tar::Archive<R>) -> crate::Result<Self> {
		let unreadable = |e: std::io::Error| crate::Error::DataUnavailable(format!("bundle archive unreadable: {}", e));

		let mut store = BundleStore::default();
		for entry in archive.entries().map_err(unreadable)? {
			let mut entry = entry.map_err(unreadable)?;
			if !entry.header().entry_type().is_file() {
				continue;
			}

			let path = entry.path().map_err(unreadable)?.to_string_lossy().into_owned();
			let name = match bundle_name_from_path(&path) {
				Some(name) => name.to_owned(),
				None => continue,
			};

			let mut text = String::new();
			entry.read_to_string(&mut text).map_err(unreadable)?;
			log::trace!("Read bundle definition {} from {}", name, path);
			store.insert(Bundle::parse(name, &text));
		}

		log::info!("Loaded {} bundles from archive", store.len());
		Ok(store)
	}

	/// Builds a store from a `.tar.gz` archive held in memory.
	pub fn from_gz_bytes(data: &[u8]) -> crate::Result<Self> {
		let gz = flate2::bufread::GzDecoder::new(data);
		Self::from_archive(&mut tar::Archive::new(gz))
	}

	/// Loads the bundles of `config`'s release.
	///
	/// Uses the parsed cache when present, otherwise the (possibly downloaded) archive, refreshing the cache afterwards.
	pub fn load(config: &crate::Config) -> crate::Result<Self> {
		let cache = config.bundle_cache_path();
		if cache.exists() {
			match Self::load_from_disk(&cache) {
				Ok(store) => return Ok(store),
				Err(e) => log::warn!("Bundle cache {} unusable, rebuilding: {}", cache.display(), e),
			}
		}

		let store = Self::from_gz_bytes(&fetch_archive(config)?)?;
		store.save_to_disk(&cache)?;
		Ok(store)
	}
}

/// Gets the bundle archive of `config`'s release as `.tar.gz` bytes.
///
/// A previously downloaded archive is reused, otherwise it is downloaded and written to [`bundle_archive_path()`](crate::Config::bundle_archive_path).
///
/// # Errors
/// - [`DataUnavailable`](crate::Error::DataUnavailable) when the server doesn't have the release.
pub fn fetch_archive(config: &crate::Config) -> crate::Result<Vec<u8>> {
	let path = config.bundle_archive_path();
	if path.exists() {
		log::debug!("Using cached bundle archive {}", path.display());
		return Ok(std::fs::read(path)?);
	}

	let url = config.bundle_archive_url();
	log::info!("Downloading bundle archive from {}", url);
	let mut response = reqwest::blocking::get(&url)?;
	if !response.status().is_success() {
		return Err(crate::Error::DataUnavailable(format!("bundle release archive not found on server: {} ({})", url, response.status())));
	}

	let mut data = Vec::<u8>::new();
	response.read_to_end(&mut data)?;

	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(&path, &data)?;
	Ok(data)
}

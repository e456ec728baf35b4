//! Release and location settings handed to the loaders and the resolver.
//!
//! Nothing in here looks at the environment. The release number always comes from the caller.

use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

pub const DEFAULT_BUNDLES_URL: &str = "https://github.com/clearlinux/clr-bundles";
pub const DEFAULT_REPO_URL: &str = "https://cdn.download.clearlinux.org";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	/// Distribution release the bundles and package metadata belong to.
	version: u32,
	#[serde(default = "default_bundles_url")]
	bundles_url: String,
	#[serde(default = "default_repo_url")]
	repo_url: String,
	/// Root of the per-release cache, each release gets `<data_dir>/<version>`.
	#[serde(default = "default_data_dir")]
	data_dir: PathBuf,
}

fn default_bundles_url() -> String { DEFAULT_BUNDLES_URL.to_string() }
fn default_repo_url() -> String { DEFAULT_REPO_URL.to_string() }
fn default_data_dir() -> PathBuf { PathBuf::from(".") }

impl Config {
	pub fn new(version: u32) -> Self {
		Self {
			version,
			bundles_url: default_bundles_url(),
			repo_url: default_repo_url(),
			data_dir: default_data_dir(),
		}
	}

	/// Reads a JSON config file. Only `version` is required.
	pub fn load_from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
		let path = path.as_ref();
		log::debug!("Loading config from {}", path.display());
		let data = std::fs::read(path)?;
		Ok(serde_json::from_slice(&data)?)
	}

	/* Fields */

	pub fn version(&self) -> u32 {
		self.version
	}
	pub fn set_version(&mut self, version: u32) {
		self.version = version;
	}

	pub fn bundles_url(&self) -> &str {
		&self.bundles_url
	}
	pub fn set_bundles_url(&mut self, url: impl Into<String>) {
		self.bundles_url = url.into().trim_end_matches('/').to_string();
	}

	pub fn repo_url(&self) -> &str {
		&self.repo_url
	}
	pub fn set_repo_url(&mut self, url: impl Into<String>) {
		self.repo_url = url.into().trim_end_matches('/').to_string();
	}

	pub fn data_dir(&self) -> &Path {
		&self.data_dir
	}
	pub fn set_data_dir(&mut self, data_dir: impl Into<PathBuf>) {
		self.data_dir = data_dir.into();
	}

	/* Paths */

	pub fn release_dir(&self) -> PathBuf {
		self.data_dir.join(self.version.to_string())
	}

	pub fn primary_db_path(&self) -> PathBuf {
		self.release_dir().join("repodata").join("primary.sqlite")
	}

	pub fn bundle_archive_path(&self) -> PathBuf {
		self.release_dir().join("bundles.tar.gz")
	}

	pub fn bundle_cache_path(&self) -> PathBuf {
		self.release_dir().join("bundles.bin")
	}

	/* URLs */

	pub fn bundle_archive_url(&self) -> String {
		format!("{}/archive/{}.tar.gz", self.bundles_url, self.version)
	}

	pub fn image_config_url(&self, image: &str) -> String {
		format!("{}/releases/{}/clear/config/image/{}-config.json", self.repo_url, self.version, image)
	}

	/// Index of the binary repository metadata files.
	pub fn repomd_url(&self) -> String {
		self.repo_file_url("repodata/repomd.xml")
	}

	/// A file of the binary repository, `href` is relative to the repository root as listed in `repomd.xml`.
	pub fn repo_file_url(&self, href: &str) -> String {
		format!("{}/releases/{}/clear/x86_64/os/{}", self.repo_url, self.version, href.trim_start_matches('/'))
	}

	pub fn source_rpm_url(&self, srpm: &str) -> String {
		format!("{}/releases/{}/clear/source/SRPMS/{}", self.repo_url, self.version, srpm)
	}
}

//! Getting a release's package database from the binary repository.
//!
//! `repomd.xml` lists the metadata files of the repository, the package database is the `primary.sqlite.xz` one.

use std::io::Read;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

static PRIMARY_DB_HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="([^"]*primary\.sqlite\.xz)""#).expect("primary db pattern is valid"));

/// Location of the compressed package database in a `repomd.xml`, relative to the repository root.
pub fn primary_db_href(repomd: &str) -> Option<&str> {
	PRIMARY_DB_HREF.captures(repomd)
		.and_then(|c| c.get(1))
		.map(|m| m.as_str())
}

/// Decompresses xz `data` into `path`.
///
/// The database is written next to `path` first and moved in place once complete.
pub fn unxz(data: &[u8], path: &Path) -> crate::Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}

	let partial = path.with_extension("part");
	let mut decoder = xz2::read::XzDecoder::new(data);
	let mut file = std::fs::File::create(&partial)?;
	if let Err(e) = std::io::copy(&mut decoder, &mut file) {
		let _ = std::fs::remove_file(&partial);
		return Err(crate::Error::DataUnavailable(format!("package database archive is corrupt: {}", e)));
	}
	drop(file);

	std::fs::rename(&partial, path)?;
	Ok(())
}

fn download(url: &str) -> crate::Result<Vec<u8>> {
	let mut response = reqwest::blocking::get(url)?;
	if !response.status().is_success() {
		return Err(crate::Error::DataUnavailable(format!("{} failed with {}", url, response.status())));
	}
	let mut data = Vec::<u8>::new();
	response.read_to_end(&mut data)?;
	Ok(data)
}

/// Path of the package database of `config`'s release.
///
/// A database already at [`primary_db_path()`](crate::Config::primary_db_path) is used as is,
/// otherwise it is found through `repomd.xml`, downloaded and decompressed there.
///
/// # Errors
/// - [`DataUnavailable`](crate::Error::DataUnavailable) when the release isn't on the server or its metadata has no package database.
pub fn fetch_primary_db(config: &crate::Config) -> crate::Result<PathBuf> {
	let path = config.primary_db_path();
	if path.exists() {
		log::debug!("Using cached package database {}", path.display());
		return Ok(path);
	}

	let repomd_url = config.repomd_url();
	log::info!("Fetching repository metadata from {}", repomd_url);
	let repomd = download(&repomd_url)
		.map_err(|e| crate::Error::DataUnavailable(format!("unable to find release {} on {}: {}", config.version(), config.repo_url(), e)))?;
	let repomd = String::from_utf8_lossy(&repomd);

	let href = primary_db_href(&repomd)
		.ok_or_else(|| crate::Error::DataUnavailable(format!("no primary.sqlite.xz listed in {}", repomd_url)))?;

	let url = config.repo_file_url(href);
	log::info!("Downloading package database from {}", url);
	unxz(&download(&url)?, &path)?;
	Ok(path)
}

//! Release detection for when the tool runs on the distribution itself.

pub const OS_RELEASE_PATH: &str = "/usr/lib/os-release";

const DISTRIBUTION_ID: &str = "clear-linux-os";

/// Reads `VERSION_ID` from os-release text, only when `ID` names the distribution.
pub fn parse_version(text: &str) -> Option<u32> {
	let mut id = None;
	let mut version = None;
	for line in text.lines() {
		let (key, value) = match line.split_once('=') {
			Some(kv) => kv,
			None => continue,
		};
		let value = value.trim().trim_matches('"');
		match key.trim() {
			"ID" => id = Some(value.to_owned()),
			"VERSION_ID" => version = value.parse::<u32>().ok(),
			_ => {},
		}
	}

	if id.as_deref() == Some(DISTRIBUTION_ID) {
		version
	} else {
		None
	}
}

pub fn installed_version(path: impl AsRef<std::path::Path>) -> Result<u32, crate::Error> {
	let path = path.as_ref();
	log::debug!("Detecting installed release from {}", path.display());
	let text = std::fs::read_to_string(path).map_err(|_| crate::Error::VersionUnknown)?;
	parse_version(&text).ok_or(crate::Error::VersionUnknown)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn version_of_matching_distribution() {
		let text = "NAME=\"Clear Linux OS\"\nID=clear-linux-os\nVERSION_ID=31470\nPRETTY_NAME=\"Clear Linux OS\"\n";
		assert_eq!(parse_version(text), Some(31470));
	}

	#[test]
	fn other_distributions_have_no_version() {
		assert_eq!(parse_version("ID=fedora\nVERSION_ID=39\n"), None);
		assert_eq!(parse_version("ID=clear-linux-os\n"), None);
	}
}

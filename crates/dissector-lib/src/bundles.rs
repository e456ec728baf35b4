//! # Bundles
//!
//! A bundle is a curated list of package names, optionally pulling in the packages of other bundles with `include(name)`.
//! Every release ships its bundle definitions as a tarball, see [`archive`] for reading it.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Deserialize};

pub mod archive;
pub use archive::fetch_archive;

mod image;
pub use image::ImageConfig;
pub use image::fetch_image_config;

static INCLUDE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^include\(([^)]*)\)").expect("include pattern is valid"));

/// A single bundle definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
	pub name: String,
	/// Literal package names in the order they are listed.
	pub packages: IndexSet<String>,
	/// Names of bundles referenced by `include(...)` lines.
	pub includes: IndexSet<String>,
}

impl Bundle {
	/// Parses the text of a bundle definition.
	///
	/// Blank lines and lines starting with `#` are skipped, `include(name)` lines become includes
	/// and anything else is a package name. Text after the closing parenthesis of an include is ignored.
	pub fn parse(name: impl Into<String>, text: &str) -> Self {
		let mut bundle = Bundle { name: name.into(), ..Default::default() };

		for line in text.lines() {
			let line = line.trim();
			if line.is_empty() || line.starts_with('#') {
				continue;
			}

			if let Some(captures) = INCLUDE_DIRECTIVE.captures(line) {
				let include = captures[1].trim();
				if include.is_empty() {
					log::warn!("Bundle `{}` has an include without a name", bundle.name);
				} else {
					bundle.includes.insert(include.to_string());
				}
			} else {
				bundle.packages.insert(line.to_string());
			}
		}

		bundle
	}
}

/// Every bundle of a single release.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleStore {
	bundles: HashMap<String, Bundle>,
}

impl BundleStore {
	pub fn new(bundles: impl IntoIterator<Item = Bundle>) -> Self {
		let mut store = Self::default();
		for b in bundles {
			store.insert(b);
		}
		store
	}

	/// Adds a bundle, replacing any existing bundle with the same name.
	pub fn insert(&mut self, bundle: Bundle) {
		self.bundles.insert(bundle.name.clone(), bundle);
	}

	pub fn get(&self, name: &str) -> Option<&Bundle> {
		self.bundles.get(name)
	}

	pub fn len(&self) -> usize {
		self.bundles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bundles.is_empty()
	}

	pub fn bundle_names(&self) -> impl Iterator<Item = &str> {
		self.bundles.keys().map(String::as_str)
	}

	/// Whether `name` is defined or at least referenced by some bundle's includes.
	pub fn is_known(&self, name: &str) -> bool {
		self.bundles.contains_key(name) || self.bundles.values().any(|b| b.includes.contains(name))
	}

	/// Packages of `name` plus the packages of the bundles it includes directly.
	///
	/// Includes of included bundles are not followed.
	pub fn direct_packages(&self, name: &str) -> HashSet<String> {
		let mut packages = HashSet::new();
		if let Some(bundle) = self.bundles.get(name) {
			packages.extend(bundle.packages.iter().cloned());
			for include in &bundle.includes {
				if let Some(included) = self.bundles.get(include) {
					packages.extend(included.packages.iter().cloned());
				}
			}
		}
		packages
	}

	/// Resolves bundle names to their packages.
	///
	/// # Errors
	/// - [`NotFound`](crate::Error::NotFound) for a name that is neither a bundle nor referenced by one.
	pub fn resolve<I, S>(&self, names: I) -> crate::Result<HashSet<String>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let names = names.into_iter().map(|n| n.as_ref().to_owned()).collect::<Vec<_>>();
		if let Some(missing) = names.iter().find(|n| !self.is_known(n)) {
			return Err(crate::Error::NotFound(missing.clone()));
		}
		crate::closure::expand(crate::closure::Backend::Bundle(self), &names)
	}

	/// Turns caller supplied roots into seed packages.
	///
	/// Bundle names are resolved like [`resolve()`](Self::resolve), anything else is taken as a literal package name.
	pub fn seed_packages<I, S>(&self, roots: I) -> crate::Result<HashSet<String>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut seeds = HashSet::new();
		let mut bundle_roots = Vec::new();
		for root in roots {
			let root = root.as_ref();
			if self.bundles.contains_key(root) {
				bundle_roots.push(root.to_owned());
			} else {
				log::debug!("Root `{}` is not a bundle, treating it as a package", root);
				seeds.insert(root.to_owned());
			}
		}
		seeds.extend(self.resolve(&bundle_roots)?);
		Ok(seeds)
	}

	/// Every package listed by any bundle.
	pub fn all_packages(&self) -> HashSet<String> {
		self.bundles.values().flat_map(|b| b.packages.iter().cloned()).collect()
	}

	/* Persistence */

	pub fn save_to_disk(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
		let path = path.as_ref();
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		log::debug!("Saving {} bundles to {}", self.len(), path.display());
		std::fs::write(path, bincode::serialize(self)?)?;
		Ok(())
	}

	pub fn load_from_disk(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
		let path = path.as_ref();
		log::debug!("Loading bundles from {}", path.display());
		let data = std::fs::read(path)?;
		Ok(bincode::deserialize(&data)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn set(items: &[&str]) -> HashSet<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn parse_partitions_lines() {
		let b = Bundle::parse("editors", "# [TITLE]: editors\n\ninclude(os-core)\nvim\n  nano  \n#joe\n");
		assert_eq!(b.includes.iter().collect::<Vec<_>>(), vec!["os-core"]);
		assert_eq!(b.packages.iter().collect::<Vec<_>>(), vec!["vim", "nano"]);
	}

	#[test]
	fn include_with_trailing_comment() {
		let b = Bundle::parse("editors", "include(os-core) # base\ninclude(devpkg-x)(y)\nvim\n");
		assert_eq!(b.includes.iter().collect::<Vec<_>>(), vec!["os-core", "devpkg-x"]);
		assert_eq!(b.packages.iter().collect::<Vec<_>>(), vec!["vim"]);
	}

	#[test]
	fn empty_include_is_dropped() {
		let b = Bundle::parse("broken", "include()\ninclude(  )\nvim\n");
		assert!(b.includes.is_empty());
		assert_eq!(b.packages.iter().collect::<Vec<_>>(), vec!["vim"]);
	}

	#[test]
	fn plain_bundle_resolves_to_its_lines() {
		let store = BundleStore::new([Bundle::parse("os-core", "glibc\nbash\n")]);
		assert_eq!(store.resolve(["os-core"]).unwrap(), set(&["glibc", "bash"]));
	}

	#[test]
	fn includes_expand_one_level() {
		let store = BundleStore::new([
			Bundle::parse("b", "include(c)\nb-pkg"),
			Bundle::parse("c", "include(d)\nc-pkg"),
			Bundle::parse("d", "d-pkg"),
		]);
		let resolved = store.resolve(["b"]).unwrap();
		assert_eq!(resolved, set(&["b-pkg", "c-pkg"]));
		assert!(!resolved.contains("d-pkg"));
	}

	#[test]
	fn union_of_independent_bundles() {
		let store = BundleStore::new([
			Bundle::parse("one", "a\nb"),
			Bundle::parse("two", "b\nc"),
		]);
		let both = store.resolve(["one", "two"]).unwrap();
		let mut separate = store.resolve(["one"]).unwrap();
		separate.extend(store.resolve(["two"]).unwrap());
		assert_eq!(both, separate);
	}

	#[test]
	fn unknown_bundle_is_not_found() {
		let store = BundleStore::new([Bundle::parse("os-core", "glibc")]);
		match store.resolve(["nope"]) {
			Err(crate::Error::NotFound(name)) => assert_eq!(name, "nope"),
			other => panic!("expected NotFound, got {:?}", other),
		}
	}

	#[test]
	fn included_only_name_is_known_but_empty() {
		let store = BundleStore::new([Bundle::parse("desktop", "include(missing)\nfirefox")]);
		assert!(store.resolve(["missing"]).unwrap().is_empty());
	}

	#[test]
	fn seeds_pass_unknown_roots_through() {
		let store = BundleStore::new([Bundle::parse("os-core", "glibc\nbash")]);
		assert_eq!(store.seed_packages(["os-core", "vim"]).unwrap(), set(&["glibc", "bash", "vim"]));
	}

	#[test]
	fn store_survives_disk_round_trip() {
		let dir = dissector_test_utils::temp_data_dir().unwrap();
		let path = dir.path().join("cache").join("bundles.bin");
		let store = BundleStore::new([Bundle::parse("os-core", "glibc\ninclude(kernel)")]);
		store.save_to_disk(&path).unwrap();
		let loaded = BundleStore::load_from_disk(&path).unwrap();
		assert_eq!(loaded.get("os-core"), store.get("os-core"));
	}
}

//! # Requirement index
//!
//! Read-only view over a release's `primary.sqlite` package database.
//! Packages declare names they require and names they provide, a requirement is satisfied by every package providing that name.
//!
//! Only three tables are used:
//! - `packages(pkgKey, name, rpm_sourcerpm)`
//! - `requires(pkgKey, name)`
//! - `provides(pkgKey, name)`

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

pub mod repodata;
pub use repodata::fetch_primary_db;

const REQUIRED_NAMES: &str =
	"SELECT DISTINCT requires.name FROM packages INNER JOIN requires ON packages.pkgKey = requires.pkgKey WHERE packages.name = ?1";
const PROVIDING_PACKAGES: &str =
	"SELECT DISTINCT packages.name FROM packages INNER JOIN provides ON packages.pkgKey = provides.pkgKey WHERE provides.name = ?1";
const PACKAGE_EXISTS: &str =
	"SELECT EXISTS(SELECT 1 FROM packages WHERE name = ?1)";
const SOURCE_PACKAGE: &str =
	"SELECT rpm_sourcerpm FROM packages WHERE name = ?1 LIMIT 1";
const SOURCE_PACKAGE_MAP: &str =
	"SELECT name, rpm_sourcerpm FROM packages";
const TABLE_COUNT: &str =
	"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('packages', 'requires', 'provides')";

#[derive(Debug)]
pub struct RequirementIndex {
	connection: Connection,
}

impl RequirementIndex {
	/// Opens the database at `path` read only.
	///
	/// # Errors
	/// - [`DataUnavailable`](crate::Error::DataUnavailable) if the file is missing or doesn't have the package tables.
	pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
		let path = path.as_ref();
		if !path.exists() {
			return Err(crate::Error::DataUnavailable(format!("missing DB: {}", path.display())));
		}

		log::debug!("Opening package database {}", path.display());
		let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)
			.map_err(|e| crate::Error::DataUnavailable(format!("unable to open {}: {}", path.display(), e)))?;
		Self::from_connection(connection)
	}

	/// Opens the package database of `config`'s release, downloading it first when it isn't in the data directory.
	pub fn open_release(config: &crate::Config) -> crate::Result<Self> {
		Self::open(fetch_primary_db(config)?)
	}

	/// Wraps an already open connection, checking it has the expected tables.
	pub fn from_connection(connection: Connection) -> crate::Result<Self> {
		let tables: i64 = connection.query_row(TABLE_COUNT, [], |r| r.get(0))
			.map_err(|e| crate::Error::DataUnavailable(format!("package database unreadable: {}", e)))?;
		if tables != 3 {
			return Err(crate::Error::DataUnavailable("package database is missing the packages, requires or provides table".to_string()));
		}
		Ok(Self { connection })
	}

	pub fn contains(&self, package: &str) -> crate::Result<bool> {
		let mut statement = self.connection.prepare_cached(PACKAGE_EXISTS)?;
		Ok(statement.query_row(params![package], |r| r.get(0))?)
	}

	/// Names `package` declares as requirements.
	pub fn required_names(&self, package: &str) -> crate::Result<HashSet<String>> {
		let mut statement = self.connection.prepare_cached(REQUIRED_NAMES)?;
		let names = statement.query_map(params![package], |r| r.get(0))?
			.collect::<rusqlite::Result<HashSet<String>>>()?;
		Ok(names)
	}

	/// Packages declaring a provision of `name`. Empty when nothing provides it.
	pub fn providers_of(&self, name: &str) -> crate::Result<HashSet<String>> {
		let mut statement = self.connection.prepare_cached(PROVIDING_PACKAGES)?;
		let packages = statement.query_map(params![name], |r| r.get(0))?
			.collect::<rusqlite::Result<HashSet<String>>>()?;
		Ok(packages)
	}

	/// Every provider of every name `package` requires.
	///
	/// Requirements nobody provides are skipped.
	pub fn direct_dependencies(&self, package: &str) -> crate::Result<HashSet<String>> {
		let mut dependencies = HashSet::new();
		for name in self.required_names(package)? {
			let providers = self.providers_of(&name)?;
			if providers.is_empty() {
				log::trace!("Requirement `{}` of `{}` has no provider", name, package);
			}
			dependencies.extend(providers);
		}
		Ok(dependencies)
	}

	/// Every package transitively required by `seed`.
	///
	/// `seed` itself is only included when one of its dependencies requires it back.
	pub fn closure(&self, seed: &str) -> crate::Result<HashSet<String>> {
		self.closure_all([seed])
	}

	/// Union of [`closure()`](Self::closure) over all `seeds`.
	pub fn closure_all<I, S>(&self, seeds: I) -> crate::Result<HashSet<String>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let seeds = seeds.into_iter().map(|s| s.as_ref().to_owned()).collect::<Vec<_>>();
		for seed in &seeds {
			if !self.contains(seed)? {
				log::warn!("Package `{}` is not in the package database", seed);
			}
		}

		let closure = crate::closure::expand(crate::closure::Backend::Requirement(self), &seeds)?;
		log::debug!("Requirement closure of {} seeds has {} packages", seeds.len(), closure.len());
		Ok(closure)
	}

	/// Source package `package` was built from.
	///
	/// # Errors
	/// - [`NotFound`](crate::Error::NotFound) when the package is unknown or has no source package recorded.
	pub fn source_package(&self, package: &str) -> crate::Result<String> {
		let mut statement = self.connection.prepare_cached(SOURCE_PACKAGE)?;
		let srpm: Option<Option<String>> = statement.query_row(params![package], |r| r.get(0)).optional()?;
		srpm.flatten()
			.filter(|s| !s.is_empty())
			.ok_or_else(|| crate::Error::NotFound(format!("no source package mapping for {}", package)))
	}

	/// Map of every package name to its source package. Packages without one are left out.
	pub fn source_package_map(&self) -> crate::Result<HashMap<String, String>> {
		let mut statement = self.connection.prepare_cached(SOURCE_PACKAGE_MAP)?;
		let rows = statement.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, Option<String>>(1)?)))?;

		let mut map = HashMap::new();
		for row in rows {
			if let (name, Some(srpm)) = row? {
				map.insert(name, srpm);
			}
		}
		Ok(map)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Minimal copy of the primary.sqlite schema.
	fn index(rows: &[(&str, &[&str], &[&str])]) -> RequirementIndex {
		let connection = Connection::open_in_memory().unwrap();
		connection.execute_batch(
			"CREATE TABLE packages (pkgKey INTEGER PRIMARY KEY, name TEXT, rpm_sourcerpm TEXT);
			CREATE TABLE requires (name TEXT, pkgKey INTEGER);
			CREATE TABLE provides (name TEXT, pkgKey INTEGER);"
		).unwrap();
		for (key, (name, requires, provides)) in rows.iter().enumerate() {
			connection.execute("INSERT INTO packages VALUES (?1, ?2, ?3)", params![key as i64, name, format!("{}-1.0-1.src.rpm", name)]).unwrap();
			for r in *requires {
				connection.execute("INSERT INTO requires VALUES (?1, ?2)", params![r, key as i64]).unwrap();
			}
			for p in *provides {
				connection.execute("INSERT INTO provides VALUES (?1, ?2)", params![p, key as i64]).unwrap();
			}
		}
		RequirementIndex::from_connection(connection).unwrap()
	}

	fn set(items: &[&str]) -> HashSet<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn no_requirements_means_empty_closure() {
		let db = index(&[("glibc", &[], &["libc.so.6"])]);
		assert!(db.closure("glibc").unwrap().is_empty());
	}

	#[test]
	fn every_provider_is_kept() {
		let db = index(&[
			("a", &["libfoo"], &[]),
			("b", &[], &["libfoo"]),
			("c", &[], &["libfoo"]),
		]);
		assert_eq!(db.closure("a").unwrap(), set(&["b", "c"]));
	}

	#[test]
	fn unprovided_requirement_is_skipped() {
		let db = index(&[
			("a", &["libmissing", "libfoo"], &[]),
			("b", &[], &["libfoo"]),
		]);
		assert_eq!(db.closure("a").unwrap(), set(&["b"]));
	}

	#[test]
	fn seed_reached_through_cycle_is_included() {
		let db = index(&[
			("a", &["libb"], &["liba"]),
			("b", &["liba"], &["libb"]),
		]);
		assert_eq!(db.closure("a").unwrap(), set(&["a", "b"]));
	}

	#[test]
	fn closure_all_is_a_fixed_point() {
		let db = index(&[
			("app", &["libx", "liby"], &[]),
			("x", &["libz"], &["libx"]),
			("y", &[], &["liby"]),
			("z", &["libx"], &["libz"]),
		]);
		let first = db.closure_all(["app"]).unwrap();
		assert_eq!(first, set(&["x", "y", "z"]));
		let mut second = db.closure_all(&first).unwrap();
		second.extend(first.iter().cloned());
		assert_eq!(second, first);
	}

	#[test]
	fn source_packages() {
		let db = index(&[("bash", &[], &[])]);
		assert_eq!(db.source_package("bash").unwrap(), "bash-1.0-1.src.rpm");
		assert_eq!(db.source_package_map().unwrap().get("bash").map(String::as_str), Some("bash-1.0-1.src.rpm"));
		assert_eq!(db.source_package("zsh").unwrap_err().kind(), crate::ErrorKind::NotFound);
	}

	#[test]
	fn missing_tables_are_data_unavailable() {
		let connection = Connection::open_in_memory().unwrap();
		connection.execute_batch("CREATE TABLE packages (pkgKey INTEGER, name TEXT);").unwrap();
		let err = RequirementIndex::from_connection(connection).unwrap_err();
		assert_eq!(err.kind(), crate::ErrorKind::DataUnavailable);
	}

	#[test]
	fn missing_file_is_data_unavailable() {
		let err = RequirementIndex::open("/nonexistent/repodata/primary.sqlite").unwrap_err();
		assert_eq!(err.kind(), crate::ErrorKind::DataUnavailable);
	}
}

//! Various helper functions for testing
//!
//! Fixtures are built in memory so tests don't depend on a network connection or a real release.

use std::io::Write;

use rusqlite::params;

/// A package row for [`package_db()`]: name, requires, provides.
pub type PackageRow<'a> = (&'a str, &'a [&'a str], &'a [&'a str]);

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
	#[error("sqlite error: {0}")]
	Sqlite(#[from] rusqlite::Error),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
}

const SCHEMA: &str = "
	CREATE TABLE packages (pkgKey INTEGER PRIMARY KEY, pkgId TEXT, name TEXT, arch TEXT, version TEXT, rpm_sourcerpm TEXT);
	CREATE TABLE requires (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER, pre BOOLEAN DEFAULT FALSE);
	CREATE TABLE provides (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
";

/// Source package name used for every fixture package.
pub fn source_rpm(package: &str) -> String {
	format!("{}-1.0-1.src.rpm", package)
}

fn fill_package_db(connection: &rusqlite::Connection, packages: &[PackageRow]) -> Result<(), FixtureError> {
	connection.execute_batch(SCHEMA)?;
	for (key, (name, requires, provides)) in packages.iter().enumerate() {
		let key = key as i64 + 1;
		connection.execute(
			"INSERT INTO packages (pkgKey, pkgId, name, arch, version, rpm_sourcerpm) VALUES (?1, ?2, ?3, 'x86_64', '1.0', ?4)",
			params![key, format!("{:040}", key), name, source_rpm(name)],
		)?;
		for r in requires.iter() {
			connection.execute("INSERT INTO requires (name, pkgKey) VALUES (?1, ?2)", params![r, key])?;
		}
		for p in provides.iter() {
			connection.execute("INSERT INTO provides (name, pkgKey) VALUES (?1, ?2)", params![p, key])?;
		}
	}
	Ok(())
}

/// In-memory database laid out like a release's `primary.sqlite`.
pub fn package_db(packages: &[PackageRow]) -> Result<dissector::RequirementIndex, Box<dyn std::error::Error>> {
	let connection = rusqlite::Connection::open_in_memory()?;
	fill_package_db(&connection, packages)?;
	Ok(dissector::RequirementIndex::from_connection(connection)?)
}

/// Writes a `primary.sqlite` to where `config` expects it.
pub fn write_package_db(config: &dissector::Config, packages: &[PackageRow]) -> Result<(), FixtureError> {
	let path = config.primary_db_path();
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	let connection = rusqlite::Connection::open(path)?;
	fill_package_db(&connection, packages)
}

/// A `.tar.gz` shaped like the upstream bundle release archive.
pub fn bundle_archive(version: u32, bundles: &[(&str, &str)]) -> Result<Vec<u8>, FixtureError> {
	let gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
	let mut builder = tar::Builder::new(gz);

	let root = format!("clr-bundles-{}", version);
	add_file(&mut builder, &format!("{}/README.md", root), b"bundle definitions\n")?;
	for (name, text) in bundles {
		add_file(&mut builder, &format!("{}/bundles/{}", root, name), text.as_bytes())?;
	}

	let mut gz = builder.into_inner()?;
	gz.flush()?;
	Ok(gz.finish()?)
}

fn add_file<W: Write>(builder: &mut tar::Builder<W>, path: &str, data: &[u8]) -> Result<(), FixtureError> {
	let mut header = tar::Header::new_gnu();
	header.set_size(data.len() as u64);
	header.set_mode(0o644);
	header.set_entry_type(tar::EntryType::Regular);
	builder.append_data(&mut header, path, data)?;
	Ok(())
}

/// Temporary directory removed when dropped, for use as [`dissector::Config::data_dir`].
pub fn temp_data_dir() -> Result<tempfile::TempDir, FixtureError> {
	Ok(tempfile::Builder::new().prefix("dissector-").tempdir()?)
}

/// Config for `version` rooted in `dir`, pointing at servers that don't exist so nothing gets downloaded.
pub fn offline_config(version: u32, dir: &std::path::Path) -> dissector::Config {
	let mut config = dissector::Config::new(version);
	config.set_data_dir(dir);
	config.set_bundles_url("http://127.0.0.1:9");
	config.set_repo_url("http://127.0.0.1:9");
	config
}

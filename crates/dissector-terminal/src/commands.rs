//! The commands the terminal exposes, each producing the lines to print.

use std::path::PathBuf;

use dissector::{BundleStore, Mode, RelationGraph, RequirementIndex, ResolverBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	/// Bundle names to the packages they list.
	Bundles,
	/// Roots to the full package closure.
	Resolve,
	/// Roots to the source package URLs of their closure.
	Sources,
	/// Image names to the bundles they are built from.
	Image,
	/// Every known package.
	List,
}

impl std::str::FromStr for Command {
	type Err = crate::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"bundles" => Ok(Command::Bundles),
			"resolve" => Ok(Command::Resolve),
			"sources" => Ok(Command::Sources),
			"image" => Ok(Command::Image),
			"list" => Ok(Command::List),
			_ => Err(crate::Error::UnknownCommand(s.to_owned())),
		}
	}
}

/// Everything a command needs besides its roots.
pub struct Context {
	pub config: dissector::Config,
	/// Selects the relation backend when present.
	pub graph: Option<PathBuf>,
}

impl Context {
	fn mode(&self) -> Mode {
		if self.graph.is_some() { Mode::Relation } else { Mode::Requirement }
	}

	fn load_graph(&self) -> Result<Option<RelationGraph>, crate::Error> {
		match &self.graph {
			Some(path) => Ok(Some(RelationGraph::load_from_file(path)?)),
			None => Ok(None),
		}
	}
}

/// Runs `command`, returning the output lines sorted and deduplicated.
pub fn run(command: Command, context: &Context, roots: &[String]) -> Result<Vec<String>, crate::Error> {
	if roots.is_empty() && command != Command::List {
		return Err(crate::Error::MissingArgument("at least one root"));
	}

	let mut lines: Vec<String> = match command {
		Command::Bundles => {
			let store = BundleStore::load(&context.config)?;
			store.resolve(roots)?.into_iter().collect()
		},
		Command::Resolve => {
			let store = BundleStore::load(&context.config)?;
			let graph = context.load_graph()?;
			let index = match graph {
				Some(_) => None,
				None => Some(RequirementIndex::open_release(&context.config)?),
			};

			let mut builder = ResolverBuilder::new(&store);
			if let Some(g) = &graph {
				builder = builder.relation_graph(g);
			}
			if let Some(i) = &index {
				builder = builder.requirement_index(i);
			}
			builder.build().resolve(roots, context.mode())?.into_iter().collect()
		},
		Command::Sources => {
			let store = BundleStore::load(&context.config)?;
			let graph = context.load_graph()?;
			let index = RequirementIndex::open_release(&context.config)?;

			let mut builder = ResolverBuilder::new(&store).requirement_index(&index);
			if let Some(g) = &graph {
				builder = builder.relation_graph(g);
			}
			builder.build().resolve_sources(roots, context.mode())?
				.iter()
				.map(|srpm| context.config.source_rpm_url(srpm))
				.collect()
		},
		Command::Image => {
			let mut bundles = Vec::new();
			for image in roots {
				bundles.extend(dissector::bundles::fetch_image_config(&context.config, image)?.bundles);
			}
			bundles
		},
		Command::List => match context.load_graph()? {
			Some(graph) => graph.nodes().map(|n| n.unquoted().to_owned()).collect(),
			None => {
				let store = BundleStore::load(&context.config)?;
				ResolverBuilder::new(&store).build().dump_all().into_iter().collect()
			},
		},
	};

	lines.sort();
	lines.dedup();
	Ok(lines)
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Release 100 with a cached bundle archive and package database.
	fn fixture() -> (tempfile::TempDir, Context) {
		let dir = dissector_test_utils::temp_data_dir().unwrap();
		let config = dissector_test_utils::offline_config(100, dir.path());

		let archive = dissector_test_utils::bundle_archive(100, &[
			("os-core", "glibc\nbash\n"),
			("editors", "include(os-core)\nvim\n"),
		]).unwrap();
		std::fs::create_dir_all(config.release_dir()).unwrap();
		std::fs::write(config.bundle_archive_path(), archive).unwrap();

		dissector_test_utils::write_package_db(&config, &[
			("glibc", &[], &["libc.so.6"]),
			("bash", &["libc.so.6"], &[]),
			("vim", &["libc.so.6", "libacl.so.1"], &[]),
			("acl", &[], &["libacl.so.1"]),
		]).unwrap();

		(dir, Context { config, graph: None })
	}

	fn roots(items: &[&str]) -> Vec<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn commands_parse() {
		assert_eq!("resolve".parse::<Command>().unwrap(), Command::Resolve);
		assert!("frobnicate".parse::<Command>().is_err());
	}

	#[test]
	fn bundles_command() {
		let (_dir, context) = fixture();
		let lines = run(Command::Bundles, &context, &roots(&["editors"])).unwrap();
		assert_eq!(lines, vec!["bash", "glibc", "vim"]);
		assert!(run(Command::Bundles, &context, &roots(&["nope"])).is_err());
	}

	#[test]
	fn resolve_command_with_database() {
		let (_dir, context) = fixture();
		let lines = run(Command::Resolve, &context, &roots(&["vim"])).unwrap();
		assert_eq!(lines, vec!["acl", "glibc", "vim"]);
	}

	#[test]
	fn resolve_command_with_graph() {
		let (dir, mut context) = fixture();
		let graph = dir.path().join("deps.dot");
		std::fs::write(&graph, r#"digraph { "vim" -> "vim_r"; subgraph "vim_r" { "glibc" } }"#).unwrap();
		context.graph = Some(graph);

		let lines = run(Command::Resolve, &context, &roots(&["vim"])).unwrap();
		assert_eq!(lines, vec!["glibc", "vim"]);
		let listed = run(Command::List, &context, &[]).unwrap();
		assert_eq!(listed, vec!["glibc", "vim"]);
	}

	#[test]
	fn sources_command() {
		let (_dir, context) = fixture();
		let lines = run(Command::Sources, &context, &roots(&["os-core"])).unwrap();
		assert_eq!(lines, vec![
			"http://127.0.0.1:9/releases/100/clear/source/SRPMS/bash-1.0-1.src.rpm",
			"http://127.0.0.1:9/releases/100/clear/source/SRPMS/glibc-1.0-1.src.rpm",
		]);
	}

	#[test]
	fn list_command_dumps_bundles() {
		let (_dir, context) = fixture();
		assert_eq!(run(Command::List, &context, &[]).unwrap(), vec!["bash", "glibc", "vim"]);
	}

	#[test]
	fn roots_are_required() {
		let (_dir, context) = fixture();
		assert!(matches!(run(Command::Resolve, &context, &[]), Err(crate::Error::MissingArgument(_))));
	}
}

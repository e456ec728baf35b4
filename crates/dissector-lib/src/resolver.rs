//! Getting the full set of packages an image needs from a list of bundles and packages.
//!
//! # Usage
//! 1. Load a [`BundleStore`] and whichever backend you want to expand with.
//! 1. Create a [`ResolverBuilder`] and hand it the backends.
//! 1. [`ResolverBuilder::build()`] to get a [`ClosureResolver`].
//! 1. [`ClosureResolver::resolve()`] with the roots and a [`Mode`].
//!
//! Roots naming a bundle are replaced by the bundle's packages, any other root is taken as a package name.
//! The returned set always contains these seed packages plus everything the chosen backend adds to them.

use std::collections::HashSet;

use crate::bundles::BundleStore;
use crate::closure::{expand, Backend};
use crate::relation_graph::{NodeId, RelationGraph};
use crate::requirements::RequirementIndex;

/// How seed packages are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
	/// No expansion, only the packages the bundles list.
	Bundle,
	/// Follow requires/provides in the package database.
	Requirement,
	/// Follow edges and relations of an external dependency graph.
	Relation,
}

pub struct ResolverBuilder<'a> {
	bundles: &'a BundleStore,
	requirements: Option<&'a RequirementIndex>,
	relations: Option<&'a RelationGraph>,
}

impl<'a> ResolverBuilder<'a> {
	pub fn new(bundles: &'a BundleStore) -> Self {
		Self {
			bundles,
			requirements: None,
			relations: None,
		}
	}

	pub fn requirement_index(mut self, index: &'a RequirementIndex) -> Self {
		self.requirements = Some(index);
		self
	}

	pub fn relation_graph(mut self, graph: &'a RelationGraph) -> Self {
		self.relations = Some(graph);
		self
	}

	pub fn build(self) -> ClosureResolver<'a> {
		ClosureResolver {
			bundles: self.bundles,
			requirements: self.requirements,
			relations: self.relations,
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub struct ClosureResolver<'a> {
	bundles: &'a BundleStore,
	requirements: Option<&'a RequirementIndex>,
	relations: Option<&'a RelationGraph>,
}

impl<'a> ClosureResolver<'a> {
	fn requirement_index(&self) -> crate::Result<&'a RequirementIndex> {
		self.requirements.ok_or_else(|| crate::Error::DataUnavailable("no package database loaded".to_string()))
	}

	fn relation_graph(&self) -> crate::Result<&'a RelationGraph> {
		self.relations.ok_or_else(|| crate::Error::DataUnavailable("no dependency graph loaded".to_string()))
	}

	/// Resolves `roots` to the full package closure.
	///
	/// # Errors
	/// - [`DataUnavailable`](crate::Error::DataUnavailable) when `mode` needs a backend that wasn't given to the builder,
	/// or the backend fails while being read. Nothing is returned in that case.
	pub fn resolve<I, S>(&self, roots: I, mode: Mode) -> crate::Result<HashSet<String>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut packages = self.bundles.seed_packages(roots)?;
		log::debug!("{} seed packages", packages.len());

		let expansion = match mode {
			Mode::Bundle => HashSet::new(),
			Mode::Requirement => self.requirement_index()?.closure_all(&packages)?,
			Mode::Relation => {
				let graph = self.relation_graph()?;
				let nodes = packages.iter().map(|p| NodeId::quoted(p)).collect::<Vec<_>>();
				for node in nodes.iter().filter(|n| !graph.contains(n)) {
					log::warn!("Package `{}` is not in the dependency graph", node.unquoted());
				}
				expand(Backend::Relation(graph), nodes.iter().map(NodeId::as_str))?
					.into_iter()
					.map(|id| NodeId::new(id).unquoted().to_owned())
					.collect()
			},
		};

		packages.extend(expansion);
		log::debug!("Resolved {:?} closure has {} packages", mode, packages.len());
		Ok(packages)
	}

	/// Every package listed in any bundle, without resolving anything.
	pub fn dump_all(&self) -> HashSet<String> {
		self.bundles.all_packages()
	}

	/// Source packages needed to build the closure of `roots`.
	///
	/// # Errors
	/// - [`NotFound`](crate::Error::NotFound) when a resolved package has no source package recorded.
	pub fn resolve_sources<I, S>(&self, roots: I, mode: Mode) -> crate::Result<HashSet<String>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let index = self.requirement_index()?;
		self.resolve(roots, mode)?
			.iter()
			.map(|p| index.source_package(p))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Bundle;

	fn set(items: &[&str]) -> HashSet<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn bundle_mode_is_seed_packages() {
		let store = BundleStore::new([Bundle::parse("os-core", "glibc\nbash")]);
		let resolver = ResolverBuilder::new(&store).build();
		assert_eq!(resolver.resolve(["os-core"], Mode::Bundle).unwrap(), set(&["glibc", "bash"]));
		assert_eq!(resolver.resolve(["os-core", "vim"], Mode::Bundle).unwrap(), set(&["glibc", "bash", "vim"]));
	}

	#[test]
	fn relation_mode_keeps_seeds() {
		let store = BundleStore::new([Bundle::parse("shells", "bash")]);
		let graph = RelationGraph::parse(r#"digraph {
			"bash" -> "bash_deps"; subgraph "bash_deps" { "glibc"; "ncurses" }
			"glibc";
		}"#).unwrap();
		let resolver = ResolverBuilder::new(&store).relation_graph(&graph).build();
		assert_eq!(resolver.resolve(["shells"], Mode::Relation).unwrap(), set(&["bash", "glibc", "ncurses"]));
	}

	#[test]
	fn missing_backend_is_data_unavailable() {
		let store = BundleStore::default();
		let resolver = ResolverBuilder::new(&store).build();
		for mode in [Mode::Requirement, Mode::Relation] {
			let err = resolver.resolve(["bash"], mode).unwrap_err();
			assert_eq!(err.kind(), crate::ErrorKind::DataUnavailable);
		}
	}

	#[test]
	fn dump_all_lists_every_bundle_package() {
		let store = BundleStore::new([
			Bundle::parse("a", "one\ntwo"),
			Bundle::parse("b", "include(a)\nthree"),
		]);
		let resolver = ResolverBuilder::new(&store).build();
		assert_eq!(resolver.dump_all(), set(&["one", "two", "three"]));
	}
}

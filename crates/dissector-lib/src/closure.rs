//! The worklist traversal shared by every backend.
//!
//! Each backend only has to answer "what are the successors of this identifier",
//! [`expand()`] takes care of the visited set and termination on cyclic graphs.
//!
//! A traversal owns its visited set and only reads the backend, so a store can be shared
//! between any number of expansions.

use std::collections::HashSet;

use crate::bundles::BundleStore;
use crate::requirements::RequirementIndex;
use crate::relation_graph::RelationGraph;

/// The data an expansion walks over.
#[derive(Debug, Clone, Copy)]
pub enum Backend<'a> {
	/// Bundle name to packages, including packages of directly included bundles.
	Bundle(&'a BundleStore),
	/// Package to every provider of any of its required names.
	Requirement(&'a RequirementIndex),
	/// Node to every member of the relations its edges point at. Identifiers are raw node ids.
	Relation(&'a RelationGraph),
}

impl Backend<'_> {
	/// Direct successors of `id`. Unknown identifiers have none.
	pub fn successors(&self, id: &str) -> crate::Result<HashSet<String>> {
		match self {
			Backend::Bundle(store) => Ok(store.direct_packages(id)),
			Backend::Requirement(index) => index.direct_dependencies(id),
			Backend::Relation(graph) => Ok(graph.successors(id)),
		}
	}

	/// How many steps away from a seed the walk may go.
	///
	/// Bundle includes only expand a single level, so the packages found from a bundle are never expanded again.
	pub fn depth_limit(&self) -> Option<usize> {
		match self {
			Backend::Bundle(_) => Some(1),
			Backend::Requirement(_) | Backend::Relation(_) => None,
		}
	}
}

/// Returns every identifier reachable from `seeds` in one or more steps.
///
/// Seeds are only part of the result when they are reached again through some path.
/// Any backend error aborts the walk and nothing is returned.
pub fn expand<I, S>(backend: Backend<'_>, seeds: I) -> crate::Result<HashSet<String>>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let limit = backend.depth_limit();

	let mut visited = HashSet::<String>::new();
	let mut reached = HashSet::<String>::new();
	let mut stack = Vec::<(String, usize)>::new();

	for seed in seeds {
		let seed = seed.as_ref();
		if visited.insert(seed.to_owned()) {
			stack.push((seed.to_owned(), 0));
		}
	}

	while let Some((id, depth)) = stack.pop() {
		if limit.is_some_and(|l| depth >= l) {
			continue;
		}

		for successor in backend.successors(&id)? {
			if visited.insert(successor.clone()) {
				stack.push((successor.clone(), depth + 1));
			}
			reached.insert(successor);
		}
	}

	log::trace!("Expansion reached {} identifiers from {} visited", reached.len(), visited.len());
	Ok(reached)
}

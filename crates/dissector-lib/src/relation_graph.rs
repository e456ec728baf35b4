//! # Relation graph
//!
//! An externally generated dependency graph where edges don't point at packages directly.
//! Every edge targets a *relation*, a named group of alternative packages, and all members of that group count as successors.
//!
//! ```text
//! node ──Requires──▶ relation ──Member──▶ node
//!                             ──Member──▶ node
//! ```
//!
//! Node identifiers are kept exactly as written in the graph description, quotes included.
//! Use [`NodeId::quoted()`] to look up a package by its plain name.

use std::collections::{HashMap, HashSet};

use petgraph::prelude::*;

mod dot;

/// Identifier of a node as it appears in the graph description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
	pub fn new(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	/// Wraps a package name in quotes to match the node naming of generated graphs.
	pub fn quoted(package: &str) -> Self {
		Self(format!("\"{}\"", package))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// The identifier without its surrounding quotes, this is the package name.
	pub fn unquoted(&self) -> &str {
		self.0.strip_prefix('"')
			.and_then(|s| s.strip_suffix('"'))
			.unwrap_or(&self.0)
	}
}

impl std::fmt::Display for NodeId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.unquoted())
	}
}

#[derive(Debug, Clone)]
pub enum NodeData {
	/// A package in the graph.
	Package(NodeId),
	/// A group of alternatives, any member satisfies an edge pointing here.
	Relation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeData {
	/// From a package to a relation it depends on.
	Requires,
	/// From a relation to one of its member packages.
	Member,
}

#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
	graph: DiGraph<NodeData, EdgeData>,
	nodes: HashMap<String, NodeIndex>,
	relations: HashMap<String, NodeIndex>,
}

impl RelationGraph {
	/// Reads a graph description.
	///
	/// # Errors
	/// - [`Parse`](crate::Error::Parse) when the text isn't a valid description.
	pub fn parse(text: &str) -> crate::Result<Self> {
		let graph = dot::parse(text)?;
		log::debug!("Parsed relation graph with {} nodes and {} relations", graph.nodes.len(), graph.relations.len());
		Ok(graph)
	}

	pub fn load_from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path)
			.map_err(|e| crate::Error::DataUnavailable(format!("unable to read dependency graph {}: {}", path.display(), e)))?;
		Self::parse(&text)
	}

	/* Construction */

	/// Returns the index of the node with id `id`, adding it when it doesn't exist.
	pub fn add_node(&mut self, id: &str) -> NodeIndex {
		if let Some(&i) = self.nodes.get(id) {
			return i;
		}
		let i = self.graph.add_node(NodeData::Package(NodeId::new(id)));
		self.nodes.insert(id.to_owned(), i);
		i
	}

	fn get_or_add_relation(&mut self, key: &str) -> NodeIndex {
		if let Some(&i) = self.relations.get(key) {
			return i;
		}
		let i = self.graph.add_node(NodeData::Relation(key.to_owned()));
		self.relations.insert(key.to_owned(), i);
		i
	}

	fn add_unique_edge(&mut self, a: NodeIndex, b: NodeIndex, weight: EdgeData) {
		if self.graph.find_edge(a, b).is_none() {
			self.graph.add_edge(a, b, weight);
		}
	}

	/// Adds an edge from node `src` to relation `relation`.
	pub fn add_edge(&mut self, src: &str, relation: &str) {
		let a = self.add_node(src);
		let b = self.get_or_add_relation(relation);
		self.add_unique_edge(a, b, EdgeData::Requires);
	}

	/// Makes node `member` one of the alternatives of relation `relation`.
	pub fn add_relation_member(&mut self, relation: &str, member: &str) {
		let r = self.get_or_add_relation(relation);
		let m = self.add_node(member);
		self.add_unique_edge(r, m, EdgeData::Member);
	}

	/* Queries */

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn contains(&self, id: &NodeId) -> bool {
		self.nodes.contains_key(id.as_str())
	}

	/// Every package node in the graph. Relation keys are not nodes, even when they were edge destinations.
	pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
		self.graph.node_indices().filter_map(move |i| match &self.graph[i] {
			NodeData::Package(id) => Some(id),
			NodeData::Relation(_) => None,
		})
	}

	/// Members of relation `key`. Empty for relations that don't exist.
	pub fn relation_members(&self, key: &str) -> HashSet<&NodeId> {
		self.relations.get(key)
			.map(|&r| self.members(r).collect())
			.unwrap_or_default()
	}

	fn members(&self, relation: NodeIndex) -> impl Iterator<Item = &NodeId> + '_ {
		self.graph.edges_directed(relation, Outgoing)
			.filter(|e| *e.weight() == EdgeData::Member)
			.filter_map(|e| match &self.graph[e.target()] {
				NodeData::Package(id) => Some(id),
				NodeData::Relation(_) => None,
			})
	}

	/// Raw ids of every member of every relation node `id` has an edge to.
	pub fn successors(&self, id: &str) -> HashSet<String> {
		let node = match self.nodes.get(id) {
			Some(&n) => n,
			None => return HashSet::new(),
		};

		self.graph.edges_directed(node, Outgoing)
			.filter(|e| *e.weight() == EdgeData::Requires)
			.flat_map(|e| self.members(e.target()))
			.map(|m| m.as_str().to_owned())
			.collect()
	}

	/// Every node reachable from `seed`.
	///
	/// `seed` is only included when it is reached again through a cycle.
	pub fn closure(&self, seed: &NodeId) -> crate::Result<HashSet<NodeId>> {
		if !self.contains(seed) {
			log::warn!("Node {} is not in the dependency graph", seed.as_str());
		}
		let reached = crate::closure::expand(crate::closure::Backend::Relation(self), [seed.as_str()])?;
		Ok(reached.into_iter().map(NodeId::new).collect())
	}
}

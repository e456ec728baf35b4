//! Turning a parsed graphviz description into a [`RelationGraph`].
//!
//! - Node statements declare packages: `"bash" [label="bash"];`
//! - Edge statements point a package at a relation key: `"bash" -> "bash_requires";`
//! - `subgraph key { ... }` blocks declare the members of relation `key`. Nodes declared there and the
//!   sources of edges written there are members.
//!
//! Attribute statements are ignored. Edge destinations are relation keys, they don't become package nodes.

use graphviz_rust::dot_structures::{Edge, EdgeTy, Graph, Id, Stmt, Vertex};

use super::RelationGraph;

/// Node id as written in the description, quoted ids keep their quotes.
fn raw_id(id: &Id) -> String {
	match id {
		Id::Escaped(s) if s.starts_with('"') => s.clone(),
		Id::Escaped(s) => format!("\"{}\"", s),
		Id::Html(s) | Id::Plain(s) | Id::Anonymous(s) => s.clone(),
	}
}

/// Relation key of a subgraph, anonymous subgraphs belong to whatever encloses them.
fn relation_key(id: &Id, enclosing: Option<&str>) -> Option<String> {
	match id {
		Id::Anonymous(_) => enclosing.map(str::to_owned),
		id => Some(raw_id(id)),
	}
}

/// Ids a vertex stands for, every node declared in it for a subgraph.
fn vertex_ids(vertex: &Vertex) -> Vec<String> {
	match vertex {
		Vertex::N(node) => vec![raw_id(&node.0)],
		Vertex::S(subgraph) => {
			let mut ids = Vec::new();
			collect_node_ids(&subgraph.stmts, &mut ids);
			ids
		},
	}
}

fn collect_node_ids(stmts: &[Stmt], ids: &mut Vec<String>) {
	for stmt in stmts {
		match stmt {
			Stmt::Node(node) => ids.push(raw_id(&node.id.0)),
			Stmt::Subgraph(subgraph) => collect_node_ids(&subgraph.stmts, ids),
			_ => {},
		}
	}
}

struct Builder {
	graph: RelationGraph,
}

impl Builder {
	fn add_member(&mut self, relation: Option<&str>, id: &str) {
		self.graph.add_node(id);
		if let Some(key) = relation {
			self.graph.add_relation_member(key, id);
		}
	}

	fn statements(&mut self, stmts: &[Stmt], relation: Option<&str>) {
		for stmt in stmts {
			match stmt {
				Stmt::Node(node) => self.add_member(relation, &raw_id(&node.id.0)),
				Stmt::Subgraph(subgraph) => {
					let key = relation_key(&subgraph.id, relation);
					self.statements(&subgraph.stmts, key.as_deref());
				},
				Stmt::Edge(edge) => self.edge(edge, relation),
				Stmt::Attribute(_) | Stmt::GAttribute(_) => {},
			}
		}
	}

	fn edge(&mut self, edge: &Edge, relation: Option<&str>) {
		let vertices = match &edge.ty {
			EdgeTy::Pair(a, b) => vec![a, b],
			EdgeTy::Chain(chain) => chain.iter().collect(),
		};

		/* Node statements inside subgraph operands still declare nodes */
		for vertex in &vertices {
			if let Vertex::S(subgraph) = vertex {
				let key = relation_key(&subgraph.id, relation);
				self.statements(&subgraph.stmts, key.as_deref());
			}
		}

		for pair in vertices.windows(2) {
			let destinations = vertex_ids(pair[1]);
			for src in vertex_ids(pair[0]) {
				self.add_member(relation, &src);
				for dst in &destinations {
					self.graph.add_edge(&src, dst);
				}
			}
		}
	}
}

/// Strips `#` lines, graphviz treats them as preprocessor output.
fn strip_preprocessor_lines(text: &str) -> String {
	text.lines()
		.map(|l| if l.trim_start().starts_with('#') { "" } else { l })
		.collect::<Vec<_>>()
		.join("\n")
}

pub(super) fn parse(text: &str) -> crate::Result<RelationGraph> {
	let parsed = graphviz_rust::parse(&strip_preprocessor_lines(text))
		.map_err(|e| crate::Error::Parse(format!("dependency graph: {}", e)))?;

	let stmts = match &parsed {
		Graph::Graph { stmts, .. } | Graph::DiGraph { stmts, .. } => stmts,
	};

	let mut builder = Builder { graph: RelationGraph::default() };
	builder.statements(stmts, None);
	Ok(builder.graph)
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::NodeId;

	fn ids(items: &[&str]) -> HashSet<String> {
		items.iter().map(|s| format!("\"{}\"", s)).collect()
	}

	#[test]
	fn full_description() {
		let g = parse(r#"
			# generated
			strict digraph "deps" {
				graph [rankdir=LR];
				node [shape=box];
				"bash" [label="bash"];
				"bash" -> "bash_requires";
				subgraph "bash_requires" {
					"glibc"; "ncurses";
				}
				// a comment
				"ncurses" -> "ncurses_requires" [style=dashed];
				/* another */
				subgraph "ncurses_requires" { "glibc" }
				rank = same
			}
		"#).unwrap();

		assert_eq!(g.node_count(), 3);
		let closure = g.closure(&NodeId::quoted("bash")).unwrap();
		assert_eq!(closure, [NodeId::quoted("glibc"), NodeId::quoted("ncurses")].into_iter().collect::<HashSet<_>>());
	}

	#[test]
	fn edge_chains() {
		let g = parse(r#"digraph { "a" -> "r1" -> "r2"; subgraph "r2" { "c" } }"#).unwrap();
		assert_eq!(g.successors("\"r1\""), ids(&["c"]));
	}

	#[test]
	fn anonymous_subgraph_members_go_to_enclosing_relation() {
		let g = parse(r#"digraph { "a" -> "grp"; subgraph "grp" { { "b" } } }"#).unwrap();
		assert_eq!(g.successors("\"a\""), ids(&["b"]));
	}

	#[test]
	fn edge_sources_in_subgraph_are_members() {
		let g = parse(r#"digraph {
			"a" -> "grp";
			subgraph "grp" { "b" -> "b_deps"; }
			subgraph "b_deps" { "c" }
		}"#).unwrap();
		assert_eq!(g.successors("\"a\""), ids(&["b"]));
		assert_eq!(g.closure(&NodeId::quoted("a")).unwrap().len(), 2);
	}

	#[test]
	fn edge_to_subgraph_operand() {
		let g = parse(r#"digraph { "a" -> { "r1" "r2" }; subgraph "r1" { "b" } subgraph "r2" { "c" } }"#).unwrap();
		assert_eq!(g.successors("\"a\""), ids(&["b", "c"]));
	}

	#[test]
	fn edge_destinations_are_not_nodes() {
		let g = parse(r#"digraph { "a" -> "a_deps"; subgraph "a_deps" { "b" } }"#).unwrap();
		let nodes = g.nodes().map(|n| n.as_str().to_owned()).collect::<HashSet<_>>();
		assert_eq!(nodes, ids(&["a", "b"]));
	}

	#[test]
	fn malformed_input_is_a_parse_error() {
		for text in ["digraph {", "digraph { \"a\" -> }", "graph { \"unterminated }", "nope { }"] {
			match parse(text) {
				Err(crate::Error::Parse(_)) => {},
				other => panic!("expected parse error for {:?}, got {:?}", text, other),
			}
		}
	}
}

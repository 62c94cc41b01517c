//! Generic dependency graph with a destructive, deterministic build-order
//! drain.
//!
//! The graph is reusable for anything with a name; the resolver instantiates
//! it over package instance names. Determinism matters more than speed here:
//! the computed order ends up inside generated build files whose diffs users
//! read, so two runs over the same node/edge sets must produce byte-identical
//! output regardless of insertion order. Every point where iteration order
//! could leak in is pinned by an explicit sort.

use std::collections::BTreeSet;
use std::collections::HashMap;

use petgraph::prelude::*;
use serde::{Serialize, Deserialize};

/// Gives graph nodes the name used for deterministic ordering and for
/// diagnostics.
pub trait GraphItem: Clone + Eq + std::hash::Hash {
	fn graph_name(&self) -> &str;
}

impl GraphItem for String {
	fn graph_name(&self) -> &str { self }
}

fn fmt_list(items: &[String]) -> String {
	items.join(", ")
}

/// These errors halt build-order determination.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
	/// Self edges are rejected the moment they are added.
	#[error("`{name}` can not depend on itself")]
	SelfDependency { name: String },
	/// A cycle inside the requested closure. Every distinct cycle trace
	/// found is listed, shortest first.
	#[error("circular dependency detected: {}", fmt_list(.cycles))]
	CircularDependency { cycles: Vec<String> },
	/// The cycle sits in a package the requested one merely depends on; the
	/// participants point at the true offender.
	#[error("`{package}` depends on packages with a circular dependency between them: {}", fmt_list(.participants))]
	CircularDependencyInDependency { package: String, participants: Vec<String> },
}

/// A directed graph where an edge `from -> to` reads "`from` depends on
/// `to`".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyGraph<T: GraphItem> {
	graph: StableDiGraph<T, ()>,
	indices: HashMap<T, NodeIndex>,
}

impl<T: GraphItem> Default for DependencyGraph<T> {
	fn default() -> Self {
		DependencyGraph { graph: StableDiGraph::default(), indices: HashMap::default() }
	}
}

impl<T: GraphItem> DependencyGraph<T> {
	pub fn new() -> Self { Self::default() }

	pub fn node_count(&self) -> usize { self.graph.node_count() }
	pub fn edge_count(&self) -> usize { self.graph.edge_count() }
	pub fn is_empty(&self) -> bool { self.graph.node_count() == 0 }

	pub fn contains(&self, item: &T) -> bool {
		self.indices.contains_key(item)
	}

	fn index_of(&self, item: &T) -> Option<NodeIndex> {
		self.indices.get(item).copied()
	}

	/// Returns the index of the existing node or adds it.
	pub fn add_node(&mut self, item: T) -> NodeIndex {
		match self.index_of(&item) {
			Some(i) => i,
			None => {
				let i = self.graph.add_node(item.clone());
				self.indices.insert(item, i);
				i
			},
		}
	}

	/// Records "`from` depends on `to`", adding either node as needed.
	///
	/// Adding the same ordered pair twice is a no-op.
	///
	/// # Errors
	/// [`SelfDependency`](GraphError::SelfDependency) when both ends are the
	/// same item.
	pub fn add_edge(&mut self, from: &T, to: &T) -> Result<(), GraphError> {
		if from == to {
			return Err(GraphError::SelfDependency { name: from.graph_name().to_owned() });
		}
		let a = self.add_node(from.clone());
		let b = self.add_node(to.clone());
		if self.graph.find_edge(a, b).is_none() {
			self.graph.add_edge(a, b, ());
		}
		Ok(())
	}

	/// Removes and returns every node nothing else depends on, detaching
	/// their outgoing edges from the remaining graph.
	pub fn remove_nodes_with_no_incoming_dependencies(&mut self) -> Vec<T> {
		let indices = self.graph.node_indices()
			.filter(|i| self.graph.edges_directed(*i, Incoming).next().is_none())
			.collect::<Vec<_>>();
		self.take_nodes(indices)
	}

	/// Removes and returns every node that depends on nothing. Only used to
	/// simplify the remainder during cycle diagnosis; such nodes can not
	/// participate in any cycle.
	pub fn remove_nodes_with_no_outgoing_dependencies(&mut self) -> Vec<T> {
		let indices = self.graph.node_indices()
			.filter(|i| self.graph.edges_directed(*i, Outgoing).next().is_none())
			.collect::<Vec<_>>();
		self.take_nodes(indices)
	}

	fn take_nodes(&mut self, indices: Vec<NodeIndex>) -> Vec<T> {
		let mut removed = Vec::with_capacity(indices.len());
		for i in indices {
			let item = self.graph.remove_node(i).expect("index was just collected from this graph");
			self.indices.remove(&item);
			removed.push(item);
		}
		removed
	}

	/// Drains the graph into a total build order: dependencies strictly
	/// before their dependents, `root` excluded from the emitted order.
	///
	/// Peels rounds of nodes nothing depends on, sorting each round
	/// case-insensitively by name; the accumulated list is leaves-last and is
	/// reversed before returning. A round that removes nothing while nodes
	/// remain means the remainder contains a cycle, which is diagnosed and
	/// returned as an error.
	///
	/// # Errors
	/// - [`CircularDependency`](GraphError::CircularDependency) with the full
	///   deduplicated, sorted cycle traces when `root` participates in the
	///   cyclic remainder.
	/// - [`CircularDependencyInDependency`](GraphError::CircularDependencyInDependency)
	///   when the cycle lives entirely in packages `root` merely depends on.
	pub fn determine_build_order(mut self, root: &T) -> Result<Vec<T>, GraphError> {
		let mut order = Vec::<T>::new();

		while !self.is_empty() {
			let mut removed = self.remove_nodes_with_no_incoming_dependencies();
			if removed.is_empty() {
				return Err(self.diagnose_cycles(root));
			}
			/* Case-insensitive for readability, case-sensitive tie-break so
			   names differing only in case still order deterministically. */
			removed.sort_by(|a, b| {
				a.graph_name().to_lowercase().cmp(&b.graph_name().to_lowercase())
					.then_with(|| a.graph_name().cmp(b.graph_name()))
			});
			for item in removed {
				if &item != root {
					order.push(item);
				}
			}
		}

		/* The peel emits consumers first; the build order wants them last. */
		order.reverse();
		Ok(order)
	}

	/// Reconstructs representative cycle traces from the stalled remainder.
	fn diagnose_cycles(mut self, root: &T) -> GraphError {
		/* Nodes depending on nothing can not close a cycle; stripping them
		   (and whatever becomes childless as a result) leaves only the
		   strongly connected remainder worth reporting. */
		loop {
			if self.remove_nodes_with_no_outgoing_dependencies().is_empty() {
				break;
			}
		}

		let root_index = match self.index_of(root) {
			Some(i) => i,
			None => return self.in_dependency_error(root),
		};

		let mut cycles = BTreeSet::<String>::new();
		let mut path = Vec::<NodeIndex>::new();
		self.walk_cycles(root_index, &mut path, &mut cycles);

		if cycles.is_empty() {
			/* The remainder is cyclic but no cycle is reachable from the root. */
			return self.in_dependency_error(root);
		}

		let mut cycles = cycles.into_iter().collect::<Vec<_>>();
		cycles.sort_by(|a, b| {
			let arrows = |s: &str| s.matches("->").count();
			arrows(a).cmp(&arrows(b)).then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
		});
		GraphError::CircularDependency { cycles }
	}

	/// Walks every simple path from `node`, closing a trace the moment a node
	/// repeats; the repeated node marks where the printable cycle starts.
	fn walk_cycles(&self, node: NodeIndex, path: &mut Vec<NodeIndex>, cycles: &mut BTreeSet<String>) {
		if let Some(position) = path.iter().position(|n| *n == node) {
			let mut names = path[position..].iter()
				.map(|n| self.graph[*n].graph_name().to_owned())
				.collect::<Vec<_>>();
			names.push(self.graph[node].graph_name().to_owned());
			cycles.insert(names.join("->"));
			return;
		}

		path.push(node);
		let targets = self.graph.edges_directed(node, Outgoing).map(|e| e.target()).collect::<Vec<_>>();
		for target in targets {
			self.walk_cycles(target, path, cycles);
		}
		path.pop();
	}

	fn in_dependency_error(&self, root: &T) -> GraphError {
		let mut participants = self.graph.node_weights()
			.map(|w| w.graph_name().to_owned())
			.collect::<Vec<_>>();
		participants.sort_by_key(|name| name.to_lowercase());
		GraphError::CircularDependencyInDependency { package: root.graph_name().to_owned(), participants }
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn graph(edges: &[(&str, &str)]) -> DependencyGraph<String> {
		let mut g = DependencyGraph::new();
		for (from, to) in edges {
			g.add_edge(&from.to_string(), &to.to_string()).unwrap();
		}
		g
	}

	#[test]
	fn chain_orders_dependencies_first_and_excludes_the_root() {
		let g = graph(&[("Top", "Lib"), ("Lib", "Core")]);
		let order = g.determine_build_order(&"Top".to_string()).unwrap();
		assert_eq!(order, vec!["Core".to_string(), "Lib".to_string()]);
	}

	#[test]
	fn every_edge_is_respected() {
		let g = graph(&[("App", "A"), ("App", "B"), ("A", "C"), ("B", "C"), ("C", "D")]);
		let order = g.determine_build_order(&"App".to_string()).unwrap();
		let position = |n: &str| order.iter().position(|o| o == n).unwrap();
		assert!(position("D") < position("C"));
		assert!(position("C") < position("A"));
		assert!(position("C") < position("B"));
	}

	#[test]
	fn order_is_identical_for_any_insertion_order() {
		let edges = [("App", "A"), ("App", "B"), ("A", "C"), ("B", "C"), ("B", "A")];
		let reference = graph(&edges).determine_build_order(&"App".to_string()).unwrap();

		let mut permuted = edges;
		permuted.reverse();
		assert_eq!(graph(&permuted).determine_build_order(&"App".to_string()).unwrap(), reference);

		let rotated = [edges[2], edges[4], edges[0], edges[3], edges[1]];
		assert_eq!(graph(&rotated).determine_build_order(&"App".to_string()).unwrap(), reference);
	}

	#[test]
	fn rounds_sort_case_insensitively() {
		let g = graph(&[("Top", "beta"), ("Top", "Alpha"), ("Top", "gamma")]);
		let order = g.determine_build_order(&"Top".to_string()).unwrap();
		assert_eq!(order, vec!["gamma".to_string(), "beta".to_string(), "Alpha".to_string()]);
	}

	#[test]
	fn self_edges_are_rejected() {
		let mut g = DependencyGraph::<String>::new();
		assert!(matches!(
			g.add_edge(&"A".to_string(), &"A".to_string()),
			Err(GraphError::SelfDependency { .. })
		));
	}

	#[test]
	fn duplicate_edges_are_idempotent() {
		let g = graph(&[("A", "B"), ("A", "B")]);
		assert_eq!(g.edge_count(), 1);
	}

	#[test]
	fn cycle_through_the_root_reports_the_trace() {
		let g = graph(&[("A", "B"), ("B", "C"), ("C", "A")]);
		match g.determine_build_order(&"A".to_string()) {
			Err(GraphError::CircularDependency { cycles }) => {
				assert_eq!(cycles, vec!["A->B->C->A".to_string()]);
			},
			other => panic!("expected a circular dependency, got {:?}", other),
		}
	}

	#[test]
	fn cycle_message_contains_the_trace() {
		let err = graph(&[("A", "B"), ("B", "C"), ("C", "A")])
			.determine_build_order(&"A".to_string())
			.unwrap_err();
		assert!(err.to_string().contains("A->B->C->A"));
	}

	#[test]
	fn multiple_cycles_are_deduplicated_and_sorted_shortest_first() {
		let g = graph(&[("A", "B"), ("B", "A"), ("A", "C"), ("C", "D"), ("D", "A")]);
		match g.determine_build_order(&"A".to_string()) {
			Err(GraphError::CircularDependency { cycles }) => {
				assert_eq!(cycles, vec!["A->B->A".to_string(), "A->C->D->A".to_string()]);
			},
			other => panic!("expected a circular dependency, got {:?}", other),
		}
	}

	#[test]
	fn cycle_below_the_root_reports_the_participants() {
		let g = graph(&[("Top", "Lib"), ("Lib", "Core"), ("Core", "Lib")]);
		match g.determine_build_order(&"Top".to_string()) {
			Err(GraphError::CircularDependencyInDependency { package, participants }) => {
				assert_eq!(package, "Top");
				assert_eq!(participants, vec!["Core".to_string(), "Lib".to_string()]);
			},
			other => panic!("expected the softer cycle error, got {:?}", other),
		}
	}

	#[test]
	fn acyclic_side_branches_are_stripped_before_diagnosis() {
		/* Leaf hangs off the cycle; it must not appear in any trace. */
		let g = graph(&[("A", "B"), ("B", "A"), ("B", "Leaf")]);
		match g.determine_build_order(&"A".to_string()) {
			Err(GraphError::CircularDependency { cycles }) => {
				assert!(cycles.iter().all(|c| !c.contains("Leaf")));
			},
			other => panic!("expected a circular dependency, got {:?}", other),
		}
	}

	#[test]
	fn draining_an_empty_graph_yields_an_empty_order() {
		let g = DependencyGraph::<String>::new();
		assert!(g.determine_build_order(&"Root".to_string()).unwrap().is_empty());
	}

	#[test]
	fn removing_sourceless_nodes_detaches_their_edges() {
		let mut g = graph(&[("A", "B"), ("B", "C")]);
		let removed = g.remove_nodes_with_no_incoming_dependencies();
		assert_eq!(removed, vec!["A".to_string()]);
		assert_eq!(g.node_count(), 2);
		assert_eq!(g.remove_nodes_with_no_incoming_dependencies(), vec!["B".to_string()]);
	}

	#[test]
	fn removing_sinkless_nodes_is_symmetric() {
		let mut g = graph(&[("A", "B"), ("B", "C")]);
		assert_eq!(g.remove_nodes_with_no_outgoing_dependencies(), vec!["C".to_string()]);
	}
}

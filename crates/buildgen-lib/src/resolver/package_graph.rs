//! Diagnostic overlay graph over the resolved templates and instances.
//!
//! Built only after the build order has succeeded; never participates in
//! cycle detection. It exists to answer "why does A depend on B" queries and
//! to drive graph-visualization exports.

use std::collections::HashMap;

use petgraph::dot::Dot;
use petgraph::prelude::*;
use serde::Serialize;

use crate::package::FlavorSelections;
use crate::package::PackageBaseName;
use crate::package::PackageInstanceName;
use super::Resolution;

/// A node wraps either a template or a concrete instance.
#[derive(Debug, Clone, Serialize)]
pub enum PackageGraphNode {
	Template { name: PackageBaseName },
	Instance { name: PackageInstanceName, supported: bool },
}

impl PackageGraphNode {
	/// Templates and instances may share a display name (a flavorless
	/// instance is named like its template), so the node key carries the
	/// kind.
	fn key(&self) -> String {
		match self {
			PackageGraphNode::Template { name } => format!("template:{}", name),
			PackageGraphNode::Instance { name, .. } => format!("instance:{}", name),
		}
	}

	pub fn display_name(&self) -> &str {
		match self {
			PackageGraphNode::Template { name } => name.value(),
			PackageGraphNode::Instance { name, .. } => name.value(),
		}
	}
}

impl std::fmt::Display for PackageGraphNode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			PackageGraphNode::Template { name } => write!(f, "{} [template]", name),
			PackageGraphNode::Instance { name, supported: true } => write!(f, "{}", name),
			PackageGraphNode::Instance { name, supported: false } => write!(f, "{} [unsupported]", name),
		}
	}
}

/// What an overlay edge means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeKind {
	/// Instance depends on instance; these mirror the build-order edges.
	Normal,
	/// Instance to the template it was materialized from.
	InstanceTemplate,
	/// Template depends on template unconditionally.
	Template,
	/// Template depends on template through one specific flavor option.
	TemplateFlavor,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageGraphEdge {
	pub kind: EdgeKind,
	/// For [`EdgeKind::TemplateFlavor`], the parent-side binding that
	/// activates the edge.
	pub selections: Option<FlavorSelections>,
	pub description: Option<String>,
}

impl std::fmt::Display for PackageGraphEdge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.kind {
			EdgeKind::Normal => f.write_str("depends")?,
			EdgeKind::InstanceTemplate => f.write_str("instance of")?,
			EdgeKind::Template => f.write_str("template depends")?,
			EdgeKind::TemplateFlavor => f.write_str("flavor depends")?,
		}
		if let Some(selections) = &self.selections {
			write!(f, " [{}]", selections)?;
		}
		if let Some(description) = &self.description {
			write!(f, " ({})", description)?;
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPackageGraph {
	graph: StableDiGraph<PackageGraphNode, PackageGraphEdge>,
	indices: HashMap<String, NodeIndex>,
}

impl ResolvedPackageGraph {
	pub(super) fn build(resolution: &Resolution) -> Self {
		let mut out = ResolvedPackageGraph { graph: StableDiGraph::default(), indices: HashMap::new() };

		for template in resolution.templates() {
			out.add_node(PackageGraphNode::Template { name: template.name().clone() });
		}
		for instance in resolution.instances() {
			out.add_node(PackageGraphNode::Instance {
				name: instance.name().clone(),
				supported: instance.is_supported(),
			});
		}

		for instance in resolution.instances() {
			let from = out.index(&format!("instance:{}", instance.name()));

			for dependency in instance.dependencies() {
				let to = out.index(&format!("instance:{}", resolution.instance(*dependency).name()));
				out.graph.add_edge(from, to, PackageGraphEdge {
					kind: EdgeKind::Normal,
					selections: None,
					description: None,
				});
			}

			let template = resolution.template(instance.template());
			let to = out.index(&format!("template:{}", template.name()));
			out.graph.add_edge(from, to, PackageGraphEdge {
				kind: EdgeKind::InstanceTemplate,
				selections: None,
				description: None,
			});
		}

		for template in resolution.templates() {
			let from = out.index(&format!("template:{}", template.name()));
			for dependency in template.dependencies() {
				let to = out.index(&format!("template:{}", resolution.template(dependency.target).name()));
				let kind = if dependency.active_when.is_empty() { EdgeKind::Template } else { EdgeKind::TemplateFlavor };
				let description = if dependency.target_selections.is_empty() {
					None
				} else {
					Some(format!("pins {}", dependency.target_selections))
				};
				out.graph.add_edge(from, to, PackageGraphEdge {
					kind,
					selections: if dependency.active_when.is_empty() { None } else { Some(dependency.active_when.clone()) },
					description,
				});
			}
		}

		out
	}

	fn add_node(&mut self, node: PackageGraphNode) {
		let key = node.key();
		let index = self.graph.add_node(node);
		self.indices.insert(key, index);
	}

	fn index(&self, key: &str) -> NodeIndex {
		*self.indices.get(key).expect("overlay nodes were all added before the edges")
	}

	pub fn node_count(&self) -> usize { self.graph.node_count() }
	pub fn edge_count(&self) -> usize { self.graph.edge_count() }

	/// Every edge record leading from `from` to `to`, matching either the
	/// template or the instance carrying each name. Empty when the two are
	/// unrelated.
	pub fn explain(&self, from: &str, to: &str) -> Vec<&PackageGraphEdge> {
		let matching = |name: &str| {
			self.graph.node_indices()
				.filter(|i| self.graph[*i].display_name() == name)
				.collect::<Vec<_>>()
		};

		let to_nodes = matching(to);
		let mut edges = Vec::new();
		for a in matching(from) {
			for edge in self.graph.edges_directed(a, Outgoing) {
				if to_nodes.contains(&edge.target()) {
					edges.push(edge.weight());
				}
			}
		}
		edges
	}

	/// GraphViz export for `--graph`-style visualization.
	pub fn dot(&self) -> String {
		format!("{}", Dot::new(&self.graph))
	}

	/// JSON export for external visualization tooling.
	///
	/// # Errors
	/// Serialization problems only; the overlay itself is always exportable.
	pub fn to_json(&self) -> crate::Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}

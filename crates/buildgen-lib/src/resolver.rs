//! Turns a sealed package universe into a deterministic build order.
//!
//! # Usage
//! 1. Build and seal a [`PackageUniverse`].
//! 1. Collect the raw `name=value` constraint pairs from CLI flags or
//! platform defaults.
//! 1. Call [`resolve()`] with the universe, the requested root packages, the
//! constraints and a [`ResolveOptions`].
//! 1. Walk [`Resolution::build_order()`] to emit build files; dependencies
//! always precede their dependents.
//! 1. Ask [`Resolution::package_graph()`] for the diagnostic overlay when a
//! `--graph`-style export or a "why does A depend on B" answer is needed.

use std::collections::HashMap;

use serde::{Serialize, Deserialize};

use crate::constraint::ExternalFlavorConstraints;
use crate::package::PackageBaseName;
use crate::universe::PackageUniverse;

pub mod dependency_graph;
pub use dependency_graph::DependencyGraph;
pub use dependency_graph::GraphItem;
pub use dependency_graph::GraphError;

pub mod template;
pub use template::TemplateId;
pub use template::ResolvedPackageTemplate;
pub use template::TemplateDependency;

pub mod instance;
pub use instance::InstanceId;
pub use instance::ResolvedPackageInstance;

pub mod expansion;
pub use expansion::ExpandError;

pub mod package_graph;
pub use package_graph::ResolvedPackageGraph;
pub use package_graph::EdgeKind;

/// Caller switches mirrored from the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveOptions {
	include_unsupported: bool,
	allow_all_flavors: bool,
}

impl ResolveOptions {
	/// Keep platform-unsupported instances in the build order instead of
	/// filtering them.
	pub fn include_unsupported(&self) -> bool {
		self.include_unsupported
	}
	pub fn set_include_unsupported(&mut self, include_unsupported: bool) {
		self.include_unsupported = include_unsupported;
	}

	/// The flavor wildcard: every unconstrained flavor axis fans out over all
	/// of its options instead of falling back to its default.
	pub fn allow_all_flavors(&self) -> bool {
		self.allow_all_flavors
	}
	pub fn set_allow_all_flavors(&mut self, allow_all_flavors: bool) {
		self.allow_all_flavors = allow_all_flavors;
	}
}

/// The product of one resolution pass.
///
/// Owns the template and instance arenas; everything else refers into them by
/// id. A single designated root is excluded from the build order but remains
/// available here for callers that need it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
	templates: Vec<ResolvedPackageTemplate>,
	instances: Vec<ResolvedPackageInstance>,
	roots: Vec<InstanceId>,
	build_order: Vec<InstanceId>,
	constraints: ExternalFlavorConstraints,
}

impl Resolution {
	pub fn templates(&self) -> &[ResolvedPackageTemplate] { &self.templates }
	pub fn instances(&self) -> &[ResolvedPackageInstance] { &self.instances }
	pub fn constraints(&self) -> &ExternalFlavorConstraints { &self.constraints }

	pub fn template(&self, id: TemplateId) -> &ResolvedPackageTemplate {
		&self.templates[id.index()]
	}

	pub fn instance(&self, id: InstanceId) -> &ResolvedPackageInstance {
		&self.instances[id.index()]
	}

	/// The instances materialized for the requested root packages.
	pub fn root_instances(&self) -> impl Iterator<Item = &ResolvedPackageInstance> {
		self.roots.iter().map(|id| &self.instances[id.index()])
	}

	/// Dependencies before dependents. A single designated root is excluded
	/// from its own order; several requested roots stay in the order so they
	/// sequence among themselves.
	pub fn build_order(&self) -> impl Iterator<Item = &ResolvedPackageInstance> {
		self.build_order.iter().map(|id| &self.instances[id.index()])
	}

	pub fn build_order_ids(&self) -> &[InstanceId] { &self.build_order }

	pub fn instance_named(&self, name: &str) -> Option<&ResolvedPackageInstance> {
		self.instances.iter().find(|i| i.name().value() == name)
	}

	/// Builds the diagnostic overlay graph for visualization and
	/// "why does A depend on B" queries.
	pub fn package_graph(&self) -> ResolvedPackageGraph {
		ResolvedPackageGraph::build(self)
	}
}

/// Runs the whole pipeline: constraint resolution, template expansion, graph
/// construction and the build-order drain.
///
/// # Errors
/// - [`Validation`](crate::Error::Validation) when the universe is unsealed
///   or `roots` is empty.
/// - Constraint errors from [`ExternalFlavorConstraints::resolve()`].
/// - [`ExpandError`] for unknown roots.
/// - [`GraphError`] when the expanded instances depend on each other in a
///   cycle.
pub fn resolve<'a>(
	universe: &PackageUniverse,
	roots: &[PackageBaseName],
	raw_constraints: impl IntoIterator<Item = (&'a str, &'a str)>,
	options: &ResolveOptions,
) -> crate::Result<Resolution> {
	if !universe.is_sealed() {
		return Err(crate::Error::Validation("universe must be sealed before resolving".into()));
	}
	if roots.is_empty() {
		return Err(crate::Error::Validation("no root packages requested".into()));
	}

	let constraints = ExternalFlavorConstraints::resolve(universe, raw_constraints)?;

	let mut expander = expansion::Expander::new(universe, &constraints, options);
	let root_ids = expander.expand_roots(roots)?;
	let (templates, instances) = expander.into_parts();

	let mut graph = DependencyGraph::<String>::new();
	for instance in &instances {
		graph.add_node(instance.name().value().to_owned());
		for dependency in instance.dependencies() {
			graph.add_edge(
				&instance.name().value().to_owned(),
				&instances[dependency.index()].name().value().to_owned(),
			)?;
		}
	}

	/* A single root is its own designated graph root; several roots (or a
	   fanned-out root) hang off a synthetic aggregate so they still order
	   among themselves. Instance names are valid identifiers, so the empty
	   string can never collide. */
	let root_name = if root_ids.len() == 1 {
		instances[root_ids[0].index()].name().value().to_owned()
	} else {
		let aggregate = String::new();
		for id in &root_ids {
			graph.add_edge(&aggregate, &instances[id.index()].name().value().to_owned())?;
		}
		aggregate
	};

	let ordered = graph.determine_build_order(&root_name)?;

	let ids_by_name: HashMap<&str, InstanceId> = instances.iter()
		.map(|i| (i.name().value(), i.id()))
		.collect();

	let mut build_order = Vec::with_capacity(ordered.len());
	for name in &ordered {
		let id = ids_by_name[name.as_str()];
		let instance = &instances[id.index()];
		if !instance.is_supported() && !options.include_unsupported() {
			log::info!("excluding unsupported package `{}` from the build order", instance.name());
			continue;
		}
		build_order.push(id);
	}

	log::debug!("resolved {} instances, {} in the build order", instances.len(), build_order.len());

	Ok(Resolution { templates, instances, roots: root_ids, build_order, constraints })
}

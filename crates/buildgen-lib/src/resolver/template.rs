//! Package templates after dependency-shape resolution, before flavor
//! binding.
//!
//! Templates and instances live in flat arena tables owned by the
//! [`Resolution`](crate::resolver::Resolution); edges between them are small
//! integer ids into those tables, never references, so the whole structure is
//! trivially serializable.

use std::collections::HashMap;

use serde::{Serialize, Deserialize};

use crate::package::EvaluationPackage;
use crate::package::FlavorExtension;
use crate::package::FlavorName;
use crate::package::FlavorSelection;
use crate::package::FlavorSelections;
use crate::package::PackageBaseName;
use crate::package::PackageFlavor;
use crate::package::PackageKind;
use crate::package::AxisKind;

/// Index of a template in the resolution's template table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(usize);

impl TemplateId {
	pub(crate) fn new(index: usize) -> Self { TemplateId(index) }
	pub fn index(self) -> usize { self.0 }
}

/// One lowered dependency edge of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDependency {
	/// The template depended on.
	pub target: TemplateId,
	/// Parent-side activation: the edge participates in an instance only when
	/// these bindings are part of the instance's selections. Empty means
	/// always active; a dependency declared inside a flavor option carries
	/// that option here.
	pub active_when: FlavorSelections,
	/// Selections imposed on the target, from the declaration's flavor
	/// branch. Empty means the target binds by constraints and defaults.
	pub target_selections: FlavorSelections,
}

/// A package template: the shape shared by all instances of one declared
/// package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPackageTemplate {
	id: TemplateId,
	name: PackageBaseName,
	kind: PackageKind,
	flavors: Vec<PackageFlavor>,
	extensions: Vec<FlavorExtension>,
	dependencies: Vec<TemplateDependency>,
	/// The distinct selection-set recipes actually materialized for this
	/// template, in materialization order.
	instance_configs: Vec<FlavorSelections>,
}

impl ResolvedPackageTemplate {
	/// Lowers a sealed package into template form: the per-option dependency
	/// lists flatten into one edge list with parent-side activation
	/// selections attached.
	pub(crate) fn lower(id: TemplateId, package: &EvaluationPackage, ids: &HashMap<PackageBaseName, TemplateId>) -> Self {
		let target_id = |name: &PackageBaseName| {
			*ids.get(name).expect("sealed universe has no dangling dependency targets")
		};

		let mut dependencies = Vec::new();
		for declaration in package.dependencies() {
			dependencies.push(TemplateDependency {
				target: target_id(&declaration.target),
				active_when: FlavorSelections::empty(),
				target_selections: declaration.flavor_info.clone().unwrap_or_default(),
			});
		}
		for flavor in package.flavors() {
			for option in &flavor.options {
				let branch = FlavorSelections::empty()
					.with(FlavorSelection::new(flavor.name.clone(), option.name.clone()));
				for declaration in &option.dependencies {
					dependencies.push(TemplateDependency {
						target: target_id(&declaration.target),
						active_when: branch.clone(),
						target_selections: declaration.flavor_info.clone().unwrap_or_default(),
					});
				}
			}
		}

		ResolvedPackageTemplate {
			id,
			name: package.name().clone(),
			kind: package.kind(),
			flavors: package.flavors().to_vec(),
			extensions: package.extensions().to_vec(),
			dependencies,
			instance_configs: Vec::new(),
		}
	}

	pub fn id(&self) -> TemplateId { self.id }
	pub fn name(&self) -> &PackageBaseName { &self.name }
	pub fn kind(&self) -> PackageKind { self.kind }
	pub fn dependencies(&self) -> &[TemplateDependency] { &self.dependencies }
	pub fn extensions(&self) -> &[FlavorExtension] { &self.extensions }
	pub fn instance_configs(&self) -> &[FlavorSelections] { &self.instance_configs }

	pub fn flavor(&self, name: &FlavorName) -> Option<&PackageFlavor> {
		self.flavors.iter().find(|f| &f.name == name)
	}

	/// Instance-multiplying axes, in declaration order.
	pub fn flavor_axes(&self) -> impl Iterator<Item = &PackageFlavor> {
		self.flavors.iter().filter(|f| f.axis == AxisKind::Flavor)
	}

	/// Settings-only axes, in declaration order.
	pub fn variant_axes(&self) -> impl Iterator<Item = &PackageFlavor> {
		self.flavors.iter().filter(|f| f.axis == AxisKind::Variant)
	}

	/// The canonical flavor order instance names encode with.
	pub fn flavor_order(&self) -> Vec<FlavorName> {
		self.flavor_axes().map(|f| f.name.clone()).collect()
	}

	pub(crate) fn record_instance_config(&mut self, selections: &FlavorSelections) {
		if !self.instance_configs.contains(selections) {
			self.instance_configs.push(selections.clone());
		}
	}
}

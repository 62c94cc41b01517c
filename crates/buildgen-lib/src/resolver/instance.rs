//! Concrete, flavor-bound package instances.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::package::FlavorName;
use crate::package::FlavorOptionName;
use crate::package::FlavorSelections;
use crate::package::PackageInstanceName;
use super::template::TemplateId;

/// Index of an instance in the resolution's instance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(usize);

impl InstanceId {
	pub(crate) fn new(index: usize) -> Self { InstanceId(index) }
	pub fn index(self) -> usize { self.0 }
}

/// One concrete package: a template with every flavor axis bound.
///
/// Never mutated once expansion finishes; discarded with the rest of the
/// resolution once the build order and reports are produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPackageInstance {
	id: InstanceId,
	name: PackageInstanceName,
	template: TemplateId,
	selections: FlavorSelections,
	/// Resolved settings for the template's variant axes; variants never
	/// multiply instances.
	variant_settings: BTreeMap<FlavorName, FlavorOptionName>,
	dependencies: Vec<InstanceId>,
	supported: bool,
}

impl ResolvedPackageInstance {
	pub(crate) fn new(
		id: InstanceId,
		name: PackageInstanceName,
		template: TemplateId,
		selections: FlavorSelections,
		variant_settings: BTreeMap<FlavorName, FlavorOptionName>,
		supported: bool,
	) -> Self {
		ResolvedPackageInstance { id, name, template, selections, variant_settings, dependencies: Vec::new(), supported }
	}

	pub fn id(&self) -> InstanceId { self.id }
	pub fn name(&self) -> &PackageInstanceName { &self.name }
	pub fn template(&self) -> TemplateId { self.template }
	pub fn selections(&self) -> &FlavorSelections { &self.selections }
	pub fn dependencies(&self) -> &[InstanceId] { &self.dependencies }

	pub fn variant_settings(&self) -> &BTreeMap<FlavorName, FlavorOptionName> {
		&self.variant_settings
	}

	/// False when any bound flavor option, or any flavor-extension option
	/// inherited through the instance's wiring, is marked unsupported on the
	/// active platform.
	pub fn is_supported(&self) -> bool { self.supported }

	pub(crate) fn mark_unsupported(&mut self) {
		self.supported = false;
	}

	pub(crate) fn add_dependency(&mut self, dependency: InstanceId) {
		if !self.dependencies.contains(&dependency) {
			self.dependencies.push(dependency);
		}
	}
}

//! Flavor and variant axis declarations.

use serde::{Serialize, Deserialize};

use super::DependencyDeclaration;
use super::FlavorName;
use super::FlavorOptionName;

/// Whether an axis multiplies instances or only carries settings.
///
/// A `Flavor` axis produces one instance per bound option; a `Variant` axis
/// resolves through the same constraint machinery but every instance of the
/// owning template shares one binding, recorded in its settings map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisKind {
	#[default] Flavor,
	Variant,
}

/// One concrete choice for a flavor, with the extra dependencies that choice
/// drags in and whether the active platform can build it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorOption {
	pub name: FlavorOptionName,
	pub supported: bool,
	pub dependencies: Vec<DependencyDeclaration>,
}

impl FlavorOption {
	pub fn new(name: FlavorOptionName) -> Self {
		FlavorOption { name, supported: true, dependencies: Vec::new() }
	}

	pub fn unsupported(name: FlavorOptionName) -> Self {
		FlavorOption { name, supported: false, dependencies: Vec::new() }
	}

	pub fn with_dependency(mut self, dependency: DependencyDeclaration) -> Self {
		self.dependencies.push(dependency);
		self
	}
}

/// A flavor or variant axis declared by a package.
///
/// The first declared option is the axis default. A `singleton` flavor is one
/// the declaring template expects to bind alone; its instances drop the
/// encoded suffix and reuse the base name as long as that stays unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFlavor {
	pub name: FlavorName,
	pub axis: AxisKind,
	/// Short alias usable in constraint strings while unambiguous.
	pub quick_name: Option<String>,
	pub options: Vec<FlavorOption>,
	pub singleton: bool,
}

impl PackageFlavor {
	pub fn new(name: FlavorName, options: Vec<FlavorOption>) -> Self {
		PackageFlavor { name, axis: AxisKind::Flavor, quick_name: None, options, singleton: false }
	}

	pub fn variant(name: FlavorName, options: Vec<FlavorOption>) -> Self {
		PackageFlavor { name, axis: AxisKind::Variant, quick_name: None, options, singleton: false }
	}

	pub fn with_quick_name(mut self, quick_name: impl Into<String>) -> Self {
		self.quick_name = Some(quick_name.into());
		self
	}

	pub fn as_singleton(mut self) -> Self {
		self.singleton = true;
		self
	}

	/// The option used when neither a constraint nor a dependency edge pins
	/// this axis. Sealing guarantees at least one option exists.
	pub fn default_option(&self) -> &FlavorOption {
		self.options.first().expect("sealed flavor has at least one option")
	}

	pub fn option(&self, name: &FlavorOptionName) -> Option<&FlavorOption> {
		self.options.iter().find(|o| &o.name == name)
	}

	pub fn option_names(&self) -> Vec<String> {
		self.options.iter().map(|o| o.name.value().to_owned()).collect()
	}
}

/// A package's additions to a flavor declared by one of its direct
/// dependencies.
///
/// Each listed option must already exist on the extended flavor; the listed
/// dependencies and supported flags apply to the *extending* package whenever
/// the dependency instance it is wired to binds that option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorExtension {
	pub flavor: FlavorName,
	pub options: Vec<FlavorOption>,
}

impl FlavorExtension {
	pub fn new(flavor: FlavorName, options: Vec<FlavorOption>) -> Self {
		FlavorExtension { flavor, options }
	}

	pub fn option(&self, name: &FlavorOptionName) -> Option<&FlavorOption> {
		self.options.iter().find(|o| &o.name == name)
	}
}

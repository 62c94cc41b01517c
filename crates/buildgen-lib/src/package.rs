//! Various types associated with packages and their flavor/variant axes.
//!
//! A package enters the engine as an [`EvaluationPackage`]: a mutable record
//! built once per declared package and then sealed. Sealing runs the shape
//! checks (self dependencies, duplicate dependency records) and freezes the
//! record so the resolver can treat it as a template.

use serde::{Serialize, Deserialize};

mod name;
pub use name::PackageBaseName;
pub use name::FlavorName;
pub use name::FlavorOptionName;

mod selection;
pub use selection::FlavorSelection;
pub use selection::FlavorSelections;
pub use selection::PackageInstanceName;

mod flavor;
pub use flavor::AxisKind;
pub use flavor::FlavorOption;
pub use flavor::PackageFlavor;
pub use flavor::FlavorExtension;

pub mod evaluation;
pub use evaluation::EvaluationPackage;
pub use evaluation::SealError;

/// What the surrounding generator builds out of a package.
///
/// The engine itself only stores and reports the kind; emitters downstream
/// branch on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageKind {
	#[default] Library,
	Executable,
	HeaderOnly,
	External,
}

/// A single declared dependency edge.
///
/// `flavor_info` carries selections imposed on the *target*: two records
/// naming the same target are legal only when every one of them names a
/// different flavor-option branch of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
	pub target: PackageBaseName,
	pub flavor_info: Option<FlavorSelections>,
}

impl DependencyDeclaration {
	pub fn new(target: PackageBaseName) -> Self {
		DependencyDeclaration { target, flavor_info: None }
	}

	pub fn with_flavor_info(target: PackageBaseName, flavor_info: FlavorSelections) -> Self {
		DependencyDeclaration { target, flavor_info: Some(flavor_info) }
	}
}

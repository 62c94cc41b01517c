//! The under-construction package record and its sealing checks.

use serde::{Serialize, Deserialize};

use super::DependencyDeclaration;
use super::FlavorExtension;
use super::FlavorName;
use super::PackageBaseName;
use super::PackageFlavor;
use super::PackageKind;

/// Shape errors raised when a package is sealed.
///
/// These are user-input errors in the package declarations, caught as early
/// as possible and independent of whether the offending package ends up in
/// any build.
#[derive(Debug, thiserror::Error)]
pub enum SealError {
	#[error("package `{package}` depends on itself")]
	SelfDependency { package: PackageBaseName },
	#[error("package `{package}` declares two dependencies on `{target}` not distinguished by flavor branches")]
	DuplicateDependency { package: PackageBaseName, target: PackageBaseName },
	#[error("package `{package}` declares flavor `{flavor}` more than once")]
	DuplicateFlavor { package: PackageBaseName, flavor: String },
	#[error("flavor `{flavor}` of package `{package}` declares no options")]
	EmptyFlavor { package: PackageBaseName, flavor: String },
	#[error("package `{package}` extends its own flavor `{flavor}`")]
	ExtensionOfOwnFlavor { package: PackageBaseName, flavor: String },
	#[error("package `{package}` extends flavor `{flavor}` of `{owner}` which is not among its direct dependencies")]
	ExtensionOutsideDependencies { package: PackageBaseName, flavor: String, owner: PackageBaseName },
	#[error("extension of flavor `{flavor}` by package `{package}` introduces unknown option `{option}`; declared options are {valid:?}")]
	ExtensionIntroducesOption { package: PackageBaseName, flavor: String, option: String, valid: Vec<String> },
	#[error("package `{package}` is sealed and can no longer be modified")]
	Sealed { package: PackageBaseName },
}

/// A declared package while still under construction.
///
/// Constructed once per declared package, populated by the loader, then
/// sealed. [`EvaluationPackage::seal()`] is the transition from "under
/// construction" to "usable by the resolver": it runs the local shape checks
/// and forbids further mutation. The cross-package checks (dependency targets
/// exist, flavor extensions reference real flavors of real dependencies) run
/// when the whole universe seals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationPackage {
	name: PackageBaseName,
	kind: PackageKind,
	dependencies: Vec<DependencyDeclaration>,
	flavors: Vec<PackageFlavor>,
	extensions: Vec<FlavorExtension>,
	sealed: bool,
}

impl EvaluationPackage {
	pub fn new(name: PackageBaseName, kind: PackageKind) -> Self {
		EvaluationPackage {
			name,
			kind,
			dependencies: Vec::new(),
			flavors: Vec::new(),
			extensions: Vec::new(),
			sealed: false,
		}
	}

	pub fn name(&self) -> &PackageBaseName { &self.name }
	pub fn kind(&self) -> PackageKind { self.kind }
	pub fn is_sealed(&self) -> bool { self.sealed }

	/// Package-level dependencies, active under every flavor binding.
	pub fn dependencies(&self) -> &[DependencyDeclaration] { &self.dependencies }
	pub fn flavors(&self) -> &[PackageFlavor] { &self.flavors }
	pub fn extensions(&self) -> &[FlavorExtension] { &self.extensions }

	pub fn flavor(&self, name: &FlavorName) -> Option<&PackageFlavor> {
		self.flavors.iter().find(|f| &f.name == name)
	}

	fn check_mutable(&self) -> crate::Result<()> {
		if self.sealed {
			Err(SealError::Sealed { package: self.name.clone() }.into())
		} else {
			Ok(())
		}
	}

	/// # Errors
	/// Fails when the package is already sealed.
	pub fn add_dependency(&mut self, dependency: DependencyDeclaration) -> crate::Result<()> {
		self.check_mutable()?;
		self.dependencies.push(dependency);
		Ok(())
	}

	/// # Errors
	/// Fails when the package is already sealed.
	pub fn add_flavor(&mut self, flavor: PackageFlavor) -> crate::Result<()> {
		self.check_mutable()?;
		self.flavors.push(flavor);
		Ok(())
	}

	/// # Errors
	/// Fails when the package is already sealed.
	pub fn add_flavor_extension(&mut self, extension: FlavorExtension) -> crate::Result<()> {
		self.check_mutable()?;
		self.extensions.push(extension);
		Ok(())
	}

	/// Every dependency record the package declares, including the ones
	/// attached to flavor options, paired with the option branch that
	/// activates them.
	pub fn all_dependencies(&self) -> impl Iterator<Item = &DependencyDeclaration> {
		self.dependencies.iter()
			.chain(self.flavors.iter().flat_map(|f| f.options.iter().flat_map(|o| o.dependencies.iter())))
			.chain(self.extensions.iter().flat_map(|e| e.options.iter().flat_map(|o| o.dependencies.iter())))
	}

	/// Runs the local shape checks and freezes the package.
	///
	/// Sealing an already sealed package is a no-op. Every problem found in
	/// the pass is reported, not just the first one.
	///
	/// # Errors
	/// A [`Grouped`](crate::Error::Grouped) error containing one
	/// [`SealError`] per problem:
	/// - a dependency on the package itself, in any branch;
	/// - two records naming the same target in one dependency list, unless
	///   all colliding records carry distinct flavor branches;
	/// - a flavor declared twice, or declared with no options;
	/// - an extension of the package's own flavor.
	pub fn seal(&mut self) -> crate::Result<()> {
		if self.sealed {
			return Ok(());
		}

		let mut errors = Vec::<crate::Error>::new();

		if self.all_dependencies().any(|d| d.target == self.name) {
			errors.push(SealError::SelfDependency { package: self.name.clone() }.into());
		}

		check_duplicates(&self.name, &self.dependencies, &mut errors);
		for flavor in &self.flavors {
			for option in &flavor.options {
				check_duplicates(&self.name, &option.dependencies, &mut errors);
			}
		}

		for (i, flavor) in self.flavors.iter().enumerate() {
			if flavor.options.is_empty() {
				errors.push(SealError::EmptyFlavor { package: self.name.clone(), flavor: flavor.name.fully_qualified() }.into());
			}
			if self.flavors[..i].iter().any(|f| f.name == flavor.name) {
				errors.push(SealError::DuplicateFlavor { package: self.name.clone(), flavor: flavor.name.fully_qualified() }.into());
			}
		}

		for extension in &self.extensions {
			if extension.flavor.owner() == &self.name {
				errors.push(SealError::ExtensionOfOwnFlavor { package: self.name.clone(), flavor: extension.flavor.fully_qualified() }.into());
			}
		}

		if errors.is_empty() {
			self.sealed = true;
			Ok(())
		} else {
			Err(crate::Error::Grouped(errors))
		}
	}
}

/// Flags every colliding pair in one dependency list.
///
/// Records naming the same target are legal only when all of them carry a
/// flavor branch and no two branches are equal.
fn check_duplicates(package: &PackageBaseName, dependencies: &[DependencyDeclaration], errors: &mut Vec<crate::Error>) {
	for (i, a) in dependencies.iter().enumerate() {
		for b in &dependencies[i + 1..] {
			if a.target != b.target {
				continue;
			}
			let distinguished = match (&a.flavor_info, &b.flavor_info) {
				(Some(fa), Some(fb)) => fa != fb,
				_ => false,
			};
			if !distinguished {
				errors.push(SealError::DuplicateDependency { package: package.clone(), target: a.target.clone() }.into());
			}
		}
	}
}

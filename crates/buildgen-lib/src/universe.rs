//! The in-memory package universe handed to the resolver.
//!
//! The out-of-scope loader parses whatever declaration format the tool uses
//! and populates a [`PackageUniverse`] with one [`EvaluationPackage`] per
//! declared package. [`PackageUniverse::seal()`] then runs the one-time
//! validation pass over every package; only a sealed universe can be
//! resolved.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::package::EvaluationPackage;
use crate::package::PackageBaseName;
use crate::package::SealError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageUniverse {
	/* BTreeMap so every walk over the universe is name-ordered and resolves deterministically. */
	packages: BTreeMap<PackageBaseName, EvaluationPackage>,
	sealed: bool,
}

impl PackageUniverse {
	pub fn new() -> Self { Self::default() }

	pub fn is_sealed(&self) -> bool { self.sealed }
	pub fn len(&self) -> usize { self.packages.len() }
	pub fn is_empty(&self) -> bool { self.packages.is_empty() }

	pub fn get(&self, name: &PackageBaseName) -> Option<&EvaluationPackage> {
		self.packages.get(name)
	}

	pub fn packages(&self) -> impl Iterator<Item = &EvaluationPackage> {
		self.packages.values()
	}

	/// # Errors
	/// - [`AlreadyExists`](crate::Error::AlreadyExists) when a package with
	///   the same base name was added before.
	/// - [`Validation`](crate::Error::Validation) when the universe is
	///   already sealed.
	pub fn add_package(&mut self, package: EvaluationPackage) -> crate::Result<()> {
		if self.sealed {
			return Err(crate::Error::Validation("universe is sealed".into()));
		}
		if self.packages.contains_key(package.name()) {
			return Err(crate::Error::AlreadyExists(package.name().value().into()));
		}
		self.packages.insert(package.name().clone(), package);
		Ok(())
	}

	/// Seals every package and runs the cross-package shape checks.
	///
	/// All problems found in the pass are reported together in one
	/// [`Grouped`](crate::Error::Grouped) error so a user sees every issue in
	/// one run. The cross-package checks are the ones a single package cannot
	/// perform on itself:
	/// - every dependency target names a declared package;
	/// - every dependency flavor branch references a flavor axis the target
	///   actually declares, with a valid option;
	/// - every flavor extension names a flavor of a direct dependency and
	///   introduces no option absent from it.
	pub fn seal(&mut self) -> crate::Result<()> {
		if self.sealed {
			return Ok(());
		}

		let mut errors = Vec::<crate::Error>::new();

		for package in self.packages.values_mut() {
			if let Err(e) = package.seal() {
				match e {
					crate::Error::Grouped(group) => errors.extend(group),
					other => errors.push(other),
				}
			}
		}

		for package in self.packages.values() {
			self.check_dependency_targets(package, &mut errors);
			self.check_extensions(package, &mut errors);
		}

		if errors.is_empty() {
			self.sealed = true;
			Ok(())
		} else {
			Err(crate::Error::Grouped(errors))
		}
	}

	fn check_dependency_targets(&self, package: &EvaluationPackage, errors: &mut Vec<crate::Error>) {
		for dependency in package.all_dependencies() {
			let target = match self.packages.get(&dependency.target) {
				Some(t) => t,
				None => {
					errors.push(crate::Error::Validation(format!(
						"package `{}` depends on `{}` which is not declared",
						package.name(), dependency.target
					)));
					continue;
				},
			};

			if let Some(flavor_info) = &dependency.flavor_info {
				for selection in flavor_info.iter() {
					match target.flavor(selection.flavor()) {
						None => errors.push(crate::Error::Validation(format!(
							"package `{}` pins flavor `{}` which `{}` does not declare",
							package.name(), selection.flavor(), target.name()
						))),
						Some(flavor) if flavor.option(selection.option()).is_none() => {
							errors.push(crate::Error::Validation(format!(
								"package `{}` pins flavor `{}` to `{}` which is not one of its options {:?}",
								package.name(), selection.flavor(), selection.option(), flavor.option_names()
							)));
						},
						Some(_) => {},
					}
				}
			}
		}
	}

	fn check_extensions(&self, package: &EvaluationPackage, errors: &mut Vec<crate::Error>) {
		for extension in package.extensions() {
			let owner = extension.flavor.owner();
			if owner == package.name() {
				/* Already reported by the package's own seal. */
				continue;
			}

			let depends_on_owner = package.all_dependencies().any(|d| &d.target == owner);
			if !depends_on_owner {
				errors.push(SealError::ExtensionOutsideDependencies {
					package: package.name().clone(),
					flavor: extension.flavor.fully_qualified(),
					owner: owner.clone(),
				}.into());
				continue;
			}

			let declared = self.packages.get(owner).and_then(|p| p.flavor(&extension.flavor));
			let declared = match declared {
				Some(f) => f,
				None => {
					errors.push(crate::Error::Validation(format!(
						"package `{}` extends flavor `{}` which `{}` does not declare",
						package.name(), extension.flavor, owner
					)));
					continue;
				},
			};

			for option in &extension.options {
				if declared.option(&option.name).is_none() {
					errors.push(SealError::ExtensionIntroducesOption {
						package: package.name().clone(),
						flavor: extension.flavor.fully_qualified(),
						option: option.name.value().into(),
						valid: declared.option_names(),
					}.into());
				}
			}
		}
	}
}

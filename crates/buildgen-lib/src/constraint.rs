//! Resolution of raw `name=value` constraints onto declared flavors and
//! variants.
//!
//! The caller hands the engine the ordered `(name, value)` pairs it collected
//! from CLI flags and platform defaults. Each name is looked up first among
//! the fully qualified flavor names of the whole universe, then among the
//! quick names that remained unambiguous. Unknown names only warn so a build
//! can proceed on defaults; everything else that goes wrong here is a hard
//! user error.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::package::FlavorName;
use crate::package::FlavorOptionName;
use crate::package::PackageFlavor;
use crate::universe::PackageUniverse;

/// These errors halt constraint resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConstraintError {
	/// The name resolved to a flavor but the value is not one of its options.
	#[error("`{option}` is not a valid option of `{flavor}`; valid options are {valid:?}")]
	InvalidOption { flavor: String, option: String, valid: Vec<String> },
	/// The quick name is used by more than one package.
	#[error("quick name `{quick}` is ambiguous, use a fully qualified flavor name; candidates are {candidates:?}")]
	QuickNameCollision { quick: String, candidates: Vec<String> },
}

/// What a quick name resolves to once the whole universe has been scanned.
enum QuickEntry {
	Unique(FlavorName),
	/// Used by more than one package; not resolvable without the fully
	/// qualified form.
	Collision(Vec<FlavorName>),
}

/// The resolved, validated mapping from flavor/variant axes to the single
/// option the user or platform forced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFlavorConstraints {
	bindings: BTreeMap<FlavorName, FlavorOptionName>,
}

impl ExternalFlavorConstraints {
	pub fn empty() -> Self { Self::default() }

	pub fn is_empty(&self) -> bool { self.bindings.is_empty() }
	pub fn len(&self) -> usize { self.bindings.len() }

	pub fn option_for(&self, flavor: &FlavorName) -> Option<&FlavorOptionName> {
		self.bindings.get(flavor)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&FlavorName, &FlavorOptionName)> {
		self.bindings.iter()
	}

	/// Maps every raw constraint onto a declared flavor or variant axis.
	///
	/// - A name matching no axis at all warns and is dropped; the build
	///   proceeds on defaults.
	/// - A later constraint for the same axis overwrites an earlier one, with
	///   a warning.
	///
	/// # Errors
	/// [`ConstraintError`] wrapped in the crate error: an option value the
	/// axis does not declare, or a quick name shared between packages.
	pub fn resolve<'a>(universe: &PackageUniverse, raw: impl IntoIterator<Item = (&'a str, &'a str)>) -> crate::Result<Self> {
		let lookup = AxisLookup::new(universe);

		let mut bindings = BTreeMap::<FlavorName, FlavorOptionName>::new();
		for (name, value) in raw {
			let flavor_name = match lookup.resolve(name)? {
				Some(f) => f,
				None => {
					log::warn!("constraint `{}={}` does not name any declared flavor or variant, ignoring it", name, value);
					continue;
				},
			};

			let flavor = lookup.declaration(&flavor_name);
			let option = match flavor.options.iter().find(|o| o.name.value() == value) {
				Some(o) => o.name.clone(),
				None => return Err(ConstraintError::InvalidOption {
					flavor: flavor_name.fully_qualified(),
					option: value.to_owned(),
					valid: flavor.option_names(),
				}.into()),
			};

			if let Some(previous) = bindings.insert(flavor_name.clone(), option) {
				log::warn!("constraint for `{}` given more than once; `{}` overrides `{}`", flavor_name, value, previous);
			}
		}

		Ok(ExternalFlavorConstraints { bindings })
	}
}

/// Lookup table from fully qualified and quick names to flavor axes.
struct AxisLookup<'u> {
	fully_qualified: BTreeMap<String, FlavorName>,
	quick: BTreeMap<String, QuickEntry>,
	declarations: BTreeMap<FlavorName, &'u PackageFlavor>,
}

impl<'u> AxisLookup<'u> {
	fn new(universe: &'u PackageUniverse) -> Self {
		let mut fully_qualified = BTreeMap::new();
		let mut quick = BTreeMap::<String, QuickEntry>::new();
		let mut declarations = BTreeMap::new();

		for package in universe.packages() {
			for flavor in package.flavors() {
				fully_qualified.insert(flavor.name.fully_qualified(), flavor.name.clone());
				declarations.insert(flavor.name.clone(), flavor);

				if let Some(quick_name) = &flavor.quick_name {
					match quick.get_mut(quick_name) {
						None => { quick.insert(quick_name.clone(), QuickEntry::Unique(flavor.name.clone())); },
						Some(QuickEntry::Unique(existing)) => {
							let candidates = vec![existing.clone(), flavor.name.clone()];
							quick.insert(quick_name.clone(), QuickEntry::Collision(candidates));
						},
						Some(QuickEntry::Collision(candidates)) => candidates.push(flavor.name.clone()),
					}
				}
			}
		}

		/* Fully qualified names always win: a quick name shadowed by one is not usable as a quick name at all. */
		quick.retain(|name, _| !fully_qualified.contains_key(name));

		AxisLookup { fully_qualified, quick, declarations }
	}

	/// # Errors
	/// A [`QuickNameCollision`](ConstraintError::QuickNameCollision) listing
	/// every flavor sharing the quick name.
	fn resolve(&self, name: &str) -> crate::Result<Option<FlavorName>> {
		if let Some(f) = self.fully_qualified.get(name) {
			return Ok(Some(f.clone()));
		}
		match self.quick.get(name) {
			Some(QuickEntry::Unique(f)) => Ok(Some(f.clone())),
			Some(QuickEntry::Collision(candidates)) => {
				let mut candidates = candidates.iter().map(|c| c.fully_qualified()).collect::<Vec<_>>();
				candidates.sort();
				Err(ConstraintError::QuickNameCollision { quick: name.to_owned(), candidates }.into())
			},
			None => Ok(None),
		}
	}

	fn declaration(&self, name: &FlavorName) -> &'u PackageFlavor {
		self.declarations.get(name).expect("resolved flavor name came from this lookup")
	}
}

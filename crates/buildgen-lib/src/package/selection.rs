//! Flavor selections and the instance names derived from them.
//!
//! # Naming rules
//!
//! An instance name is a pure function of the base name and the selection
//! set. The selection set itself is order-independent (it is kept in a
//! canonical sort) but the *encoding* into a name follows the owning
//! template's flavor declaration order, so two callers that pick the same
//! options always get byte-identical names.

use serde::{Serialize, Deserialize};

use super::FlavorName;
use super::FlavorOptionName;
use super::PackageBaseName;

/// "This flavor is bound to this option."
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlavorSelection {
	flavor: FlavorName,
	option: FlavorOptionName,
}

impl FlavorSelection {
	pub fn new(flavor: FlavorName, option: FlavorOptionName) -> Self {
		FlavorSelection { flavor, option }
	}

	pub fn flavor(&self) -> &FlavorName { &self.flavor }
	pub fn option(&self) -> &FlavorOptionName { &self.option }
}

/// An ordered, duplicate-free set of [`FlavorSelection`].
///
/// At most one selection per flavor; inserting a second binding for the same
/// flavor replaces the first. The member list is kept sorted by flavor name
/// so that equality and hashing are order-independent. The empty set is the
/// distinguished "no flavor selected" value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlavorSelections(Vec<FlavorSelection>);

impl FlavorSelections {
	pub fn empty() -> Self { Self::default() }

	pub fn is_empty(&self) -> bool { self.0.is_empty() }
	pub fn len(&self) -> usize { self.0.len() }

	pub fn iter(&self) -> impl Iterator<Item = &FlavorSelection> {
		self.0.iter()
	}

	pub fn option_for(&self, flavor: &FlavorName) -> Option<&FlavorOptionName> {
		self.0.iter().find(|s| s.flavor() == flavor).map(|s| s.option())
	}

	pub fn insert(&mut self, selection: FlavorSelection) {
		if let Some(existing) = self.0.iter_mut().find(|s| s.flavor() == selection.flavor()) {
			*existing = selection;
		} else {
			self.0.push(selection);
			self.0.sort();
		}
	}

	pub fn with(mut self, selection: FlavorSelection) -> Self {
		self.insert(selection);
		self
	}

	/// True when every binding in `self` is also present in `other`.
	///
	/// The empty set is a subset of everything, which is what makes an
	/// unconditional dependency edge active under any binding.
	pub fn is_subset_of(&self, other: &FlavorSelections) -> bool {
		self.0.iter().all(|s| other.option_for(s.flavor()) == Some(s.option()))
	}

	/// Combines two selection sets; bindings in `other` win on conflict.
	pub fn merged_with(&self, other: &FlavorSelections) -> FlavorSelections {
		let mut out = self.clone();
		for s in other.iter() {
			out.insert(s.clone());
		}
		out
	}
}

impl FromIterator<FlavorSelection> for FlavorSelections {
	fn from_iter<I: IntoIterator<Item = FlavorSelection>>(iter: I) -> Self {
		let mut out = FlavorSelections::empty();
		for s in iter {
			out.insert(s);
		}
		out
	}
}

impl std::fmt::Display for FlavorSelections {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut first = true;
		for s in self.iter() {
			if !first { f.write_str(", ")?; }
			write!(f, "{}={}", s.flavor(), s.option())?;
			first = false;
		}
		Ok(())
	}
}

/// The unique, deterministic name of one concrete package instance.
///
/// `Base` when no flavor is selected, otherwise
/// `Base___option1__option2...` with the option names ordered by the owning
/// template's flavor declaration order. Two instances with an equal value are
/// interchangeable; the resolver never materializes two distinct instances
/// under the same value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageInstanceName(String);

const SELECTION_SEPARATOR: &str = "___";
const OPTION_SEPARATOR: &str = "__";

impl PackageInstanceName {
	/// The suffix-free name used for instances of flavorless templates and
	/// for "smart" named singleton-flavor instances.
	pub fn plain(base: &PackageBaseName) -> Self {
		PackageInstanceName(base.value().to_owned())
	}

	/// Encodes a name from `base` and `selections`.
	///
	/// `flavor_order` is the owning template's flavor declaration order and
	/// must cover every selected flavor.
	///
	/// # Panics
	/// Panics when a selection references a flavor outside `flavor_order`;
	/// that is a programming-contract violation, not a user error, and the
	/// public construction paths cannot produce it.
	pub fn encode(base: &PackageBaseName, selections: &FlavorSelections, flavor_order: &[FlavorName]) -> Self {
		if selections.is_empty() {
			return Self::plain(base);
		}

		for s in selections.iter() {
			assert!(flavor_order.contains(s.flavor()), "selection references flavor `{}` which the template does not declare", s.flavor());
		}

		let options = flavor_order.iter()
			.filter_map(|flavor| selections.option_for(flavor))
			.map(|o| o.value())
			.collect::<Vec<_>>()
			.join(OPTION_SEPARATOR);

		PackageInstanceName(format!("{}{}{}", base.value(), SELECTION_SEPARATOR, options))
	}

	pub fn value(&self) -> &str { &self.0 }
}

impl std::fmt::Display for PackageInstanceName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

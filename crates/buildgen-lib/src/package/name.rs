//! Validated identifier types.
//!
//! All comparisons are case-sensitive string comparisons; two names differing
//! only in case are different names. Validation happens once at construction
//! so the rest of the engine can pass these around without re-checking.

use serde::{Serialize, Deserialize};

fn validate_identifier(s: &str) -> crate::Result<()> {
	if s.is_empty() {
		return Err(crate::Error::Parse("identifier is empty".into()));
	}
	if let Some(c) = s.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '_')) {
		return Err(crate::Error::Parse(format!("identifier `{}` contains invalid character `{}`", s, c)));
	}
	Ok(())
}

/// The declared name of a package, before any flavor options are bound.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageBaseName(String);

impl PackageBaseName {
	/// # Errors
	/// Returns a [`Parse`](crate::Error::Parse) error when the input is empty
	/// or contains characters outside alphanumerics, `.` and `_`.
	pub fn new(s: impl AsRef<str>) -> crate::Result<Self> {
		validate_identifier(s.as_ref())?;
		Ok(PackageBaseName(s.as_ref().to_owned()))
	}

	pub fn value(&self) -> &str { &self.0 }
}

impl TryFrom<&str> for PackageBaseName {
	type Error = crate::Error;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl std::fmt::Display for PackageBaseName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// The owner-qualified name of a flavor or variant axis.
///
/// A flavor is owned by exactly one package; the fully qualified form
/// `Owner.flavor` is what constraint strings use when a quick name is
/// ambiguous or absent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlavorName {
	owner: PackageBaseName,
	name: String,
}

impl FlavorName {
	/// # Errors
	/// Returns a [`Parse`](crate::Error::Parse) error when the local name
	/// fails identifier validation.
	pub fn new(owner: PackageBaseName, name: impl AsRef<str>) -> crate::Result<Self> {
		validate_identifier(name.as_ref())?;
		Ok(FlavorName { owner, name: name.as_ref().to_owned() })
	}

	pub fn owner(&self) -> &PackageBaseName { &self.owner }
	pub fn name(&self) -> &str { &self.name }

	pub fn fully_qualified(&self) -> String {
		format!("{}.{}", self.owner, self.name)
	}
}

impl std::fmt::Display for FlavorName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}", self.owner, self.name)
	}
}

/// One concrete choice for a flavor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlavorOptionName(String);

impl FlavorOptionName {
	/// # Errors
	/// Returns a [`Parse`](crate::Error::Parse) error when the input fails
	/// identifier validation.
	pub fn new(s: impl AsRef<str>) -> crate::Result<Self> {
		validate_identifier(s.as_ref())?;
		Ok(FlavorOptionName(s.as_ref().to_owned()))
	}

	pub fn value(&self) -> &str { &self.0 }
}

impl TryFrom<&str> for FlavorOptionName {
	type Error = crate::Error;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl std::fmt::Display for FlavorOptionName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

//! Various helper functions for building package universes in tests.
//!
//! Helpers panic on invalid input to keep test bodies focused on the
//! behavior under test rather than on plumbing.

use buildgen::package::*;
use buildgen::PackageUniverse;

pub fn base(name: &str) -> PackageBaseName {
	PackageBaseName::new(name).expect("test package name is valid")
}

pub fn option(name: &str) -> FlavorOptionName {
	FlavorOptionName::new(name).expect("test option name is valid")
}

pub fn flavor_name(owner: &str, name: &str) -> FlavorName {
	FlavorName::new(base(owner), name).expect("test flavor name is valid")
}

pub fn selection(owner: &str, flavor: &str, opt: &str) -> FlavorSelection {
	FlavorSelection::new(flavor_name(owner, flavor), option(opt))
}

pub fn selections(bindings: &[(&str, &str, &str)]) -> FlavorSelections {
	bindings.iter().map(|&(owner, flavor, opt)| selection(owner, flavor, opt)).collect()
}

/// A library package depending on `deps` with no flavors.
pub fn library(name: &str, deps: &[&str]) -> EvaluationPackage {
	package(name, PackageKind::Library, deps)
}

/// An executable package depending on `deps` with no flavors.
pub fn executable(name: &str, deps: &[&str]) -> EvaluationPackage {
	package(name, PackageKind::Executable, deps)
}

pub fn package(name: &str, kind: PackageKind, deps: &[&str]) -> EvaluationPackage {
	let mut p = EvaluationPackage::new(base(name), kind);
	for dep in deps {
		p.add_dependency(DependencyDeclaration::new(base(dep))).expect("package is not sealed yet");
	}
	p
}

/// A flavor axis owned by `owner` whose first option is the default.
pub fn flavor(owner: &str, name: &str, options: &[&str]) -> PackageFlavor {
	PackageFlavor::new(
		flavor_name(owner, name),
		options.iter().map(|o| FlavorOption::new(option(o))).collect(),
	)
}

/// Adds the packages and seals the universe.
pub fn sealed_universe(packages: Vec<EvaluationPackage>) -> PackageUniverse {
	let mut universe = PackageUniverse::new();
	for p in packages {
		universe.add_package(p).expect("test package names are unique");
	}
	universe.seal().expect("test universe is well formed");
	universe
}

/// Builds and seals a universe of flavorless packages from `(name, deps)`
/// pairs.
pub fn plain_universe(packages: &[(&str, &[&str])]) -> PackageUniverse {
	sealed_universe(packages.iter().map(|&(name, deps)| library(name, deps)).collect())
}

pub mod error;
pub use error::Result;
pub use error::Error;

pub mod package;

pub mod universe;
pub use universe::PackageUniverse;

pub mod constraint;
pub use constraint::ExternalFlavorConstraints;

pub mod resolver;
pub use resolver::resolve;
pub use resolver::Resolution;
pub use resolver::ResolveOptions;

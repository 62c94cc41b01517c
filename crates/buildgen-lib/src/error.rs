//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

fn fmt_grouped(errors: &[Error]) -> String {
	errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n")
}

#[derive(Debug, Error)]
pub enum Error {
	#[error("parsing error: {0}")]
	Parse(String),
	#[error("validation error: {0}")]
	Validation(String),
	#[error("already exists: {0}")]
	AlreadyExists(String),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("package shape error: {0}")]
	Seal(#[from] crate::package::evaluation::SealError),
	#[error("constraint error: {0}")]
	Constraint(#[from] crate::constraint::ConstraintError),
	#[error("dependency graph error: {0}")]
	Graph(#[from] crate::resolver::dependency_graph::GraphError),
	#[error("resolve error: {0}")]
	Expand(#[from] crate::resolver::expansion::ExpandError),
	/// Every problem found by a validation pass, reported together.
	///
	/// Callers render one `ERROR:` line per contained error.
	#[error("{}", fmt_grouped(.0))]
	Grouped(Vec<Error>),
}

//! Error codes

/// Errors that can occur when using this library
///
/// Invalid end-user credentials are not an error, see
/// [`AuthOutcome`](crate::client::AuthOutcome). Neither is a lookup that
/// matches nothing.
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// Caller input failed validation. Raised before any connection is opened.
	#[error("Attribute format error: {0}")]
	Format(String),
	/// The directory rejected the request because of an attribute or object
	/// class mismatch. Usually a misspelled attribute name in the call.
	#[error("Schema error: {0}")]
	Schema(String),
	/// The directory could not be reached, or the service identity was
	/// refused.
	#[error("Connection has failed")]
	Connection,
	/// Anything not covered above. Details are logged when this is raised.
	#[error("Unexpected error occurred")]
	Unexpected,
	/// An attribute value returned by the directory does not have the
	/// expected syntax.
	#[error("Invalid attribute value: {0}")]
	Invalid(String),
	/// The client configuration is unusable.
	#[error("Invalid configuration: {0}")]
	Config(String),
	/// Reading TLS material from disk failed.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Whether retrying the same call later could succeed.
	#[must_use]
	pub const fn is_retryable(&self) -> bool {
		matches!(self, Self::Connection)
	}
}

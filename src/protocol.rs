//! The contract with the LDAP protocol client.
//!
//! [`Directory`](crate::client::Directory) only talks to the network through
//! these traits. [`crate::ldap::Ldap`] implements them on top of `ldap3`.
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Scope, SearchEntry};
use serde::Serialize;

/// LDAP result codes (RFC 4511 appendix A, plus client side codes) the
/// library tells apart.
pub mod rc {
	/// `success`
	pub const SUCCESS: u32 = 0;
	/// `sizeLimitExceeded`
	pub const SIZE_LIMIT_EXCEEDED: u32 = 4;
	/// `noSuchAttribute`
	pub const NO_SUCH_ATTRIBUTE: u32 = 16;
	/// `undefinedAttributeType`
	pub const UNDEFINED_ATTRIBUTE_TYPE: u32 = 17;
	/// `inappropriateMatching`
	pub const INAPPROPRIATE_MATCHING: u32 = 18;
	/// `invalidAttributeSyntax`
	pub const INVALID_ATTRIBUTE_SYNTAX: u32 = 21;
	/// `noSuchObject`
	pub const NO_SUCH_OBJECT: u32 = 32;
	/// `invalidCredentials`
	pub const INVALID_CREDENTIALS: u32 = 49;
	/// `busy`
	pub const BUSY: u32 = 51;
	/// `unavailable`
	pub const UNAVAILABLE: u32 = 52;
	/// `objectClassViolation`
	pub const OBJECT_CLASS_VIOLATION: u32 = 65;
	/// Client side: the server is down.
	pub const SERVER_DOWN: u32 = 81;
	/// Client side: the operation timed out.
	pub const TIMEOUT: u32 = 85;
	/// Client side: the connection could not be established.
	pub const CONNECT_ERROR: u32 = 91;
}

/// Outcome of a bind as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindResult {
	/// Result code, `0` on success.
	pub rc: u32,
	/// Matched DN.
	pub matched: String,
	/// Diagnostic message. Active Directory puts the reason for a refused
	/// bind here (`... data 52e ...`).
	pub text: String,
}

impl BindResult {
	/// A successful bind.
	#[must_use]
	pub fn success() -> Self {
		Self::with_code(rc::SUCCESS, "")
	}

	/// A bind that ended with `rc`.
	#[must_use]
	pub fn with_code(rc: u32, text: impl Into<String>) -> Self {
		Self { rc, matched: String::new(), text: text.into() }
	}

	/// Whether the session is authenticated.
	#[must_use]
	pub const fn is_success(&self) -> bool {
		self.rc == rc::SUCCESS
	}
}

impl From<ldap3::LdapResult> for BindResult {
	fn from(result: ldap3::LdapResult) -> Self {
		Self { rc: result.rc, matched: result.matched, text: result.text }
	}
}

/// Failures reported by the protocol client.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
	/// Attribute or object class mismatch.
	#[error("Schema violation: {0}")]
	Schema(String),
	/// The search base does not exist.
	#[error("No such object")]
	NoSuchObject,
	/// The bind credentials were refused.
	#[error("Invalid credentials: {0}")]
	InvalidCredentials(String),
	/// A named bind was attempted without a password.
	#[error("A password is mandatory for a named bind")]
	PasswordRequired,
	/// Opening, writing to or reading from the connection failed.
	#[error("Transport failure: {0}")]
	Transport(String),
	/// Anything else.
	#[error("{0}")]
	Other(String),
}

impl ProtocolError {
	/// Classify a non-successful result code.
	#[must_use]
	pub fn from_code(code: u32, text: &str) -> Self {
		let detail = format!("rc={code}, {text}");
		match code {
			rc::NO_SUCH_ATTRIBUTE
			| rc::UNDEFINED_ATTRIBUTE_TYPE
			| rc::INAPPROPRIATE_MATCHING
			| rc::INVALID_ATTRIBUTE_SYNTAX
			| rc::OBJECT_CLASS_VIOLATION => Self::Schema(detail),
			rc::NO_SUCH_OBJECT => Self::NoSuchObject,
			rc::INVALID_CREDENTIALS => Self::InvalidCredentials(detail),
			rc::BUSY | rc::UNAVAILABLE | rc::SERVER_DOWN | rc::TIMEOUT | rc::CONNECT_ERROR => {
				Self::Transport(detail)
			}
			_ => Self::Other(detail),
		}
	}

	/// Classify a refused bind.
	#[must_use]
	pub fn from_bind(bind: &BindResult) -> Self {
		Self::from_code(bind.rc, &bind.text)
	}
}

impl From<ldap3::LdapError> for ProtocolError {
	fn from(err: ldap3::LdapError) -> Self {
		use ldap3::LdapError;

		match err {
			LdapError::LdapResult { result } => Self::from_code(result.rc, &result.text),
			LdapError::Io { .. }
			| LdapError::OpSend { .. }
			| LdapError::ResultRecv { .. }
			| LdapError::Timeout { .. }
			| LdapError::EndOfStream => Self::Transport(err.to_string()),
			_ => Self::Other(err.to_string()),
		}
	}
}

/// Parameters of one search.
#[derive(Debug)]
pub struct SearchParams<'a> {
	/// Search base DN.
	pub base: &'a str,
	/// RFC 4515 filter.
	pub filter: &'a str,
	/// Search scope.
	pub scope: Scope,
	/// Maximum number of entries, `None` for no limit.
	pub size_limit: Option<i32>,
	/// Time to wait for the response.
	pub timeout: Duration,
	/// Attributes to return.
	pub attributes: &'a [String],
}

/// A pool of directory servers sessions can be opened against.
#[async_trait]
pub trait DirectoryProtocol: Send + Sync {
	/// Session type of this client.
	type Session: DirectorySession;

	/// Connect to the next server of the pool and bind as `user`.
	///
	/// A refused bind still yields a session, check
	/// [`DirectorySession::bind_result`]. Errors are reserved for failures to
	/// talk to the server at all.
	async fn open_session(&self, user: &str, password: &str) -> Result<Self::Session, ProtocolError>;
}

/// An open connection to one directory server.
#[async_trait]
pub trait DirectorySession: Send {
	/// Result of the bind the session was opened with.
	fn bind_result(&self) -> &BindResult;

	/// Whether the session is authenticated.
	fn is_bound(&self) -> bool {
		self.bind_result().is_success()
	}

	/// Run a search.
	async fn search(&mut self, params: &SearchParams<'_>) -> Result<Vec<SearchEntry>, ProtocolError>;

	/// Unbind and release the connection.
	async fn close(self) -> Result<(), ProtocolError>;
}

#[cfg(test)]
mod tests {
	use super::{rc, BindResult, ProtocolError};

	#[test]
	fn result_code_classes() {
		assert!(matches!(ProtocolError::from_code(rc::UNDEFINED_ATTRIBUTE_TYPE, ""), ProtocolError::Schema(_)));
		assert!(matches!(ProtocolError::from_code(rc::OBJECT_CLASS_VIOLATION, ""), ProtocolError::Schema(_)));
		assert_eq!(ProtocolError::from_code(rc::NO_SUCH_OBJECT, "gone"), ProtocolError::NoSuchObject);
		assert!(matches!(
			ProtocolError::from_code(rc::INVALID_CREDENTIALS, "data 52e"),
			ProtocolError::InvalidCredentials(detail) if detail.contains("52e")
		));
		assert!(matches!(ProtocolError::from_code(rc::UNAVAILABLE, ""), ProtocolError::Transport(_)));
		assert!(matches!(ProtocolError::from_code(53, "unwilling"), ProtocolError::Other(_)));
	}

	#[test]
	fn bind_results() {
		assert!(BindResult::success().is_success());
		let refused = BindResult::with_code(rc::INVALID_CREDENTIALS, "data 52e");
		assert!(!refused.is_success());
		assert!(matches!(ProtocolError::from_bind(&refused), ProtocolError::InvalidCredentials(_)));
	}

	#[test]
	fn ldap_errors() {
		let io = ldap3::LdapError::from(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
		assert!(matches!(ProtocolError::from(io), ProtocolError::Transport(_)));
		assert!(matches!(
			ProtocolError::from(ldap3::LdapError::EndOfStream),
			ProtocolError::Transport(_)
		));
	}
}

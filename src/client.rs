//! The directory client callers talk to.
//!
//! Every call validates its input, opens one session, runs at most one search
//! and releases the session again, whatever the outcome.
use std::{fmt, future::Future, time::Duration};

use ldap3::{Scope, SearchEntry};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::{
	attributes::AttributeSet,
	category::ObjectCategory,
	config::Config,
	entry::Record,
	error::Error,
	ldap::Ldap,
	normalize::{self, Lookup},
	protocol::{rc, BindResult, DirectoryProtocol, DirectorySession, ProtocolError, SearchParams},
	validate::{AuthRequest, DetailRequest, PersonAuth, SearchRequest},
};

/// Settings of the [`Directory`] that are not about connecting.
#[derive(Clone)]
pub struct DirectorySettings {
	/// Identity used for lookups and searches.
	pub service_user: String,
	/// Password of the service identity.
	pub service_password: String,
	/// Base DN of every search.
	pub search_base: String,
	/// Result cap of lookups and searches.
	pub size_limit: Option<i32>,
	/// Time to wait for search results.
	pub operation_timeout: Duration,
	/// Minimum length of end-user passwords.
	pub min_password_length: usize,
}

impl fmt::Debug for DirectorySettings {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DirectorySettings")
			.field("service_user", &self.service_user)
			.field("service_password", &"<redacted>")
			.field("search_base", &self.search_base)
			.field("size_limit", &self.size_limit)
			.field("operation_timeout", &self.operation_timeout)
			.field("min_password_length", &self.min_password_length)
			.finish()
	}
}

impl From<&Config> for DirectorySettings {
	fn from(config: &Config) -> Self {
		Self {
			service_user: config.service_user.clone(),
			service_password: config.service_password.clone(),
			search_base: config.search_base.clone(),
			size_limit: config.size_limit,
			operation_timeout: config.connection.operation_timeout,
			min_password_length: config.min_password_length,
		}
	}
}

/// Outcome of [`Directory::person_auth`]. Refused credentials are an
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOutcome {
	/// The bind succeeded. Holds the enabled account of the user.
	Authenticated(Record),
	/// The directory refused the bind.
	Rejected(BindResult),
}

impl AuthOutcome {
	/// Whether the credentials were accepted.
	#[must_use]
	pub const fn is_success(&self) -> bool {
		matches!(self, Self::Authenticated(_))
	}

	/// The account of the authenticated user.
	#[must_use]
	pub const fn record(&self) -> Option<&Record> {
		match self {
			Self::Authenticated(record) => Some(record),
			Self::Rejected(_) => None,
		}
	}

	/// The account of the authenticated user.
	#[must_use]
	pub fn into_record(self) -> Option<Record> {
		match self {
			Self::Authenticated(record) => Some(record),
			Self::Rejected(_) => None,
		}
	}

	/// LDAP result code of the bind.
	#[must_use]
	pub const fn result_code(&self) -> u32 {
		match self {
			Self::Authenticated(_) => rc::SUCCESS,
			Self::Rejected(bind) => bind.rc,
		}
	}
}

/// Looks up and authenticates Active Directory objects.
///
/// Cheap to share between tasks: no state is kept between calls apart from
/// the round-robin position of the server pool.
#[derive(Debug)]
pub struct Directory<P = Ldap> {
	/// Protocol client sessions are opened with.
	protocol: P,
	/// Settings.
	settings: DirectorySettings,
}

impl Directory<Ldap> {
	/// Create a client talking to the servers of `config`.
	pub async fn connect(config: &Config) -> Result<Self, Error> {
		Ok(Self::new(Ldap::new(config).await?, DirectorySettings::from(config)))
	}
}

impl<P: DirectoryProtocol> Directory<P> {
	/// Create a client on top of a protocol implementation.
	#[must_use]
	pub const fn new(protocol: P, settings: DirectorySettings) -> Self {
		Self { protocol, settings }
	}

	/// The settings of this client.
	#[must_use]
	pub const fn settings(&self) -> &DirectorySettings {
		&self.settings
	}

	/// The protocol client.
	#[must_use]
	pub const fn protocol(&self) -> &P {
		&self.protocol
	}

	/// Look up the object whose `attr_name` equals `attr_value`.
	///
	/// The attribute is expected to be unique. If it is not, all matches are
	/// returned sorted by it and a warning is logged.
	pub async fn object_detail(&self, request: &DetailRequest) -> Result<Lookup, Error> {
		let lookup = request.validate()?;
		let filter = lookup.query().to_filter();
		let entries = self
			.run_and_translate(
				"object_detail",
				&filter,
				self.service_search(&filter, &lookup.attributes),
			)
			.await?;
		Ok(normalize::detail(entries, &lookup))
	}

	/// Search objects by value. Persons are prefix matched on several
	/// attributes, groups and computers on a substring of their `cn`.
	/// Results are sorted by the order-by attribute.
	pub async fn objects_search(&self, request: &SearchRequest) -> Result<Vec<Record>, Error> {
		let search = request.validate()?;
		let filter = search.query().to_filter();
		let entries = self
			.run_and_translate(
				"objects_search",
				&filter,
				self.service_search(&filter, &search.attributes),
			)
			.await?;
		Ok(normalize::search(entries, &search))
	}

	/// Authenticate a person with their user principal name and password.
	///
	/// The bind is done with the given credentials directly. On success the
	/// enabled account behind the login is read through the same session.
	pub async fn person_auth(&self, request: &AuthRequest) -> Result<AuthOutcome, Error> {
		let auth = request.validate(self.settings.min_password_length)?;
		let filter = auth.query().to_filter();
		self.run_and_translate("person_auth", &filter, self.authenticate(&auth, &filter)).await
	}

	/// Log a call, run it and translate its failure.
	async fn run_and_translate<T, F>(&self, operation: &str, filter: &str, call: F) -> Result<T, Error>
	where
		F: Future<Output = Result<T, ProtocolError>> + Send,
	{
		debug!("{operation}: searching {} for {filter}", self.settings.search_base);
		call.await.map_err(|err| translate(operation, filter, err))
	}

	/// Search parameters of this client.
	fn params<'a>(
		&'a self,
		filter: &'a str,
		attributes: &'a AttributeSet,
		size_limit: Option<i32>,
	) -> SearchParams<'a> {
		SearchParams {
			base: &self.settings.search_base,
			filter,
			scope: Scope::Subtree,
			size_limit,
			timeout: self.settings.operation_timeout,
			attributes: attributes.as_slice(),
		}
	}

	/// Run one search as the service identity.
	async fn service_search(
		&self,
		filter: &str,
		attributes: &AttributeSet,
	) -> Result<Vec<SearchEntry>, ProtocolError> {
		let mut session = self
			.protocol
			.open_session(&self.settings.service_user, &self.settings.service_password)
			.await?;
		if !session.is_bound() {
			let err = ProtocolError::from_bind(session.bind_result());
			release(session).await;
			return Err(err);
		}

		let result = session.search(&self.params(filter, attributes, self.settings.size_limit)).await;
		release(session).await;
		match result {
			Err(ProtocolError::NoSuchObject) => {
				warn!("Search base {} does not exist", self.settings.search_base);
				Ok(Vec::new())
			}
			other => other,
		}
	}

	/// Bind as the user and read their account.
	async fn authenticate(&self, auth: &PersonAuth, filter: &str) -> Result<AuthOutcome, ProtocolError> {
		let mut session = match self.protocol.open_session(&auth.login, &auth.password).await {
			Ok(session) => session,
			Err(ProtocolError::InvalidCredentials(text)) => {
				warn!("Invalid credentials for {}: {text}", auth.login);
				return Ok(AuthOutcome::Rejected(BindResult::with_code(rc::INVALID_CREDENTIALS, text)));
			}
			Err(err) => return Err(err),
		};
		if !session.is_bound() {
			let bind = session.bind_result().clone();
			warn!("Authentication of {} refused: rc={}, {}", auth.login, bind.rc, bind.text);
			release(session).await;
			return Ok(AuthOutcome::Rejected(bind));
		}

		let result = session.search(&self.params(filter, &auth.attributes, None)).await;
		release(session).await;
		let mut entries = match result {
			Err(ProtocolError::NoSuchObject) => Vec::new(),
			other => other?,
		};
		if entries.is_empty() {
			return Err(ProtocolError::Other(format!(
				"{} authenticated but has no enabled account under the search base",
				auth.login
			)));
		}
		if entries.len() > 1 {
			warn!("{} accounts match {}, using the first one", entries.len(), auth.login);
		}
		let entry = entries.swap_remove(0);
		Ok(AuthOutcome::Authenticated(normalize::normalize(
			entry,
			ObjectCategory::Person,
			&auth.attributes,
		)))
	}
}

/// Unbind, logging instead of failing.
async fn release<S: DirectorySession>(session: S) {
	if let Err(err) = session.close().await {
		warn!("Failed to release directory session: {err}");
	}
}

/// Map a protocol failure to the caller facing error.
fn translate(operation: &str, filter: &str, err: ProtocolError) -> Error {
	error!("{operation} failed for {filter}: {err}");
	match err {
		ProtocolError::Schema(detail) => Error::Schema(detail),
		ProtocolError::InvalidCredentials(_)
		| ProtocolError::PasswordRequired
		| ProtocolError::Transport(_) => Error::Connection,
		ProtocolError::NoSuchObject | ProtocolError::Other(_) => Error::Unexpected,
	}
}

#[cfg(test)]
mod tests {
	use super::{translate, AuthOutcome};
	use crate::{
		entry::Record,
		error::Error,
		protocol::{rc, BindResult, ProtocolError},
	};

	#[test]
	fn error_classes() {
		assert!(matches!(
			translate("test", "(cn=x)", ProtocolError::Schema("rc=17".to_owned())),
			Error::Schema(detail) if detail == "rc=17"
		));
		for err in [
			ProtocolError::InvalidCredentials("data 52e".to_owned()),
			ProtocolError::PasswordRequired,
			ProtocolError::Transport("connection refused".to_owned()),
		] {
			assert!(matches!(translate("test", "(cn=x)", err), Error::Connection));
		}
		assert!(matches!(translate("test", "(cn=x)", ProtocolError::Other("?".to_owned())), Error::Unexpected));
	}

	#[test]
	fn outcome_accessors() {
		let rejected = AuthOutcome::Rejected(BindResult::with_code(rc::INVALID_CREDENTIALS, "data 52e"));
		assert!(!rejected.is_success());
		assert_eq!(rejected.result_code(), 49);
		assert!(rejected.record().is_none());

		let accepted = AuthOutcome::Authenticated(Record::default());
		assert!(accepted.is_success());
		assert_eq!(accepted.result_code(), 0);
		assert_eq!(accepted.into_record(), Some(Record::default()));
	}
}

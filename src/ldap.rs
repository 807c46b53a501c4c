//! Protocol client for connecting to LDAP servers, backed by `ldap3`

use std::{
	fmt,
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration,
};

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, SearchEntry, SearchOptions, SearchResult};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::{
	config::Config,
	error::Error,
	protocol::{rc, BindResult, DirectoryProtocol, DirectorySession, ProtocolError, SearchParams},
};

/// A static list of servers handed out in round-robin order.
///
/// The pool is passive: servers are not probed, and a server that fails is
/// not skipped on the next turn.
#[derive(Debug)]
pub struct ServerPool {
	/// The configured servers.
	servers: Vec<Url>,
	/// Number of servers handed out so far.
	cursor: AtomicUsize,
}

impl ServerPool {
	/// Create a pool. At least one server is required.
	pub fn new(servers: Vec<Url>) -> Result<Self, Error> {
		if servers.is_empty() {
			return Err(Error::Config("At least one directory server must be configured".to_owned()));
		}
		Ok(Self { servers, cursor: AtomicUsize::new(0) })
	}

	/// The server to use for the next connection.
	#[must_use]
	pub fn next(&self) -> &Url {
		let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.servers.len();
		&self.servers[index]
	}

	/// All servers of the pool.
	#[must_use]
	pub fn servers(&self) -> &[Url] {
		&self.servers
	}
}

/// Opens sessions against a [`ServerPool`].
pub struct Ldap {
	/// Servers to connect to.
	pool: ServerPool,
	/// Connection settings shared by all sessions.
	settings: LdapConnSettings,
	/// Time to wait for the response to a bind.
	operation_timeout: Duration,
}

impl fmt::Debug for Ldap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Ldap")
			.field("pool", &self.pool)
			.field("operation_timeout", &self.operation_timeout)
			.finish_non_exhaustive()
	}
}

impl Ldap {
	/// Create a client from the connection part of the configuration. TLS
	/// material is read here, once.
	pub async fn new(config: &Config) -> Result<Self, Error> {
		Ok(Self {
			pool: ServerPool::new(config.servers.clone())?,
			settings: config.connection.to_settings().await?,
			operation_timeout: config.connection.operation_timeout,
		})
	}

	/// The server pool.
	#[must_use]
	pub fn pool(&self) -> &ServerPool {
		&self.pool
	}

	/// Create a connection to the next server of the pool.
	async fn connect(&self) -> Result<(LdapConnAsync, ldap3::Ldap), ProtocolError> {
		let url = self.pool.next();
		debug!("Connecting to {url}");
		let (conn, ldap) = LdapConnAsync::from_url_with_settings(self.settings.clone(), url).await?;
		Ok((conn, ldap))
	}
}

#[async_trait]
impl DirectoryProtocol for Ldap {
	type Session = Session;

	async fn open_session(&self, user: &str, password: &str) -> Result<Session, ProtocolError> {
		// An empty password makes the server treat the bind as anonymous.
		if password.is_empty() {
			return Err(ProtocolError::PasswordRequired);
		}

		let (conn, mut ldap) = self.connect().await?;
		let driver = tokio::spawn(async move {
			if let Err(err) = conn.drive().await {
				warn!("Ldap connection error {err}");
			}
		});

		match ldap.with_timeout(self.operation_timeout).simple_bind(user, password).await {
			Ok(result) => Ok(Session { ldap, driver, bind: BindResult::from(result) }),
			Err(err) => {
				driver.abort();
				Err(err.into())
			}
		}
	}
}

/// A bound (or refused) connection to one server.
pub struct Session {
	/// The connection handle.
	ldap: ldap3::Ldap,
	/// Background task driving the connection.
	driver: JoinHandle<()>,
	/// Result of the initial bind.
	bind: BindResult,
}

impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session").field("bind", &self.bind).finish_non_exhaustive()
	}
}

#[async_trait]
impl DirectorySession for Session {
	fn bind_result(&self) -> &BindResult {
		&self.bind
	}

	async fn search(&mut self, params: &SearchParams<'_>) -> Result<Vec<SearchEntry>, ProtocolError> {
		let mut options = SearchOptions::new();
		if let Some(size_limit) = params.size_limit {
			options = options.sizelimit(size_limit);
		}

		let SearchResult(entries, result) = self
			.ldap
			.with_search_options(options)
			.with_timeout(params.timeout)
			.search(params.base, params.scope, params.filter, params.attributes.to_vec())
			.await?;

		check_search_rc(result.rc, &result.text, params.size_limit)?;

		Ok(entries
			.into_iter()
			.filter(|entry| !entry.is_ref() && !entry.is_intermediate())
			.map(SearchEntry::construct)
			.collect())
	}

	async fn close(mut self) -> Result<(), ProtocolError> {
		let result = self.ldap.unbind().await;
		if let Err(err) = self.driver.await {
			warn!("Failed to join background task: {err}");
		}
		result.map_err(ProtocolError::from)
	}
}

/// Accept the result code of a search. An exceeded size limit still yields
/// the entries received so far.
fn check_search_rc(code: u32, text: &str, size_limit: Option<i32>) -> Result<(), ProtocolError> {
	match code {
		rc::SUCCESS => Ok(()),
		rc::SIZE_LIMIT_EXCEEDED => {
			warn!(
				"Size limit of {} entries exceeded, results are truncated",
				size_limit.unwrap_or_default()
			);
			Ok(())
		}
		code => Err(ProtocolError::from_code(code, text)),
	}
}

#[cfg(test)]
mod tests {
	#![allow(clippy::unwrap_used)]

	use url::Url;

	use super::{check_search_rc, ServerPool};
	use crate::{
		error::Error,
		protocol::{rc, ProtocolError},
	};

	#[test]
	fn round_robin() {
		let servers: Vec<Url> = ["ldaps://dc1.example.com", "ldaps://dc2.example.com"]
			.iter()
			.map(|url| Url::parse(url).unwrap())
			.collect();
		let pool = ServerPool::new(servers.clone()).unwrap();
		assert_eq!(pool.next(), &servers[0]);
		assert_eq!(pool.next(), &servers[1]);
		assert_eq!(pool.next(), &servers[0]);
		assert_eq!(pool.servers(), servers.as_slice());
	}

	#[test]
	fn empty_pool() {
		assert!(matches!(ServerPool::new(Vec::new()), Err(Error::Config(_))));
	}

	#[test]
	fn search_result_codes() {
		assert_eq!(check_search_rc(rc::SUCCESS, "", Some(1000)), Ok(()));
		assert_eq!(check_search_rc(rc::SIZE_LIMIT_EXCEEDED, "Sizelimit exceeded", Some(1000)), Ok(()));
		assert_eq!(
			check_search_rc(rc::NO_SUCH_OBJECT, "0000208D: NameErr", None),
			Err(ProtocolError::NoSuchObject)
		);
		assert!(matches!(
			check_search_rc(rc::UNDEFINED_ATTRIBUTE_TYPE, "mial", None),
			Err(ProtocolError::Schema(detail)) if detail.contains("mial")
		));
		assert!(matches!(check_search_rc(rc::BUSY, "", None), Err(ProtocolError::Transport(_))));
	}
}

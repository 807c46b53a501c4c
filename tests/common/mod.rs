use std::{
	collections::HashMap,
	error::Error,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex,
	},
	time::Duration,
};

use ad_lookup::{
	protocol::SearchParams, BindResult, Directory, DirectoryProtocol, DirectorySession,
	DirectorySettings, ProtocolError,
};
use async_trait::async_trait;
use ldap3::{LdapConnAsync, SearchEntry};

pub const SERVICE_USER: &str = "CN=svc-lookup,OU=Service,DC=example,DC=com";
pub const SERVICE_PASSWORD: &str = "service-secret";
pub const SEARCH_BASE: &str = "DC=example,DC=com";

/// Diagnostic Active Directory sends along with result code 49.
pub const BAD_PASSWORD: &str =
	"80090308: LdapErr: DSID-0C09042A, comment: AcceptSecurityContext error, data 52e, v3839";

#[must_use]
pub fn entry(dn: &str, attrs: &[(&str, &[&str])]) -> SearchEntry {
	SearchEntry {
		dn: dn.to_owned(),
		attrs: attrs
			.iter()
			.map(|(name, values)| {
				((*name).to_owned(), values.iter().map(|value| (*value).to_owned()).collect())
			})
			.collect(),
		bin_attrs: HashMap::new(),
	}
}

#[must_use]
pub fn settings() -> DirectorySettings {
	DirectorySettings {
		service_user: SERVICE_USER.to_owned(),
		service_password: SERVICE_PASSWORD.to_owned(),
		search_base: SEARCH_BASE.to_owned(),
		size_limit: Some(1000),
		operation_timeout: Duration::from_secs(10),
		min_password_length: 8,
	}
}

/// A search as the mock directory received it.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
	pub user: String,
	pub filter: String,
	pub attributes: Vec<String>,
	pub size_limit: Option<i32>,
}

#[derive(Debug, Default)]
struct State {
	credentials: HashMap<String, String>,
	entries: Vec<SearchEntry>,
	search_error: Option<ProtocolError>,
	unreachable: bool,
	opened: AtomicUsize,
	closed: AtomicUsize,
	searches: Mutex<Vec<RecordedSearch>>,
}

/// In-memory directory. Every search returns the canned entries, whatever the
/// filter.
#[derive(Debug, Clone)]
pub struct MockDirectory {
	state: Arc<State>,
}

impl MockDirectory {
	#[must_use]
	pub fn new() -> Self {
		let mut state = State::default();
		state.credentials.insert(SERVICE_USER.to_owned(), SERVICE_PASSWORD.to_owned());
		Self { state: Arc::new(state) }
	}

	fn state_mut(&mut self) -> &mut State {
		Arc::get_mut(&mut self.state).expect("configure the mock before sharing it")
	}

	#[must_use]
	pub fn with_user(mut self, login: &str, password: &str) -> Self {
		self.state_mut().credentials.insert(login.to_owned(), password.to_owned());
		self
	}

	#[must_use]
	pub fn with_entries(mut self, entries: Vec<SearchEntry>) -> Self {
		self.state_mut().entries = entries;
		self
	}

	#[must_use]
	pub fn with_search_error(mut self, err: ProtocolError) -> Self {
		self.state_mut().search_error = Some(err);
		self
	}

	#[must_use]
	pub fn unreachable(mut self) -> Self {
		self.state_mut().unreachable = true;
		self
	}

	#[must_use]
	pub fn into_directory(self) -> Directory<MockDirectory> {
		Directory::new(self, settings())
	}

	pub fn opened(&self) -> usize {
		self.state.opened.load(Ordering::SeqCst)
	}

	pub fn closed(&self) -> usize {
		self.state.closed.load(Ordering::SeqCst)
	}

	pub fn searches(&self) -> Vec<RecordedSearch> {
		self.state.searches.lock().unwrap().clone()
	}
}

impl Default for MockDirectory {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl DirectoryProtocol for MockDirectory {
	type Session = MockSession;

	async fn open_session(&self, user: &str, password: &str) -> Result<MockSession, ProtocolError> {
		if self.state.unreachable {
			return Err(ProtocolError::Transport("connection refused".to_owned()));
		}
		if password.is_empty() {
			return Err(ProtocolError::PasswordRequired);
		}
		self.state.opened.fetch_add(1, Ordering::SeqCst);
		let bind = match self.state.credentials.get(user) {
			Some(expected) if expected == password => BindResult::success(),
			_ => BindResult::with_code(49, BAD_PASSWORD),
		};
		Ok(MockSession { state: Arc::clone(&self.state), user: user.to_owned(), bind })
	}
}

#[derive(Debug)]
pub struct MockSession {
	state: Arc<State>,
	user: String,
	bind: BindResult,
}

#[async_trait]
impl DirectorySession for MockSession {
	fn bind_result(&self) -> &BindResult {
		&self.bind
	}

	async fn search(&mut self, params: &SearchParams<'_>) -> Result<Vec<SearchEntry>, ProtocolError> {
		assert!(self.is_bound(), "searched on an unbound session");
		self.state.searches.lock().unwrap().push(RecordedSearch {
			user: self.user.clone(),
			filter: params.filter.to_owned(),
			attributes: params.attributes.to_vec(),
			size_limit: params.size_limit,
		});
		if let Some(err) = &self.state.search_error {
			return Err(err.clone());
		}
		let mut entries = self.state.entries.clone();
		if let Some(limit) = params.size_limit {
			entries.truncate(usize::try_from(limit).unwrap());
		}
		Ok(entries)
	}

	async fn close(self) -> Result<(), ProtocolError> {
		self.state.closed.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

pub async fn ldap_connect() -> Result<ldap3::Ldap, Box<dyn Error>> {
	let (conn, mut ldap) = LdapConnAsync::new("ldap://localhost:1389").await?;
	let _handle = tokio::spawn(async move {
		if let Err(err) = conn.drive().await {
			panic!("Ldap connection error {err}");
		}
	});
	ldap.simple_bind("cn=admin,dc=example,dc=org", "adminpassword").await?;
	Ok(ldap)
}

pub async fn ldap_add_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.add(
		&format!("ou={},dc=example,dc=org", ou),
		vec![("objectClass", ["organizationalUnit"].into())],
	)
	.await?
	.success()?;
	Ok(())
}

pub async fn ldap_delete_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.delete(&format!("ou={},dc=example,dc=org", ou)).await?.success()?;
	Ok(())
}

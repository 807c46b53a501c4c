//! Config for the directory client.
use std::{path::PathBuf, sync::Arc, time::Duration};

use ldap3::LdapConnSettings;
use rustls::{Certificate, ClientConfig, PrivateKey, RootCertStore};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error::Error, validate::DEFAULT_MIN_PASSWORD_LENGTH};

/// Result cap for detail lookups and searches unless configured otherwise.
pub const DEFAULT_SIZE_LIMIT: i32 = 1000;

/// Connect and receive timeout in seconds unless configured otherwise.
pub const DEFAULT_TIMEOUT: u64 = 10;

/// Directory client configuration.
#[derive(Deserialize, Serialize, Clone)]
pub struct Config {
	/// Directory servers, used round-robin. Supports ldap, ldaps, and ldapi
	/// schemes
	pub servers: Vec<Url>,
	/// Connection settings.
	#[serde(default)]
	pub connection: ConnectionConfig,
	/// The DN or UPN of the service identity used for lookups
	pub service_user: String,
	/// The password of the service identity
	pub service_password: String,
	/// The search base for all lookups
	pub search_base: String,
	/// Maximum number of objects a lookup or search returns. `None` removes
	/// the cap. End-user authentication is never capped.
	#[serde(default = "default_size_limit")]
	pub size_limit: Option<i32>,
	/// Passwords shorter than this are refused before binding
	#[serde(default = "default_min_password_length")]
	pub min_password_length: usize,
}

impl std::fmt::Debug for Config {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Config")
			.field("servers", &self.servers)
			.field("connection", &self.connection)
			.field("service_user", &self.service_user)
			.field("service_password", &"<redacted>")
			.field("search_base", &self.search_base)
			.field("size_limit", &self.size_limit)
			.field("min_password_length", &self.min_password_length)
			.finish()
	}
}

/// Serde default of [`Config::size_limit`].
#[allow(clippy::unnecessary_wraps)]
const fn default_size_limit() -> Option<i32> {
	Some(DEFAULT_SIZE_LIMIT)
}

/// Serde default of [`Config::min_password_length`].
const fn default_min_password_length() -> usize {
	DEFAULT_MIN_PASSWORD_LENGTH
}

/// Configuration for how to connect to the directory servers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
	/// Timeout to establish a connection in seconds.
	pub timeout: u64,

	/// Time to wait for the response to a bind or search.
	pub operation_timeout: Duration,

	/// TLS config
	#[serde(default)]
	pub tls: TLSConfig,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self {
			timeout: DEFAULT_TIMEOUT,
			operation_timeout: Duration::from_secs(DEFAULT_TIMEOUT),
			tls: TLSConfig::default(),
		}
	}
}

/// TLS Configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TLSConfig {
	/// Use StartTLS extended operation for establishing a secure connection,
	/// rather than TLS on a dedicated port.
	#[serde(default)]
	pub starttls: bool,

	/// Disable verification of TLS certificates
	#[serde(default)]
	pub no_tls_verify: bool,

	/// TLS root certificates path, PEM encoded
	pub root_certificates_path: Option<PathBuf>,

	/// Path of the PKCS8 TLS client key to use for the connection
	pub client_key_path: Option<PathBuf>,

	/// Path of the TLS client certificate to use for the connection
	pub client_certificate_path: Option<PathBuf>,
}

impl ConnectionConfig {
	/// Create a [`LdapConnSettings`] based on this [`ConnectionConfig`]
	pub(crate) async fn to_settings(&self) -> Result<LdapConnSettings, Error> {
		let mut settings = LdapConnSettings::new();

		settings = settings.set_conn_timeout(Duration::from_secs(self.timeout));
		settings = settings.set_starttls(self.tls.starttls);
		settings = settings.set_no_tls_verify(self.tls.no_tls_verify);

		if let Some(path) = &self.tls.root_certificates_path {
			let mut roots = RootCertStore::empty();
			let certificates = read_certificates(path).await?;
			let (added, _) = roots.add_parsable_certificates(&certificates);
			if added == 0 {
				return Err(Error::Config(format!(
					"No usable root certificate in {}",
					path.display()
				)));
			}

			let builder = ClientConfig::builder().with_safe_defaults().with_root_certificates(roots);
			let config = match (&self.tls.client_key_path, &self.tls.client_certificate_path) {
				(Some(key_path), Some(cert_path)) => {
					let chain =
						read_certificates(cert_path).await?.into_iter().map(Certificate).collect();
					let key = rustls_pemfile::pkcs8_private_keys(
						&mut tokio::fs::read(key_path).await?.as_slice(),
					)?
					.into_iter()
					.next()
					.ok_or_else(|| {
						Error::Config(format!("No PKCS8 private key in {}", key_path.display()))
					})?;
					builder.with_client_auth_cert(chain, PrivateKey(key)).map_err(|err| {
						Error::Config(format!("Could not use client certificates: {err}"))
					})?
				}
				(None, None) => builder.with_no_client_auth(),
				_ => Err(Error::Config(
					"Both a client certificate and key file in PKCS8 format must be specified"
						.to_owned(),
				))?,
			};
			settings = settings.set_config(Arc::new(config));
		}
		Ok(settings)
	}
}

/// Read all PEM encoded certificates from a file.
async fn read_certificates(path: &std::path::Path) -> Result<Vec<Vec<u8>>, Error> {
	let pem = tokio::fs::read(path).await?;
	let certificates = rustls_pemfile::certs(&mut pem.as_slice())?;
	if certificates.is_empty() {
		return Err(Error::Config(format!("No certificate found in {}", path.display())));
	}
	Ok(certificates)
}

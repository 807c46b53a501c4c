//! Look up and authenticate Active Directory persons, groups and computers.
//!
//! The library builds the search filters for the three object categories,
//! picks the attributes to request, and shapes the results: single object
//! lookups, sorted searches and end-user authentication by bind. Each call
//! opens its own connection to one server of a round-robin pool and releases
//! it before returning.
//!
//! For a general primer on LDAP, the [introduction] in the `ldap3` crate which
//! is used here for interfacing with LDAP is an excellent resource.
//!
//! [introduction]: https://github.com/inejge/ldap3/blob/master/LDAP-primer.md
//!
//! # Getting started
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use url::Url;
//! use ad_lookup::{
//!     config::{Config, ConnectionConfig},
//!     AuthRequest, DetailRequest, Directory, SearchRequest,
//! };
//!
//! // Configuration can also be deserialized with serde. It's hand-constructed
//! // here for demonstration purposes.
//! let config = Config {
//!     servers: vec![Url::parse("ldaps://dc1.example.com")?, Url::parse("ldaps://dc2.example.com")?],
//!     connection: ConnectionConfig::default(),
//!     service_user: "svc-lookup@example.com".to_owned(),
//!     service_password: "verysecret".to_owned(),
//!     search_base: "DC=example,DC=com".to_owned(),
//!     size_limit: Some(1000),
//!     min_password_length: 8,
//! };
//! let directory = Directory::connect(&config).await?;
//!
//! let person = directory
//!     .object_detail(&DetailRequest::new("person", "sAMAccountName", "jdoe").active_only(true))
//!     .await?;
//! println!("Found: {person:#?}");
//!
//! for group in directory.objects_search(&SearchRequest::new("group", "admins")).await? {
//!     println!("{}", group.dn);
//! }
//!
//! let outcome = directory.person_auth(&AuthRequest::new("jdoe@example.com", "hunter2hunter2")).await?;
//! println!("Authenticated: {}", outcome.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations
//! * Values are put into filters verbatim. Escape untrusted input with
//!   [`ldap3::ldap_escape`] before passing it in.
//! * Searches are not paged. Results beyond the configured size limit are
//!   dropped with a warning.
//! * A server that cannot be reached fails the call, the next call moves on
//!   to the next server of the pool. There is no failover within a call.
//! * [secrecy](https://docs.rs/secrecy) is not used for storing passwords.

pub mod attributes;
pub mod category;
pub mod client;
pub mod codes;
pub mod config;
pub mod entry;
pub mod error;
pub mod filter;
pub mod ldap;
pub mod normalize;
pub mod protocol;
pub mod validate;

pub use ldap3::{self, SearchEntry};

pub use crate::{
	attributes::{defaults_for, AttributeSet},
	category::{ObjectCategory, Operation},
	client::{AuthOutcome, Directory, DirectorySettings},
	codes::{sat_description, uac_description},
	config::{Config, ConnectionConfig, TLSConfig},
	entry::{Record, Value},
	error::Error,
	filter::{build_detail_filter, build_search_filter, SearchQuery},
	normalize::Lookup,
	protocol::{BindResult, DirectoryProtocol, DirectorySession, ProtocolError},
	validate::{AuthRequest, DetailRequest, SearchRequest},
};

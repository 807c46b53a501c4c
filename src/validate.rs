//! Validation of caller supplied parameters.
//!
//! Every directory call starts from one of the request builders here. Calling
//! `validate` checks the input, applies the registry defaults and produces an
//! immutable query. Nothing touches the network before that succeeds.
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
	attributes::{AttributeSet, PERSON_AUTH, PERSON_SEARCH_BY},
	category::{ObjectCategory, Operation},
	error::Error,
	filter::SearchQuery,
};

/// Minimum end-user password length unless configured otherwise.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Attribute holding the login of a person.
pub const UPN_ATTRIBUTE: &str = "userPrincipalName";

lazy_static! {
	/// RFC 822 derived grammar for user principal names. The local part is
	/// either dot separated lowercase alphanumerics or a quoted string, the
	/// domain a lowercase host name or an IPv4 literal.
	static ref UPN: Regex = Regex::new(concat!(
		r#"(?-u)^(?:[a-z0-9]+(?:\.[a-z0-9]+)*"#,
		r#"|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")"#,
		r#"@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?"#,
		r#"|\[(?:(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.){3}"#,
		r#"(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\])$"#,
	))
	.unwrap_or_else(|err| unreachable!("UPN grammar does not compile: {err}"));
}

/// Whether `login` is shaped like a user principal name.
#[must_use]
pub fn is_valid_upn(login: &str) -> bool {
	UPN.is_match(login)
}

/// Reject empty and whitespace-only values.
fn non_empty(field: &str, value: &str) -> Result<(), Error> {
	if value.trim().is_empty() {
		return Err(Error::Format(format!("`{field}` must not be empty")));
	}
	Ok(())
}

/// Check an optional attribute name list. An empty list counts as absent.
fn attribute_list<'a>(
	field: &str,
	list: Option<&'a Vec<String>>,
) -> Result<Option<&'a [String]>, Error> {
	match list {
		Some(list) if !list.is_empty() => {
			for name in list {
				non_empty(field, name)?;
			}
			Ok(Some(list.as_slice()))
		}
		_ => Ok(None),
	}
}

/// Collect attribute names into an owned list.
fn owned_list<I, S>(attrs: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	attrs.into_iter().map(Into::into).collect()
}

/// Parameters of a strict single object lookup, as received from a caller.
#[derive(Debug, Clone)]
pub struct DetailRequest {
	/// `person`, `group` or `computer`, in any case.
	pub object_category: String,
	/// Attribute to match on.
	pub attr_name: String,
	/// Value the attribute has to equal.
	pub attr_value: String,
	/// Only match enabled accounts. Applies to persons.
	pub active_only: bool,
	/// Attributes to return. Registry defaults are used when unset or empty.
	pub returned_attrs: Option<Vec<String>>,
}

impl DetailRequest {
	/// Lookup of `attr_name=attr_value` among objects of `object_category`.
	#[must_use]
	pub fn new(
		object_category: impl Into<String>,
		attr_name: impl Into<String>,
		attr_value: impl Into<String>,
	) -> Self {
		Self {
			object_category: object_category.into(),
			attr_name: attr_name.into(),
			attr_value: attr_value.into(),
			active_only: false,
			returned_attrs: None,
		}
	}

	/// Restrict person lookups to enabled accounts.
	#[must_use]
	pub fn active_only(mut self, active_only: bool) -> Self {
		self.active_only = active_only;
		self
	}

	/// Attributes to return.
	#[must_use]
	pub fn returned_attrs<I, S>(mut self, attrs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.returned_attrs = Some(owned_list(attrs));
		self
	}

	/// Validate the request and resolve its attribute set. The queried
	/// attribute is always returned.
	pub fn validate(&self) -> Result<DetailLookup, Error> {
		let category: ObjectCategory = self.object_category.parse()?;
		non_empty("attr_name", &self.attr_name)?;
		non_empty("attr_value", &self.attr_value)?;
		let returned = attribute_list("returned_attrs", self.returned_attrs.as_ref())?;

		Ok(DetailLookup {
			category,
			attributes: AttributeSet::resolve(category, Operation::Detail, returned, &self.attr_name),
			attr_name: self.attr_name.clone(),
			attr_value: self.attr_value.clone(),
			active_only: self.active_only,
		})
	}
}

/// A validated single object lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLookup {
	/// Category of the object.
	pub category: ObjectCategory,
	/// Attribute matched on, also the sort key when several objects match.
	pub attr_name: String,
	/// Value matched.
	pub attr_value: String,
	/// Only enabled accounts.
	pub active_only: bool,
	/// Attributes requested from the directory.
	pub attributes: AttributeSet,
}

impl DetailLookup {
	/// The query to run.
	#[must_use]
	pub fn query(&self) -> SearchQuery {
		SearchQuery::detail(self.category, &self.attr_name, &self.attr_value, self.active_only)
	}
}

/// Parameters of a search, as received from a caller.
#[derive(Debug, Clone)]
pub struct SearchRequest {
	/// `person`, `group` or `computer`, in any case.
	pub object_category: String,
	/// Value searched for.
	pub attr_value: String,
	/// Attribute to sort by. Defaults to the category's key attribute.
	pub order_by: Option<String>,
	/// Person attributes to match against. Ignored for other categories.
	pub search_by_attrs: Option<Vec<String>>,
	/// Attributes to return. Registry defaults are used when unset or empty.
	pub returned_attrs: Option<Vec<String>>,
}

impl SearchRequest {
	/// Search objects of `object_category` for `attr_value`.
	#[must_use]
	pub fn new(object_category: impl Into<String>, attr_value: impl Into<String>) -> Self {
		Self {
			object_category: object_category.into(),
			attr_value: attr_value.into(),
			order_by: None,
			search_by_attrs: None,
			returned_attrs: None,
		}
	}

	/// Attribute to sort results by.
	#[must_use]
	pub fn order_by(mut self, attr: impl Into<String>) -> Self {
		self.order_by = Some(attr.into());
		self
	}

	/// Person attributes to prefix match against.
	#[must_use]
	pub fn search_by_attrs<I, S>(mut self, attrs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.search_by_attrs = Some(owned_list(attrs));
		self
	}

	/// Attributes to return.
	#[must_use]
	pub fn returned_attrs<I, S>(mut self, attrs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.returned_attrs = Some(owned_list(attrs));
		self
	}

	/// Validate the request and resolve its defaults. The sort attribute is
	/// always returned.
	pub fn validate(&self) -> Result<ObjectSearch, Error> {
		let category: ObjectCategory = self.object_category.parse()?;
		non_empty("attr_value", &self.attr_value)?;
		let order_by = match &self.order_by {
			Some(order_by) => {
				non_empty("order_by", order_by)?;
				order_by.clone()
			}
			None => category.key_attribute(Operation::Search).to_owned(),
		};
		let search_by = attribute_list("search_by_attrs", self.search_by_attrs.as_ref())?;
		let returned = attribute_list("returned_attrs", self.returned_attrs.as_ref())?;

		let search_by = match category {
			ObjectCategory::Person => match search_by {
				Some(attrs) => attrs.to_vec(),
				None => owned_list(PERSON_SEARCH_BY.iter().copied()),
			},
			ObjectCategory::Group | ObjectCategory::Computer => Vec::new(),
		};

		Ok(ObjectSearch {
			category,
			attributes: AttributeSet::resolve(category, Operation::Search, returned, &order_by),
			attr_value: self.attr_value.clone(),
			order_by,
			search_by,
		})
	}
}

/// A validated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSearch {
	/// Category of the objects.
	pub category: ObjectCategory,
	/// Value searched for.
	pub attr_value: String,
	/// Sort attribute, always part of `attributes`.
	pub order_by: String,
	/// Person attributes matched against, empty for other categories.
	pub search_by: Vec<String>,
	/// Attributes requested from the directory.
	pub attributes: AttributeSet,
}

impl ObjectSearch {
	/// The query to run.
	#[must_use]
	pub fn query(&self) -> SearchQuery {
		SearchQuery::search(self.category, &self.attr_value, &self.search_by)
	}
}

/// End-user credentials, as received from a caller.
#[derive(Clone)]
pub struct AuthRequest {
	/// User principal name, e.g. `jdoe@example.com`.
	pub login: String,
	/// Password.
	pub password: String,
	/// Attributes to return on success. Defaults to [`PERSON_AUTH`].
	pub returned_attrs: Option<Vec<String>>,
}

impl fmt::Debug for AuthRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthRequest")
			.field("login", &self.login)
			.field("password", &"<redacted>")
			.field("returned_attrs", &self.returned_attrs)
			.finish()
	}
}

impl AuthRequest {
	/// Authenticate `login` with `password`.
	#[must_use]
	pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
		Self { login: login.into(), password: password.into(), returned_attrs: None }
	}

	/// Attributes to return on success.
	#[must_use]
	pub fn returned_attrs<I, S>(mut self, attrs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.returned_attrs = Some(owned_list(attrs));
		self
	}

	/// Validate the credentials. An empty password would turn the bind into
	/// an anonymous one, so passwords shorter than `min_password_length` are
	/// refused here.
	pub fn validate(&self, min_password_length: usize) -> Result<PersonAuth, Error> {
		if !is_valid_upn(&self.login) {
			return Err(Error::Format(format!(
				"`{}` doesn't match the format of the `{UPN_ATTRIBUTE}` attribute",
				self.login
			)));
		}
		if self.password.is_empty() || self.password.chars().count() < min_password_length {
			return Err(Error::Format(format!(
				"Password must be at least {min_password_length} characters long"
			)));
		}
		let returned = attribute_list("returned_attrs", self.returned_attrs.as_ref())?;
		let attributes = match returned {
			Some(attrs) => AttributeSet::new(attrs, UPN_ATTRIBUTE),
			None => AttributeSet::new(PERSON_AUTH, UPN_ATTRIBUTE),
		};

		Ok(PersonAuth { login: self.login.clone(), password: self.password.clone(), attributes })
	}
}

/// Validated end-user credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonAuth {
	/// User principal name used as bind identity.
	pub login: String,
	/// Password used for the bind.
	pub password: String,
	/// Attributes requested after a successful bind.
	pub attributes: AttributeSet,
}

impl fmt::Debug for PersonAuth {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PersonAuth")
			.field("login", &self.login)
			.field("password", &"<redacted>")
			.field("attributes", &self.attributes)
			.finish()
	}
}

impl PersonAuth {
	/// Lookup of the enabled account behind the login.
	#[must_use]
	pub fn query(&self) -> SearchQuery {
		SearchQuery::detail(ObjectCategory::Person, UPN_ATTRIBUTE, &self.login, true)
	}
}

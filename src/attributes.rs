//! Default attribute sets per object category and operation.
//!
//! The tables are hand-maintained. `msDS-UserPasswordExpiryTimeComputed` is a
//! constructed attribute which a `*` request does not return, so it is listed
//! explicitly for person details.
use crate::category::{ObjectCategory, Operation};

/// Attributes returned by a computer detail lookup.
pub const COMPUTER_DETAIL: &[&str] = &[
	"cn",
	"description",
	"distinguishedName",
	"lastLogon",
	"logonCount",
	"name",
	"objectGUID",
	"operatingSystem",
	"operatingSystemVersion",
	"sAMAccountName",
	"sAMAccountType",
	"servicePrincipalName",
	"whenChanged",
	"whenCreated",
];

/// Attributes returned by a computer search.
pub const COMPUTER_SEARCH: &[&str] =
	&["cn", "operatingSystem", "operatingSystemVersion", "whenChanged", "whenCreated"];

/// Attributes returned by a group detail lookup.
pub const GROUP_DETAIL: &[&str] = &[
	"cn",
	"description",
	"distinguishedName",
	"mail",
	"member",
	"memberOf",
	"name",
	"objectGUID",
	"sAMAccountName",
	"sAMAccountType",
	"whenChanged",
	"whenCreated",
];

/// Attributes returned by a group search.
pub const GROUP_SEARCH: &[&str] =
	&["distinguishedName", "mail", "sAMAccountName", "whenChanged", "whenCreated"];

/// Attributes returned after a successful end-user authentication.
pub const PERSON_AUTH: &[&str] = &[
	"cn",
	"employeeNumber",
	"ipPhone",
	"mail",
	"mobile",
	"userPrincipalName",
	"sAMAccountName",
];

/// Attributes returned by a person detail lookup.
pub const PERSON_DETAIL: &[&str] = &[
	"accountExpires",
	"badPasswordTime",
	"badPwdCount",
	"cn",
	"company",
	"department",
	"displayName",
	"employeeID",
	"employeeNumber",
	"extensionAttribute12",
	"extensionAttribute5",
	"extensionAttribute6",
	"extensionAttribute9",
	"ipPhone",
	"l",
	"lastLogoff",
	"lastLogon",
	"lockoutTime",
	"logonCount",
	"mail",
	"manager",
	"memberOf",
	"mobile",
	"msDS-UserPasswordExpiryTimeComputed",
	"msExchExtensionAttribute22",
	"msExchExtensionAttribute23",
	"msExchExtensionCustomAttribute1",
	"msExchExtensionCustomAttribute2",
	"objectGUID",
	"pwdLastSet",
	"sAMAccountName",
	"sAMAccountType",
	"servicePrincipalName",
	"streetAddress",
	"telephoneNumber",
	"thumbnailPhoto",
	"title",
	"userAccountControl",
	"userPrincipalName",
	"whenChanged",
	"whenCreated",
];

/// Attributes a person search matches against when the caller names none.
pub const PERSON_SEARCH_BY: &[&str] =
	&["cn", "employeeNumber", "ipPhone", "mail", "mobile", "sAMAccountName"];

/// Attributes returned by a person search.
pub const PERSON_SEARCH: &[&str] = &[
	"department",
	"displayName",
	"employeeNumber",
	"ipPhone",
	"mail",
	"mobile",
	"sAMAccountName",
	"title",
	"userAccountControl",
	"whenChanged",
	"whenCreated",
];

/// The hand-authored default list for a category and operation, without the
/// key attribute guarantee. Use [`defaults_for`] for a complete set.
#[must_use]
pub const fn default_list(category: ObjectCategory, operation: Operation) -> &'static [&'static str] {
	match (category, operation) {
		(ObjectCategory::Person, Operation::Detail) => PERSON_DETAIL,
		(ObjectCategory::Person, Operation::Search) => PERSON_SEARCH,
		(ObjectCategory::Group, Operation::Detail) => GROUP_DETAIL,
		(ObjectCategory::Group, Operation::Search) => GROUP_SEARCH,
		(ObjectCategory::Computer, Operation::Detail) => COMPUTER_DETAIL,
		(ObjectCategory::Computer, Operation::Search) => COMPUTER_SEARCH,
	}
}

/// The default attribute set for a category and operation, keyed by the
/// category's designated key attribute.
#[must_use]
pub fn defaults_for(category: ObjectCategory, operation: Operation) -> AttributeSet {
	AttributeSet::new(default_list(category, operation), category.key_attribute(operation))
}

/// Ordered, duplicate free list of attribute names to request, always
/// containing its key attribute.
///
/// Attribute names are compared ASCII case-insensitively, as the directory
/// does. The first spelling seen wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSet {
	/// Attribute names in request order.
	names: Vec<String>,
	/// Index of the key attribute in `names`.
	key: usize,
}

impl AttributeSet {
	/// Builds a set from `names`, appending `key` if it is not already
	/// present.
	#[must_use]
	pub fn new<I, S>(names: I, key: &str) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut set = AttributeSet { names: Vec::new(), key: 0 };
		for name in names {
			set.push(name.as_ref());
		}
		set.key = set.push(key);
		set
	}

	/// Resolves the set to request: the caller's list if one was given and is
	/// not empty, the registry defaults otherwise. `key` is guaranteed to be
	/// part of the result.
	#[must_use]
	pub fn resolve(
		category: ObjectCategory,
		operation: Operation,
		requested: Option<&[String]>,
		key: &str,
	) -> Self {
		match requested {
			Some(requested) if !requested.is_empty() => Self::new(requested, key),
			_ => Self::new(default_list(category, operation), key),
		}
	}

	/// Adds `name` unless present and returns its position.
	fn push(&mut self, name: &str) -> usize {
		if let Some(index) = self.position(name) {
			return index;
		}
		self.names.push(name.to_owned());
		self.names.len() - 1
	}

	/// Position of `name`, ignoring ASCII case.
	fn position(&self, name: &str) -> Option<usize> {
		self.names.iter().position(|existing| existing.eq_ignore_ascii_case(name))
	}

	/// Whether `name` is part of the set.
	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.position(name).is_some()
	}

	/// The key attribute.
	#[must_use]
	pub fn key(&self) -> &str {
		&self.names[self.key]
	}

	/// Iterate over the attribute names in request order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.names.iter().map(String::as_str)
	}

	/// The attribute names as a slice.
	#[must_use]
	pub fn as_slice(&self) -> &[String] {
		&self.names
	}

	/// Number of attributes in the set.
	#[must_use]
	pub fn len(&self) -> usize {
		self.names.len()
	}

	/// Always `false`, a set holds at least its key attribute.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}
}

//! Search filter construction for the supported object categories.
//!
//! Values are inserted verbatim. No escaping of the LDAP filter special
//! characters `*()\` and NUL takes place here, since escaping would change
//! how wildcards in caller input match. Callers handling untrusted input
//! should pass values through [`ldap3::ldap_escape`] first.
use std::fmt;

use crate::{attributes::PERSON_SEARCH_BY, category::ObjectCategory};

/// `userAccountControl` bit marking a disabled account (`ACCOUNTDISABLE`).
pub const ACCOUNT_DISABLE: u32 = 0x2;

/// OID of the `LDAP_MATCHING_RULE_BIT_AND` extensible matching rule.
pub const MATCHING_RULE_BIT_AND: &str = "1.2.840.113556.1.4.803";

/// How a predicate value is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
	/// `(attr=value)`
	Exact,
	/// `(attr=value*)`
	Prefix,
	/// `(attr=*value*)`
	Contains,
}

/// One attribute assertion of a [`SearchQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
	/// Attribute name.
	pub attr: String,
	/// Asserted value.
	pub value: String,
	/// How the value is matched.
	pub mode: MatchMode,
}

impl Predicate {
	/// Create a predicate.
	#[must_use]
	pub fn new(attr: impl Into<String>, value: impl Into<String>, mode: MatchMode) -> Self {
		Self { attr: attr.into(), value: value.into(), mode }
	}
}

impl fmt::Display for Predicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.mode {
			MatchMode::Exact => write!(f, "({}={})", self.attr, self.value),
			MatchMode::Prefix => write!(f, "({}={}*)", self.attr, self.value),
			MatchMode::Contains => write!(f, "({}=*{}*)", self.attr, self.value),
		}
	}
}

/// A directory query for one object category.
///
/// A single predicate is asserted directly, several are OR-ed together.
/// `active_only` only applies to persons, where it excludes disabled accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
	/// Category of the objects searched for.
	pub category: ObjectCategory,
	/// Attribute assertions.
	pub predicate: Vec<Predicate>,
	/// Restrict persons to enabled accounts. `None` means no restriction.
	pub active_only: Option<bool>,
}

impl SearchQuery {
	/// Strict lookup on a single attribute.
	#[must_use]
	pub fn detail(category: ObjectCategory, attr_name: &str, attr_value: &str, active_only: bool) -> Self {
		Self {
			category,
			predicate: vec![Predicate::new(attr_name, attr_value, MatchMode::Exact)],
			active_only: Some(active_only),
		}
	}

	/// Search by value. Persons are prefix matched on every attribute of
	/// `search_by`, or on [`PERSON_SEARCH_BY`] when it is empty. Groups and
	/// computers are substring matched on `cn` and ignore `search_by`.
	#[must_use]
	pub fn search<S: AsRef<str>>(category: ObjectCategory, attr_value: &str, search_by: &[S]) -> Self {
		let predicate = match category {
			ObjectCategory::Person => {
				let attrs: Vec<&str> = if search_by.is_empty() {
					PERSON_SEARCH_BY.to_vec()
				} else {
					search_by.iter().map(|attr| attr.as_ref()).collect()
				};
				attrs
					.into_iter()
					.map(|attr| Predicate::new(attr, attr_value, MatchMode::Prefix))
					.collect()
			}
			ObjectCategory::Group | ObjectCategory::Computer => {
				vec![Predicate::new("cn", attr_value, MatchMode::Contains)]
			}
		};
		Self { category, predicate, active_only: None }
	}

	/// Render the query as an RFC 4515 filter string.
	#[must_use]
	pub fn to_filter(&self) -> String {
		let mut filter = format!("(&(objectCategory={})", self.category.ldap_name());
		if self.category == ObjectCategory::Person {
			filter.push_str("(objectClass=User)");
			if self.active_only == Some(true) {
				filter.push_str(&format!(
					"(!(userAccountControl:{MATCHING_RULE_BIT_AND}:={ACCOUNT_DISABLE}))"
				));
			}
		}
		for other in self.category.others() {
			filter.push_str(&format!("(!(objectCategory={}))", other.ldap_name()));
		}
		match self.predicate.as_slice() {
			[single] => {
				filter.push_str(&single.to_string());
			}
			many => {
				filter.push_str("(|");
				for predicate in many {
					filter.push_str(&predicate.to_string());
				}
				filter.push(')');
			}
		}
		filter.push(')');
		filter
	}
}

impl fmt::Display for SearchQuery {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_filter())
	}
}

/// Filter for a strict lookup of one object by `attr_name=attr_value`.
#[must_use]
pub fn build_detail_filter(
	category: ObjectCategory,
	attr_name: &str,
	attr_value: &str,
	active_only: bool,
) -> String {
	SearchQuery::detail(category, attr_name, attr_value, active_only).to_filter()
}

/// Filter for a search by `attr_value`.
#[must_use]
pub fn build_search_filter<S: AsRef<str>>(
	category: ObjectCategory,
	attr_value: &str,
	search_by_attrs: &[S],
) -> String {
	SearchQuery::search(category, attr_value, search_by_attrs).to_filter()
}

//! The kinds of directory objects that can be looked up.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Category of an Active Directory object.
///
/// `objectCategory` alone is not enough to tell these apart in schemas where
/// categories overlap, so every filter built for one category also excludes
/// the other two (see [`ObjectCategory::others`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectCategory {
	/// A user account (`objectCategory=Person`, `objectClass=User`).
	Person,
	/// A security or distribution group.
	Group,
	/// A computer account.
	Computer,
}

/// The shape of a directory query, which decides the default attribute set
/// and the attribute results are keyed or ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Strict lookup of one object by a (nominally unique) attribute.
	Detail,
	/// Prefix or substring search returning a list of objects.
	Search,
}

impl ObjectCategory {
	/// All categories, in declaration order.
	pub const ALL: [ObjectCategory; 3] =
		[ObjectCategory::Person, ObjectCategory::Group, ObjectCategory::Computer];

	/// The value used for this category in `objectCategory` assertions.
	#[must_use]
	pub const fn ldap_name(self) -> &'static str {
		match self {
			ObjectCategory::Person => "Person",
			ObjectCategory::Group => "Group",
			ObjectCategory::Computer => "Computer",
		}
	}

	/// The two categories a filter for `self` has to exclude explicitly.
	#[must_use]
	pub const fn others(self) -> [ObjectCategory; 2] {
		match self {
			ObjectCategory::Person => [ObjectCategory::Computer, ObjectCategory::Group],
			ObjectCategory::Group => [ObjectCategory::Computer, ObjectCategory::Person],
			ObjectCategory::Computer => [ObjectCategory::Group, ObjectCategory::Person],
		}
	}

	/// The designated key attribute of the category for an operation: the
	/// usual lookup key for detail queries and the default sort key for
	/// searches.
	#[must_use]
	pub const fn key_attribute(self, operation: Operation) -> &'static str {
		match (self, operation) {
			(ObjectCategory::Person, Operation::Detail) => "sAMAccountName",
			(ObjectCategory::Person, Operation::Search) => "displayName",
			(ObjectCategory::Group, _) => "sAMAccountName",
			(ObjectCategory::Computer, _) => "cn",
		}
	}
}

impl fmt::Display for ObjectCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.ldap_name())
	}
}

impl FromStr for ObjectCategory {
	type Err = Error;

	/// Parses a category name case-insensitively.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		Self::ALL
			.into_iter()
			.find(|category| category.ldap_name().eq_ignore_ascii_case(trimmed))
			.ok_or_else(|| {
				Error::Format(format!(
					"Unknown object category `{s}`, expected one of `person`, `group`, `computer`"
				))
			})
	}
}

#[cfg(test)]
mod tests {
	use super::{ObjectCategory, Operation};
	use crate::error::Error;

	#[test]
	fn parse_is_case_insensitive() {
		assert_eq!("person".parse::<ObjectCategory>().ok(), Some(ObjectCategory::Person));
		assert_eq!("GROUP".parse::<ObjectCategory>().ok(), Some(ObjectCategory::Group));
		assert_eq!(" Computer ".parse::<ObjectCategory>().ok(), Some(ObjectCategory::Computer));
		assert!(matches!("printer".parse::<ObjectCategory>(), Err(Error::Format(_))));
		assert!(matches!("".parse::<ObjectCategory>(), Err(Error::Format(_))));
	}

	#[test]
	fn others_never_contain_self() {
		for category in ObjectCategory::ALL {
			let others = category.others();
			assert!(!others.contains(&category));
			assert_ne!(others[0], others[1]);
		}
	}

	#[test]
	fn key_attributes() {
		assert_eq!(ObjectCategory::Person.key_attribute(Operation::Detail), "sAMAccountName");
		assert_eq!(ObjectCategory::Person.key_attribute(Operation::Search), "displayName");
		assert_eq!(ObjectCategory::Group.key_attribute(Operation::Search), "sAMAccountName");
		assert_eq!(ObjectCategory::Computer.key_attribute(Operation::Detail), "cn");
	}
}

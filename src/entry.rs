//! Directory objects as handed to callers, with helpers for extracting data.
use std::collections::BTreeMap;

use ldap3::SearchEntry;
use serde::Serialize;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{attributes::AttributeSet, error::Error};

/// LDAP GeneralizedTime as described in RFC 4517 section 3.3.13, without
/// fractional seconds.
pub const TIME_FORMAT: &[time::format_description::FormatItem] =
	time::macros::format_description!("[year][month][day][hour][minute][second]Z");

/// LDAP GeneralizedTime with fractional seconds, as Active Directory writes
/// `whenCreated` and `whenChanged` (`20230516200520.0Z`).
pub const TIME_FORMAT_FRACTIONAL: &[time::format_description::FormatItem] =
	time::macros::format_description!("[year][month][day][hour][minute][second].[subsecond]Z");

/// Number of 100ns intervals between 1601-01-01 and the unix epoch.
const FILETIME_UNIX_EPOCH: i128 = 116_444_736_000_000_000;

/// The value of one attribute.
///
/// Directory attributes are multi-valued. A single value is unwrapped into
/// [`Value::Text`] or [`Value::Binary`], anything else stays a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
	/// Exactly one UTF-8 value.
	Text(String),
	/// Zero or several UTF-8 values.
	TextList(Vec<String>),
	/// Exactly one binary value, e.g. `objectGUID`.
	Binary(Vec<u8>),
	/// Several binary values.
	BinaryList(Vec<Vec<u8>>),
	/// Values duplicated into `(value, value)` pairs, ready for use as
	/// option lists.
	Pairs(Vec<(String, String)>),
}

impl Value {
	/// Wrap the UTF-8 values of an attribute.
	#[must_use]
	pub fn from_text(mut values: Vec<String>) -> Self {
		if values.len() == 1 {
			Value::Text(values.remove(0))
		} else {
			Value::TextList(values)
		}
	}

	/// Wrap the binary values of an attribute.
	#[must_use]
	pub fn from_binary(mut values: Vec<Vec<u8>>) -> Self {
		if values.len() == 1 {
			Value::Binary(values.remove(0))
		} else {
			Value::BinaryList(values)
		}
	}

	/// An attribute without values.
	#[must_use]
	pub const fn empty() -> Self {
		Value::TextList(Vec::new())
	}

	/// The first value as text. Binary values have none.
	#[must_use]
	pub fn first(&self) -> Option<&str> {
		match self {
			Value::Text(value) => Some(value.as_str()),
			Value::TextList(values) => values.first().map(String::as_str),
			Value::Pairs(pairs) => pairs.first().map(|(value, _)| value.as_str()),
			Value::Binary(_) | Value::BinaryList(_) => None,
		}
	}

	/// All text values.
	#[must_use]
	pub fn texts(&self) -> Vec<&str> {
		match self {
			Value::Text(value) => vec![value.as_str()],
			Value::TextList(values) => values.iter().map(String::as_str).collect(),
			Value::Pairs(pairs) => pairs.iter().map(|(value, _)| value.as_str()).collect(),
			Value::Binary(_) | Value::BinaryList(_) => Vec::new(),
		}
	}

	/// The first value in binary form. Text values are returned as their
	/// UTF-8 bytes.
	#[must_use]
	pub fn binary_first(&self) -> Option<&[u8]> {
		match self {
			Value::Binary(value) => Some(value.as_slice()),
			Value::BinaryList(values) => values.first().map(Vec::as_slice),
			Value::Text(_) | Value::TextList(_) | Value::Pairs(_) => {
				self.first().map(str::as_bytes)
			}
		}
	}

	/// Whether the attribute holds no value at all.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		match self {
			Value::Text(_) | Value::Binary(_) => false,
			Value::TextList(values) => values.is_empty(),
			Value::BinaryList(values) => values.is_empty(),
			Value::Pairs(pairs) => pairs.is_empty(),
		}
	}
}

/// One directory object.
///
/// Attribute names keep the spelling the server used. Lookups through the
/// accessor methods ignore ASCII case, as the directory does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
	/// Distinguished name of the object.
	pub dn: String,
	/// Attribute values by attribute name.
	pub attributes: BTreeMap<String, Value>,
}

impl Record {
	/// Convert a raw search entry. Every attribute of `requested` the entry
	/// lacks is added with an empty value, so requested attributes are always
	/// present.
	#[must_use]
	pub fn from_entry(entry: SearchEntry, requested: &AttributeSet) -> Self {
		let mut attributes: BTreeMap<String, Value> = entry
			.attrs
			.into_iter()
			.map(|(name, values)| (name, Value::from_text(values)))
			.chain(entry.bin_attrs.into_iter().map(|(name, values)| (name, Value::from_binary(values))))
			.collect();

		for name in requested.iter().filter(|name| !matches!(*name, "*" | "+")) {
			if !attributes.keys().any(|existing| existing.eq_ignore_ascii_case(name)) {
				attributes.insert(name.to_owned(), Value::empty());
			}
		}

		Record { dn: entry.dn, attributes }
	}

	/// The stored name of `attr`, ignoring ASCII case.
	fn key_of(&self, attr: &str) -> Option<&String> {
		if let Some((key, _)) = self.attributes.get_key_value(attr) {
			return Some(key);
		}
		self.attributes.keys().find(|key| key.eq_ignore_ascii_case(attr))
	}

	/// The value of an attribute.
	#[must_use]
	pub fn get(&self, attr: &str) -> Option<&Value> {
		let key = self.key_of(attr)?;
		self.attributes.get(key)
	}

	/// Mutable access to the value of an attribute.
	pub fn get_mut(&mut self, attr: &str) -> Option<&mut Value> {
		let key = self.key_of(attr)?.clone();
		self.attributes.get_mut(&key)
	}

	/// Get the first value of an attribute. Will return `None` if the
	/// attribute is missing, empty or binary.
	#[must_use]
	pub fn first(&self, attr: &str) -> Option<&str> {
		self.get(attr)?.first()
	}

	/// All text values of an attribute.
	#[must_use]
	pub fn values(&self, attr: &str) -> Vec<&str> {
		self.get(attr).map(Value::texts).unwrap_or_default()
	}

	/// Get the first value of an attribute, in binary form.
	#[must_use]
	pub fn binary_first(&self, attr: &str) -> Option<&[u8]> {
		self.get(attr)?.binary_first()
	}

	/// Get the first value of an attribute, interpreted as an integer.
	/// Suited for `userAccountControl` and `sAMAccountType`.
	#[must_use]
	pub fn int_first(&self, attr: &str) -> Option<Result<i64, Error>> {
		let value = self.first(attr)?;
		Some(value.trim().parse().map_err(|_| malformed(attr, value)))
	}

	/// Get the first value of an attribute, interpreted as GeneralizedTime.
	#[must_use]
	pub fn time_first(&self, attr: &str) -> Option<Result<OffsetDateTime, Error>> {
		let value = self.first(attr)?;
		Some(parse_generalized_time(value).ok_or_else(|| malformed(attr, value)))
	}

	/// Get the first value of an attribute, interpreted as a Windows FILETIME
	/// (`pwdLastSet`, `accountExpires`, `lastLogon`, ...). `0` and
	/// `9223372036854775807` mean "never" and yield `None`.
	#[must_use]
	pub fn filetime_first(&self, attr: &str) -> Option<Result<OffsetDateTime, Error>> {
		let ticks = match self.int_first(attr)? {
			Ok(ticks) => ticks,
			Err(err) => return Some(Err(err)),
		};
		if ticks <= 0 || ticks == i64::MAX {
			return None;
		}
		let nanos = (i128::from(ticks) - FILETIME_UNIX_EPOCH) * 100;
		Some(
			OffsetDateTime::from_unix_timestamp_nanos(nanos)
				.map_err(|_| malformed(attr, &ticks.to_string())),
		)
	}
}

/// Parse GeneralizedTime with or without fractional seconds.
#[must_use]
pub fn parse_generalized_time(value: &str) -> Option<OffsetDateTime> {
	PrimitiveDateTime::parse(value, &TIME_FORMAT_FRACTIONAL)
		.or_else(|_| PrimitiveDateTime::parse(value, &TIME_FORMAT))
		.ok()
		.map(PrimitiveDateTime::assume_utc)
}

/// Error for an attribute value that does not have the expected syntax.
fn malformed(attr: &str, value: &str) -> Error {
	Error::Invalid(format!("Malformed value `{value}` for attribute `{attr}`"))
}

#[cfg(test)]
mod tests {
	#![allow(clippy::unwrap_used)]

	use std::collections::HashMap;

	use ldap3::SearchEntry;
	use time::macros::datetime;

	use super::{parse_generalized_time, Record, Value};
	use crate::{attributes::AttributeSet, error::Error};

	fn entry() -> SearchEntry {
		SearchEntry {
			dn: String::from("CN=Foo Bar,OU=People,DC=example,DC=com"),
			attrs: HashMap::from([
				(String::from("name"), vec![String::from("Foo Bar"), String::from("Bar McBaz")]),
				(String::from("sAMAccountName"), vec![String::from("fbar")]),
				(String::from("userAccountControl"), vec![String::from("66048")]),
				(String::from("whenCreated"), vec![String::from("20230516200520.0Z")]),
				(String::from("pwdLastSet"), vec![String::from("133288416000000000")]),
				(String::from("accountExpires"), vec![String::from("9223372036854775807")]),
			]),
			bin_attrs: HashMap::from([(String::from("objectGUID"), vec![vec![0xde, 0xad]])]),
		}
	}

	#[test]
	fn attr_first() {
		let record = Record::from_entry(entry(), &AttributeSet::new(["name"], "sAMAccountName"));
		assert_eq!(
			record.first("attribute_does_not_exist"),
			None,
			"Undefined attributes should return None"
		);
		assert_eq!(record.first("name"), Some("Foo Bar"), "Should return the first value");
		assert_eq!(record.first("samaccountname"), Some("fbar"), "Lookup should ignore case");
		assert_eq!(record.values("name"), ["Foo Bar", "Bar McBaz"]);
		assert_eq!(record.binary_first("objectGUID"), Some([0xde, 0xad].as_slice()));
		assert_eq!(record.dn, "CN=Foo Bar,OU=People,DC=example,DC=com");
	}

	#[test]
	fn single_values_are_unwrapped() {
		let record = Record::from_entry(entry(), &AttributeSet::new(["name"], "cn"));
		assert_eq!(record.get("sAMAccountName"), Some(&Value::Text("fbar".to_owned())));
		assert!(matches!(record.get("name"), Some(Value::TextList(values)) if values.len() == 2));
		assert_eq!(record.get("objectGUID"), Some(&Value::Binary(vec![0xde, 0xad])));
	}

	#[test]
	fn requested_attributes_are_always_present() {
		let requested = AttributeSet::new(["*", "mail", "SAMACCOUNTNAME"], "displayName");
		let record = Record::from_entry(entry(), &requested);
		assert_eq!(record.get("mail"), Some(&Value::empty()));
		assert_eq!(record.get("displayName"), Some(&Value::empty()));
		assert!(!record.attributes.contains_key("*"));
		assert!(!record.attributes.contains_key("SAMACCOUNTNAME"));
		assert_eq!(record.first("mail"), None);
	}

	#[test]
	fn typed_accessors() {
		let record = Record::from_entry(entry(), &AttributeSet::new(["name"], "cn"));
		assert_eq!(record.int_first("userAccountControl").unwrap().unwrap(), 66048);
		assert!(matches!(record.int_first("name"), Some(Err(Error::Invalid(_)))));
		assert!(record.int_first("missing").is_none());

		assert_eq!(record.time_first("whenCreated").unwrap().unwrap(), datetime!(2023-05-16 20:05:20 UTC));
		assert!(matches!(record.time_first("name"), Some(Err(Error::Invalid(_)))));
		assert!(matches!(record.filetime_first("name"), Some(Err(Error::Invalid(_)))));

		assert_eq!(
			record.filetime_first("pwdLastSet").unwrap().unwrap(),
			datetime!(2023-05-18 00:00:00 UTC)
		);
		assert!(record.filetime_first("accountExpires").is_none());
	}

	#[test]
	fn generalized_time_without_fraction() {
		assert_eq!(parse_generalized_time("20130516200520Z"), Some(datetime!(2013-05-16 20:05:20 UTC)));
		assert_eq!(parse_generalized_time("yesterday"), None);
	}
}

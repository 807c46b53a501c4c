//! Shaping raw search results into what callers get back.
use ldap3::SearchEntry;
use serde::Serialize;

use crate::{
	attributes::AttributeSet,
	category::ObjectCategory,
	entry::{Record, Value},
	validate::{DetailLookup, ObjectSearch},
};

/// Group attributes holding distinguished names, handed out as option pairs.
pub const RELATIONAL_ATTRIBUTES: [&str; 2] = ["member", "memberOf"];

/// Result of a single object lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Lookup {
	/// Nothing matched.
	NotFound,
	/// Exactly one object matched.
	One(Record),
	/// The attribute was not unique. Objects are sorted by the queried
	/// attribute.
	Many(Vec<Record>),
}

impl Lookup {
	/// Whether anything matched.
	#[must_use]
	pub fn is_found(&self) -> bool {
		!matches!(self, Lookup::NotFound)
	}

	/// The single match, if the lookup was unambiguous.
	#[must_use]
	pub fn one(self) -> Option<Record> {
		match self {
			Lookup::One(record) => Some(record),
			Lookup::NotFound | Lookup::Many(_) => None,
		}
	}

	/// All matches.
	#[must_use]
	pub fn into_records(self) -> Vec<Record> {
		match self {
			Lookup::NotFound => Vec::new(),
			Lookup::One(record) => vec![record],
			Lookup::Many(records) => records,
		}
	}
}

/// Convert one raw entry, applying the post-processing of its category.
#[must_use]
pub fn normalize(entry: SearchEntry, category: ObjectCategory, requested: &AttributeSet) -> Record {
	let mut record = Record::from_entry(entry, requested);
	if category == ObjectCategory::Group {
		for attr in RELATIONAL_ATTRIBUTES {
			if let Some(value) = record.get_mut(attr) {
				*value = into_pairs(std::mem::replace(value, Value::empty()));
			}
		}
	}
	record
}

/// Duplicate every value into a `(value, value)` pair.
fn into_pairs(value: Value) -> Value {
	let values = match value {
		Value::Text(value) => vec![value],
		Value::TextList(values) => values,
		Value::Pairs(_) | Value::Binary(_) | Value::BinaryList(_) => return value,
	};
	Value::Pairs(values.into_iter().map(|value| (value.clone(), value)).collect())
}

/// Sort records ascending by the first value of `attr`. Records without a
/// value sort first, ties keep the directory's order.
pub fn sort_by_attribute(records: &mut [Record], attr: &str) {
	records.sort_by(|a, b| a.first(attr).unwrap_or_default().cmp(b.first(attr).unwrap_or_default()));
}

/// Shape the entries of a detail lookup.
#[must_use]
pub fn detail(entries: Vec<SearchEntry>, lookup: &DetailLookup) -> Lookup {
	let mut records: Vec<Record> = entries
		.into_iter()
		.map(|entry| normalize(entry, lookup.category, &lookup.attributes))
		.collect();
	match records.len() {
		0 => {
			tracing::warn!(
				"{} `{}={}` not found",
				lookup.category,
				lookup.attr_name,
				lookup.attr_value
			);
			Lookup::NotFound
		}
		1 => Lookup::One(records.remove(0)),
		count => {
			tracing::warn!(
				"{count} objects of category {} match `{}={}`, use an attribute with unique values",
				lookup.category,
				lookup.attr_name,
				lookup.attr_value
			);
			sort_by_attribute(&mut records, &lookup.attr_name);
			Lookup::Many(records)
		}
	}
}

/// Shape the entries of a search, sorted by the search's order-by attribute.
#[must_use]
pub fn search(entries: Vec<SearchEntry>, search: &ObjectSearch) -> Vec<Record> {
	let mut records: Vec<Record> = entries
		.into_iter()
		.map(|entry| normalize(entry, search.category, &search.attributes))
		.collect();
	if records.is_empty() {
		tracing::debug!("No {} matches `{}`", search.category, search.attr_value);
	}
	sort_by_attribute(&mut records, &search.order_by);
	records
}

#[cfg(test)]
mod tests {
	#![allow(clippy::unwrap_used)]

	use std::collections::HashMap;

	use ldap3::SearchEntry;

	use super::{detail, normalize, search, Lookup};
	use crate::{
		attributes::AttributeSet,
		category::ObjectCategory,
		entry::Value,
		validate::{DetailRequest, SearchRequest},
	};

	fn entry(dn: &str, attrs: &[(&str, &[&str])]) -> SearchEntry {
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

	fn pairs(values: &[&str]) -> Value {
		Value::Pairs(values.iter().map(|value| ((*value).to_owned(), (*value).to_owned())).collect())
	}

	#[test]
	fn detail_not_found() {
		let lookup = DetailRequest::new("person", "mail", "nobody@example.com").validate().unwrap();
		assert_eq!(detail(Vec::new(), &lookup), Lookup::NotFound);
		assert!(!detail(Vec::new(), &lookup).is_found());
	}

	#[test]
	fn detail_single_match() {
		let lookup = DetailRequest::new("person", "mail", "bob@example.com").validate().unwrap();
		let result =
			detail(vec![entry("CN=Bob", &[("mail", &["bob@example.com"])])], &lookup).one().unwrap();
		assert_eq!(result.first("mail"), Some("bob@example.com"));
	}

	#[test]
	fn detail_ambiguous_match_is_sorted() {
		let lookup = DetailRequest::new("person", "sn", "x").validate().unwrap();
		let entries = vec![entry("CN=Bob", &[("sn", &["bob"])]), entry("CN=Alice", &[("sn", &["alice"])])];
		let Lookup::Many(records) = detail(entries, &lookup) else {
			panic!("expected several records");
		};
		let names: Vec<_> = records.iter().map(|record| record.first("sn").unwrap()).collect();
		assert_eq!(names, ["alice", "bob"]);
	}

	#[test]
	fn search_sorts_by_order_by() {
		let request = SearchRequest::new("person", "a").returned_attrs(["mail"]);
		let query = request.validate().unwrap();
		let entries = vec![
			entry("CN=C", &[("displayName", &["Carol"]), ("mail", &["c@example.com"])]),
			entry("CN=A", &[("displayName", &["Alice"])]),
			entry("CN=B", &[("displayName", &["Bob"])]),
		];
		let records = search(entries, &query);
		let names: Vec<_> = records.iter().map(|record| record.first("displayName").unwrap()).collect();
		assert_eq!(names, ["Alice", "Bob", "Carol"]);
		for record in &records {
			assert!(record.get("displayName").is_some());
			assert!(record.get("mail").is_some());
		}
	}

	#[test]
	fn search_without_sort_value_sorts_first() {
		let query = SearchRequest::new("computer", "WS").validate().unwrap();
		let records = search(vec![entry("CN=B", &[("cn", &["B"])]), entry("CN=none", &[])], &query);
		assert_eq!(records[0].dn, "CN=none");
		assert_eq!(records[0].get("cn"), Some(&Value::empty()));
		assert!(search(Vec::new(), &query).is_empty());
	}

	#[test]
	fn group_members_become_pairs() {
		let requested = AttributeSet::new(["member", "memberOf"], "sAMAccountName");
		let record = normalize(
			entry("CN=Admins", &[("member", &["dn1", "dn2"]), ("memberOf", &["dn3"])]),
			ObjectCategory::Group,
			&requested,
		);
		assert_eq!(record.get("member"), Some(&pairs(&["dn1", "dn2"])));
		assert_eq!(record.get("memberOf"), Some(&pairs(&["dn3"])));
	}

	#[test]
	fn group_without_members_has_empty_pairs() {
		let requested = AttributeSet::new(["member"], "sAMAccountName");
		let record = normalize(entry("CN=Empty", &[]), ObjectCategory::Group, &requested);
		assert_eq!(record.get("member"), Some(&Value::Pairs(Vec::new())));
	}

	#[test]
	fn persons_keep_member_of_lists() {
		let requested = AttributeSet::new(["memberOf"], "sAMAccountName");
		let record =
			normalize(entry("CN=Bob", &[("memberOf", &["dn1"])]), ObjectCategory::Person, &requested);
		assert_eq!(record.get("memberOf"), Some(&Value::Text("dn1".to_owned())));
	}
}

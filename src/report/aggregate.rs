/// Classification of raw record fields into grouped and flat collections.
///
/// Grouped fields carry a `"key: detail"` convention; everything before the
/// first separator names the project the detail belongs to.
use std::collections::HashMap;

use crate::report::record::Record;

/// Default separator between a group key and its detail.
pub const DEFAULT_SEPARATOR: char = ':';

/// Default prefix a blog reference must start with.
pub const DEFAULT_LINK_PREFIX: &str = "http";

/// Ordered, non-empty list of details sharing one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    key: String,
    details: Vec<String>,
}

impl Group {
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn details(&self) -> &[String] {
        &self.details
    }
}

/// Groups keyed by string, iterated in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMap {
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl GroupMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `detail` to the group `key`, creating the group if needed.
    pub fn push(&mut self, key: &str, detail: &str) {
        match self.index.get(key) {
            Some(&pos) => self.groups[pos].details.push(detail.to_string()),
            None => {
                self.index.insert(key.to_string(), self.groups.len());
                self.groups.push(Group {
                    key: key.to_string(),
                    details: vec![detail.to_string()],
                });
            },
        }
    }

    pub fn get(&self, key: &str) -> Option<&Group> {
        self.index.get(key).map(|&pos| &self.groups[pos])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    /// Groups in first-seen order, ready for pagination.
    #[inline]
    pub fn as_slice(&self) -> &[Group] {
        &self.groups
    }
}

impl<'a> IntoIterator for &'a GroupMap {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Ordered list of trimmed, non-empty strings.
pub type FlatList = Vec<String>;

/// Everything the report needs from one batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    /// Accomplishments by project
    pub work: GroupMap,
    /// Plans by project
    pub plans: GroupMap,
    pub learnings: FlatList,
    pub support: FlatList,
    pub insights: FlatList,
    pub blogs: FlatList,
}

/// Turns records into an [`Aggregate`].
///
/// Malformed fields are skipped, never reported: a grouped field without
/// the separator, an empty flat field or a blog reference that is not a
/// link simply does not appear in the output.
#[derive(Debug, Clone)]
pub struct Aggregator {
    separator: char,
    link_prefix: String,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            link_prefix: DEFAULT_LINK_PREFIX.to_string(),
        }
    }
}

impl Aggregator {
    pub fn new(separator: char, link_prefix: impl Into<String>) -> Self {
        Self {
            separator,
            link_prefix: link_prefix.into(),
        }
    }

    pub fn aggregate<'a, I>(&self, records: I) -> Aggregate
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut out = Aggregate::default();
        for record in records {
            self.push_grouped(&mut out.work, &record.accomplishment);
            self.push_grouped(&mut out.plans, &record.plan);
            push_flat(&mut out.learnings, &record.learning);
            push_flat(&mut out.support, &record.support);
            push_flat(&mut out.insights, &record.insight);

            let blog = record.blog.trim();
            if blog.starts_with(self.link_prefix.as_str()) {
                out.blogs.push(blog.to_string());
            }
        }
        out
    }

    fn push_grouped(&self, groups: &mut GroupMap, raw: &str) {
        if let Some((key, detail)) = raw.trim().split_once(self.separator) {
            groups.push(key.trim(), detail.trim());
        }
    }
}

fn push_flat(list: &mut FlatList, raw: &str) {
    let value = raw.trim();
    if !value.is_empty() {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn work(text: &str) -> Record {
        Record {
            accomplishment: text.to_string(),
            ..Record::default()
        }
    }

    #[test]
    fn test_groups_by_first_separator() {
        let records = [work("P1: did X"), work("P1: did Y"), work("P2: did Z")];
        let agg = Aggregator::default().aggregate(&records);

        let keys: Vec<&str> = agg.work.iter().map(Group::key).collect();
        assert_eq!(keys, ["P1", "P2"]);
        assert_eq!(agg.work.get("P1").unwrap().details(), ["did X", "did Y"]);
        assert_eq!(agg.work.get("P2").unwrap().details(), ["did Z"]);
    }

    #[test]
    fn test_detail_keeps_later_separators() {
        let records = [work("  Infra : deploy: done at 10:30 ")];
        let agg = Aggregator::default().aggregate(&records);
        assert_eq!(agg.work.get("Infra").unwrap().details(), ["deploy: done at 10:30"]);
    }

    #[test]
    fn test_malformed_fields_are_skipped() {
        let records = [
            Record {
                accomplishment: "no separator here".to_string(),
                learning: "   ".to_string(),
                plan: "P9: next".to_string(),
                support: "Rust: ownership".to_string(),
                insight: "listen first".to_string(),
                blog: "www.example.com".to_string(),
            },
            Record {
                blog: " https://blog.example.com/post ".to_string(),
                ..Record::default()
            },
        ];
        let agg = Aggregator::default().aggregate(&records);

        assert!(agg.work.is_empty());
        assert!(agg.learnings.is_empty());
        assert_eq!(agg.plans.len(), 1);
        assert_eq!(agg.support, ["Rust: ownership"]);
        assert_eq!(agg.insights, ["listen first"]);
        assert_eq!(agg.blogs, ["https://blog.example.com/post"]);
    }

    #[test]
    fn test_custom_separator() {
        let records = [work("P1 | a"), work("P1: b")];
        let agg = Aggregator::new('|', "http").aggregate(&records);
        assert_eq!(agg.work.len(), 1);
        assert_eq!(agg.work.get("P1").unwrap().details(), ["a"]);
    }

    proptest! {
        #[test]
        fn prop_every_detail_is_kept_in_order(
            entries in proptest::collection::vec((0u8..5, "[a-z ]{1,12}"), 0..40)
        ) {
            let records: Vec<Record> = entries
                .iter()
                .map(|(key, detail)| work(&format!("K{}:{}", key, detail)))
                .collect();
            let agg = Aggregator::default().aggregate(&records);

            let total: usize = agg.work.iter().map(|g| g.details().len()).sum();
            prop_assert_eq!(total, entries.len());
            for group in &agg.work {
                prop_assert!(!group.details().is_empty());
                let expected: Vec<String> = entries
                    .iter()
                    .filter(|(key, _)| format!("K{}", key) == group.key())
                    .map(|(_, detail)| detail.trim().to_string())
                    .collect();
                prop_assert_eq!(group.details(), expected.as_slice());
            }
        }
    }
}

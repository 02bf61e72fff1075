//! Data bags.
//!
//! A data bag is a named map of values the client sends back with every request
//! (`jxnbags`). Server code reads and updates bags; when anything changed, the
//! whole set is returned to the client with a single `bags.set` command.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The data bags of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataBags {
    bags: BTreeMap<String, Map<String, Value>>,
    dirty: bool,
}

impl DataBags {
    /// Load bags from the decoded `jxnbags` value.
    ///
    /// Entries that are not objects are ignored.
    pub fn from_value(value: Value) -> Self {
        let bags = match value {
            Value::Object(map) => map
                .into_iter()
                .filter_map(|(name, bag)| match bag {
                    Value::Object(bag) => Some((name, bag)),
                    _ => None,
                })
                .collect(),
            _ => BTreeMap::new(),
        };
        Self { bags, dirty: false }
    }

    /// Read a value from a bag.
    pub fn get(&self, bag: &str, key: &str) -> Option<&Value> {
        self.bags.get(bag).and_then(|b| b.get(key))
    }

    /// Write a value into a bag, creating the bag if needed.
    pub fn set(&mut self, bag: &str, key: &str, value: Value) {
        self.bags
            .entry(bag.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.dirty = true;
    }

    /// Remove every value of a bag.
    pub fn clear(&mut self, bag: &str) {
        if let Some(b) = self.bags.get_mut(bag) {
            b.clear();
            self.dirty = true;
        }
    }

    /// A whole bag.
    pub fn bag(&self, bag: &str) -> Option<&Map<String, Value>> {
        self.bags.get(bag)
    }

    /// Returns `true` if a bag was modified during this request.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// All bags as one JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.bags
                .iter()
                .map(|(name, bag)| (name.clone(), Value::Object(bag.clone())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_marks_dirty() {
        let mut bags = DataBags::from_value(json!({"user": {"id": 7}, "junk": 3}));
        assert_eq!(bags.get("user", "id"), Some(&json!(7)));
        assert!(bags.bag("junk").is_none());
        assert!(!bags.is_dirty());

        bags.set("user", "name", json!("ada"));
        assert!(bags.is_dirty());
        assert_eq!(bags.to_value(), json!({"user": {"id": 7, "name": "ada"}}));
    }

    #[test]
    fn test_clear_unknown_bag_is_noop() {
        let mut bags = DataBags::default();
        bags.clear("nothing");
        assert!(!bags.is_dirty());
    }
}

//! Round-trip metadata attached to ops.
//!
//! Metadata never influences numeric behavior, equality or cache identity.

use serde::{Deserialize, Serialize};

/// Identity and free-form description of an op, as read from a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatMetadata {
    /// Optional identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Optional human-readable name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Description lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<String>,
    /// Extra attributes as ordered key/value pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
}

impl FormatMetadata {
    /// Metadata with only an id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    /// Metadata with only a name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// True if nothing is set.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
            && self.name.is_empty()
            && self.descriptions.is_empty()
            && self.attributes.is_empty()
    }

    /// Looks up an attribute value by key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets (or replaces) an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Merges metadata of an op that is being fused into this one.
    ///
    /// Ids and names are joined with `" + "`, descriptions are appended, and
    /// attributes of `other` are added when the key is new.
    pub fn combine(&mut self, other: &FormatMetadata) {
        fn join(a: &mut String, b: &str) {
            if b.is_empty() {
                return;
            }
            if a.is_empty() {
                a.push_str(b);
            } else if a != b {
                a.push_str(" + ");
                a.push_str(b);
            }
        }
        join(&mut self.id, &other.id);
        join(&mut self.name, &other.name);
        self.descriptions.extend(other.descriptions.iter().cloned());
        for (k, v) in &other.attributes {
            if self.attribute(k).is_none() {
                self.attributes.push((k.clone(), v.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_joins_ids() {
        let mut a = FormatMetadata::with_id("a");
        let mut b = FormatMetadata::with_id("b");
        b.set_attribute("k", "v");
        a.combine(&b);
        assert_eq!(a.id, "a + b");
        assert_eq!(a.attribute("k"), Some("v"));
    }

    #[test]
    fn set_attribute_replaces() {
        let mut m = FormatMetadata::default();
        assert!(m.is_empty());
        m.set_attribute("k", "1");
        m.set_attribute("k", "2");
        assert_eq!(m.attributes.len(), 1);
        assert_eq!(m.attribute("k"), Some("2"));
    }
}

//! ---
//! spark_section: "03-persistence-logging"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block document storage backends."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! In-memory document table shared by every store backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Document, Result};

/// Ordered collection of JSON documents keyed by ascending id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    documents: BTreeMap<u64, Document>,
    dirty: bool,
}

/// On-disk layout: `{"_default": {"1": {...}, "2": {...}}}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TableFile {
    #[serde(rename = "_default", default)]
    documents: BTreeMap<u64, Document>,
}

impl Table {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the file representation. Blank input yields an empty table.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }
        let file: TableFile = serde_json::from_slice(bytes)?;
        Ok(Self {
            documents: file.documents,
            dirty: false,
        })
    }

    /// Serialize to the file representation.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let file = TableFile {
            documents: self.documents.clone(),
        };
        Ok(serde_json::to_vec(&file)?)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when no document is stored.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Every document in insertion order.
    pub fn all(&self) -> Vec<Document> {
        self.documents.values().cloned().collect()
    }

    /// Look up a document by id.
    pub fn get(&self, id: u64) -> Option<&Document> {
        self.documents.get(&id)
    }

    /// Documents where `doc[key] == value`.
    pub fn search(&self, key: &str, value: &Value) -> Vec<Document> {
        self.documents
            .values()
            .filter(|doc| matches(doc, key, value))
            .cloned()
            .collect()
    }

    /// Ids of the documents where `doc[key] == value`.
    pub fn ids_matching(&self, key: &str, value: &Value) -> Vec<u64> {
        self.documents
            .iter()
            .filter(|(_, doc)| matches(doc, key, value))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Whether any document has `doc[key] == value`.
    pub fn contains(&self, key: &str, value: &Value) -> bool {
        self.documents.values().any(|doc| matches(doc, key, value))
    }

    /// Append a document and return its id.
    pub fn insert(&mut self, doc: Document) -> u64 {
        let id = self.next_id();
        self.documents.insert(id, doc);
        self.dirty = true;
        id
    }

    /// Append several documents, returning their ids in order.
    pub fn insert_multiple(&mut self, docs: impl IntoIterator<Item = Document>) -> Vec<u64> {
        docs.into_iter().map(|doc| self.insert(doc)).collect()
    }

    /// Merge `fields` into every document where `doc[key] == value`.
    pub fn update(&mut self, fields: &Document, key: &str, value: &Value) -> Vec<u64> {
        let ids = self.ids_matching(key, value);
        for id in &ids {
            if let Some(doc) = self.documents.get_mut(id) {
                for (field, field_value) in fields {
                    doc.insert(field.clone(), field_value.clone());
                }
            }
        }
        if !ids.is_empty() {
            self.dirty = true;
        }
        ids
    }

    /// [`Table::update`], inserting `doc` when nothing matched.
    pub fn upsert(&mut self, doc: Document, key: &str, value: &Value) -> Vec<u64> {
        let ids = self.update(&doc, key, value);
        if ids.is_empty() {
            vec![self.insert(doc)]
        } else {
            ids
        }
    }

    /// Remove every document.
    pub fn purge(&mut self) {
        if !self.documents.is_empty() {
            self.documents.clear();
            self.dirty = true;
        }
    }

    /// Return and clear the modified flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn next_id(&self) -> u64 {
        self.documents
            .last_key_value()
            .map_or(1, |(id, _)| id + 1)
    }
}

fn matches(doc: &Document, key: &str, value: &Value) -> bool {
    doc.get(key) == Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn ids_start_at_one_and_ascend() {
        let mut table = Table::new();
        assert_eq!(table.insert(doc(json!({"a": 1}))), 1);
        assert_eq!(
            table.insert_multiple(vec![doc(json!({"a": 2})), doc(json!({"a": 3}))]),
            vec![2, 3]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(2), Some(&doc(json!({"a": 2}))));
    }

    #[test]
    fn update_merges_fields() {
        let mut table = Table::new();
        table.insert(doc(json!({"id": 1, "name": "a"})));
        table.insert(doc(json!({"id": 2, "name": "b"})));
        table.take_dirty();

        let updated = table.update(&doc(json!({"name": "c", "extra": true})), "id", &json!(2));
        assert_eq!(updated, vec![2]);
        assert!(table.take_dirty());
        assert_eq!(
            table.search("id", &json!(2)),
            vec![doc(json!({"id": 2, "name": "c", "extra": true}))]
        );

        assert!(table.update(&doc(json!({"x": 1})), "id", &json!(9)).is_empty());
        assert!(!table.take_dirty());
    }

    #[test]
    fn upsert_inserts_when_missing() {
        let mut table = Table::new();
        assert_eq!(table.upsert(doc(json!({"id": "x"})), "id", &json!("x")), vec![1]);
        assert_eq!(table.upsert(doc(json!({"id": "x", "v": 1})), "id", &json!("x")), vec![1]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn file_layout_uses_default_table() {
        let mut table = Table::new();
        table.insert(doc(json!({"service_id": "s1"})));
        let written: Value = serde_json::from_slice(&table.to_vec().unwrap()).unwrap();
        assert_eq!(written, json!({"_default": {"1": {"service_id": "s1"}}}));

        let reread = Table::from_slice(&table.to_vec().unwrap()).unwrap();
        assert_eq!(reread.all(), table.all());
        assert!(Table::from_slice(b"  \n").unwrap().is_empty());
        assert!(Table::from_slice(b"{}").unwrap().is_empty());
    }

    #[test]
    fn purge_of_empty_table_is_clean() {
        let mut table = Table::new();
        table.purge();
        assert!(!table.take_dirty());
        table.insert(doc(json!({})));
        table.purge();
        assert!(table.take_dirty());
        assert!(table.is_empty());
    }
}

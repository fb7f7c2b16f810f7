//! ---
//! spark_section: "03-persistence-logging"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block document storage backends."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! Block metadata records kept in a [`DataStore`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use spark_codec::ObjectType;
use tracing::debug;

use crate::{DataStore, DataStoreError, Document, Result};

const SERVICE_ID: &str = "service_id";

/// One block as remembered by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Name the block is known by.
    pub service_id: String,
    /// Codec object type of `obj`.
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    /// Block contents in their JSON form.
    pub obj: Value,
}

impl BlockRecord {
    /// Assemble a record.
    pub fn new(service_id: impl Into<String>, object_type: ObjectType, obj: Value) -> Self {
        Self {
            service_id: service_id.into(),
            object_type,
            obj,
        }
    }

    fn into_document(self) -> Result<Document> {
        match serde_json::to_value(self)? {
            Value::Object(doc) => Ok(doc),
            _ => Err(DataStoreError::Rejected(
                "block record did not serialize to an object".into(),
            )),
        }
    }

    fn from_document(doc: Document) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(doc))?)
    }
}

/// Typed access to block records, validated by the codec.
#[derive(Debug)]
pub struct BlockStore<S> {
    store: S,
}

impl<S: DataStore> BlockStore<S> {
    /// Wrap a document store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and upsert `record` by service id, returning what was stored.
    ///
    /// `obj` is stored in the normalized form produced by a codec round trip.
    /// PID blocks keep only their persisted fields.
    pub async fn save(&self, record: BlockRecord) -> Result<BlockRecord> {
        let encoded = spark_codec::encode(record.object_type, &record.obj)?;
        let view = if record.object_type == ObjectType::PID {
            ObjectType::PID_PERSISTED
        } else {
            record.object_type
        };
        let obj = spark_codec::decode(view, &encoded)?;
        let stored = BlockRecord { obj, ..record };

        let id = json!(stored.service_id);
        self.store
            .update_unique(SERVICE_ID, &id, stored.clone().into_document()?, None)
            .await?;
        debug!(service_id = %stored.service_id, object_type = %stored.object_type, "block saved");
        Ok(stored)
    }

    /// Record stored under `service_id`, if any.
    pub async fn load(&self, service_id: &str) -> Result<Option<BlockRecord>> {
        let id = json!(service_id);
        let mut found = self.store.find_by_key(SERVICE_ID, &id).await?;
        if found.len() > 1 {
            return Err(DataStoreError::MultipleMatches {
                key: SERVICE_ID.into(),
                value: id,
            });
        }
        found.pop().map(BlockRecord::from_document).transpose()
    }

    /// Codec-encoded bytes of the block stored under `service_id`.
    pub async fn encoded(&self, service_id: &str) -> Result<Option<Vec<u8>>> {
        match self.load(service_id).await? {
            Some(record) => Ok(Some(spark_codec::encode(record.object_type, &record.obj)?)),
            None => Ok(None),
        }
    }

    /// Every stored block record. Documents of another shape are skipped.
    pub async fn list(&self) -> Result<Vec<BlockRecord>> {
        let docs = self.store.all().await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            match BlockRecord::from_document(doc) {
                Ok(record) => records.push(record),
                Err(err) => debug!(error = %err, "skipping non-block document"),
            }
        }
        Ok(records)
    }
}

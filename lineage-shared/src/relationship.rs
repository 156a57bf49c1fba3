//! Canonical relationship entity and its identity hash.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use sha3::{Digest, Sha3_256};

use crate::value::TypedValue;

/// A directed lineage edge between two catalog entities.
///
/// Fields are private so the identity hash can never drift from the content
/// it was computed over.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    source_id: String,
    target_id: String,
    relationship_type: String,
    attributes: BTreeMap<String, TypedValue>,
    identity_hash: String,
}

impl Relationship {
    /// Build a relationship and compute its identity hash.
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_type: impl Into<String>,
        attributes: BTreeMap<String, TypedValue>,
    ) -> Self {
        let source_id = source_id.into();
        let target_id = target_id.into();
        let relationship_type = relationship_type.into();
        let identity_hash =
            identity_hash(&source_id, &target_id, &relationship_type, &attributes);

        Self {
            source_id,
            target_id,
            relationship_type,
            attributes,
            identity_hash,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn relationship_type(&self) -> &str {
        &self.relationship_type
    }

    pub fn attributes(&self) -> &BTreeMap<String, TypedValue> {
        &self.attributes
    }

    pub fn identity_hash(&self) -> &str {
        &self.identity_hash
    }

    /// JSON payload sent to the catalog.
    pub fn to_payload(&self) -> Value {
        let attributes: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        json!({
            "sourceId": self.source_id,
            "targetId": self.target_id,
            "relationshipType": self.relationship_type,
            "attributes": attributes,
            "identityHash": self.identity_hash,
        })
    }
}

/// Deterministic SHA3-256 fingerprint of a relationship's defining content.
///
/// Every component is length-prefixed so that no two distinct inputs share
/// an encoding. Attributes are visited in key order (the map is sorted).
pub fn identity_hash(
    source_id: &str,
    target_id: &str,
    relationship_type: &str,
    attributes: &BTreeMap<String, TypedValue>,
) -> String {
    let mut hasher = Sha3_256::new();
    write_component(&mut hasher, source_id);
    write_component(&mut hasher, target_id);
    write_component(&mut hasher, relationship_type);
    hasher.update((attributes.len() as u64).to_be_bytes());
    for (key, value) in attributes {
        write_component(&mut hasher, key);
        write_component(&mut hasher, &value.canonical());
    }
    hex::encode(hasher.finalize())
}

fn write_component(hasher: &mut Sha3_256, part: &str) {
    hasher.update((part.len() as u64).to_be_bytes());
    hasher.update(part.as_bytes());
}

//! Conversion of validated records into relationships.

use std::collections::BTreeMap;

use lineage_shared::{Relationship, TypedValue, ValidatedRecord};

const SOURCE_FIELD: &str = "source_entity_guid";
const TARGET_FIELD: &str = "target_entity_guid";
const TYPE_FIELD: &str = "relationship_type";

/// Turns a [`ValidatedRecord`] into a [`Relationship`].
///
/// The endpoint and type fields become the relationship's defining fields;
/// every other typed field becomes an attribute. Building is pure and cannot
/// fail: the validator already guaranteed the required fields are present and
/// typed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipBuilder;

impl RelationshipBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, record: ValidatedRecord) -> Relationship {
        let mut attributes = record.typed_fields;

        let source_id = take_canonical(&mut attributes, SOURCE_FIELD);
        let target_id = take_canonical(&mut attributes, TARGET_FIELD);
        let relationship_type = take_canonical(&mut attributes, TYPE_FIELD);

        Relationship::new(source_id, target_id, relationship_type, attributes)
    }
}

fn take_canonical(fields: &mut BTreeMap<String, TypedValue>, name: &str) -> String {
    fields
        .remove(name)
        .map(|value| value.canonical())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateKind;
    use crate::validator::RecordValidator;
    use lineage_shared::RawRecord;

    fn build(fields: &[(&str, &str)]) -> Relationship {
        let raw = RawRecord::new(0, fields.iter().copied());
        let validated = RecordValidator::new()
            .validate(&raw, &TemplateKind::BasicLineage.template())
            .unwrap();
        RelationshipBuilder::new().build(validated)
    }

    #[test]
    fn test_build_splits_defining_fields_from_attributes() {
        let rel = build(&[
            ("source_entity_guid", "6F1C2A4E-8D3B-4C5A-9E7F-0A1B2C3D4E5F"),
            ("target_entity_guid", "7a2d3b5f-9e4c-4d6b-8f0a-1b2c3d4e5f60"),
            ("relationship_type", "feeds"),
            ("owner", "data-eng"),
        ]);

        assert_eq!(rel.source_id(), "6f1c2a4e-8d3b-4c5a-9e7f-0a1b2c3d4e5f");
        assert_eq!(rel.target_id(), "7a2d3b5f-9e4c-4d6b-8f0a-1b2c3d4e5f60");
        assert_eq!(rel.relationship_type(), "feeds");
        assert_eq!(
            rel.attributes().keys().collect::<Vec<_>>(),
            vec!["confidence_score", "metadata", "owner"]
        );
    }

    #[test]
    fn test_equivalent_rows_share_identity() {
        let a = build(&[
            ("source_entity_guid", "6f1c2a4e-8d3b-4c5a-9e7f-0a1b2c3d4e5f"),
            ("target_entity_guid", "7a2d3b5f-9e4c-4d6b-8f0a-1b2c3d4e5f60"),
            ("relationship_type", "feeds"),
            ("metadata", r#"{"b":1,"a":2}"#),
        ]);
        let b = build(&[
            ("source_entity_guid", "6F1C2A4E-8D3B-4C5A-9E7F-0A1B2C3D4E5F"),
            ("target_entity_guid", "7a2d3b5f-9e4c-4d6b-8f0a-1b2c3d4e5f60"),
            ("relationship_type", "feeds"),
            ("confidence_score", "1.0"),
            ("metadata", r#"{ "a": 2, "b": 1 }"#),
        ]);
        let c = build(&[
            ("source_entity_guid", "6f1c2a4e-8d3b-4c5a-9e7f-0a1b2c3d4e5f"),
            ("target_entity_guid", "7a2d3b5f-9e4c-4d6b-8f0a-1b2c3d4e5f60"),
            ("relationship_type", "derives"),
        ]);

        assert_eq!(a.identity_hash(), b.identity_hash());
        assert_ne!(a.identity_hash(), c.identity_hash());
    }
}

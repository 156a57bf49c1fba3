//! Template-driven validation of raw records.

use std::collections::BTreeMap;

use lineage_shared::{RawRecord, TypedValue, ValidatedRecord};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ValidationError;
use crate::template::{FieldKind, Template};

/// Checks raw records against a template and types their fields.
///
/// Validation is fail-fast per row: the first problem found is returned and
/// no further fields are inspected. Required fields are checked first, then
/// present fields are coerced, both in template declaration order. Columns
/// the template does not declare are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordValidator;

impl RecordValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        raw: &RawRecord,
        template: &Template,
    ) -> Result<ValidatedRecord, ValidationError> {
        let row = raw.row_index;

        if let Some(field) = template
            .required_fields()
            .find(|field| raw.value(field).is_none())
        {
            return Err(ValidationError::missing(row, field));
        }

        let mut typed_fields = BTreeMap::new();
        for spec in template.fields() {
            match raw.value(spec.name) {
                Some(text) => {
                    let value = coerce(spec.kind, text)
                        .map_err(|reason| ValidationError::invalid(row, spec.name, reason))?;
                    typed_fields.insert(spec.name.to_string(), value);
                }
                None => {
                    if let Some(default) = spec.default_value() {
                        typed_fields.insert(spec.name.to_string(), default.clone());
                    }
                }
            }
        }

        Ok(ValidatedRecord::new(row, typed_fields))
    }
}

fn coerce(kind: FieldKind, text: &str) -> Result<TypedValue, String> {
    match kind {
        FieldKind::String => Ok(TypedValue::Text(text.to_string())),
        FieldKind::Score => {
            let value: f64 = text
                .parse()
                .map_err(|_| format!("not a number: '{}'", text))?;
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(format!("must be between 0 and 1, got {}", text));
            }
            // `-0` passes the range check; store it as `0`.
            Ok(TypedValue::Score(value + 0.0))
        }
        FieldKind::JsonObject => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(TypedValue::Json(map)),
            Ok(_) => Err("expected a JSON object".to_string()),
            Err(e) => Err(format!("invalid JSON: {}", e)),
        },
        FieldKind::Guid => Uuid::parse_str(text)
            .map(TypedValue::Guid)
            .map_err(|_| format!("not a valid GUID: '{}'", text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateKind;
    use serde_json::json;

    const SOURCE: &str = "6f1c2a4e-8d3b-4c5a-9e7f-0a1b2c3d4e5f";
    const TARGET: &str = "7a2d3b5f-9e4c-4d6b-8f0a-1b2c3d4e5f60";

    fn row(extra: &[(&str, &str)]) -> RawRecord {
        let mut fields = vec![
            ("source_entity_guid", SOURCE),
            ("target_entity_guid", TARGET),
            ("relationship_type", "feeds"),
        ];
        fields.extend_from_slice(extra);
        RawRecord::new(0, fields)
    }

    fn validate(raw: &RawRecord) -> Result<ValidatedRecord, ValidationError> {
        RecordValidator::new().validate(raw, &TemplateKind::BasicLineage.template())
    }

    #[test]
    fn test_valid_row_gets_defaults() {
        let record = validate(&row(&[("owner", " data-eng ")])).unwrap();

        assert_eq!(
            record.get("source_entity_guid"),
            Some(&TypedValue::Guid(Uuid::parse_str(SOURCE).unwrap()))
        );
        assert_eq!(record.get("owner"), Some(&TypedValue::Text("data-eng".into())));
        assert_eq!(record.get("confidence_score"), Some(&TypedValue::Score(1.0)));
        assert_eq!(record.get("metadata").map(|v| v.to_json()), Some(json!({})));
        assert_eq!(record.get("description"), None);
    }

    #[test]
    fn test_missing_required_field() {
        let raw = RawRecord::new(
            7,
            [("source_entity_guid", SOURCE), ("relationship_type", "  ")],
        );

        assert_eq!(
            validate(&raw),
            Err(ValidationError::missing(7, "target_entity_guid"))
        );
    }

    #[test]
    fn test_score_must_be_numeric_and_in_range() {
        let err = validate(&row(&[("confidence_score", "abc")])).unwrap_err();
        assert_eq!(err.field(), "confidence_score");
        assert!(err.to_string().contains("not a number"));

        for bad in ["1.5", "-0.1", "NaN", "inf"] {
            let err = validate(&row(&[("confidence_score", bad)])).unwrap_err();
            assert_eq!(err.field(), "confidence_score", "value {}", bad);
        }

        let record = validate(&row(&[("confidence_score", " 0.75 ")])).unwrap();
        assert_eq!(record.get("confidence_score"), Some(&TypedValue::Score(0.75)));
    }

    #[test]
    fn test_negative_zero_score_is_normalised() {
        let record = validate(&row(&[("confidence_score", "-0")])).unwrap();
        let score = record.get("confidence_score").and_then(|v| v.as_score()).unwrap();

        assert!(score.is_sign_positive());
        assert_eq!(record.get("confidence_score").unwrap().canonical(), "0");
    }

    #[test]
    fn test_metadata_must_be_object() {
        let err = validate(&row(&[("metadata", "[1,2]")])).unwrap_err();
        assert_eq!(err.field(), "metadata");

        let err = validate(&row(&[("metadata", "{not json")])).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));

        let record = validate(&row(&[("metadata", r#"{"job":"nightly"}"#)])).unwrap();
        assert_eq!(
            record.get("metadata").map(|v| v.to_json()),
            Some(json!({"job": "nightly"}))
        );
    }

    #[test]
    fn test_fail_fast_reports_first_error_only() {
        let raw = RawRecord::new(
            2,
            [
                ("source_entity_guid", "not-a-guid"),
                ("target_entity_guid", TARGET),
                ("relationship_type", "feeds"),
                ("confidence_score", "abc"),
            ],
        );

        let err = validate(&raw).unwrap_err();
        assert_eq!(err.field(), "source_entity_guid");
        assert_eq!(err.row(), 2);
    }

    #[test]
    fn test_unknown_columns_are_ignored() {
        let record = validate(&row(&[("colour", "blue")])).unwrap();
        assert_eq!(record.get("colour"), None);
    }
}

use std::fmt;
use std::str::FromStr;

use lineage_shared::TypedValue;
use serde_json::Map;

use crate::errors::SchemaError;

/// Type a field is coerced to during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    /// Float constrained to `[0, 1]`.
    Score,
    /// JSON text that must decode to an object.
    JsonObject,
    Guid,
}

/// Whether a field must be present, and what fills it in when it is not.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    Required,
    Optional(Option<TypedValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub requirement: Requirement,
}

impl FieldSpec {
    fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            requirement: Requirement::Required,
        }
    }

    fn optional(name: &'static str, kind: FieldKind, default: Option<TypedValue>) -> Self {
        Self {
            name,
            kind,
            requirement: Requirement::Optional(default),
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self.requirement, Requirement::Required)
    }

    pub fn default_value(&self) -> Option<&TypedValue> {
        match &self.requirement {
            Requirement::Optional(default) => default.as_ref(),
            Requirement::Required => None,
        }
    }
}

/// Known relationship row shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// A plain entity-to-entity lineage edge.
    BasicLineage,
    /// A lineage edge between two specific columns of the entities.
    ColumnMapping,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 2] = [TemplateKind::BasicLineage, TemplateKind::ColumnMapping];

    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::BasicLineage => "basic_lineage",
            TemplateKind::ColumnMapping => "column_mapping",
        }
    }

    /// The schema for this kind.
    pub fn template(self) -> Template {
        let mut fields = vec![
            FieldSpec::required("source_entity_guid", FieldKind::Guid),
            FieldSpec::required("target_entity_guid", FieldKind::Guid),
            FieldSpec::required("relationship_type", FieldKind::String),
        ];

        if self == TemplateKind::ColumnMapping {
            fields.push(FieldSpec::required("source_column", FieldKind::String));
            fields.push(FieldSpec::required("target_column", FieldKind::String));
        }

        fields.extend([
            FieldSpec::optional("process_name", FieldKind::String, None),
            FieldSpec::optional("description", FieldKind::String, None),
            FieldSpec::optional(
                "confidence_score",
                FieldKind::Score,
                Some(TypedValue::Score(1.0)),
            ),
            FieldSpec::optional("owner", FieldKind::String, None),
            FieldSpec::optional(
                "metadata",
                FieldKind::JsonObject,
                Some(TypedValue::Json(Map::new())),
            ),
        ]);

        if self == TemplateKind::ColumnMapping {
            fields.push(FieldSpec::optional("transformation", FieldKind::String, None));
        }

        Template { kind: self, fields }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TemplateKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| SchemaError::TemplateNotFound(s.to_string()))
    }
}

/// A named, immutable schema for one class of relationship rows.
///
/// Fields are kept in declaration order, which is also the order the
/// validator checks them in.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    kind: TemplateKind,
    fields: Vec<FieldSpec>,
}

impl Template {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.is_required())
            .map(|f| f.name)
    }

    /// Optional fields with their defaults (`None` when the field has none).
    pub fn optional_fields(&self) -> impl Iterator<Item = (&'static str, Option<&TypedValue>)> + '_ {
        self.fields
            .iter()
            .filter(|f| !f.is_required())
            .map(|f| (f.name, f.default_value()))
    }

    pub fn field_type(&self, name: &str) -> Option<FieldKind> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_lineage_shape() {
        let template = TemplateKind::BasicLineage.template();

        assert_eq!(template.name(), "basic_lineage");
        assert_eq!(
            template.required_fields().collect::<Vec<_>>(),
            vec!["source_entity_guid", "target_entity_guid", "relationship_type"]
        );
        assert_eq!(template.field_type("confidence_score"), Some(FieldKind::Score));
        assert_eq!(template.field_type("metadata"), Some(FieldKind::JsonObject));
        assert_eq!(template.field_type("source_column"), None);

        let defaults: Vec<_> = template
            .optional_fields()
            .filter_map(|(name, default)| default.map(|d| (name, d.clone())))
            .collect();
        assert_eq!(
            defaults,
            vec![
                ("confidence_score", TypedValue::Score(1.0)),
                ("metadata", TypedValue::Json(Map::new())),
            ]
        );
    }

    #[test]
    fn test_column_mapping_extends_basic_lineage() {
        let template = TemplateKind::ColumnMapping.template();
        let required: Vec<_> = template.required_fields().collect();

        assert_eq!(required.len(), 5);
        assert!(required.contains(&"source_column"));
        assert!(required.contains(&"target_column"));
        assert_eq!(template.field_type("transformation"), Some(FieldKind::String));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            "column_mapping".parse::<TemplateKind>(),
            Ok(TemplateKind::ColumnMapping)
        );
        assert_eq!(TemplateKind::BasicLineage.to_string(), "basic_lineage");
        assert_eq!(
            "BasicLineage".parse::<TemplateKind>(),
            Err(SchemaError::TemplateNotFound("BasicLineage".into()))
        );
    }
}

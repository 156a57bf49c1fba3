use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::schema::{Template, TemplateKind};
use crate::errors::SchemaError;

/// Read-only lookup of templates by name.
///
/// Populated once at startup; templates are shared as `Arc` so concurrent
/// validation never copies them.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<&'static str, Arc<Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in template.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in TemplateKind::ALL {
            registry.templates.insert(kind.name(), Arc::new(kind.template()));
        }
        registry
    }

    pub fn register(&mut self, kind: TemplateKind) -> Result<(), SchemaError> {
        if self.templates.contains_key(kind.name()) {
            return Err(SchemaError::DuplicateTemplate(kind.name().to_string()));
        }
        debug!(template = kind.name(), "Registered template");
        self.templates.insert(kind.name(), Arc::new(kind.template()));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<Template>, SchemaError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::TemplateNotFound(name.to_string()))
    }

    /// Registered template names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.templates.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

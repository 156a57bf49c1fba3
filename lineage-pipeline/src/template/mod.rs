//! Relationship templates.
//!
//! A template declares which input columns a class of relationship rows
//! requires, which are optional (with defaults), and how each is typed.
//! Templates form a closed set ([`TemplateKind`]) so validation stays
//! exhaustive; add a variant to support a new row shape.

mod registry;
mod schema;

pub use registry::TemplateRegistry;
pub use schema::{FieldKind, FieldSpec, Requirement, Template, TemplateKind};

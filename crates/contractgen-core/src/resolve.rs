//! `$ref` resolution against `components.schemas`
//!
//! Resolution is a single hop and never fails: a ref with a foreign prefix or
//! naming an absent schema comes back unchanged and is treated as opaque.

use crate::document::{OpenApiDocument, Schema};

/// The only ref form that resolves.
pub const COMPONENT_SCHEMA_PREFIX: &str = "#/components/schemas/";

impl OpenApiDocument {
    /// Resolve one level of `$ref`.
    ///
    /// - `None` → `None`
    /// - inline schema → itself
    /// - `#/components/schemas/<name>` with `<name>` present → that schema
    /// - anything else → the original node
    #[must_use]
    pub fn resolve<'s>(&'s self, schema: Option<&'s Schema>) -> Option<&'s Schema> {
        let schema = schema?;
        let Schema::Ref(reference) = schema else {
            return Some(schema);
        };
        let target = reference
            .strip_prefix(COMPONENT_SCHEMA_PREFIX)
            .and_then(|name| self.components.schemas.get(name));
        Some(target.unwrap_or(schema))
    }
}

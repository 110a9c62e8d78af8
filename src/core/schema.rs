use crate::core::fields::{Field, FieldKind};
use crate::utils::error::{MarshalError, Result};
use crate::utils::validation::validate_non_empty_string;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

// Helper functions ///////////////////////////////////////////////////////////

/// Prefixes substituted when a declared field name is turned into its output
/// key. Lets schemas declare keys like `@id` or `#text` that attribute-style
/// names cannot spell.
const MANGLE_PREFIXES: &[(&str, &str)] = &[
    ("at__", "@"),
    ("hash__", "#"),
    ("dash__", "-"),
    ("dot__", "."),
];

/// Output key for a declared field name.
///
/// Only the first matching prefix is substituted, and only when a non-empty
/// remainder follows it; everything else (leading underscores, non-ASCII
/// names, a bare prefix) passes through unchanged.
pub fn mangle_name(name: &str) -> String {
    for (prefix, replacement) in MANGLE_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            if !rest.is_empty() {
                return format!("{}{}", replacement, rest);
            }
        }
    }
    name.to_string()
}

/// Copy of `fields` with the named fields removed; unknown names are an
/// error.
pub(crate) fn fields_exclude(
    fields: &IndexMap<String, Field>,
    remove: &[String],
) -> Result<IndexMap<String, Field>> {
    ensure_known_fields(fields, remove, "exclude")?;
    Ok(fields
        .iter()
        .filter(|(name, _)| !remove.contains(name))
        .map(|(name, field)| (name.clone(), field.clone()))
        .collect())
}

/// Copy of `fields` containing only the named fields, in the order they were
/// named; unknown names are an error.
pub(crate) fn fields_only(
    fields: &IndexMap<String, Field>,
    keep: &[String],
) -> Result<IndexMap<String, Field>> {
    ensure_known_fields(fields, keep, "only")?;
    Ok(keep
        .iter()
        .map(|name| (name.clone(), fields[name].clone()))
        .collect())
}

fn ensure_known_fields(
    fields: &IndexMap<String, Field>,
    names: &[String],
    context: &str,
) -> Result<()> {
    let unknown: Vec<&str> = names
        .iter()
        .filter(|name| !fields.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(MarshalError::SelectionError {
            message: format!("{} names unknown field(s): {}", context, unknown.join(", ")),
        });
    }
    Ok(())
}

// Schema //////////////////////////////////////////////////////////////////////

/// A named, immutable set of field declarations in declaration order.
///
/// Schemas are assembled through [`SchemaBuilder`] and shared behind an
/// `Arc`; dumping goes through a compiled
/// [`Marshaller`](crate::core::marshaller::Marshaller).
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: IndexMap<String, Field>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            base_fields: IndexMap::new(),
            own_fields: IndexMap::new(),
            include: IndexMap::new(),
            exclude: Vec::new(),
            only: None,
        }
    }

    /// Build a schema from a sample object, mapping each value to its
    /// natural field kind.
    pub fn infer_from(name: impl Into<String>, sample: &Value) -> Result<Arc<Schema>> {
        let obj = sample.as_object().ok_or_else(|| MarshalError::SchemaError {
            message: "can only infer a schema from a JSON object".to_string(),
        })?;
        let mut builder = Schema::builder(name);
        for (key, value) in obj {
            builder = builder.field(key, Field::new(FieldKind::infer(value)));
        }
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &IndexMap<String, Field> {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Assembles a [`Schema`] from base schemas, declared fields and field
/// selection, with the same precedence rules throughout: bases supplied
/// first win among themselves, declared fields override bases, included
/// fields override everything except declared fields (that collision is an
/// error, since both were given explicitly).
pub struct SchemaBuilder {
    name: String,
    base_fields: IndexMap<String, Field>,
    own_fields: IndexMap<String, Field>,
    include: IndexMap<String, Field>,
    exclude: Vec<String>,
    only: Option<Vec<String>>,
}

impl SchemaBuilder {
    /// Inherit the fields of a base schema. May be called repeatedly; the
    /// first base to declare a name keeps it.
    pub fn extends(mut self, base: &Schema) -> Self {
        for (name, field) in base.fields() {
            self.base_fields
                .entry(name.clone())
                .or_insert_with(|| field.clone());
        }
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.own_fields.insert(name.into(), field);
        self
    }

    /// Additional fields, e.g. built dynamically.
    pub fn include(mut self, fields: IndexMap<String, Field>) -> Self {
        self.include.extend(fields);
        self
    }

    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect();
        self.only = Some(names);
        self
    }

    pub fn build(self) -> Result<Arc<Schema>> {
        validate_non_empty_string("schema name", &self.name).map_err(|_| {
            MarshalError::SchemaError {
                message: "schema name cannot be empty".to_string(),
            }
        })?;

        if !self.exclude.is_empty() && self.only.is_some() {
            return Err(MarshalError::SelectionError {
                message: "cannot specify exclude and only at the same time".to_string(),
            });
        }

        let ambiguous: Vec<&str> = self
            .include
            .keys()
            .filter(|name| self.own_fields.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if !ambiguous.is_empty() {
            return Err(MarshalError::SchemaError {
                message: format!(
                    "field(s) declared and included at the same time: {}",
                    ambiguous.join(", ")
                ),
            });
        }

        let mut fields = self.base_fields;
        for (name, field) in self.own_fields {
            fields.insert(name, field);
        }
        for (name, field) in self.include {
            fields.insert(name, field);
        }

        if fields.keys().any(|name| name.is_empty()) {
            return Err(MarshalError::SchemaError {
                message: "field names cannot be empty".to_string(),
            });
        }

        if !self.exclude.is_empty() {
            fields = fields_exclude(&fields, &self.exclude)?;
        } else if let Some(only) = &self.only {
            fields = fields_only(&fields, only)?;
        }

        Ok(Arc::new(Schema {
            name: self.name,
            fields,
        }))
    }
}

use crate::core::fields::{Field, FieldKind, ValueSource};
use crate::core::schema::{fields_exclude, fields_only, mangle_name, Schema};
use crate::domain::model::{MarshalFormat, Marshalled};
use crate::utils::error::{MarshalError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Per-marshaller counterparts of the schema-level selection knobs, plus the
/// dump shape.
#[derive(Debug, Clone, Default)]
pub struct MarshalOptions {
    pub exclude: Vec<String>,
    pub only: Option<Vec<String>>,
    pub include: Option<IndexMap<String, Field>>,
    pub many: bool,
    pub format: MarshalFormat,
}

impl MarshalOptions {
    pub fn is_customized(&self) -> bool {
        !self.exclude.is_empty()
            || self.only.is_some()
            || self.include.is_some()
            || self.many
            || self.format != MarshalFormat::Dict
    }
}

#[derive(Debug, Clone)]
struct PlannedField {
    name: String,
    key: String,
    // never `Name`: resolved to an attribute lookup at compile time
    source: ValueSource,
    kind: FieldKind,
}

/// A schema compiled against [`MarshalOptions`].
///
/// Field selection, output keys and value sources are all resolved once
/// here, so [`dump`](Marshaller::dump) walks a flat plan and does no
/// per-field configuration work.
#[derive(Debug, Clone)]
pub struct Marshaller {
    schema: Arc<Schema>,
    plan: Vec<PlannedField>,
    many: bool,
    format: MarshalFormat,
}

impl Marshaller {
    pub fn new(schema: Arc<Schema>) -> Result<Self> {
        Self::with_options(schema, MarshalOptions::default())
    }

    pub fn with_options(schema: Arc<Schema>, options: MarshalOptions) -> Result<Self> {
        if !options.exclude.is_empty() && options.only.is_some() {
            return Err(MarshalError::SelectionError {
                message: "cannot specify exclude and only at the same time".to_string(),
            });
        }

        let mut fields = schema.fields().clone();
        if let Some(include) = options.include {
            fields.extend(include);
        }
        if !options.exclude.is_empty() {
            fields = fields_exclude(&fields, &options.exclude)?;
        } else if let Some(only) = &options.only {
            fields = fields_only(&fields, only)?;
        }

        let mut seen_keys = HashSet::new();
        let mut plan = Vec::with_capacity(fields.len());
        for (name, field) in &fields {
            let key = mangle_name(name);
            if !seen_keys.insert(key.clone()) {
                return Err(MarshalError::SchemaError {
                    message: format!(
                        "schema '{}': field '{}' renders to duplicate output key '{}'",
                        schema.name(),
                        name,
                        key
                    ),
                });
            }
            let source = match field.source() {
                ValueSource::Name => ValueSource::Attr(name.clone()),
                other => other.clone(),
            };
            plan.push(PlannedField {
                name: name.clone(),
                key,
                source,
                kind: field.kind().clone(),
            });
        }

        Ok(Self {
            schema,
            plan,
            many: options.many,
            format: options.format,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn many(&self) -> bool {
        self.many
    }

    pub fn format(&self) -> MarshalFormat {
        self.format
    }

    /// Output keys in dump order.
    pub fn keys(&self) -> Vec<&str> {
        self.plan.iter().map(|pf| pf.key.as_str()).collect()
    }

    /// Marshal `obj`, honoring the configured `many`.
    pub fn dump<T: Serialize>(&self, obj: &T) -> Result<Marshalled> {
        let value = serde_json::to_value(obj)?;
        self.marshal(&value, self.many)
    }

    /// Marshal one object regardless of the configured `many`.
    pub fn dump_single<T: Serialize>(&self, obj: &T) -> Result<Marshalled> {
        let value = serde_json::to_value(obj)?;
        self.marshal(&value, false)
    }

    /// Marshal a collection regardless of the configured `many`.
    pub fn dump_many<T: Serialize>(&self, obj: &T) -> Result<Marshalled> {
        let value = serde_json::to_value(obj)?;
        self.marshal(&value, true)
    }

    pub fn dump_value<T: Serialize>(&self, obj: &T) -> Result<Value> {
        self.dump(obj).map(Marshalled::into_value)
    }

    /// Marshal an already-serialized value to a plain JSON value. This is
    /// the path embedded fields take.
    pub(crate) fn marshal_value(&self, value: &Value) -> Result<Value> {
        self.marshal(value, self.many).map(Marshalled::into_value)
    }

    fn marshal(&self, value: &Value, many: bool) -> Result<Marshalled> {
        if many {
            let items = value.as_array().ok_or_else(|| MarshalError::ProcessingError {
                message: format!(
                    "schema '{}': many-dump expects a JSON array",
                    self.schema.name()
                ),
            })?;
            let dumped = items
                .iter()
                .map(|item| self.dump_object(item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Marshalled::Many(dumped))
        } else {
            self.dump_object(value)
        }
    }

    fn dump_object(&self, value: &Value) -> Result<Marshalled> {
        let obj = value.as_object().ok_or_else(|| MarshalError::ProcessingError {
            message: format!(
                "schema '{}': can only marshal JSON objects",
                self.schema.name()
            ),
        })?;

        match self.format {
            MarshalFormat::Dict => {
                let mut map = Map::new();
                for pf in &self.plan {
                    map.insert(pf.key.clone(), self.field_value(pf, value, obj)?);
                }
                Ok(Marshalled::Dict(map))
            }
            MarshalFormat::OrderedDict => {
                let mut map = IndexMap::with_capacity(self.plan.len());
                for pf in &self.plan {
                    map.insert(pf.key.clone(), self.field_value(pf, value, obj)?);
                }
                Ok(Marshalled::OrderedDict(map))
            }
            MarshalFormat::Tuples => {
                let mut pairs = Vec::with_capacity(self.plan.len());
                for pf in &self.plan {
                    pairs.push((pf.key.clone(), self.field_value(pf, value, obj)?));
                }
                Ok(Marshalled::Tuples(pairs))
            }
            MarshalFormat::List => {
                let mut values = Vec::with_capacity(self.plan.len());
                for pf in &self.plan {
                    values.push(self.field_value(pf, value, obj)?);
                }
                Ok(Marshalled::List(values))
            }
        }
    }

    fn field_value(
        &self,
        pf: &PlannedField,
        whole: &Value,
        obj: &Map<String, Value>,
    ) -> Result<Value> {
        let raw = match &pf.source {
            ValueSource::Attr(attr) => {
                obj.get(attr)
                    .cloned()
                    .ok_or_else(|| MarshalError::DumpError {
                        field: pf.name.clone(),
                        reason: format!("object has no attribute '{}'", attr),
                    })?
            }
            ValueSource::Name => {
                obj.get(&pf.name)
                    .cloned()
                    .ok_or_else(|| MarshalError::DumpError {
                        field: pf.name.clone(),
                        reason: format!("object has no attribute '{}'", pf.name),
                    })?
            }
            ValueSource::Getter(getter) => getter(whole)?,
            ValueSource::Constant(constant) => constant.clone(),
        };
        pf.kind.pack(&pf.name, raw)
    }
}

use crate::core::marshaller::{MarshalOptions, Marshaller};
use crate::core::registry;
use crate::core::schema::Schema;
use crate::utils::error::{MarshalError, Result};
use crate::utils::validation::ensure_identifier;
use chrono::{DateTime, NaiveDate};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type Getter = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Where a field's raw value comes from. `Name` means "the attribute with
/// the same name as the field"; the marshaller resolves it at compile time.
#[derive(Clone, Default)]
pub enum ValueSource {
    #[default]
    Name,
    Attr(String),
    Getter(Getter),
    Constant(Value),
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Name => write!(f, "Name"),
            ValueSource::Attr(attr) => f.debug_tuple("Attr").field(attr).finish(),
            ValueSource::Getter(_) => write!(f, "Getter(..)"),
            ValueSource::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Any,
    Boolean,
    Integer,
    Float,
    Str,
    Date,
    DateTime,
    Embed(Embed),
}

impl FieldKind {
    /// Field kind for a sample value, for building schemas from example
    /// records.
    pub fn infer(value: &Value) -> FieldKind {
        match value {
            Value::Bool(_) => FieldKind::Boolean,
            Value::Number(n) if n.is_f64() => FieldKind::Float,
            Value::Number(_) => FieldKind::Integer,
            Value::String(_) => FieldKind::Str,
            _ => FieldKind::Any,
        }
    }

    pub(crate) fn pack(&self, field: &str, val: Value) -> Result<Value> {
        match self {
            FieldKind::Any
            | FieldKind::Boolean
            | FieldKind::Integer
            | FieldKind::Float
            | FieldKind::Str => Ok(val),
            FieldKind::Date => pack_date(field, val),
            FieldKind::DateTime => pack_datetime(field, val),
            FieldKind::Embed(embed) => embed.pack(field, val),
        }
    }
}

// Dates are normalized rather than passed through, so a record carrying a
// malformed date fails at dump time instead of leaking downstream.
fn pack_date(field: &str, val: Value) -> Result<Value> {
    match val {
        Value::Null => Ok(Value::Null),
        Value::String(s) => {
            let date: NaiveDate = s.parse().map_err(|e| MarshalError::DumpError {
                field: field.to_string(),
                reason: format!("invalid date {:?}: {}", s, e),
            })?;
            Ok(Value::String(date.format("%Y-%m-%d").to_string()))
        }
        other => Err(MarshalError::DumpError {
            field: field.to_string(),
            reason: format!("expected a date string, got {}", other),
        }),
    }
}

fn pack_datetime(field: &str, val: Value) -> Result<Value> {
    match val {
        Value::Null => Ok(Value::Null),
        Value::String(s) => {
            let dt = DateTime::parse_from_rfc3339(&s).map_err(|e| MarshalError::DumpError {
                field: field.to_string(),
                reason: format!("invalid datetime {:?}: {}", s, e),
            })?;
            Ok(Value::String(dt.to_rfc3339()))
        }
        other => Err(MarshalError::DumpError {
            field: field.to_string(),
            reason: format!("expected a datetime string, got {}", other),
        }),
    }
}

/// One entry of a schema: a value source plus a packing rule.
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    source: ValueSource,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            source: ValueSource::Name,
        }
    }

    pub fn any() -> Self {
        Self::new(FieldKind::Any)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    pub fn float() -> Self {
        Self::new(FieldKind::Float)
    }

    pub fn string() -> Self {
        Self::new(FieldKind::Str)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn datetime() -> Self {
        Self::new(FieldKind::DateTime)
    }

    pub fn embed(embed: Embed) -> Self {
        Self::new(FieldKind::Embed(embed))
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn source(&self) -> &ValueSource {
        &self.source
    }

    /// Read the value from a differently-named attribute.
    pub fn attr(self, attr: impl Into<String>) -> Result<Self> {
        let attr = attr.into();
        ensure_identifier("attr", &attr)?;
        self.with_source(ValueSource::Attr(attr))
    }

    /// Compute the value from the whole serialized object.
    pub fn getter(self, f: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static) -> Result<Self> {
        self.with_source(ValueSource::Getter(Arc::new(f)))
    }

    /// A constant value, never read from the object.
    pub fn constant(self, value: impl Into<Value>) -> Result<Self> {
        self.with_source(ValueSource::Constant(value.into()))
    }

    fn with_source(mut self, source: ValueSource) -> Result<Self> {
        if !matches!(self.source, ValueSource::Name) {
            return Err(MarshalError::SchemaError {
                message: "attr, getter and constant are mutually exclusive".to_string(),
            });
        }
        self.source = source;
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub enum EmbedTarget {
    Name(String),
    Schema(Arc<Schema>),
    Marshaller(Arc<Marshaller>),
}

/// Embeds linked object(s) marshalled by another schema.
///
/// A target given by name is resolved against the registry the first time it
/// is dumped, so schemas may embed schemas defined later, including
/// themselves.
#[derive(Debug, Clone)]
pub struct Embed {
    target: EmbedTarget,
    options: MarshalOptions,
    resolved: OnceCell<Arc<Marshaller>>,
}

impl Embed {
    pub fn new(target: EmbedTarget, options: MarshalOptions) -> Result<Self> {
        if matches!(target, EmbedTarget::Marshaller(_)) && options.is_customized() {
            return Err(MarshalError::SchemaError {
                message: "options cannot accompany an already-built marshaller".to_string(),
            });
        }
        Ok(Self {
            target,
            options,
            resolved: OnceCell::new(),
        })
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::by_name_with(name, MarshalOptions::default())
    }

    pub fn by_name_with(name: impl Into<String>, options: MarshalOptions) -> Self {
        Self {
            target: EmbedTarget::Name(name.into()),
            options,
            resolved: OnceCell::new(),
        }
    }

    pub fn of_schema(schema: Arc<Schema>) -> Self {
        Self::of_schema_with(schema, MarshalOptions::default())
    }

    pub fn of_schema_with(schema: Arc<Schema>, options: MarshalOptions) -> Self {
        Self {
            target: EmbedTarget::Schema(schema),
            options,
            resolved: OnceCell::new(),
        }
    }

    pub fn of_marshaller(marshaller: Arc<Marshaller>) -> Self {
        Self {
            target: EmbedTarget::Marshaller(marshaller),
            options: MarshalOptions::default(),
            resolved: OnceCell::new(),
        }
    }

    fn resolve(&self) -> Result<&Arc<Marshaller>> {
        self.resolved.get_or_try_init(|| match &self.target {
            EmbedTarget::Name(name) => {
                let schema = registry::lookup(name)?;
                Ok(Arc::new(Marshaller::with_options(
                    schema,
                    self.options.clone(),
                )?))
            }
            EmbedTarget::Schema(schema) => Ok(Arc::new(Marshaller::with_options(
                schema.clone(),
                self.options.clone(),
            )?)),
            EmbedTarget::Marshaller(marshaller) => Ok(marshaller.clone()),
        })
    }

    fn pack(&self, field: &str, val: Value) -> Result<Value> {
        if val.is_null() {
            return Ok(Value::Null);
        }
        let marshaller = self.resolve()?;
        marshaller.marshal_value(&val).map_err(|e| match e {
            e @ MarshalError::DumpError { .. } => e,
            other => MarshalError::DumpError {
                field: field.to_string(),
                reason: other.to_string(),
            },
        })
    }
}

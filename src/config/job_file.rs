use crate::core::engine::{DataSource, OutputFormat};
use crate::core::fields::{Embed, Field};
use crate::core::marshaller::{MarshalOptions, Marshaller};
use crate::core::registry;
use crate::core::schema::Schema;
use crate::domain::model::MarshalFormat;
use crate::utils::error::{MarshalError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_url, Validate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A TOML job file: one marshalling job plus the schemas it needs.
///
/// Schema tables keep their file order, so `extends` may reference any
/// schema defined above (or one registered from code beforehand); embedded
/// schemas resolve lazily and may point anywhere in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFile {
    pub job: JobConfig,
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub description: Option<String>,
    pub schema: String,
    pub source: SourceSpec,
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub many: Option<bool>,
    pub format: Option<MarshalFormat>,
    pub exclude: Option<Vec<String>>,
    pub only: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    pub r#type: String,
    pub endpoint: Option<String>,
    pub path: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSpec {
    #[serde(default)]
    pub extends: Vec<String>,
    pub fields: IndexMap<String, FieldSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub r#type: Option<String>,
    pub attr: Option<String>,
    #[serde(rename = "const")]
    pub constant: Option<Value>,
    pub schema: Option<String>,
    pub many: Option<bool>,
    pub exclude: Option<Vec<String>>,
    pub only: Option<Vec<String>>,
}

impl JobFile {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: JobFile = toml::from_str(&content)?;
        Ok(file)
    }

    /// Build and register every schema the file defines, in file order.
    pub fn register_schemas(&self) -> Result<()> {
        for (name, spec) in &self.schemas {
            let schema = build_schema(name, spec)?;
            registry::register(schema)?;
        }
        Ok(())
    }

    pub fn build_marshaller(&self) -> Result<Arc<Marshaller>> {
        let schema = registry::lookup(&self.job.schema)?;
        let options = MarshalOptions {
            exclude: self.job.exclude.clone().unwrap_or_default(),
            only: self.job.only.clone(),
            include: None,
            // collection handling is the pipeline's concern, see `many()`
            many: false,
            format: self.job.format.unwrap_or_default(),
        };
        Ok(Arc::new(Marshaller::with_options(schema, options)?))
    }

    pub fn data_source(&self) -> Result<DataSource> {
        match self.job.source.r#type.as_str() {
            "api" => {
                let endpoint = self.job.source.endpoint.as_ref().ok_or_else(|| {
                    MarshalError::MissingConfigError {
                        field: "job.source.endpoint".to_string(),
                    }
                })?;
                Ok(DataSource::Endpoint(endpoint.clone()))
            }
            "file" => {
                let path = self.job.source.path.as_ref().ok_or_else(|| {
                    MarshalError::MissingConfigError {
                        field: "job.source.path".to_string(),
                    }
                })?;
                Ok(DataSource::File(path.clone()))
            }
            other => Err(MarshalError::InvalidConfigValueError {
                field: "job.source.type".to_string(),
                value: other.to_string(),
                reason: "expected 'api' or 'file'".to_string(),
            }),
        }
    }

    pub fn output_formats(&self) -> Vec<OutputFormat> {
        self.job
            .output_formats
            .iter()
            .filter_map(|format| {
                let parsed = OutputFormat::parse(format);
                if parsed.is_none() {
                    tracing::warn!("🔶 Unsupported output format: {}", format);
                }
                parsed
            })
            .collect()
    }

    pub fn many(&self) -> bool {
        self.job.many.unwrap_or(false)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.job.source.timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for JobFile {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("job.name", &self.job.name)?;
        validate_non_empty_string("job.schema", &self.job.schema)?;

        match self.job.source.r#type.as_str() {
            "api" => {
                let endpoint = self.job.source.endpoint.as_deref().ok_or_else(|| {
                    MarshalError::MissingConfigError {
                        field: "job.source.endpoint".to_string(),
                    }
                })?;
                validate_url("job.source.endpoint", endpoint)?;
            }
            "file" => {
                let path = self.job.source.path.as_deref().ok_or_else(|| {
                    MarshalError::MissingConfigError {
                        field: "job.source.path".to_string(),
                    }
                })?;
                validate_path("job.source.path", path)?;
            }
            other => {
                return Err(MarshalError::InvalidConfigValueError {
                    field: "job.source.type".to_string(),
                    value: other.to_string(),
                    reason: "expected 'api' or 'file'".to_string(),
                });
            }
        }

        validate_path("job.output_path", &self.job.output_path)?;

        if self.job.output_formats.is_empty() {
            return Err(MarshalError::MissingConfigError {
                field: "job.output_formats".to_string(),
            });
        }
        for format in &self.job.output_formats {
            if OutputFormat::parse(format).is_none() {
                return Err(MarshalError::InvalidConfigValueError {
                    field: "job.output_formats".to_string(),
                    value: format.clone(),
                    reason: "expected 'json' or 'csv'".to_string(),
                });
            }
        }

        let excludes = self.job.exclude.as_ref().is_some_and(|e| !e.is_empty());
        if excludes && self.job.only.is_some() {
            return Err(MarshalError::SelectionError {
                message: "job cannot specify exclude and only at the same time".to_string(),
            });
        }

        Ok(())
    }
}

fn build_schema(name: &str, spec: &SchemaSpec) -> Result<Arc<Schema>> {
    let mut builder = Schema::builder(name);
    for base_name in &spec.extends {
        let base = registry::lookup(base_name)?;
        builder = builder.extends(&base);
    }
    for (field_name, field_spec) in &spec.fields {
        builder = builder.field(field_name, build_field(field_name, field_spec)?);
    }
    builder.build()
}

fn build_field(name: &str, spec: &FieldSpec) -> Result<Field> {
    let kind = spec.r#type.as_deref().unwrap_or("any");
    let mut field = match kind {
        "any" => Field::any(),
        "boolean" => Field::boolean(),
        "integer" => Field::integer(),
        "float" => Field::float(),
        "string" => Field::string(),
        "date" => Field::date(),
        "datetime" => Field::datetime(),
        "embed" => {
            let target =
                spec.schema
                    .as_ref()
                    .ok_or_else(|| MarshalError::MissingConfigError {
                        field: format!("fields.{}.schema", name),
                    })?;
            let options = MarshalOptions {
                exclude: spec.exclude.clone().unwrap_or_default(),
                only: spec.only.clone(),
                include: None,
                many: spec.many.unwrap_or(false),
                format: MarshalFormat::Dict,
            };
            Field::embed(Embed::by_name_with(target, options))
        }
        other => {
            return Err(MarshalError::InvalidConfigValueError {
                field: format!("fields.{}.type", name),
                value: other.to_string(),
                reason:
                    "expected one of: any, boolean, integer, float, string, date, datetime, embed"
                        .to_string(),
            });
        }
    };

    if let Some(attr) = &spec.attr {
        field = field.attr(attr.clone())?;
    }
    if let Some(constant) = &spec.constant {
        field = field.constant(constant.clone())?;
    }
    Ok(field)
}

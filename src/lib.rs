pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::cli::LocalStorage;
pub use crate::config::job_file::JobFile;
pub use crate::core::engine::{DataSource, Engine, MarshalPipeline, OutputFormat};
pub use crate::core::fields::{Embed, EmbedTarget, Field, FieldKind, ValueSource};
pub use crate::core::marshaller::{MarshalOptions, Marshaller};
pub use crate::core::registry;
pub use crate::core::schema::{mangle_name, Schema, SchemaBuilder};
pub use crate::domain::model::{MarshalBatch, MarshalFormat, Marshalled, Record};
pub use crate::utils::error::{MarshalError, Result};

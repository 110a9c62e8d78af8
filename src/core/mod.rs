pub mod engine;
pub mod fields;
pub mod marshaller;
pub mod registry;
pub mod schema;

pub use crate::domain::model::{MarshalBatch, MarshalFormat, Marshalled, Record};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;

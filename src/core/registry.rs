use crate::core::schema::Schema;
use crate::utils::error::{MarshalError, Result};
use once_cell::sync::Lazy;
use std::{collections::HashMap, sync::Arc, sync::RwLock};

use tracing::debug;

static SCHEMA_REGISTRY: Lazy<RwLock<HashMap<String, Arc<Schema>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a schema under its name so embedded fields can reference it
/// before it is in scope (or reference the schema being defined itself).
///
/// Re-registering the identical schema is a no-op; a different schema under
/// an existing name is an error.
pub fn register(schema: Arc<Schema>) -> Result<()> {
    let name = schema.name().to_string();
    let mut registry = SCHEMA_REGISTRY.write().unwrap();
    if let Some(existing) = registry.get(&name) {
        if Arc::ptr_eq(existing, &schema) {
            return Ok(());
        }
        return Err(MarshalError::DuplicateSchemaError { name });
    }
    debug!("Registering schema: {}", name);
    registry.insert(name, schema);
    Ok(())
}

pub fn lookup(name: &str) -> Result<Arc<Schema>> {
    SCHEMA_REGISTRY
        .read()
        .unwrap()
        .get(name)
        .cloned()
        .ok_or_else(|| MarshalError::UnknownSchemaError {
            name: name.to_string(),
        })
}

pub fn registered_names() -> Vec<String> {
    let mut names: Vec<String> = SCHEMA_REGISTRY.read().unwrap().keys().cloned().collect();
    names.sort();
    names
}

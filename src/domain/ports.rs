use crate::domain::model::{MarshalBatch, Record};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Record>>;
    fn marshal(&self, records: Vec<Record>) -> Result<MarshalBatch>;
    async fn write(&self, batch: MarshalBatch) -> Result<String>;
}

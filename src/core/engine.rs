use crate::core::marshaller::Marshaller;
use crate::domain::model::{MarshalBatch, Marshalled, Record};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{MarshalError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Runs a pipeline's three stages with progress logging.
pub struct Engine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> Engine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("📥 Fetching records...");
        let records = self.pipeline.fetch().await?;
        tracing::info!("📥 Fetched {} records", records.len());

        tracing::info!("🔄 Marshalling records...");
        let batch = self.pipeline.marshal(records)?;
        tracing::info!("🔄 Marshalled {} records", batch.records.len());

        tracing::info!("💾 Writing output...");
        let output_path = self.pipeline.write(batch).await?;
        tracing::info!("💾 Output saved to: {}", output_path);

        Ok(output_path)
    }
}

#[derive(Debug, Clone)]
pub enum DataSource {
    Endpoint(String),
    File(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

/// The stock pipeline: fetch JSON records from an HTTP endpoint or a file,
/// marshal them through one schema, write JSON/CSV artifacts.
pub struct MarshalPipeline<S: Storage> {
    name: String,
    source: DataSource,
    marshaller: Arc<Marshaller>,
    storage: S,
    output_path: String,
    formats: Vec<OutputFormat>,
    many: bool,
    timeout: Option<Duration>,
    client: Client,
}

impl<S: Storage> MarshalPipeline<S> {
    pub fn new(
        name: String,
        source: DataSource,
        marshaller: Arc<Marshaller>,
        storage: S,
        output_path: String,
    ) -> Self {
        Self {
            name,
            source,
            marshaller,
            storage,
            output_path,
            formats: vec![OutputFormat::Json],
            many: false,
            timeout: None,
            client: Client::new(),
        }
    }

    pub fn with_formats(mut self, formats: Vec<OutputFormat>) -> Self {
        self.formats = formats;
        self
    }

    /// Marshal the fetched records as one collection instead of one by one.
    pub fn with_many(mut self, many: bool) -> Self {
        self.many = many;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn fetch_api_records(&self, endpoint: &str) -> Result<Vec<Record>> {
        let mut request = self.client.get(endpoint);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!("📡 {}: Making API request to: {}", self.name, endpoint);
        let response = request.send().await?;
        tracing::debug!("📡 {}: API response status: {}", self.name, response.status());

        if !response.status().is_success() {
            let error_msg = format!("API request failed with status: {}", response.status());
            tracing::error!("❌ {}: {}", self.name, error_msg);
            return Err(MarshalError::ProcessingError { message: error_msg });
        }

        let json_data: Value = response.json().await?;
        Ok(records_from_value(json_data))
    }

    fn render_csv(&self, records: &[Marshalled]) -> Result<String> {
        let keys = self.marshaller.keys();
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&keys)?;

        for record in records {
            let row: Vec<String> = match record {
                Marshalled::List(values) => values.iter().map(csv_cell).collect(),
                other => keys
                    .iter()
                    .map(|key| other.get(key).map(csv_cell).unwrap_or_default())
                    .collect(),
            };
            writer.write_record(&row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| MarshalError::ProcessingError {
                message: format!("CSV rendering failed: {}", e),
            })?;
        String::from_utf8(bytes).map_err(|e| MarshalError::ProcessingError {
            message: format!("CSV rendering produced invalid UTF-8: {}", e),
        })
    }
}

/// API responses come in three shapes: an array of objects, a single
/// object, or something else entirely (wrapped under a "response" key).
fn records_from_value(value: Value) -> Vec<Record> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(obj) => Some(Record::from(obj)),
                _ => None,
            })
            .collect(),
        Value::Object(obj) => vec![Record::from(obj)],
        other => {
            let mut data = HashMap::new();
            data.insert("response".to_string(), other);
            vec![Record { data }]
        }
    }
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl<S: Storage> Pipeline for MarshalPipeline<S> {
    async fn fetch(&self) -> Result<Vec<Record>> {
        match &self.source {
            DataSource::Endpoint(endpoint) => self.fetch_api_records(endpoint).await,
            DataSource::File(path) => {
                let bytes = self.storage.read_file(path).await?;
                let json_data: Value = serde_json::from_slice(&bytes)?;
                Ok(records_from_value(json_data))
            }
        }
    }

    fn marshal(&self, records: Vec<Record>) -> Result<MarshalBatch> {
        let marshalled: Vec<Marshalled> = if self.many {
            match self.marshaller.dump_many(&records)? {
                Marshalled::Many(items) => items,
                other => vec![other],
            }
        } else {
            records
                .iter()
                .map(|record| self.marshaller.dump_single(record))
                .collect::<Result<_>>()?
        };

        let json_output = serde_json::to_string_pretty(&marshalled)?;
        let csv_output = if self.formats.contains(&OutputFormat::Csv) {
            Some(self.render_csv(&marshalled)?)
        } else {
            None
        };

        Ok(MarshalBatch {
            records: marshalled,
            json_output,
            csv_output,
        })
    }

    async fn write(&self, batch: MarshalBatch) -> Result<String> {
        if self.formats.contains(&OutputFormat::Json) {
            self.storage
                .write_file("output.json", batch.json_output.as_bytes())
                .await?;
        }
        if let Some(csv_output) = &batch.csv_output {
            self.storage
                .write_file("output.csv", csv_output.as_bytes())
                .await?;
        }
        Ok(format!("{}/output.json", self.output_path))
    }
}

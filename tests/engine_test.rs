use anyhow::Result;
use httpmock::prelude::*;
use marsh::utils::validation::Validate;
use marsh::{
    DataSource, Engine, Field, JobFile, LocalStorage, MarshalPipeline, Marshaller, OutputFormat,
    Schema,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn person_marshaller(name: &str) -> Arc<Marshaller> {
    let schema = Schema::builder(name)
        .field("name", Field::string())
        .field("number", Field::integer())
        .field("born", Field::date().attr("birth_date").unwrap())
        .build()
        .unwrap();
    Arc::new(Marshaller::new(schema).unwrap())
}

#[tokio::test]
async fn test_end_to_end_api_run() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/people");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!([
                {"name": "Bedevere", "number": 2, "birth_date": "0502-02-02", "secret": "x"},
                {"name": "Lancelot", "number": 3, "birth_date": "0503-03-03", "secret": "y"}
            ]));
    });

    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let pipeline = MarshalPipeline::new(
        "api_run".to_string(),
        DataSource::Endpoint(server.url("/people")),
        person_marshaller("engine_test.ApiPersonSchema"),
        LocalStorage::new(output_path.clone()),
        output_path.clone(),
    )
    .with_formats(vec![OutputFormat::Json, OutputFormat::Csv]);

    let result_path = Engine::new(pipeline).run().await?;

    api_mock.assert();
    assert_eq!(result_path, format!("{}/output.json", output_path));

    let json_text = std::fs::read_to_string(temp_dir.path().join("output.json"))?;
    let parsed: serde_json::Value = serde_json::from_str(&json_text)?;
    assert_eq!(
        parsed,
        json!([
            {"name": "Bedevere", "number": 2, "born": "0502-02-02"},
            {"name": "Lancelot", "number": 3, "born": "0503-03-03"}
        ])
    );

    let csv_text = std::fs::read_to_string(temp_dir.path().join("output.csv"))?;
    let lines: Vec<&str> = csv_text.lines().collect();
    assert_eq!(lines[0], "name,number,born");
    assert_eq!(lines[1], "Bedevere,2,0502-02-02");
    assert_eq!(lines[2], "Lancelot,3,0503-03-03");

    Ok(())
}

#[tokio::test]
async fn test_api_failure_is_an_error() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/people");
        then.status(500);
    });

    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let pipeline = MarshalPipeline::new(
        "failing_run".to_string(),
        DataSource::Endpoint(server.url("/people")),
        person_marshaller("engine_test.FailingPersonSchema"),
        LocalStorage::new(output_path.clone()),
        output_path,
    );

    let result = Engine::new(pipeline).run().await;

    api_mock.assert();
    assert!(result.is_err());

    Ok(())
}

#[tokio::test]
async fn test_single_object_response() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/person");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"name": "Arthur", "number": 1, "birth_date": "0501-01-01"}));
    });

    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let pipeline = MarshalPipeline::new(
        "single_run".to_string(),
        DataSource::Endpoint(server.url("/person")),
        person_marshaller("engine_test.SinglePersonSchema"),
        LocalStorage::new(output_path.clone()),
        output_path,
    );

    Engine::new(pipeline).run().await?;

    api_mock.assert();
    let json_text = std::fs::read_to_string(temp_dir.path().join("output.json"))?;
    let parsed: serde_json::Value = serde_json::from_str(&json_text)?;
    assert_eq!(
        parsed,
        json!([{"name": "Arthur", "number": 1, "born": "0501-01-01"}])
    );

    Ok(())
}

#[tokio::test]
async fn test_job_file_driven_run() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/knights");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!([
                {"name": "Galahad", "number": 4, "birth_date": "0504-04-04"}
            ]));
    });

    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");

    let config_content = format!(
        r#"
[job]
name = "knights"
schema = "engine_test.JobPersonSchema"
output_path = "{}"
output_formats = ["json"]

[job.source]
type = "api"
endpoint = "{}"

[schemas."engine_test.JobPersonSchema".fields]
name = {{ type = "string" }}
number = {{ type = "integer" }}
born = {{ type = "date", attr = "birth_date" }}
"#,
        output_path,
        server.url("/knights")
    );

    let config_path = temp_dir.path().join("job.toml");
    std::fs::write(&config_path, config_content)?;

    let job_file = JobFile::from_file(&config_path)?;
    job_file.validate()?;
    job_file.register_schemas()?;

    let pipeline = MarshalPipeline::new(
        job_file.job.name.clone(),
        job_file.data_source()?,
        job_file.build_marshaller()?,
        LocalStorage::new(output_path.clone()),
        output_path.clone(),
    )
    .with_formats(job_file.output_formats())
    .with_many(job_file.many());

    Engine::new(pipeline).run().await?;

    api_mock.assert();
    let json_text = std::fs::read_to_string(temp_dir.path().join("output.json"))?;
    let parsed: serde_json::Value = serde_json::from_str(&json_text)?;
    assert_eq!(
        parsed,
        json!([{"name": "Galahad", "number": 4, "born": "0504-04-04"}])
    );

    Ok(())
}

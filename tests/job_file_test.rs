use anyhow::Result;
use marsh::utils::validation::Validate;
use marsh::JobFile;
use serde_json::json;
use tempfile::TempDir;

fn write_job_file(temp_dir: &TempDir, content: &str) -> String {
    let path = temp_dir.path().join("job.toml");
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_load_register_and_dump() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = write_job_file(
        &temp_dir,
        r#"
[job]
name = "people"
description = "Marshal people records"
schema = "job_file_test.PersonSchema"
output_path = "./output"
output_formats = ["json", "csv"]
format = "ordered_dict"

[job.source]
type = "file"
path = "people.json"

[schemas."job_file_test.PersonSchema".fields]
title = { type = "string" }
name = { type = "string" }
born = { type = "date", attr = "birth_date" }
source = { type = "string", const = "import" }
"#,
    );

    let job_file = JobFile::from_file(&config_path)?;
    job_file.validate()?;
    job_file.register_schemas()?;

    let marshaller = job_file.build_marshaller()?;
    assert_eq!(marshaller.keys(), vec!["title", "name", "born", "source"]);

    let dumped = marshaller.dump_value(&json!({
        "title": "King",
        "name": "Arthur",
        "birth_date": "0501-01-01",
        "ignored": true
    }))?;
    assert_eq!(
        dumped,
        json!({
            "title": "King",
            "name": "Arthur",
            "born": "0501-01-01",
            "source": "import"
        })
    );

    Ok(())
}

#[test]
fn test_embed_between_file_schemas() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = write_job_file(
        &temp_dir,
        r#"
[job]
name = "books"
schema = "job_file_test.BookSchema"
output_path = "./output"
output_formats = ["json"]

[job.source]
type = "file"
path = "books.json"

[schemas."job_file_test.BookSchema".fields]
title = { type = "string" }
author = { type = "embed", schema = "job_file_test.AuthorSchema", only = ["name"] }

[schemas."job_file_test.AuthorSchema".fields]
name = { type = "string" }
email = { type = "string" }
"#,
    );

    let job_file = JobFile::from_file(&config_path)?;
    job_file.validate()?;
    job_file.register_schemas()?;

    let marshaller = job_file.build_marshaller()?;
    let dumped = marshaller.dump_value(&json!({
        "title": "Le Morte d'Arthur",
        "author": {"name": "Thomas Malory", "email": "malory@example.com"}
    }))?;
    assert_eq!(
        dumped,
        json!({
            "title": "Le Morte d'Arthur",
            "author": {"name": "Thomas Malory"}
        })
    );

    Ok(())
}

#[test]
fn test_extends_earlier_file_schema() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = write_job_file(
        &temp_dir,
        r#"
[job]
name = "knights"
schema = "job_file_test.KnightSchema"
output_path = "./output"
output_formats = ["json"]

[job.source]
type = "file"
path = "knights.json"

[schemas."job_file_test.NamedSchema".fields]
name = { type = "string" }

[schemas."job_file_test.KnightSchema"]
extends = ["job_file_test.NamedSchema"]

[schemas."job_file_test.KnightSchema".fields]
rank = { type = "string" }
"#,
    );

    let job_file = JobFile::from_file(&config_path)?;
    job_file.validate()?;
    job_file.register_schemas()?;

    let marshaller = job_file.build_marshaller()?;
    assert_eq!(marshaller.keys(), vec!["name", "rank"]);

    Ok(())
}

#[test]
fn test_invalid_endpoint_url_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = write_job_file(
        &temp_dir,
        r#"
[job]
name = "people"
schema = "job_file_test.SomeSchema"
output_path = "./output"
output_formats = ["json"]

[job.source]
type = "api"
endpoint = "ftp://example.com/people"
"#,
    );

    let job_file = JobFile::from_file(&config_path)?;
    assert!(job_file.validate().is_err());

    Ok(())
}

#[test]
fn test_mangled_names_in_file_schemas() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = write_job_file(
        &temp_dir,
        r#"
[job]
name = "linked-data"
schema = "job_file_test.LinkedSchema"
output_path = "./output"
output_formats = ["json"]

[job.source]
type = "file"
path = "input.json"

[schemas."job_file_test.LinkedSchema".fields]
at__id = { type = "string", attr = "id" }
name = { type = "string" }
"#,
    );

    let job_file = JobFile::from_file(&config_path)?;
    job_file.validate()?;
    job_file.register_schemas()?;

    let marshaller = job_file.build_marshaller()?;
    let dumped = marshaller.dump_value(&json!({"id": "thing-1", "name": "Thing"}))?;
    assert_eq!(dumped, json!({"@id": "thing-1", "name": "Thing"}));

    Ok(())
}

use marsh::{registry, Embed, Field, MarshalOptions, Marshaller, Schema};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Serialize, Clone)]
struct Knight {
    title: String,
    name: String,
}

#[derive(Serialize)]
struct King {
    title: String,
    name: String,
    subjects: Vec<Knight>,
}

fn arthur() -> King {
    King {
        title: "King".to_string(),
        name: "Arthur".to_string(),
        subjects: vec![
            Knight {
                title: "Sir".to_string(),
                name: "Bedevere".to_string(),
            },
            Knight {
                title: "Sir".to_string(),
                name: "Lancelot".to_string(),
            },
            Knight {
                title: "Sir".to_string(),
                name: "Galahad".to_string(),
            },
        ],
    }
}

fn knight_schema(name: &str) -> Arc<Schema> {
    Schema::builder(name)
        .field("name", Field::string())
        .build()
        .unwrap()
}

fn expected_court() -> serde_json::Value {
    json!({
        "title": "King",
        "name": "Arthur",
        "subjects": [
            {"name": "Bedevere"},
            {"name": "Lancelot"},
            {"name": "Galahad"},
        ]
    })
}

fn many() -> MarshalOptions {
    MarshalOptions {
        many: true,
        ..Default::default()
    }
}

#[test]
fn test_embed_by_name() {
    let knights = knight_schema("embed_test.KnightSchema");
    registry::register(knights.clone()).unwrap();

    let king_schema = Schema::builder("embed_test.KingSchemaByName")
        .extends(&knights)
        .field("title", Field::string())
        .field(
            "subjects",
            Field::embed(Embed::by_name_with("embed_test.KnightSchema", many())),
        )
        .build()
        .unwrap();
    let marshaller = Marshaller::new(king_schema).unwrap();

    assert_eq!(marshaller.dump_value(&arthur()).unwrap(), expected_court());
}

#[test]
fn test_embed_by_schema() {
    let knights = knight_schema("embed_test.UnregisteredKnightSchema");

    let king_schema = Schema::builder("embed_test.KingSchemaBySchema")
        .extends(&knights)
        .field("title", Field::string())
        .field(
            "subjects",
            Field::embed(Embed::of_schema_with(knights.clone(), many())),
        )
        .build()
        .unwrap();
    let marshaller = Marshaller::new(king_schema).unwrap();

    assert_eq!(marshaller.dump_value(&arthur()).unwrap(), expected_court());
}

#[test]
fn test_embed_by_marshaller() {
    let knights = knight_schema("embed_test.MarshalledKnightSchema");
    let knight_marshaller = Arc::new(Marshaller::with_options(knights.clone(), many()).unwrap());

    let king_schema = Schema::builder("embed_test.KingSchemaByMarshaller")
        .extends(&knights)
        .field("title", Field::string())
        .field(
            "subjects",
            Field::embed(Embed::of_marshaller(knight_marshaller)),
        )
        .build()
        .unwrap();
    let marshaller = Marshaller::new(king_schema).unwrap();

    assert_eq!(marshaller.dump_value(&arthur()).unwrap(), expected_court());
}

#[test]
fn test_embed_self_referential() {
    let schema = Schema::builder("embed_test.SelfReferentialKingSchema")
        .field("name", Field::string())
        .field(
            "boss",
            Field::embed(Embed::by_name_with(
                "embed_test.SelfReferentialKingSchema",
                MarshalOptions {
                    exclude: vec!["boss".to_string()],
                    ..Default::default()
                },
            )),
        )
        .build()
        .unwrap();
    registry::register(schema.clone()).unwrap();
    let marshaller = Marshaller::new(schema).unwrap();

    // the king is his own boss
    let king = json!({"name": "Arthur", "boss": {"name": "Arthur"}});
    assert_eq!(
        marshaller.dump_value(&king).unwrap(),
        json!({"name": "Arthur", "boss": {"name": "Arthur"}})
    );
}

#[test]
fn test_embed_null_value() {
    let knights = knight_schema("embed_test.NullableKnightSchema");
    let schema = Schema::builder("embed_test.NullBossSchema")
        .field("name", Field::string())
        .field("boss", Field::embed(Embed::of_schema(knights)))
        .build()
        .unwrap();
    let marshaller = Marshaller::new(schema).unwrap();

    assert_eq!(
        marshaller
            .dump_value(&json!({"name": "Arthur", "boss": null}))
            .unwrap(),
        json!({"name": "Arthur", "boss": null})
    );
}

#[test]
fn test_embed_unknown_name_fails_at_dump_time() {
    let schema = Schema::builder("embed_test.DanglingEmbedSchema")
        .field("name", Field::string())
        .field(
            "boss",
            Field::embed(Embed::by_name("embed_test.NeverRegisteredSchema")),
        )
        .build()
        .unwrap();
    // building the marshaller is fine; the reference is resolved lazily
    let marshaller = Marshaller::new(schema).unwrap();

    assert!(marshaller
        .dump(&json!({"name": "Arthur", "boss": {"name": "Arthur"}}))
        .is_err());
}

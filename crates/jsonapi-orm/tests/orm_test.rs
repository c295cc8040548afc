use jsonapi_orm::mock::MockTransport;
use jsonapi_orm::value::decode;
use jsonapi_orm::{
    ApiConfig, ApiModel, Document, Method, Model, ModelDecl, ModelType, OrmApi, OrmError,
    RelationValue, TransportError,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

struct Fixture {
    mock: Arc<MockTransport>,
    orm: Arc<OrmApi>,
}

impl Fixture {
    fn new() -> Self {
        let mock = Arc::new(MockTransport::new());
        let orm = OrmApi::new(mock.clone(), ApiConfig::new("http://localhost/api"));
        Self { mock, orm }
    }

    fn register(&self, decl: ModelDecl) -> Arc<ModelType> {
        self.orm.register(decl).unwrap()
    }

    fn tests(&self) -> Arc<ModelType> {
        self.register(
            ModelDecl::new("test")
                .attribute("name", "name")
                .relation("other", "other"),
        )
    }

    fn designs(&self) -> Arc<ModelType> {
        self.register(
            ModelDecl::new("designs")
                .attribute("name", "name")
                .attribute("status", "status")
                .relation("sub_designs", "sub_designs")
                .relation("others", "others"),
        )
    }
}

fn document(raw: Value) -> Document {
    decode(&raw).unwrap()
}

#[test]
fn test_empty_declaration() {
    let fixture = Fixture::new();
    let empty = fixture.register(ModelDecl::new("empty"));
    assert!(empty.fields().is_empty());
    assert!(fixture.orm.registry().contains("empty"));
}

#[test]
fn test_duplicate_registration_fails() {
    let fixture = Fixture::new();
    fixture.register(ModelDecl::new("articles"));
    let err = fixture.orm.register(ModelDecl::new("articles")).unwrap_err();
    assert!(matches!(err, OrmError::DuplicateType(tag) if tag == "articles"));
}

struct Post(Model);

impl ApiModel for Post {
    const TYPE: &'static str = "posts";

    fn declare() -> ModelDecl {
        ModelDecl::new("articles").attribute("title", "title")
    }

    fn from_model(model: Model) -> Self {
        Post(model)
    }

    fn model(&self) -> &Model {
        &self.0
    }
}

#[test]
fn test_typed_registration_checks_type_tag() {
    let fixture = Fixture::new();
    let err = fixture.orm.register_model::<Post>().unwrap_err();
    assert!(matches!(
        err,
        OrmError::TypeTagMismatch { expected, declared } if expected == "posts" && declared == "articles"
    ));
    assert!(fixture.orm.registry().is_empty());
}

#[tokio::test]
async fn test_refresh() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    fixture.mock.expect(Method::Get, "test/123").return_ok(
        200,
        json!({"data": {"type": "test", "id": "123", "attributes": {"name": "alice"}}}),
    );

    let test = tests.from_id("123");
    assert!(test.is_stub());
    test.refresh().await.unwrap();

    assert!(!test.is_stub());
    assert_eq!(test.attribute("name").await.unwrap(), json!("alice"));
    assert_eq!(
        fixture.mock.last_request().unwrap().url,
        "http://localhost/api/test/123"
    );
    fixture.mock.verify();
}

#[tokio::test]
async fn test_refresh_with_relationships() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    fixture.mock.expect(Method::Get, "test/123").return_ok(
        200,
        json!({
            "data": {
                "type": "test",
                "id": "123",
                "relationships": {"other": {"data": {"type": "test", "id": "1"}}}
            },
            "included": [{"type": "test", "id": "1", "attributes": {"name": "alice"}}]
        }),
    );

    let test = tests.from_id("123");
    test.refresh().await.unwrap();

    let other = test.to_one("other").await.unwrap().unwrap();
    assert!(!other.is_stub());
    assert_eq!(other.attribute("name").await.unwrap(), json!("alice"));
    fixture.mock.verify();
}

#[tokio::test]
async fn test_stub_loads_on_first_attribute_access() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    fixture.mock.expect_get("test/7").return_ok(
        200,
        json!({"data": {"type": "test", "id": "7", "attributes": {"name": "carol"}}}),
    );

    let test = tests.from_id("7");
    assert_eq!(test.id().as_deref(), Some("7"));
    assert_eq!(fixture.mock.requests().len(), 0);

    assert_eq!(test.attribute("name").await.unwrap(), json!("carol"));
    assert_eq!(test.attribute("name").await.unwrap(), json!("carol"));
    assert_eq!(fixture.mock.requests().len(), 1);
    fixture.mock.verify();
}

#[tokio::test]
async fn test_refresh_upgrades_cached_stub_in_place() {
    let fixture = Fixture::new();
    let articles = fixture.register(
        ModelDecl::new("articles")
            .attribute("title", "title")
            .to_one("author", "author"),
    );
    fixture.register(ModelDecl::new("people").attribute("name", "name"));
    let content = document(json!({
        "data": {
            "type": "articles",
            "id": "1",
            "relationships": {"author": {"data": {"type": "people", "id": "9"}}}
        }
    }));

    let article = articles.from_document(&content).unwrap().unwrap();
    let author = article.to_one("author").await.unwrap().unwrap();
    assert!(author.is_stub());

    fixture.mock.expect_get("articles/1").return_ok(
        200,
        json!({
            "data": {
                "type": "articles",
                "id": "1",
                "attributes": {"title": "JSON API paints my bikeshed!"},
                "relationships": {"author": {"data": {"type": "people", "id": "9"}}}
            },
            "included": [{"type": "people", "id": "9", "attributes": {"name": "Dan"}}]
        }),
    );
    article.refresh().await.unwrap();

    assert!(!author.is_stub());
    assert_eq!(author.attribute("name").await.unwrap(), json!("Dan"));
    assert_eq!(article.to_one("author").await.unwrap(), Some(author));
    fixture.mock.verify();
}

#[tokio::test]
async fn test_from_document_with_relationships() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    let content = document(json!({
        "data": {
            "type": "test",
            "id": "5",
            "relationships": {"other": {"data": {"type": "test", "id": "1"}}}
        },
        "included": [{"type": "test", "id": "1", "attributes": {"name": "alice"}}]
    }));

    let test = tests.from_document(&content).unwrap().unwrap();
    let other = test.to_one("other").await.unwrap().unwrap();
    assert_eq!(other.attribute("name").await.unwrap(), json!("alice"));
    assert!(fixture.mock.requests().is_empty());
}

#[tokio::test]
async fn test_relationship_with_null_identifier_is_none() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    let content = document(json!({
        "data": {
            "type": "test",
            "id": "1",
            "relationships": {"other": {"data": {"type": null, "id": null}}}
        }
    }));

    let test = tests.from_document(&content).unwrap().unwrap();
    assert_eq!(test.to_one("other").await.unwrap(), None);
}

#[tokio::test]
async fn test_attributes_readable_next_to_unresolved_relations() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    let content = document(json!({
        "data": {
            "type": "designs",
            "id": "1",
            "relationships": {"sub_designs": {"data": [{"type": "designs", "id": 3}]}},
            "attributes": {"name": "doctor_x"}
        }
    }));

    let design = designs.from_document(&content).unwrap().unwrap();
    assert_eq!(design.attribute("name").await.unwrap(), json!("doctor_x"));

    let err = design.relation("sub_designs").await.unwrap_err();
    assert!(matches!(err, OrmError::InvalidIdentifier { .. }));
}

#[tokio::test]
async fn test_unresolved_relation_yields_stubs() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    let content = document(json!({
        "data": {
            "type": "designs",
            "id": "1",
            "relationships": {"sub_designs": {"data": [
                {"type": "designs", "id": "3"},
                {"type": "designs", "id": "4"}
            ]}}
        }
    }));

    let design = designs.from_document(&content).unwrap().unwrap();
    let subs = design.to_many("sub_designs").await.unwrap();
    let ids: Vec<Option<String>> = subs.iter().map(|m| m.id()).collect();
    assert_eq!(ids, [Some("3".to_owned()), Some("4".to_owned())]);
    assert!(subs.iter().all(|m| m.is_stub()));

    // Cached: same handles on the second read.
    assert_eq!(design.to_many("sub_designs").await.unwrap(), subs);
}

#[tokio::test]
async fn test_saving_new() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    fixture.mock.expect(Method::Post, "designs").return_ok(
        201,
        json!({"data": {"type": "designs", "id": "1", "attributes": {"name": "doctor_x"}}}),
    );

    let design = designs.new_instance();
    design.set_attribute("name", "doctor_x").await.unwrap();
    assert_eq!(design.id(), None);
    design.save().await.unwrap();

    assert_eq!(design.id().as_deref(), Some("1"));
    assert_eq!(
        fixture.mock.last_body(),
        Some(json!({"data": {"type": "designs", "attributes": {"name": "doctor_x"}}}))
    );
    fixture.mock.verify();
}

#[tokio::test]
async fn test_creating_with_id() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    fixture.mock.expect_post("designs").return_empty(204);

    let design = designs.new_instance();
    design.set_id("1");
    design.set_attribute("name", "doctor_x").await.unwrap();
    let before = design.raw_object();
    design.create().await.unwrap();

    assert_eq!(design.raw_object(), before);
    assert_eq!(design.id().as_deref(), Some("1"));
    assert_eq!(
        fixture.mock.last_body(),
        Some(json!({"data": {"id": "1", "type": "designs", "attributes": {"name": "doctor_x"}}}))
    );
}

#[tokio::test]
async fn test_saving_updated() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    fixture.mock.expect(Method::Patch, "designs/1").return_empty(204);

    let design = designs.new_instance();
    design.set_attribute("name", "doctor_x").await.unwrap();
    design.set_id("1");
    design.save().await.unwrap();

    assert_eq!(
        fixture.mock.last_body(),
        Some(json!({"data": {"id": "1", "type": "designs", "attributes": {"name": "doctor_x"}}}))
    );
    assert_eq!(design.attribute("name").await.unwrap(), json!("doctor_x"));
    fixture.mock.verify();
}

#[tokio::test]
async fn test_saving_updated_with_some_server_side_changes() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    fixture.mock.expect_patch("designs/1").return_ok(
        200,
        json!({"data": {"type": "designs", "attributes": {"name": "doctor_x", "status": "complete"}}}),
    );

    let design = designs.new_instance();
    design.set_attribute("name", "doctor_x").await.unwrap();
    design.set_id("1");
    design.save().await.unwrap();

    assert_eq!(design.attribute("status").await.unwrap(), json!("complete"));
    assert_eq!(design.id().as_deref(), Some("1"));
}

#[tokio::test]
async fn test_saving_updated_with_metadata_keeps_state() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    fixture
        .mock
        .expect_patch("designs/1")
        .return_ok(200, json!({"meta": {"success-level": "great"}}));

    let design = designs.new_instance();
    design.set_attribute("name", "doctor_x").await.unwrap();
    design.set_id("1");
    design.save().await.unwrap();

    assert_eq!(design.attribute("name").await.unwrap(), json!("doctor_x"));
}

#[tokio::test]
async fn test_failed_update_leaves_state_untouched() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    fixture.mock.expect_patch("designs/1").return_ok(
        422,
        json!({"errors": [{"status": "422", "title": "Invalid name"}]}),
    );

    let design = designs.new_instance();
    design.set_id("1");
    design.set_attribute("name", "").await.unwrap();
    let before = design.raw_object();

    let err = design.save().await.unwrap_err();
    assert!(matches!(
        err,
        OrmError::Transport(TransportError::Client { status: 422, .. })
    ));
    assert_eq!(design.raw_object(), before);
}

#[tokio::test]
async fn test_update_with_unknown_included_type_leaves_state_untouched() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    fixture.mock.expect_patch("designs/1").return_ok(
        200,
        json!({
            "data": {"type": "designs", "id": "1", "attributes": {"name": "server"}},
            "included": [{"type": "ghosts", "id": "1"}]
        }),
    );

    let design = designs.new_instance();
    design.set_id("1");
    design.set_attribute("name", "local").await.unwrap();
    let sub_design = designs.from_id("2");
    design
        .set_to_one("sub_designs", Some(&sub_design))
        .await
        .unwrap();
    let before = design.raw_object();

    let err = design.save().await.unwrap_err();
    assert!(matches!(err, OrmError::UnknownType(tag) if tag == "ghosts"));
    assert_eq!(design.raw_object(), before);
    assert_eq!(design.attribute("name").await.unwrap(), json!("local"));
    assert_eq!(
        design.to_one("sub_designs").await.unwrap(),
        Some(sub_design)
    );
    fixture.mock.verify();
}

#[tokio::test]
async fn test_failed_create_leaves_id_unset() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    fixture.mock.expect_post("designs").return_ok(
        201,
        json!({
            "data": {"type": "designs", "id": "7", "attributes": {"name": "server"}},
            "included": [{"type": "designs", "id": 8}]
        }),
    );

    let design = designs.new_instance();
    design.set_attribute("name", "local").await.unwrap();

    let err = design.save().await.unwrap_err();
    assert!(matches!(err, OrmError::InvalidIdentifier { .. }));
    assert_eq!(design.id(), None);
    assert_eq!(design.attribute("name").await.unwrap(), json!("local"));
}

#[tokio::test]
async fn test_created_without_id_takes_response_as_is() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    fixture.mock.expect_post("designs").return_ok(
        201,
        json!({"data": {"type": "designs", "attributes": {"name": "server", "status": "new"}}}),
    );

    let design = designs.new_instance();
    design.set_attribute("name", "local").await.unwrap();
    design.save().await.unwrap();

    assert_eq!(design.id(), None);
    assert_eq!(design.attribute("name").await.unwrap(), json!("server"));
    assert_eq!(design.attribute("status").await.unwrap(), json!("new"));
    fixture.mock.verify();
}

#[tokio::test]
async fn test_clearing_to_one_sends_null_linkage() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    fixture.mock.expect_get("test/1").return_ok(
        200,
        json!({
            "data": {
                "type": "test",
                "id": "1",
                "relationships": {"other": {"data": {"type": "test", "id": "2"}}}
            }
        }),
    );
    fixture.mock.expect_patch("test/1").return_empty(204);

    let test = tests.from_id("1");
    assert!(test.to_one("other").await.unwrap().is_some());
    test.set_to_one("other", None).await.unwrap();
    test.save().await.unwrap();

    assert_eq!(
        fixture.mock.last_body(),
        Some(json!({
            "data": {
                "type": "test",
                "id": "1",
                "relationships": {"other": {"data": null}}
            }
        }))
    );
    assert_eq!(test.to_one("other").await.unwrap(), None);
    fixture.mock.verify();
}

#[tokio::test]
async fn test_relation_to_main_object() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    let content = document(json!({
        "data": {
            "type": "designs",
            "id": "2",
            "relationships": {"sub_designs": {"data": {"type": "designs", "id": "3"}}},
            "attributes": {"name": "doctor_x"}
        },
        "included": [{
            "type": "designs",
            "id": "3",
            "relationships": {"sub_designs": {"data": {"type": "designs", "id": "2"}}},
            "attributes": {"name": "doctor_y"}
        }]
    }));

    let design = designs.from_document(&content).unwrap().unwrap();
    let sub = design.to_one("sub_designs").await.unwrap().unwrap();
    let back = sub.to_one("sub_designs").await.unwrap().unwrap();

    assert_eq!(back, design);
    assert_eq!(back.attribute("name").await.unwrap(), json!("doctor_x"));

    design.forget_relations();
    sub.forget_relations();
}

#[tokio::test]
async fn test_shared_targets_are_one_object() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    let content = document(json!({
        "data": [
            {"type": "designs", "id": "1", "relationships": {"others": {"data": [{"type": "designs", "id": "9"}]}}},
            {"type": "designs", "id": "2", "relationships": {"others": {"data": [{"type": "designs", "id": "9"}]}}}
        ],
        "included": [{"type": "designs", "id": "9", "attributes": {"name": "shared"}}]
    }));

    let mut repository = fixture.orm.repository();
    let primary = repository.update_from_document(&content).unwrap();
    assert_eq!(primary.len(), 2);
    assert_eq!(repository.len(), 3);
    assert_eq!(primary[0].type_tag(), designs.type_tag());

    let first = primary[0].to_many("others").await.unwrap();
    let second = primary[1].to_many("others").await.unwrap();
    assert_eq!(first[0], second[0]);
}

#[tokio::test]
async fn test_saving_relation_to_many() {
    let fixture = Fixture::new();
    let designs = fixture.designs();
    fixture.mock.expect_patch("designs/1").return_empty(200);

    let design = designs.new_instance();
    design.set_id("1");
    design
        .set_to_many("others", std::slice::from_ref(&design))
        .await
        .unwrap();
    design.save().await.unwrap();

    assert_eq!(
        fixture.mock.last_body(),
        Some(json!({
            "data": {
                "id": "1",
                "type": "designs",
                "relationships": {"others": {"data": [{"type": "designs", "id": "1"}]}}
            }
        }))
    );
    assert_eq!(
        design.relation("others").await.unwrap(),
        RelationValue::Many(vec![design.clone()])
    );
    design.forget_relations();
}

#[tokio::test]
async fn test_declared_cardinality_is_enforced() {
    let fixture = Fixture::new();
    let articles = fixture.register(
        ModelDecl::new("articles")
            .to_one("author", "author")
            .to_many("comments", "comments"),
    );
    let content = document(json!({
        "data": {
            "type": "articles",
            "id": "1",
            "relationships": {
                "author": {"data": [{"type": "articles", "id": "2"}]},
                "comments": {"data": []}
            }
        }
    }));

    let article = articles.from_document(&content).unwrap().unwrap();
    assert!(matches!(
        article.relation("author").await,
        Err(OrmError::Cardinality { .. })
    ));
    assert_eq!(article.to_many("comments").await.unwrap(), Vec::new());
    assert!(matches!(
        article.set_to_one("comments", None).await,
        Err(OrmError::Cardinality { .. })
    ));
}

#[tokio::test]
async fn test_field_kind_and_unknown_field_errors() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    let test = tests.new_instance();

    assert!(matches!(
        test.attribute("other").await,
        Err(OrmError::FieldKind { .. })
    ));
    assert!(matches!(
        test.relation("name").await,
        Err(OrmError::FieldKind { .. })
    ));
    assert!(matches!(
        test.attribute("missing").await,
        Err(OrmError::UnknownField { .. })
    ));
}

#[tokio::test]
async fn test_getting_list() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    fixture.mock.expect(Method::Get, "test").return_ok(
        200,
        json!({"data": [{"type": "test", "id": "123", "attributes": {"name": "alice"}}]}),
    );

    let result = tests.get_list().await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].attribute("name").await.unwrap(), json!("alice"));
    fixture.mock.verify();
}

#[tokio::test]
async fn test_getting_list_with_relationships() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    fixture.mock.expect_get("test").return_ok(
        200,
        json!({
            "data": [
                {
                    "type": "test", "id": "123", "attributes": {"name": "bob"},
                    "relationships": {"other": {"data": {"type": "test", "id": "1"}}}
                },
                {"type": "test", "id": "1", "attributes": {"name": "alice"}}
            ],
            "included": []
        }),
    );

    let result = tests.get_list().await.unwrap();
    assert_eq!(result[0].attribute("name").await.unwrap(), json!("bob"));
    assert_eq!(result[1].attribute("name").await.unwrap(), json!("alice"));
    let other = result[0].to_one("other").await.unwrap().unwrap();
    assert_eq!(other, result[1]);
}

#[tokio::test]
async fn test_exists() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    fixture
        .mock
        .expect_get("test/1")
        .return_ok(200, json!({"data": {"type": "test", "id": "1"}}));
    fixture
        .mock
        .expect_get("test/2")
        .return_ok(404, json!({"errors": [{"status": "404"}]}));
    fixture.mock.expect_get("test/3").return_empty(500);

    assert!(tests.exists("1").await.unwrap());
    assert!(!tests.exists("2").await.unwrap());
    assert!(matches!(
        tests.exists("3").await,
        Err(OrmError::Transport(TransportError::Server { status: 500, .. }))
    ));
    fixture.mock.verify();
}

#[tokio::test]
async fn test_delete() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    fixture.mock.expect(Method::Delete, "test/123").return_empty(204);

    let test = tests.from_id("123");
    test.delete().await.unwrap();

    let request = fixture.mock.last_request().unwrap();
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.body, None);
    fixture.mock.verify();
}

#[tokio::test]
async fn test_item_endpoint_requires_id() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    let test = tests.new_instance();
    assert!(matches!(
        test.delete().await,
        Err(OrmError::MissingIdentifier(tag)) if tag == "test"
    ));
}

#[tokio::test]
async fn test_model_outliving_its_api_is_detached() {
    let fixture = Fixture::new();
    let tests = fixture.tests();
    let test = tests.from_id("1");
    drop(fixture);

    assert!(matches!(test.refresh().await, Err(OrmError::Detached(_))));
}

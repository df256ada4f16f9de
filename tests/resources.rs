mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use common::{attrs, blog_store, send, RecordingGate};
use resource_sdk::{
    from_json_str, Ability, MemoryStore, Record, Repository, ResourceApi, RuleRequest, Scope, ValidationRule,
};
use serde_json::{json, Map};
use std::sync::Arc;

fn app(json: &str, store: &Arc<MemoryStore>, gate: &Arc<RecordingGate>) -> Router {
    ResourceApi::new(from_json_str(json).unwrap(), store.clone())
        .gate(gate.clone())
        .build()
        .unwrap()
}

const BLOG: &str = r#"{
    "group": { "authorization": true },
    "resources": {
        "post": "Post",
        "post.comment": "Comment"
    }
}"#;

#[tokio::test]
async fn index_lists_the_whole_collection() {
    let store = blog_store();
    store.insert("Post", attrs(json!({ "title": "first" }))).unwrap();
    store.insert("Post", attrs(json!({ "title": "second" }))).unwrap();
    let gate = RecordingGate::allowing();
    let router = app(r#"{ "resources": { "post": "Post" } }"#, &store, &gate);

    let (status, body) = send(&router, Method::GET, "/post", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["first", "second"]);
    assert!(gate.calls().is_empty());
}

#[tokio::test]
async fn missing_nested_item_is_not_found_and_never_authorized() {
    let store = blog_store();
    store.insert("Post", Map::new()).unwrap();
    let gate = RecordingGate::allowing();
    let router = app(BLOG, &store, &gate);

    let (status, body) = send(&router, Method::GET, "/post/1/comment/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not Found" }));
    assert!(gate.calls().is_empty());
}

#[tokio::test]
async fn denied_delete_leaves_the_record_in_place() {
    let store = blog_store();
    store.insert("Post", Map::new()).unwrap();
    let gate = RecordingGate::denying();
    let router = app(
        r#"{ "resources": { "post": { "model": "Post", "authorization": true } } }"#,
        &store,
        &gate,
    );

    let (status, body) = send(&router, Method::DELETE, "/post/1", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Unauthorized" }));
    assert_eq!(store.count("Post").unwrap(), 1);
    assert_eq!(gate.calls(), vec![(Ability::Delete, "Post".to_string(), 0)]);
}

#[tokio::test]
async fn store_under_missing_parent_is_not_found() {
    let store = blog_store();
    let gate = RecordingGate::allowing();
    let router = app(BLOG, &store, &gate);

    let (status, body) = send(&router, Method::POST, "/post/5/comment", Some(json!({ "body": "hi" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not Found" }));
    assert!(gate.calls().is_empty());
    assert_eq!(store.count("Comment").unwrap(), 0);
}

#[tokio::test]
async fn transformed_collection_keeps_order() {
    let store = blog_store();
    store.insert("Post", attrs(json!({ "title": "b", "secret": 1 }))).unwrap();
    store.insert("Post", attrs(json!({ "title": "a", "secret": 2 }))).unwrap();
    let router = ResourceApi::new(from_json_str(r#"{ "resources": { "post": "Post" } }"#).unwrap(), store.clone())
        .transformer(
            "Post",
            Arc::new(|r: &Record| json!({ "id": r.key, "title": r.get("title") })),
        )
        .build()
        .unwrap();

    let (status, body) = send(&router, Method::GET, "/post", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": 1, "title": "b" }, { "id": 2, "title": "a" }]));
}

#[tokio::test]
async fn nested_crud_round() {
    let store = blog_store();
    store.insert("Post", Map::new()).unwrap();
    let gate = RecordingGate::allowing();
    let router = app(BLOG, &store, &gate);

    let (status, created) = send(&router, Method::POST, "/post/1/comment", Some(json!({ "body": "hi" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["post_id"], json!(1));
    assert_eq!(created["body"], json!("hi"));

    let (status, patched) = send(&router, Method::PATCH, "/post/1/comment/1", Some(json!({ "body": "edited" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["body"], json!("edited"));
    assert_eq!(patched["post_id"], json!(1));

    let (status, put) = send(&router, Method::PUT, "/post/1/comment/1", Some(json!({ "flag": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(put["body"], json!("edited"));

    let (status, listed) = send(&router, Method::GET, "/post/1/comment", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, body) = send(&router, Method::DELETE, "/post/1/comment/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);
    assert_eq!(store.count("Comment").unwrap(), 0);

    assert_eq!(
        gate.calls(),
        vec![
            (Ability::Create, "Comment".to_string(), 1),
            (Ability::Update, "Comment".to_string(), 1),
            (Ability::Update, "Comment".to_string(), 1),
            (Ability::View, "Comment".to_string(), 1),
            (Ability::Delete, "Comment".to_string(), 1),
        ]
    );
}

#[tokio::test]
async fn three_level_chain_walks_each_relation() {
    let store = blog_store();
    let post = store.insert("Post", Map::new()).unwrap();
    let other = store.insert("Post", Map::new()).unwrap();
    let comment = store
        .create(&Scope::related(post, "comments"), attrs(json!({ "body": "c" })))
        .await
        .unwrap();
    store
        .create(&Scope::related(comment, "likes"), attrs(json!({ "by": "ann" })))
        .await
        .unwrap();
    let gate = RecordingGate::allowing();
    let router = app(
        r#"{ "resources": {
            "post": { "model": "Post", "disable_routing": true },
            "post.comment": { "model": "Comment", "disable_routing": true },
            "post.comment.like": { "model": "Like", "authorization": true }
        } }"#,
        &store,
        &gate,
    );

    let (status, like) = send(&router, Method::GET, "/post/1/comment/1/like/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(like["by"], json!("ann"));
    assert_eq!(gate.calls(), vec![(Ability::View, "Like".to_string(), 2)]);

    let wrong_parent = format!("/post/{}/comment/1/like/1", other.key_string());
    let (status, _) = send(&router, Method::GET, &wrong_parent, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, Method::GET, "/post/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn group_prefix_and_route_names() {
    let store = blog_store();
    store.insert("Post", attrs(json!({ "title": "t" }))).unwrap();
    let gate = RecordingGate::allowing();
    let router = app(
        r#"{ "group": { "prefix": "api", "as": "api." }, "resources": { "post": { "model": "Post", "router_options": { "only": ["show"] } } } }"#,
        &store,
        &gate,
    );

    let (status, post) = send(&router, Method::GET, "/api/post/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["title"], json!("t"));

    let (status, _) = send(&router, Method::GET, "/api/post", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&router, Method::DELETE, "/api/post/1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn route_name_prefix_without_trailing_dot_resolves() {
    let store = blog_store();
    store.insert("Post", attrs(json!({ "title": "t" }))).unwrap();
    let gate = RecordingGate::allowing();
    let router = app(
        r#"{ "group": { "routeNamePrefix": "api" }, "resources": { "post": "Post" } }"#,
        &store,
        &gate,
    );

    let (status, post) = send(&router, Method::GET, "/post/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["title"], json!("t"));
}

#[tokio::test]
async fn validated_request_failures() {
    let store = blog_store();
    let router = ResourceApi::new(
        from_json_str(
            r#"{ "resources": { "post": { "model": "Post", "requests": { "store": "post.store" } } } }"#,
        )
        .unwrap(),
        store.clone(),
    )
    .request(
        "post.store",
        Arc::new(RuleRequest::new().rule("title", ValidationRule::required().length(Some(3), None))),
    )
    .build()
    .unwrap();

    let (status, body) = send(&router, Method::POST, "/post", Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], json!("validation_error"));
    assert_eq!(
        body["error"]["details"]["title"],
        json!(["title must be at least 3 characters"])
    );
    assert_eq!(store.count("Post").unwrap(), 0);

    let (status, body) = send(&router, Method::POST, "/post", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("bad_request"));

    let (status, created) = send(&router, Method::POST, "/post", Some(json!({ "title": "long enough" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], json!(1));
}

#[tokio::test]
async fn client_supplied_id_does_not_clash_on_store() {
    let store = blog_store();
    store.insert("Post", attrs(json!({ "title": "first" }))).unwrap();
    let gate = RecordingGate::allowing();
    let router = app(r#"{ "resources": { "post": "Post" } }"#, &store, &gate);

    let (status, created) = send(&router, Method::POST, "/post", Some(json!({ "id": 1, "title": "second" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], json!(2));
    assert_eq!(store.count("Post").unwrap(), 2);
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let store = blog_store();
    let router = ResourceApi::new(from_json_str(r#"{ "resources": { "post": "Post" } }"#).unwrap(), store.clone())
        .body_limit(16)
        .build()
        .unwrap();
    let (status, _) = send(&router, Method::POST, "/post", Some(json!({ "title": "much longer than sixteen bytes" }))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(store.count("Post").unwrap(), 0);
}

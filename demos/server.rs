//! Demo server: in-memory blog with posts, comments and tags.
//! Reads are open; writes need `x-role: editor`. Config path from RESOURCE_CONFIG (default demos/blog.json).

use axum::Router;
use resource_sdk::{
    common_routes, load_from_path, Ability, AuthorizationRequest, MemoryStore, PolicyFn, Record, ResourceApi,
    RuleRequest, ValidationRule,
};
use serde_json::{json, Map};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn editor_writes(req: &AuthorizationRequest<'_>) -> bool {
    req.ability == Ability::View
        || req
            .headers
            .get("x-role")
            .and_then(|v| v.to_str().ok())
            .map(|role| role == "editor")
            .unwrap_or(false)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("resource_sdk=info".parse()?))
        .init();

    let config_path = std::env::var("RESOURCE_CONFIG").unwrap_or_else(|_| "demos/blog.json".into());
    let config = load_from_path(&config_path).await?;

    let store = Arc::new(
        MemoryStore::new()
            .with_model("Post")
            .with_model("Tag")
            .with_relation("Post", "comments", "Comment", "post_id"),
    );
    let mut welcome = Map::new();
    welcome.insert("title".into(), json!("Welcome"));
    store.insert("Post", welcome)?;

    let comment = RuleRequest::new().rule("body", ValidationRule::required().length(Some(1), Some(2000)));
    let resources = ResourceApi::new(config, store)
        .gate(Arc::new(PolicyFn(editor_writes)))
        .request("comment.store", Arc::new(comment.clone()))
        .request("comment.update", Arc::new(comment.partial()))
        .transformer(
            "Post",
            Arc::new(|r: &Record| json!({ "id": r.key, "title": r.get("title"), "created_at": r.get("created_at") })),
        )
        .build()?;

    let app = Router::new().merge(common_routes()).merge(resources);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

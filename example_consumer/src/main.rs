//! Example consumer: a separate Rust project that uses resource-sdk as a dependency.
//! Expects tables `blog.posts` and `blog.comments (post_id references posts)`.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

use resource_sdk::{common_routes, from_json_str, AllowAll, PgModel, PgRelation, PgRepository, ResourceApi};
use std::sync::Arc;
use tokio::net::TcpListener;

const RESOURCES: &str = r#"{
    "group": { "prefix": "api/v1", "as": "v1." },
    "resources": {
        "post": "Post",
        "post.comment": { "model": "Comment", "router_options": { "except": ["update"] } }
    }
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("resource_sdk=info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/blog".into());
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let repository = PgRepository::new(pool)
        .model("Post", PgModel::new("blog", "posts").fillable(["title", "body"]))
        .model("Comment", PgModel::new("blog", "comments").fillable(["body"]))
        .relation(
            "Post",
            "comments",
            PgRelation {
                model: "Comment".into(),
                foreign_key: "post_id".into(),
            },
        );

    let resources = ResourceApi::new(from_json_str(RESOURCES)?, Arc::new(repository))
        .gate(Arc::new(AllowAll))
        .build()?;
    let app = common_routes().merge(resources);

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Common test utilities for integration tests
///
/// Provides shared infrastructure:
/// - Test database setup (migrations run on first connect)
/// - App construction with the real router and middleware stack
/// - User registration and token helpers
/// - Request/response helpers
use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use ticklist_api::app::{build_router, AppState};
use ticklist_api::config::Config;
use ticklist_shared::db::migrations::run_migrations;
use ticklist_shared::models::user::User;
use tower::Service as _;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    created_users: Vec<Uuid>,
}

/// A registered test user
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestContext {
    /// Creates a new test context against the configured database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            created_users: Vec::new(),
        })
    }

    /// Registers a fresh user through the API and returns id + token
    pub async fn register_user(&mut self) -> anyhow::Result<TestUser> {
        let email = format!("test-{}@example.com", Uuid::new_v4());
        let user = self.register_with(&email, "secret123").await?;
        Ok(user)
    }

    /// Registers a user with explicit credentials through the API
    pub async fn register_with(
        &mut self,
        email: &str,
        password: &str,
    ) -> anyhow::Result<TestUser> {
        let response = self
            .request(
                "POST",
                "/auth/register",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;

        let status = response.status();
        let body = body_json(response).await;
        if status != StatusCode::CREATED {
            anyhow::bail!("registration failed with {}: {}", status, body);
        }

        let id: Uuid = body["subject_id"].as_str().unwrap().parse()?;
        let token = body["token"].as_str().unwrap().to_string();
        self.created_users.push(id);

        Ok(TestUser {
            id,
            email: email.to_string(),
            token,
        })
    }

    /// Sends a request through the full router
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.app.clone().call(request).await.unwrap()
    }

    /// Removes every user this context registered (cascades to their rows)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        for id in &self.created_users {
            User::delete(&self.db, *id).await?;
        }
        Ok(())
    }
}

/// Reads a response body as JSON (Null when empty or not JSON)
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

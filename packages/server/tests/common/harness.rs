//! Test harness over in-memory dependencies.
//!
//! Every test gets fresh stores, so tests never see each other's data. The same
//! `ServerDeps` backs both direct action calls and the HTTP router.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use samaritan_core::common::GeoPoint;
use samaritan_core::domains::auth::JwtService;
use samaritan_core::domains::identity::{register_organization, register_samaritan, Actor};
use samaritan_core::kernel::{ServerDeps, TestDependencies};
use samaritan_core::server::{build_app, AppState};
use serde_json::Value;
use test_context::AsyncTestContext;
use tower::ServiceExt;

use super::fixtures::{organization_signup, samaritan_signup};

pub const TEST_JWT_SECRET: &str = "test_secret_key";
pub const TEST_JWT_ISSUER: &str = "test_issuer";

/// Test harness that wires in-memory stores into `ServerDeps`.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let donor = ctx.samaritan("donor").await;
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    /// The in-memory stores and spies - inspect these in assertions.
    pub test_deps: TestDependencies,
    pub deps: Arc<ServerDeps>,
    pub jwt_service: Arc<JwtService>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        // In-memory stores are dropped with the harness
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_dependencies(TestDependencies::new())
    }

    pub fn with_dependencies(test_deps: TestDependencies) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let deps = Arc::new(test_deps.server_deps());
        Self {
            test_deps,
            deps,
            jwt_service: Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string())),
        }
    }

    /// Register an organization located at `location`.
    pub async fn organization(&self, username: &str, location: GeoPoint) -> Actor {
        register_organization(&organization_signup(username, location), &self.deps)
            .await
            .expect("Failed to register organization")
    }

    /// Register a samaritan.
    pub async fn samaritan(&self, username: &str) -> Actor {
        register_samaritan(&samaritan_signup(username), &self.deps)
            .await
            .expect("Failed to register samaritan")
    }

    /// A bearer token for `actor`.
    pub fn token(&self, actor: &Actor) -> String {
        self.jwt_service
            .create_token(actor.id(), actor.identity.username.clone(), actor.kind())
            .expect("Failed to create token")
    }

    pub fn router(&self) -> Router {
        let state = AppState::new(self.deps.clone(), None, self.jwt_service.clone());
        build_app(state, &[])
    }

    /// Send one request through the full router and decode the JSON body.
    ///
    /// Empty bodies decode to `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

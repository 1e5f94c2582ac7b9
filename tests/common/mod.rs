#![allow(dead_code)]

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::json;

use carlot::auth::TokenService;
use carlot::blob::MemoryBlobStore;
use carlot::cars::CarManager;
use carlot::routes::{self, health};
use carlot::state::AppState;
use carlot::store::MemoryStore;

pub const JWT_SECRET: &str = "integration-test-secret";
const BOUNDARY: &str = "----carlot-test-boundary";

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub blobs: MemoryBlobStore,
}

pub fn test_context() -> TestContext {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new("/uploads");
    let state = web::Data::new(AppState::new(
        Arc::new(store.clone()),
        CarManager::new(Arc::new(store), Arc::new(blobs.clone())),
        TokenService::new(JWT_SECRET),
    ));
    TestContext { state, blobs }
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(Logger::default())
            .service(health::health)
            .service(web::scope("/api").configure(routes::config)),
    )
    .await
}

/// Signs up and logs in, returning the bearer token.
pub async fn signup_and_login(
    app: &impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    username: &str,
    password: &str,
) -> String {
    let credentials = json!({ "username": username, "password": password });

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&credentials)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED, "signup failed");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&credentials)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK, "login failed");
    let body: serde_json::Value = test::read_body_json(resp).await;
    body["token"].as_str().expect("token in login response").to_string()
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// A hand-built `multipart/form-data` body.
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// The common create/update fields.
    pub fn car(title: &str, description: &str, tags: &str) -> Self {
        Self::new()
            .text("title", title)
            .text("description", description)
            .text("tags", tags)
    }

    /// Finishes the body and applies it to `req` with the matching content type.
    pub fn apply(mut self, req: test::TestRequest) -> test::TestRequest {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        req.insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(self.body)
    }
}

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use serde_json::Value;

use common::{init_app, test_context};

#[actix_rt::test]
async fn test_openapi_document_is_served() {
    let ctx = test_context();
    let app = init_app(ctx.state.clone()).await;

    let req = test::TestRequest::get()
        .uri("/api/docs/openapi.json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let doc: Value = test::read_body_json(resp).await;
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(doc["info"]["title"], "Car API");
    assert!(doc["paths"]["/api/cars"]["post"]["requestBody"]["content"]["multipart/form-data"].is_object());
    assert!(doc["paths"]["/api/auth/signup"]["post"].is_object());
    for schema in ["Car", "CarUpload", "Credentials", "TokenResponse", "ErrorBody"] {
        assert!(doc["components"]["schemas"][schema].is_object(), "schema {}", schema);
    }
}

#[actix_rt::test]
async fn test_swagger_ui_needs_no_token() {
    let ctx = test_context();
    let app = init_app(ctx.state.clone()).await;

    let req = test::TestRequest::get().uri("/api/docs").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));

    let body = test::read_body(resp).await;
    let page = std::str::from_utf8(&body).unwrap();
    assert!(page.contains("docs/openapi.json"));
}

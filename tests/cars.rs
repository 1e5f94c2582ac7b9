mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use carlot::blob::key_from_location;
use carlot::cars::MAX_IMAGE_BYTES;
use carlot::routes::multipart::MAX_TEXT_FIELD_BYTES;
use common::{bearer, init_app, signup_and_login, test_context, MultipartBody};

fn image_list(car: &Value) -> Vec<String> {
    car["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[test_log::test(actix_rt::test)]
async fn test_car_lifecycle() {
    let ctx = test_context();
    let app = init_app(ctx.state.clone()).await;
    let token = signup_and_login(&app, "alice", "pw1").await;

    // Create with two images.
    let req = MultipartBody::car("Camry", "Reliable sedan", r#"["sedan","toyota"]"#)
        .file("images", "a.jpg", b"aaaa")
        .file("images", "b.jpg", b"bbbb")
        .apply(test::TestRequest::post().uri("/api/cars"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let car: Value = test::read_body_json(resp).await;
    let id = car["id"].as_str().unwrap().to_string();
    assert_eq!(car["title"], "Camry");
    assert_eq!(car["description"], "Reliable sedan");
    assert_eq!(car["tags"], json!(["sedan", "toyota"]));
    let images = image_list(&car);
    assert_eq!(images.len(), 2);
    assert!(images[0].starts_with("/uploads/") && images[0].ends_with("-a.jpg"));
    assert!(images[1].ends_with("-b.jpg"));
    let (a, b) = (images[0].clone(), images[1].clone());
    assert_eq!(ctx.blobs.keys().await.len(), 2);

    // List returns it.
    let req = test::TestRequest::get()
        .uri("/api/cars")
        .insert_header(bearer(&token))
        .to_request();
    let cars: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cars.as_array().unwrap().len(), 1);
    assert_eq!(cars[0]["id"], json!(id));

    // Update keeping only a.
    let req = MultipartBody::car("Camry XLE", "Now with leather", r#"["sedan"]"#)
        .text("existingImages", &json!([a]).to_string())
        .apply(test::TestRequest::put().uri(&format!("/api/cars/{}", id)))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let car: Value = test::read_body_json(resp).await;
    assert_eq!(car["title"], "Camry XLE");
    assert_eq!(car["tags"], json!(["sedan"]));
    assert_eq!(image_list(&car), vec![a.clone()]);
    assert!(ctx.blobs.contains(key_from_location(&a)).await);
    assert!(!ctx.blobs.contains(key_from_location(&b)).await);

    // Update keeping a and adding c.
    let req = MultipartBody::car("Camry XLE", "Now with leather", r#"["sedan"]"#)
        .text("existingImages", &json!([a]).to_string())
        .file("images", "c.jpg", b"cccc")
        .apply(test::TestRequest::put().uri(&format!("/api/cars/{}", id)))
        .insert_header(bearer(&token))
        .to_request();
    let car: Value = test::call_and_read_body_json(&app, req).await;
    let images = image_list(&car);
    assert_eq!(images.len(), 2);
    assert_eq!(images[0], a);
    assert!(images[1].ends_with("-c.jpg"));

    // Get reflects the update.
    let req = test::TestRequest::get()
        .uri(&format!("/api/cars/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, car);

    // Delete.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/cars/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        test::read_body(resp).await,
        "Car and associated images deleted successfully"
    );
    assert!(ctx.blobs.keys().await.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/api/cars/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/cars/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_tags_decoding() {
    let ctx = test_context();
    let app = init_app(ctx.state.clone()).await;
    let token = signup_and_login(&app, "alice", "pw1").await;

    let test_cases = vec![
        (Some(r#"["SUV","Sedan"]"#), json!(["SUV", "Sedan"])),
        (Some("SUV, Sedan"), json!(["SUV, Sedan"])),
        (Some(""), json!([])),
        (None, json!([])),
    ];

    for (tags, expected) in test_cases {
        let mut body = MultipartBody::new()
            .text("title", "Car")
            .text("description", "Desc");
        if let Some(tags) = tags {
            body = body.text("tags", tags);
        }
        let req = body
            .apply(test::TestRequest::post().uri("/api/cars"))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "tags {:?}", tags);
        let car: Value = test::read_body_json(resp).await;
        assert_eq!(car["tags"], expected, "tags {:?}", tags);
        assert_eq!(car["images"], json!([]));
    }
}

#[actix_rt::test]
async fn test_cars_are_scoped_to_owner() {
    let ctx = test_context();
    let app = init_app(ctx.state.clone()).await;
    let alice = signup_and_login(&app, "alice", "pw1").await;
    let bob = signup_and_login(&app, "bob", "pw2").await;

    let req = MultipartBody::car("Camry", "Alice's car", "[]")
        .file("images", "a.jpg", b"aaaa")
        .apply(test::TestRequest::post().uri("/api/cars"))
        .insert_header(bearer(&alice))
        .to_request();
    let car: Value = test::call_and_read_body_json(&app, req).await;
    let id = car["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/cars")
        .insert_header(bearer(&bob))
        .to_request();
    let cars: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cars, json!([]));

    let req = test::TestRequest::get()
        .uri(&format!("/api/cars/{}", id))
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = MultipartBody::car("Stolen", "Bob's now", "[]")
        .text("existingImages", "[]")
        .apply(test::TestRequest::put().uri(&format!("/api/cars/{}", id)))
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/cars/{}", id))
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    // Alice's car is untouched.
    let req = test::TestRequest::get()
        .uri(&format!("/api/cars/{}", id))
        .insert_header(bearer(&alice))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, car);
    assert_eq!(ctx.blobs.keys().await.len(), 1);
}

#[actix_rt::test]
async fn test_invalid_car_requests() {
    let ctx = test_context();
    let app = init_app(ctx.state.clone()).await;
    let token = signup_and_login(&app, "alice", "pw1").await;

    // Missing title.
    let req = MultipartBody::new()
        .text("description", "No title")
        .file("images", "a.jpg", b"aaaa")
        .apply(test::TestRequest::post().uri("/api/cars"))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.blobs.keys().await.is_empty());

    // Too many files.
    let mut body = MultipartBody::car("Camry", "Too many", "[]");
    for i in 0..11 {
        body = body.file("images", &format!("{}.jpg", i), b"x");
    }
    let req = body
        .apply(test::TestRequest::post().uri("/api/cars"))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.blobs.keys().await.is_empty());

    // Not a multipart body.
    let req = test::TestRequest::post()
        .uri("/api/cars")
        .insert_header(bearer(&token))
        .set_json(json!({ "title": "Camry", "description": "JSON" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = MultipartBody::car("Camry", "Valid", "[]")
        .apply(test::TestRequest::post().uri("/api/cars"))
        .insert_header(bearer(&token))
        .to_request();
    let car: Value = test::call_and_read_body_json(&app, req).await;
    let id = car["id"].as_str().unwrap().to_string();

    // Malformed keep list.
    let req = MultipartBody::car("Camry", "Valid", "[]")
        .text("existingImages", "not json")
        .apply(test::TestRequest::put().uri(&format!("/api/cars/{}", id)))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    // Blank description on update.
    let req = MultipartBody::car("Camry", "   ", "[]")
        .apply(test::TestRequest::put().uri(&format!("/api/cars/{}", id)))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    // Ids that are not UUIDs and ids that do not exist.
    for uri in ["/api/cars/not-a-uuid".to_string(), format!("/api/cars/{}", Uuid::new_v4())] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND,
            "{}",
            uri
        );
    }
}

#[actix_rt::test]
async fn test_update_without_keep_list_drops_all_images() {
    let ctx = test_context();
    let app = init_app(ctx.state.clone()).await;
    let token = signup_and_login(&app, "alice", "pw1").await;

    let req = MultipartBody::car("Camry", "Two images", "[]")
        .file("images", "a.jpg", b"aaaa")
        .file("images[]", "b.jpg", b"bbbb")
        .apply(test::TestRequest::post().uri("/api/cars"))
        .insert_header(bearer(&token))
        .to_request();
    let car: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(image_list(&car).len(), 2);

    let req = MultipartBody::car("Camry", "No images now", "[]")
        .apply(test::TestRequest::put().uri(&format!("/api/cars/{}", car["id"].as_str().unwrap())))
        .insert_header(bearer(&token))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["images"], json!([]));
    assert!(ctx.blobs.keys().await.is_empty());
}

#[actix_rt::test]
async fn test_upload_failure_is_server_error() {
    let ctx = test_context();
    let app = init_app(ctx.state.clone()).await;
    let token = signup_and_login(&app, "alice", "pw1").await;

    ctx.blobs.fail_puts(true);
    let req = MultipartBody::car("Camry", "Broken storage", "[]")
        .file("images", "a.jpg", b"aaaa")
        .apply(test::TestRequest::post().uri("/api/cars"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let req = test::TestRequest::get()
        .uri("/api/cars")
        .insert_header(bearer(&token))
        .to_request();
    let cars: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cars, json!([]));
}

#[actix_rt::test]
async fn test_list_search() {
    let ctx = test_context();
    let app = init_app(ctx.state.clone()).await;
    let token = signup_and_login(&app, "alice", "pw1").await;

    for (title, tags) in [("Toyota Camry", r#"["sedan"]"#), ("Ford Bronco", r#"["SUV"]"#)] {
        let req = MultipartBody::car(title, "For sale", tags)
            .apply(test::TestRequest::post().uri("/api/cars"))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/cars?search=suv")
        .insert_header(bearer(&token))
        .to_request();
    let cars: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cars.as_array().unwrap().len(), 1);
    assert_eq!(cars[0]["title"], "Ford Bronco");

    let req = test::TestRequest::get()
        .uri("/api/cars")
        .insert_header(bearer(&token))
        .to_request();
    let cars: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cars[0]["title"], "Toyota Camry");
    assert_eq!(cars[1]["title"], "Ford Bronco");
}

#[actix_rt::test]
async fn test_oversized_parts_are_rejected() {
    let ctx = test_context();
    let app = init_app(ctx.state.clone()).await;
    let token = signup_and_login(&app, "alice", "pw1").await;

    let big_image = vec![0u8; MAX_IMAGE_BYTES + 1];
    let req = MultipartBody::car("Camry", "Huge photo", "[]")
        .file("images", "small.jpg", b"ok")
        .file("images", "huge.jpg", &big_image)
        .apply(test::TestRequest::post().uri("/api/cars"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("images"));

    let long_title = "a".repeat(MAX_TEXT_FIELD_BYTES + 1);
    let req = MultipartBody::car(&long_title, "Long title", "[]")
        .apply(test::TestRequest::post().uri("/api/cars"))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    assert!(ctx.blobs.keys().await.is_empty());
    let req = test::TestRequest::get()
        .uri("/api/cars")
        .insert_header(bearer(&token))
        .to_request();
    let cars: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cars, json!([]));
}

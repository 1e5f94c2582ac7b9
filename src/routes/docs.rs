//! OpenAPI description of the REST API and a Swagger UI page to browse it.
//!
//! `GET /api/docs` serves the UI, `GET /api/docs/openapi.json` the document it renders.

use actix_web::{get, http::header::ContentType, HttpResponse, Responder};
use lazy_static::lazy_static;
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::auth::{Credentials, TokenResponse};
use crate::error::ErrorBody;
use crate::models::Car;
use crate::routes::{auth, cars};

/// The `multipart/form-data` body of create and update requests.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarUpload {
    #[schema(example = "2019 Toyota Camry")]
    pub title: String,
    #[schema(example = "A well-maintained car with low mileage")]
    pub description: String,
    /// JSON array of strings; any other value is stored as a single tag.
    #[schema(example = r#"["sedan","toyota","camry"]"#)]
    pub tags: Option<String>,
    /// Update only: JSON array of current image locations to keep.
    #[schema(example = r#"["/uploads/1596234932334-0d9e3c2b8f4a4c1e9a7b5d6f3e2a1c0b-image.jpg"]"#)]
    pub existing_images: Option<String>,
    /// Up to ten image files.
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Vec<Vec<u8>>,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Car API", description = "API for managing cars"),
    paths(
        auth::signup,
        auth::login,
        cars::list_cars,
        cars::create_car,
        cars::get_car,
        cars::update_car,
        cars::delete_car,
    ),
    components(schemas(Car, CarUpload, Credentials, TokenResponse, ErrorBody)),
    modifiers(&BearerAuth),
    tags(
        (name = "Authentication", description = "Signup and login"),
        (name = "Cars", description = "The caller's car listings")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme the car routes refer to.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

lazy_static! {
    static ref OPENAPI: utoipa::openapi::OpenApi = ApiDoc::openapi();
}

const SWAGGER_UI_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Car API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "docs/openapi.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(&*OPENAPI)
}

#[get("")]
pub async fn swagger_ui() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(SWAGGER_UI_PAGE)
}

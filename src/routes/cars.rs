use crate::{
    auth::AuthenticatedUser,
    error::{AppError, ErrorBody},
    models::{decode_keep_list, Car, CarQuery},
    routes::{docs::CarUpload, multipart::CarForm},
    state::AppState,
};
use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;

/// Lists the authenticated user's cars.
///
/// ## Query Parameters:
/// - `search` (optional): case-insensitive substring matched against title, description and tags.
///
/// ## Responses:
/// - `200 OK`: JSON array of cars in insertion order.
/// - `401 Unauthorized`: Missing or invalid bearer token.
#[utoipa::path(
    get,
    path = "/api/cars",
    tag = "Cars",
    params(("search" = Option<String>, Query, description = "Case-insensitive substring filter")),
    responses(
        (status = 200, description = "The caller's cars", body = [Car]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[get("")]
pub async fn list_cars(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<CarQuery>,
) -> Result<impl Responder, AppError> {
    let cars = state.cars.list(user.0, query.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(cars))
}

/// Creates a car for the authenticated user.
///
/// ## Request Body (`multipart/form-data`):
/// - `title`, `description`: required, non-empty.
/// - `tags`: JSON array of strings; any other value is stored as a single tag.
/// - `images`: zero to ten files.
///
/// ## Responses:
/// - `201 Created`: The new car.
/// - `400 Bad Request`: Missing field, too many files, or malformed body.
/// - `401 Unauthorized`: Missing or invalid bearer token.
/// - `500 Internal Server Error`: An image could not be stored.
#[utoipa::path(
    post,
    path = "/api/cars",
    tag = "Cars",
    request_body(content = CarUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Car created", body = Car),
        (status = 400, description = "Missing field, too many or too large files", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "An image could not be stored", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[post("")]
pub async fn create_car(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let mut form = CarForm::read(payload).await?;
    let fields = form.take_fields();
    let car = state.cars.create(user.0, fields, form.images).await?;
    Ok(HttpResponse::Created().json(car))
}

/// Retrieves one of the authenticated user's cars.
///
/// ## Responses:
/// - `200 OK`: The car.
/// - `404 Not Found`: No such car, or it belongs to another user.
#[utoipa::path(
    get,
    path = "/api/cars/{id}",
    tag = "Cars",
    params(("id" = Uuid, Path, description = "Car id")),
    responses(
        (status = 200, description = "The car", body = Car),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Car not found", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[get("/{id}")]
pub async fn get_car(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    car_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let car = state.cars.get(user.0, car_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(car))
}

/// Replaces a car's title, description and tags and reconciles its images.
///
/// ## Request Body (`multipart/form-data`):
/// - `title`, `description`, `tags`: as for create; all three are replaced.
/// - `existingImages`: JSON array of current image locations to keep. Any current
///   image not listed is deleted. Absent means keep none.
/// - `images`: new files, appended after the kept images.
///
/// ## Responses:
/// - `200 OK`: The updated car.
/// - `400 Bad Request`: Missing field, malformed `existingImages`, or too many files.
/// - `404 Not Found`: No such car, or it belongs to another user.
/// - `500 Internal Server Error`: A new image could not be stored.
#[utoipa::path(
    put,
    path = "/api/cars/{id}",
    tag = "Cars",
    params(("id" = Uuid, Path, description = "Car id")),
    request_body(content = CarUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "The updated car", body = Car),
        (status = 400, description = "Missing field, malformed existingImages, or bad files", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Car not found", body = ErrorBody),
        (status = 500, description = "A new image could not be stored", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[put("/{id}")]
pub async fn update_car(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    car_id: web::Path<Uuid>,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let mut form = CarForm::read(payload).await?;
    let keep = decode_keep_list(form.existing_images.as_deref())?;
    let fields = form.take_fields();
    let car = state
        .cars
        .update(user.0, car_id.into_inner(), fields, keep, form.images)
        .await?;
    Ok(HttpResponse::Ok().json(car))
}

/// Deletes a car and every image it references.
///
/// ## Responses:
/// - `200 OK`: Plain-text acknowledgement.
/// - `404 Not Found`: No such car, or it belongs to another user.
#[utoipa::path(
    delete,
    path = "/api/cars/{id}",
    tag = "Cars",
    params(("id" = Uuid, Path, description = "Car id")),
    responses(
        (status = 200, description = "Car and associated images deleted successfully", body = String, content_type = "text/plain"),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Car not found", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[delete("/{id}")]
pub async fn delete_car(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    car_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state.cars.delete(user.0, car_id.into_inner()).await?;
    Ok(HttpResponse::Ok().body("Car and associated images deleted successfully"))
}

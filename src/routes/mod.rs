pub mod auth;
pub mod cars;
pub mod docs;
pub mod health;
pub mod multipart;

use actix_web::web;

use crate::auth::AuthMiddleware;

/// Mounts the API under whatever scope the caller chooses (`/api` in production).
/// The auth and docs routes are public; every car route requires a bearer token.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::signup)
            .service(auth::login),
    )
    .service(
        web::scope("/docs")
            .service(docs::swagger_ui)
            .service(docs::openapi_json),
    )
    .service(
        web::scope("/cars")
            .wrap(AuthMiddleware)
            .service(cars::list_cars)
            .service(cars::create_car)
            .service(cars::get_car)
            .service(cars::update_car)
            .service(cars::delete_car),
    );
}

use crate::{
    auth::{self, Credentials, TokenResponse},
    error::{AppError, ErrorBody},
    state::AppState,
};
use actix_web::{http::header, post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates the account and answers `201` with a plain-text acknowledgement. No token is
/// issued; the client logs in afterwards.
///
/// ## Responses:
/// - `201 Created`: The user was created.
/// - `400 Bad Request`: Username taken, or a field is missing or empty.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Authentication",
    request_body = Credentials,
    responses(
        (status = 201, description = "User created successfully", body = String, content_type = "text/plain"),
        (status = 400, description = "Error signing up. Try different username", body = ErrorBody),
    )
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<AppState>,
    credentials: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    auth::signup(state.users.as_ref(), &credentials).await?;
    Ok(HttpResponse::Created().body("User created successfully"))
}

/// Login user
///
/// Checks the credentials and returns a bearer token valid for 23 hours, both in the
/// JSON body and in the `Authorization` response header.
///
/// ## Responses:
/// - `200 OK`: `{"token": "..."}`.
/// - `400 Bad Request`: Invalid credentials (the same answer for unknown users and wrong passwords).
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = Credentials,
    responses(
        (status = 200, description = "Successful authentication", body = TokenResponse,
            headers(("Authorization" = String, description = "Bearer <token>"))),
        (status = 400, description = "Invalid credentials", body = ErrorBody),
    )
)]
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    credentials: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    let token = auth::login(state.users.as_ref(), &state.tokens, &credentials).await?;
    Ok(HttpResponse::Ok()
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .json(TokenResponse { token }))
}

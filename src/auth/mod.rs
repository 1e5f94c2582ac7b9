pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::NewUser;
use crate::store::{StoreError, UserStore};

pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService, TOKEN_TTL_HOURS};

/// Body of both `POST /api/auth/signup` and `POST /api/auth/login`.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct Credentials {
    #[validate(length(min = 1, message = "username is required"))]
    #[schema(example = "johndoe")]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    #[schema(example = "strongpassword123")]
    pub password: String,
}

/// Response to a successful login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR...")]
    pub token: String,
}

/// Registers a new account. No token is issued; the caller logs in separately.
pub async fn signup(users: &dyn UserStore, credentials: &Credentials) -> Result<Uuid, AppError> {
    credentials.validate()?;

    if users
        .find_user_by_username(&credentials.username)
        .await?
        .is_some()
    {
        return Err(username_taken());
    }

    let password_hash = hash_password(credentials.password.clone()).await?;

    // Two concurrent signups can both pass the lookup; the store's unique index decides.
    let user = users
        .insert_user(NewUser {
            username: credentials.username.clone(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => username_taken(),
            other => other.into(),
        })?;

    log::info!("registered user {}", user.id);
    Ok(user.id)
}

/// Checks the credentials and issues a bearer token bound to the user's id.
///
/// Unknown usernames and wrong passwords both yield `AppError::InvalidCredentials`.
pub async fn login(
    users: &dyn UserStore,
    tokens: &TokenService,
    credentials: &Credentials,
) -> Result<String, AppError> {
    credentials.validate()?;

    let user = users
        .find_user_by_username(&credentials.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(credentials.password.clone(), user.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }

    tokens.issue(user.id)
}

fn username_taken() -> AppError {
    AppError::Conflict("Error signing up. Try different username".into())
}

//! Password hashing. bcrypt is CPU bound, so both operations run on the blocking pool.

use crate::error::AppError;

const BCRYPT_COST: u32 = 10;

/// Hashes `password` with a fresh salt.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(blocking_failed)?
        .map_err(AppError::from)
}

/// `Ok(false)` on mismatch. A stored hash that bcrypt cannot parse is an internal error.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(blocking_failed)?
        .map_err(AppError::from)
}

fn blocking_failed(e: tokio::task::JoinError) -> AppError {
    AppError::InternalServerError(format!("password task failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_hash_then_verify() {
        let hashed = hash_password("pw1".to_string()).await.unwrap();

        assert_ne!(hashed, "pw1");
        assert!(hashed.starts_with("$2"));
        assert!(verify_password("pw1".to_string(), hashed.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hashed).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_same_password_gets_distinct_salts() {
        let first = hash_password("pw1".to_string()).await.unwrap();
        let second = hash_password("pw1".to_string()).await.unwrap();
        assert_ne!(first, second);
    }

    #[actix_rt::test]
    async fn test_unparseable_hash_is_internal_error() {
        let result = verify_password("pw1".to_string(), "not-a-bcrypt-hash".to_string()).await;
        assert!(matches!(result, Err(AppError::InternalServerError(_))));
    }
}

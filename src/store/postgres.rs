use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CarStore, StoreError, StoreResult, UserStore};
use crate::models::{Car, CarFields, NewCar, NewUser, User};

const CAR_COLUMNS: &str =
    "id, user_id, title, description, tags, images, created_at, updated_at";

/// Postgres SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed record store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies the embedded migrations.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {}", e)))?;
        Ok(Self::new(pool))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::Duplicate("username".into());
            }
        }
        StoreError::Database(error.to_string())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = User::new(user);
        sqlx::query("INSERT INTO users (id, username, password_hash, created_at) VALUES ($1, $2, $3, $4)")
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl CarStore for PgStore {
    async fn insert_car(&self, car: NewCar) -> StoreResult<Car> {
        let car = Car::new(car);
        let sql = format!(
            "INSERT INTO cars ({CAR_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {CAR_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Car>(&sql)
            .bind(car.id)
            .bind(car.user_id)
            .bind(&car.title)
            .bind(&car.description)
            .bind(&car.tags)
            .bind(&car.images)
            .bind(car.created_at)
            .bind(car.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(inserted)
    }

    async fn list_cars(&self, owner: Uuid) -> StoreResult<Vec<Car>> {
        let sql = format!("SELECT {CAR_COLUMNS} FROM cars WHERE user_id = $1 ORDER BY created_at, id");
        let cars = sqlx::query_as::<_, Car>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(cars)
    }

    async fn find_car(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Car>> {
        let sql = format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1 AND user_id = $2");
        let car = sqlx::query_as::<_, Car>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(car)
    }

    async fn update_car(
        &self,
        owner: Uuid,
        id: Uuid,
        fields: CarFields,
        images: Vec<String>,
    ) -> StoreResult<Option<Car>> {
        let sql = format!(
            "UPDATE cars \
             SET title = $1, description = $2, tags = $3, images = $4, updated_at = NOW() \
             WHERE id = $5 AND user_id = $6 \
             RETURNING {CAR_COLUMNS}"
        );
        let car = sqlx::query_as::<_, Car>(&sql)
            .bind(fields.title)
            .bind(fields.description)
            .bind(fields.tags)
            .bind(images)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(car)
    }

    async fn delete_car(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Car>> {
        let sql = format!("DELETE FROM cars WHERE id = $1 AND user_id = $2 RETURNING {CAR_COLUMNS}");
        let car = sqlx::query_as::<_, Car>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(car)
    }
}

//! Record store for users and cars.
//!
//! Handlers and services only see the [`UserStore`] and [`CarStore`] traits. Every car
//! operation is keyed by both the car id and the owner id, so a car owned by someone
//! else is indistinguishable from a missing one.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Car, CarFields, NewCar, NewUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the constrained field.
    #[error("{0} already exists")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with [`StoreError::Duplicate`] if the username is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait CarStore: Send + Sync {
    async fn insert_car(&self, car: NewCar) -> StoreResult<Car>;

    /// All cars of `owner` in insertion order.
    async fn list_cars(&self, owner: Uuid) -> StoreResult<Vec<Car>>;

    async fn find_car(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Car>>;

    /// Replaces title, description, tags and images and bumps `updated_at`.
    /// Returns `None` if no car `id` owned by `owner` exists.
    async fn update_car(
        &self,
        owner: Uuid,
        id: Uuid,
        fields: CarFields,
        images: Vec<String>,
    ) -> StoreResult<Option<Car>>;

    /// Removes the car and returns it as it was, or `None` if it did not exist.
    async fn delete_car(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Car>>;
}

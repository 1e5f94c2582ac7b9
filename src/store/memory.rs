//! In-process record store.
//!
//! Used by the test suites and when the server is started with `DATABASE_URL=memory`.
//! Data lives only as long as the process.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CarStore, StoreError, StoreResult, UserStore};
use crate::models::{Car, CarFields, NewCar, NewUser, User};

/// Cheaply cloneable; all clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    // Vec keeps insertion order for listing.
    cars: Arc<RwLock<Vec<Car>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(StoreError::Duplicate("username".into()));
        }
        let user = User::new(user);
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }
}

#[async_trait]
impl CarStore for MemoryStore {
    async fn insert_car(&self, car: NewCar) -> StoreResult<Car> {
        let car = Car::new(car);
        self.cars.write().await.push(car.clone());
        Ok(car)
    }

    async fn list_cars(&self, owner: Uuid) -> StoreResult<Vec<Car>> {
        Ok(self
            .cars
            .read()
            .await
            .iter()
            .filter(|car| car.user_id == owner)
            .cloned()
            .collect())
    }

    async fn find_car(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Car>> {
        Ok(self
            .cars
            .read()
            .await
            .iter()
            .find(|car| car.id == id && car.user_id == owner)
            .cloned())
    }

    async fn update_car(
        &self,
        owner: Uuid,
        id: Uuid,
        fields: CarFields,
        images: Vec<String>,
    ) -> StoreResult<Option<Car>> {
        let mut cars = self.cars.write().await;
        let Some(car) = cars
            .iter_mut()
            .find(|car| car.id == id && car.user_id == owner)
        else {
            return Ok(None);
        };
        car.title = fields.title;
        car.description = fields.description;
        car.tags = fields.tags;
        car.images = images;
        car.updated_at = Utc::now();
        Ok(Some(car.clone()))
    }

    async fn delete_car(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Car>> {
        let mut cars = self.cars.write().await;
        Ok(cars
            .iter()
            .position(|car| car.id == id && car.user_id == owner)
            .map(|index| cars.remove(index)))
    }
}

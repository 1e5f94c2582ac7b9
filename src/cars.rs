//! Car lifecycle: create, read, update and delete of car records together with the
//! images they reference.
//!
//! A car moves `nonexistent -> active -> deleted`. Every operation is scoped to the
//! owner, and a car owned by someone else is reported exactly like a missing one.
//!
//! The record store and the blob store are not updated transactionally. Blob writes
//! happen before the record changes and are undone if the record change fails. Blob
//! deletions happen only after the record no longer references them; they are
//! best-effort and only logged, so a failure there can leave an orphaned object but
//! never a car pointing at a missing one.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::blob::{key_from_location, upload_key, BlobStore};
use crate::error::AppError;
use crate::models::{Car, CarFields, NewCar};
use crate::store::CarStore;

/// Most image files accepted in one create or update request.
pub const MAX_IMAGES_PER_REQUEST: usize = 10;

/// Largest single image file accepted, in bytes.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// An image file received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct CarManager {
    store: Arc<dyn CarStore>,
    blobs: Arc<dyn BlobStore>,
}

impl CarManager {
    pub fn new(store: Arc<dyn CarStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Stores the uploads and inserts a car owned by `owner` whose `images` are the
    /// resulting locations in upload order.
    pub async fn create(
        &self,
        owner: Uuid,
        fields: CarFields,
        uploads: Vec<ImageUpload>,
    ) -> Result<Car, AppError> {
        fields.validate()?;
        check_upload_count(&uploads)?;

        let images = self.store_uploads(uploads).await?;
        match self
            .store
            .insert_car(NewCar {
                user_id: owner,
                fields,
                images: images.clone(),
            })
            .await
        {
            Ok(car) => {
                log::info!("created car {} with {} image(s)", car.id, car.images.len());
                Ok(car)
            }
            Err(e) => {
                self.remove_blobs(&images).await;
                Err(e.into())
            }
        }
    }

    /// All cars of `owner`, optionally narrowed by a case-insensitive substring search.
    pub async fn list(&self, owner: Uuid, search: Option<&str>) -> Result<Vec<Car>, AppError> {
        let cars = self.store.list_cars(owner).await?;
        Ok(match search {
            Some(query) => cars.into_iter().filter(|car| car.matches(query)).collect(),
            None => cars,
        })
    }

    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<Car, AppError> {
        self.store.find_car(owner, id).await?.ok_or_else(car_not_found)
    }

    /// Replaces title, description and tags, keeps the images listed in `keep`, drops
    /// the rest from the blob store and appends the new uploads.
    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        fields: CarFields,
        keep: Vec<String>,
        uploads: Vec<ImageUpload>,
    ) -> Result<Car, AppError> {
        fields.validate()?;
        check_upload_count(&uploads)?;

        let car = self.get(owner, id).await?;
        let (mut images, removed) = reconcile_images(&car.images, &keep);

        // Upload first: if this fails the car and its current blobs are untouched.
        let added = self.store_uploads(uploads).await?;
        images.extend(added.iter().cloned());

        match self.store.update_car(owner, id, fields, images).await {
            Ok(Some(updated)) => {
                self.remove_blobs(&removed).await;
                log::info!(
                    "updated car {}: {} image(s) removed, {} added",
                    id,
                    removed.len(),
                    added.len()
                );
                Ok(updated)
            }
            Ok(None) => {
                self.remove_blobs(&added).await;
                Err(car_not_found())
            }
            Err(e) => {
                self.remove_blobs(&added).await;
                Err(e.into())
            }
        }
    }

    /// Deletes the car, then every blob it referenced.
    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), AppError> {
        let car = self
            .store
            .delete_car(owner, id)
            .await?
            .ok_or_else(car_not_found)?;
        self.remove_blobs(&car.images).await;
        log::info!("deleted car {}", id);
        Ok(())
    }

    /// Writes every upload, returning locations in order. If any write fails the ones
    /// already written are removed and the error is returned.
    async fn store_uploads(&self, uploads: Vec<ImageUpload>) -> Result<Vec<String>, AppError> {
        // Increasing prefixes keep the batch in upload order; the uuid keeps keys unique.
        let base_millis = Utc::now().timestamp_millis();
        let mut locations = Vec::with_capacity(uploads.len());
        for (offset, upload) in (0_i64..).zip(uploads) {
            let key = upload_key(base_millis + offset, Uuid::new_v4(), &upload.filename);
            match self
                .blobs
                .put(&key, upload.data, upload.content_type.as_deref())
                .await
            {
                Ok(location) => locations.push(location),
                Err(e) => {
                    log::error!("failed to store upload {}: {}", key, e);
                    self.remove_blobs(&locations).await;
                    return Err(e.into());
                }
            }
        }
        Ok(locations)
    }

    async fn remove_blobs(&self, locations: &[String]) {
        for location in locations {
            let key = key_from_location(location);
            if let Err(e) = self.blobs.delete(key).await {
                log::warn!("failed to delete blob {} ({}): {}", key, location, e);
            }
        }
    }
}

/// Splits `current` into the images to keep and the ones to remove.
///
/// Kept images follow the order of `keep`; entries of `keep` that are not among
/// `current` are ignored and duplicates collapse to their first occurrence. Removed
/// images are `current` minus `keep`, by exact string match, in their current order.
pub fn reconcile_images(current: &[String], keep: &[String]) -> (Vec<String>, Vec<String>) {
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let keep_set: HashSet<&str> = keep.iter().map(String::as_str).collect();

    let mut seen = HashSet::new();
    let kept = keep
        .iter()
        .filter(|location| current_set.contains(location.as_str()))
        .filter(|location| seen.insert(location.as_str()))
        .cloned()
        .collect();
    let removed = current
        .iter()
        .filter(|location| !keep_set.contains(location.as_str()))
        .cloned()
        .collect();
    (kept, removed)
}

fn check_upload_count(uploads: &[ImageUpload]) -> Result<(), AppError> {
    if uploads.len() > MAX_IMAGES_PER_REQUEST {
        return Err(AppError::ValidationError(format!(
            "at most {} images may be uploaded per request",
            MAX_IMAGES_PER_REQUEST
        )));
    }
    Ok(())
}

fn car_not_found() -> AppError {
    AppError::NotFound("Car not found".into())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// A car listing as stored in the record store and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    /// Unique identifier for the car (UUID v4).
    pub id: Uuid,
    /// The owning user. Only this user may read, update or delete the car.
    pub user_id: Uuid,
    #[schema(example = "2019 Toyota Camry")]
    pub title: String,
    #[schema(example = "A well-maintained car with low mileage")]
    pub description: String,
    #[schema(example = json!(["sedan", "toyota", "camry"]))]
    pub tags: Vec<String>,
    /// Blob locations in display order.
    #[schema(example = json!(["/uploads/1596234932334-0d9e3c2b8f4a4c1e9a7b5d6f3e2a1c0b-image.jpg"]))]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The three fields every create and update replaces wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct CarFields {
    #[validate(custom = "not_blank")]
    pub title: String,
    #[validate(custom = "not_blank")]
    pub description: String,
    pub tags: Vec<String>,
}

/// A car about to be inserted.
#[derive(Debug, Clone)]
pub struct NewCar {
    pub user_id: Uuid,
    pub fields: CarFields,
    pub images: Vec<String>,
}

/// Query parameters accepted when listing cars.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CarQuery {
    /// Case-insensitive substring matched against title, description and tags.
    pub search: Option<String>,
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("required"));
    }
    Ok(())
}

impl Car {
    pub fn new(input: NewCar) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            title: input.fields.title,
            description: input.fields.description,
            tags: input.fields.tags,
            images: input.images,
            created_at: now,
            updated_at: now,
        }
    }

    /// Naive substring match used by the list search.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

/// Decodes the `tags` form value.
///
/// A JSON array of strings is taken as-is. Anything else that is not blank becomes a
/// single tag holding the raw value.
pub fn decode_tags(raw: Option<&str>) -> Vec<String> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Vec::new(),
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(tags) => tags,
        Err(_) => vec![raw.to_string()],
    }
}

/// Decodes the `existingImages` form value: a JSON array of locations, `[]` when absent.
pub fn decode_keep_list(raw: Option<&str>) -> Result<Vec<String>, AppError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw).map_err(|e| {
            AppError::BadRequest(format!("existingImages must be a JSON array of strings: {}", e))
        }),
        _ => Ok(Vec::new()),
    }
}

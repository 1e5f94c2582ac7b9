use actix_multipart::{Field, Multipart, MultipartError};
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;

use crate::cars::{ImageUpload, MAX_IMAGES_PER_REQUEST, MAX_IMAGE_BYTES};
use crate::error::AppError;
use crate::models::{decode_tags, CarFields};

/// Largest text part (title, description, tags, existingImages) accepted, in bytes.
pub const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// The decoded `multipart/form-data` body of a create or update request.
///
/// Text parts are kept raw; interpretation (tags JSON, keep list) happens later.
/// Unknown parts are read and dropped.
#[derive(Debug, Default)]
pub struct CarForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub existing_images: Option<String>,
    pub images: Vec<ImageUpload>,
}

impl CarForm {
    /// Reads the whole payload. Stops with `ValidationError` as soon as more than
    /// `MAX_IMAGES_PER_REQUEST` files arrive or a part outgrows its byte limit
    /// (`MAX_IMAGE_BYTES` for files, `MAX_TEXT_FIELD_BYTES` for everything else).
    pub async fn read(mut payload: Multipart) -> Result<Self, AppError> {
        let mut form = CarForm::default();

        while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
            let disposition = field.content_disposition();
            let name = disposition.get_name().unwrap_or_default().to_string();
            let filename = disposition.get_filename().map(str::to_string);
            let content_type = field.content_type().map(|mime| mime.to_string());
            let limit = match name.as_str() {
                "images" | "images[]" => MAX_IMAGE_BYTES,
                _ => MAX_TEXT_FIELD_BYTES,
            };
            let data = read_field(&mut field, &name, limit).await?;

            match name.as_str() {
                "images" | "images[]" => {
                    // Browsers send an empty part when no file was picked.
                    if data.is_empty() && filename.as_deref().unwrap_or_default().is_empty() {
                        continue;
                    }
                    if form.images.len() == MAX_IMAGES_PER_REQUEST {
                        return Err(AppError::ValidationError(format!(
                            "at most {} images may be uploaded per request",
                            MAX_IMAGES_PER_REQUEST
                        )));
                    }
                    form.images.push(ImageUpload {
                        filename: filename.unwrap_or_default(),
                        content_type,
                        data,
                    });
                }
                "title" => form.title = Some(into_text(&name, data)?),
                "description" => form.description = Some(into_text(&name, data)?),
                "tags" => form.tags = Some(into_text(&name, data)?),
                "existingImages" => form.existing_images = Some(into_text(&name, data)?),
                _ => log::debug!("ignoring multipart field {:?}", name),
            }
        }

        Ok(form)
    }

    /// Takes title, description and tags out of the form. Missing text parts become
    /// empty strings so validation reports them.
    pub fn take_fields(&mut self) -> CarFields {
        CarFields {
            title: self.title.take().unwrap_or_default(),
            description: self.description.take().unwrap_or_default(),
            tags: decode_tags(self.tags.as_deref()),
        }
    }
}

async fn read_field(field: &mut Field, name: &str, limit: usize) -> Result<Bytes, AppError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        if buffer.len() + chunk.len() > limit {
            return Err(AppError::ValidationError(format!(
                "field {} exceeds {} bytes",
                name, limit
            )));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

fn into_text(name: &str, data: Bytes) -> Result<String, AppError> {
    String::from_utf8(data.to_vec())
        .map_err(|_| AppError::BadRequest(format!("field {} is not valid UTF-8", name)))
}

fn malformed(error: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", error))
}

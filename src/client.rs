//! Typed client for the car listing REST API.
//!
//! The bearer token is never stored in the client: `login` returns a [`BearerToken`]
//! and every protected call takes one explicitly. A `401` answer surfaces as
//! [`ClientError::Unauthorized`] so the caller knows to drop its token and log in again.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Credentials, TokenResponse};
use crate::models::Car;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL: {0}")]
    Url(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token missing, invalid or expired")]
    Unauthorized,

    #[error("API error ({status}): {body}")]
    Api { status: StatusCode, body: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// A credential returned by `login`, passed to each protected call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A file to attach to a create or update request.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Title, description and tags as sent by a create or update form.
#[derive(Debug, Clone, Default)]
pub struct CarDraft {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Parses the comma-separated tag input of the add/edit forms.
///
/// `"SUV, Sedan"` becomes `["SUV", "Sedan"]`; empty entries are dropped.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:8080/api`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| ClientError::Url(e.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Url(e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            status => Err(ClientError::Api {
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        Ok(self.send(request).await?.json().await?)
    }

    pub async fn signup(&self, credentials: &Credentials) -> ClientResult<()> {
        let url = self.url("auth/signup")?;
        self.send(self.http.post(url).json(credentials)).await?;
        Ok(())
    }

    pub async fn login(&self, credentials: &Credentials) -> ClientResult<BearerToken> {
        let url = self.url("auth/login")?;
        let response: TokenResponse = self.send_json(self.http.post(url).json(credentials)).await?;
        Ok(BearerToken(response.token))
    }

    pub async fn list_cars(&self, token: &BearerToken, search: Option<&str>) -> ClientResult<Vec<Car>> {
        let url = self.url("cars")?;
        let mut request = self.http.get(url).bearer_auth(token.as_str());
        if let Some(search) = search {
            request = request.query(&[("search", search)]);
        }
        self.send_json(request).await
    }

    pub async fn get_car(&self, token: &BearerToken, id: Uuid) -> ClientResult<Car> {
        let url = self.url(&format!("cars/{}", id))?;
        self.send_json(self.http.get(url).bearer_auth(token.as_str()))
            .await
    }

    pub async fn create_car(
        &self,
        token: &BearerToken,
        draft: &CarDraft,
        images: Vec<ImageFile>,
    ) -> ClientResult<Car> {
        let url = self.url("cars")?;
        let form = car_form(draft, images)?;
        self.send_json(self.http.post(url).bearer_auth(token.as_str()).multipart(form))
            .await
    }

    /// `keep` lists the current image locations to retain; the rest are deleted.
    pub async fn update_car(
        &self,
        token: &BearerToken,
        id: Uuid,
        draft: &CarDraft,
        keep: &[String],
        images: Vec<ImageFile>,
    ) -> ClientResult<Car> {
        let url = self.url(&format!("cars/{}", id))?;
        let keep = serde_json::to_string(keep).unwrap_or_else(|_| "[]".to_string());
        let form = car_form(draft, images)?.text("existingImages", keep);
        self.send_json(self.http.put(url).bearer_auth(token.as_str()).multipart(form))
            .await
    }

    pub async fn delete_car(&self, token: &BearerToken, id: Uuid) -> ClientResult<()> {
        let url = self.url(&format!("cars/{}", id))?;
        self.send(self.http.delete(url).bearer_auth(token.as_str()))
            .await?;
        Ok(())
    }
}

fn car_form(draft: &CarDraft, images: Vec<ImageFile>) -> ClientResult<Form> {
    let tags = serde_json::to_string(&draft.tags).unwrap_or_else(|_| "[]".to_string());
    let mut form = Form::new()
        .text("title", draft.title.clone())
        .text("description", draft.description.clone())
        .text("tags", tags);
    for image in images {
        let part = Part::bytes(image.data.to_vec())
            .file_name(image.filename)
            .mime_str(&image.content_type)?;
        form = form.part("images", part);
    }
    Ok(form)
}

#![doc = "The `carlot` library crate."]
#![doc = ""]
#![doc = "Per-user car listings with image uploads: authentication, the car lifecycle,"]
#![doc = "record and blob storage, HTTP routes, and a typed client for the REST API."]
#![doc = "The `carlot` binary (`main.rs`) wires these together into a server."]

pub mod auth;
pub mod blob;
pub mod cars;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};

use carlot::{
    auth::TokenService,
    blob::{BlobStore, LocalBlobStore, S3BlobStore},
    cars::CarManager,
    config::{Config, StorageConfig},
    routes::{self, health},
    state::AppState,
    store::{CarStore, MemoryStore, PgStore, UserStore},
};

fn startup_error(context: &str, error: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{}: {}", context, error))
}

async fn build_blob_store(storage: &StorageConfig) -> std::io::Result<Arc<dyn BlobStore>> {
    Ok(match storage {
        StorageConfig::Local { dir, url_prefix } => Arc::new(
            LocalBlobStore::new(dir, url_prefix)
                .await
                .map_err(|e| startup_error("failed to prepare upload directory", e))?,
        ),
        StorageConfig::S3 {
            bucket,
            region,
            endpoint,
            access_key_id,
            secret_access_key,
            public_url,
        } => {
            let credentials = access_key_id
                .as_deref()
                .zip(secret_access_key.as_deref());
            Arc::new(
                S3BlobStore::new(
                    bucket,
                    region,
                    endpoint.as_deref(),
                    credentials,
                    public_url.as_deref(),
                )
                .await,
            )
        }
    })
}

fn cors(origin: Option<&str>) -> Cors {
    let cors = match origin {
        Some(origin) => Cors::default().allowed_origin(origin).supports_credentials(),
        None => Cors::default().allow_any_origin(),
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::AUTHORIZATION])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;

    let (users, car_store): (Arc<dyn UserStore>, Arc<dyn CarStore>) = if config.uses_memory_store() {
        log::warn!("DATABASE_URL=memory: records will not outlive this process");
        let store = MemoryStore::new();
        (Arc::new(store.clone()), Arc::new(store))
    } else {
        let store = PgStore::connect(&config.database_url)
            .await
            .map_err(|e| startup_error("failed to connect to database", e))?;
        (Arc::new(store.clone()), Arc::new(store))
    };

    let blobs = build_blob_store(&config.storage).await?;
    let state = web::Data::new(AppState::new(
        users,
        CarManager::new(car_store, blobs),
        TokenService::new(&config.jwt_secret),
    ));

    let static_uploads = match &config.storage {
        StorageConfig::Local { dir, url_prefix } => Some((url_prefix.clone(), dir.clone())),
        StorageConfig::S3 { .. } => None,
    };
    let cors_origin = config.cors_origin.clone();

    log::info!("Starting carlot server at {}", config.server_url());
    HttpServer::new(move || {
        let mut app = App::new()
            .app_data(state.clone())
            .wrap(cors(cors_origin.as_deref()))
            .wrap(Logger::default())
            .service(health::health)
            .service(web::scope("/api").configure(routes::config));
        if let Some((prefix, dir)) = &static_uploads {
            app = app.service(Files::new(prefix, dir));
        }
        app
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}

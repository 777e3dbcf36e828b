use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use crate::adapters::api::{ApiState, configure_routes};
use crate::adapters::db::{open_connection, run_migrations, schema_version};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::services::SqlitePanelService;
use crate::domain::clock::SystemClock;

pub fn run(config: AppConfig) -> Result<(), AppError> {
    ensure_parent_dir(&config.db_path)?;

    let mut connection = open_connection(&config.db_path).map_err(AppError::database_init)?;
    run_migrations(&mut connection).map_err(AppError::database_init)?;
    let version = schema_version(&connection).map_err(AppError::database_init)?;
    tracing::info!(db_path = %config.db_path, schema_version = version, "database ready");

    let shared_connection = Arc::new(Mutex::new(connection));
    let api_state = ApiState {
        panels: SqlitePanelService::new(shared_connection),
        brands: Arc::new(config.panel_brands.clone()),
        page_limits: config.page_limits,
        clock: Arc::new(SystemClock),
    };
    let cors_allowed_origin = config.cors_allowed_origin.clone();

    tracing::info!(bind = %config.http_bind, "http server starting");

    actix_web::rt::System::new()
        .block_on(async move {
            HttpServer::new(move || {
                App::new()
                    .wrap(build_cors(cors_allowed_origin.as_deref()))
                    .app_data(web::Data::new(api_state.clone()))
                    .configure(configure_routes)
            })
            .bind(&config.http_bind)?
            .run()
            .await
        })
        .map_err(AppError::runtime)
}

fn build_cors(allowed_origin: Option<&str>) -> Cors {
    match allowed_origin {
        Some(origin) if origin != "*" => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_header(actix_web::http::header::CONTENT_TYPE)
            .max_age(3600),
        _ => Cors::permissive(),
    }
}

fn ensure_parent_dir(db_path: &str) -> Result<(), AppError> {
    if let Some(parent) = std::path::Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(AppError::database_init)?;
    }
    Ok(())
}

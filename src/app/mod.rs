mod config;
mod error;
mod logging;
mod runtime;
pub mod services;

pub use config::AppConfig;
pub use error::AppError;

pub fn run() -> Result<(), AppError> {
    let config = config::AppConfig::from_env()?;

    logging::init()?;

    tracing::info!(
        db_path = %config.db_path,
        http_bind = %config.http_bind,
        panel_brands = config.panel_brands.len(),
        default_page_size = config.page_limits.default_size,
        max_page_size = config.page_limits.max_size,
        cors_allowed_origin = config.cors_allowed_origin.as_deref().unwrap_or("*"),
        "application bootstrap initialized"
    );

    runtime::run(config)
}

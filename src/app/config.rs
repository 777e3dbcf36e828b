use crate::app::AppError;
use crate::domain::pagination::PageLimits;
use crate::domain::panel::BrandAllowList;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub http_bind: String,
    pub panel_brands: BrandAllowList,
    pub page_limits: PageLimits,
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` when present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let panel_brands = match non_empty(&lookup, "PANEL_BRANDS") {
            Some(raw) => BrandAllowList::from_csv(&raw),
            None => BrandAllowList::default(),
        };
        if panel_brands.is_empty() {
            return Err(AppError::config("PANEL_BRANDS must name at least one brand"));
        }

        let page_limits = PageLimits {
            default_size: parse_or_default(&lookup, "DEFAULT_PAGE_SIZE", 20_u32)?,
            max_size: parse_or_default(&lookup, "MAX_PAGE_SIZE", 500_u32)?,
        };
        if page_limits.default_size == 0 || page_limits.max_size == 0 {
            return Err(AppError::config("page sizes must be greater than zero"));
        }
        if page_limits.default_size > page_limits.max_size {
            return Err(AppError::config(
                "DEFAULT_PAGE_SIZE must not exceed MAX_PAGE_SIZE",
            ));
        }

        Ok(Self {
            db_path: non_empty(&lookup, "DB_PATH").unwrap_or_else(|| "./data/solar.db".to_string()),
            http_bind: non_empty(&lookup, "HTTP_BIND")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            panel_brands,
            page_limits,
            cors_allowed_origin: non_empty(&lookup, "CORS_ALLOWED_ORIGIN"),
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}

use std::sync::Arc;

use actix_web::error::InternalError;
use actix_web::{HttpResponse, Responder, get, post, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::app::services::{
    PanelCommandHandler, PanelQueryHandler, ServiceError, SqlitePanelService,
};
use crate::domain::clock::Clock;
use crate::domain::electricity::{DayWindow, HourlyReadingInput};
use crate::domain::models::{HourlyElectricityRecord, PanelRecord};
use crate::domain::pagination::{Page, PageLimits, PageMetadata, PageRequest};
use crate::domain::panel::{BrandAllowList, PanelRegistration, Serial, ValidationError};

#[derive(Clone)]
pub struct ApiState {
    pub panels: SqlitePanelService,
    pub brands: Arc<BrandAllowList>,
    pub page_limits: PageLimits,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PanelResponse {
    pub id: i64,
    pub serial: String,
    pub longitude: f64,
    pub latitude: f64,
    pub brand: String,
}

impl From<PanelRecord> for PanelResponse {
    fn from(panel: PanelRecord) -> Self {
        Self {
            id: panel.id,
            serial: panel.serial,
            longitude: panel.longitude,
            latitude: panel.latitude,
            brand: panel.brand,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PanelRefResponse {
    pub id: i64,
    pub serial: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HourlyElectricityResponse {
    pub id: i64,
    pub panel: PanelRefResponse,
    pub generated_electricity: i64,
    pub reading_at: String,
}

impl From<HourlyElectricityRecord> for HourlyElectricityResponse {
    fn from(reading: HourlyElectricityRecord) -> Self {
        Self {
            id: reading.id,
            panel: PanelRefResponse {
                id: reading.panel_id,
                serial: reading.panel_serial,
            },
            generated_electricity: reading.generated_electricity,
            reading_at: reading.reading_at,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub first: String,
    pub last: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PagedResponse<T> {
    pub content: Vec<T>,
    pub page: PageMetadata,
    pub links: PageLinks,
}

impl<T> PagedResponse<T> {
    fn new(page: Page<T>, base_path: &str) -> Self {
        let size = page.metadata.size;
        let href = |number: u64| format!("{base_path}?page={number}&size={size}");
        let number = u64::from(page.metadata.number);

        let links = PageLinks {
            self_link: href(number),
            first: href(0),
            last: href(page.last_number()),
            prev: page.has_previous().then(|| href(number - 1)),
            next: page.has_next().then(|| href(number + 1)),
        };

        Self {
            content: page.content,
            page: page.metadata,
            links,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub since: Option<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health)
        .service(register_panel_endpoint)
        .service(record_hourly_endpoint)
        .service(hourly_history_endpoint)
        .service(daily_electricity_endpoint)
        .service(get_panel_endpoint);
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|error, _req| {
        tracing::warn!(error = %error, "rejected unreadable request body");
        let response = HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("malformed request body: {error}")
        }));
        InternalError::from_response(error, response).into()
    })
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/api/register")]
async fn register_panel_endpoint(
    state: web::Data<ApiState>,
    body: web::Json<PanelRegistration>,
) -> impl Responder {
    let new_panel = match body.validate(&state.brands) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(error = %error, "panel registration rejected");
            return validation_error_response(error);
        }
    };

    match state.panels.register_panel(&new_panel) {
        Ok(panel) => HttpResponse::Accepted().json(PanelResponse::from(panel)),
        Err(error) => service_error_response(error),
    }
}

#[get("/api/panels/{serial}")]
async fn get_panel_endpoint(state: web::Data<ApiState>, path: web::Path<String>) -> impl Responder {
    let serial = match lookup_serial(&path) {
        Ok(value) => value,
        Err(response) => return response,
    };

    match state.panels.find_panel(&serial) {
        Ok(Some(panel)) => HttpResponse::Ok().json(PanelResponse::from(panel)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("no panel registered with serial {serial}")
        })),
        Err(error) => service_error_response(error),
    }
}

#[post("/api/panels/{serial}/hourly")]
async fn record_hourly_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<String>,
    body: web::Json<HourlyReadingInput>,
) -> impl Responder {
    let serial = match lookup_serial(&path) {
        Ok(value) => value,
        Err(response) => return response,
    };

    let reading = match body.validate() {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(serial = %serial, error = %error, "hourly reading rejected");
            return validation_error_response(error);
        }
    };

    match state.panels.record_hourly(&serial, &reading) {
        Ok(stored) => HttpResponse::Ok().json(HourlyElectricityResponse::from(stored)),
        Err(error) => service_error_response(error),
    }
}

#[get("/api/panels/{serial}/hourly-history")]
async fn hourly_history_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> impl Responder {
    let serial = match lookup_serial(&path) {
        Ok(value) => value,
        Err(response) => return response,
    };
    let request = PageRequest::new(query.page, query.size, state.page_limits);

    match state.panels.hourly_history(&serial, request) {
        Ok(page) => {
            let base_path = format!("/api/panels/{serial}/hourly-history");
            let page = page.map(HourlyElectricityResponse::from);
            HttpResponse::Ok().json(PagedResponse::new(page, &base_path))
        }
        Err(error) => service_error_response(error),
    }
}

#[get("/api/panels/{serial}/daily")]
async fn daily_electricity_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<String>,
    query: web::Query<DailyQuery>,
) -> impl Responder {
    let serial = match lookup_serial(&path) {
        Ok(value) => value,
        Err(response) => return response,
    };

    let now = state.clock.now();
    let window = match query.since.as_deref().map(str::trim) {
        None | Some("") => DayWindow::yesterday(now),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(first_day) => DayWindow::since(first_day, now),
            Err(_) => {
                return validation_error_response(ValidationError::single(
                    "since",
                    format!("'{raw}' is not a YYYY-MM-DD date"),
                ));
            }
        },
    };

    match state.panels.daily_electricity(&serial, &window) {
        Ok(days) => HttpResponse::Ok().json(days),
        Err(error) => service_error_response(error),
    }
}

/// A serial that fails the format rule in a URL path cannot address any
/// panel, so it answers 404 where registration answers 400.
fn lookup_serial(raw: &str) -> Result<Serial, HttpResponse> {
    Serial::parse(raw).map_err(|error| {
        HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("no panel addressable by serial '{raw}': {error}")
        }))
    })
}

fn validation_error_response(error: ValidationError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": "validation failed",
        "violations": error.violations,
    }))
}

fn service_error_response(error: ServiceError) -> HttpResponse {
    match error {
        ServiceError::DbLockPoisoned => {
            tracing::error!("database lock poisoned");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "database lock poisoned"
            }))
        }
        ServiceError::Database(error) => {
            tracing::error!(error = %error, "database operation failed");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("database query failed: {error}")
            }))
        }
        ServiceError::DuplicateSerial(serial) => validation_error_response(
            ValidationError::single("serial", format!("serial {serial} is already registered")),
        ),
        ServiceError::PanelNotFound(serial) => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("no panel registered with serial {serial}")
        })),
        error @ ServiceError::PanelMismatch { .. } => {
            validation_error_response(ValidationError::single("panel.id", error.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use actix_web::dev::ServiceResponse;
    use actix_web::http::header::ContentType;
    use actix_web::{App, body::to_bytes, http::StatusCode, test, web};
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    use crate::app::services::SqlitePanelService;
    use crate::domain::pagination::PageLimits;
    use crate::domain::panel::BrandAllowList;
    use crate::test_support::{FixedClock, open_test_connection};

    use super::{ApiState, configure_routes};

    const SERIAL: &str = "1234567890123456";

    fn build_state(name: &str) -> ApiState {
        let connection = open_test_connection(name);

        ApiState {
            panels: SqlitePanelService::new(Arc::new(Mutex::new(connection))),
            brands: Arc::new(BrandAllowList::default()),
            page_limits: PageLimits::default(),
            clock: Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2018, 7, 1, 8, 0, 0).unwrap(),
            )),
        }
    }

    async fn body_json(resp: ServiceResponse) -> Value {
        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        serde_json::from_slice(&body).expect("body should be json")
    }

    fn register_request(serial: &str, brand: &str) -> actix_web::test::TestRequest {
        test::TestRequest::post()
            .uri("/api/register")
            .insert_header(ContentType::json())
            .set_payload(format!(
                "{{\"serial\": \"{serial}\", \"longitude\": \"54.123232\", \"latitude\": \"54.123232\",\"brand\":\"{brand}\" }}"
            ))
    }

    fn hourly_request(serial: &str, value: i64, reading_at: &str) -> actix_web::test::TestRequest {
        test::TestRequest::post()
            .uri(&format!("/api/panels/{serial}/hourly"))
            .set_json(json!({
                "generatedElectricity": value,
                "readingAt": reading_at,
            }))
    }

    macro_rules! init_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_endpoint_returns_ok() {
        let app = init_app!(build_state("api-health"));

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn registers_valid_panel_with_accepted_status() {
        let app = init_app!(build_state("api-register-valid"));

        let resp = test::call_service(&app, register_request("1234567890ABCDEF", "tesla").to_request()).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let json = body_json(resp).await;
        assert_eq!(json["serial"], "1234567890ABCDEF");
        assert_eq!(json["brand"], "tesla");
        assert_eq!(json["latitude"], 54.123232);
        assert!(json["id"].as_i64().is_some());
    }

    #[actix_web::test]
    async fn rejects_short_serial_on_registration() {
        let app = init_app!(build_state("api-register-short"));

        let resp = test::call_service(&app, register_request("232323", "tesla").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = body_json(resp).await;
        assert_eq!(json["violations"][0]["field"], "serial");
    }


    #[actix_web::test]
    async fn rejects_padded_serial_on_registration() {
        let app = init_app!(build_state("api-register-padded"));

        let resp =
            test::call_service(&app, register_request("  1234567890ABCDEF  ", "tesla").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = body_json(resp).await;
        assert_eq!(json["violations"][0]["field"], "serial");

        let req = test::TestRequest::get()
            .uri("/api/panels/1234567890ABCDEF")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn rejects_short_serial_and_unknown_brand_together() {
        let app = init_app!(build_state("api-register-brand"));

        let resp = test::call_service(&app, register_request("654321", "teslar").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = body_json(resp).await;
        let violations = json["violations"].as_array().expect("violations should be an array");
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[1]["field"], "brand");
    }

    #[actix_web::test]
    async fn rejects_duplicate_registration() {
        let app = init_app!(build_state("api-register-duplicate"));

        let first = test::call_service(&app, register_request(SERIAL, "tesla").to_request()).await;
        assert_eq!(first.status(), StatusCode::ACCEPTED);

        let second = test::call_service(&app, register_request(SERIAL, "lg").to_request()).await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn rejects_unreadable_json_with_bad_request() {
        let app = init_app!(build_state("api-register-garbage"));

        let req = test::TestRequest::post()
            .uri("/api/register")
            .insert_header(ContentType::json())
            .set_payload("{\"serial\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap_or_default().starts_with("malformed request body"));
    }

    #[actix_web::test]
    async fn stores_hourly_reading_for_registered_panel() {
        let app = init_app!(build_state("api-hourly-store"));
        let registered = test::call_service(&app, register_request(SERIAL, "tesla").to_request()).await;
        let panel_id = body_json(registered).await["id"].as_i64().expect("id should be present");

        let req = test::TestRequest::post()
            .uri(&format!("/api/panels/{SERIAL}/hourly"))
            .insert_header(ContentType::json())
            .set_payload(format!(
                "{{ \"panel\": {{\"id\": \"{panel_id}\"}}, \"generatedElectricity\": \"50\", \"readingAt\": \"2018-06-30T00:00:00.000Z\" }}"
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["panel"]["id"], panel_id);
        assert_eq!(json["panel"]["serial"], SERIAL);
        assert_eq!(json["generatedElectricity"], 50);
        assert_eq!(json["readingAt"], "2018-06-30T00:00:00.000Z");
        assert!(json["id"].as_i64().is_some());
    }

    #[actix_web::test]
    async fn hourly_reading_for_unregistered_panel_is_not_found() {
        let app = init_app!(build_state("api-hourly-missing"));

        let resp = test::call_service(
            &app,
            hourly_request(SERIAL, 50, "2018-06-30T00:00:00.000Z").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn hourly_reading_with_malformed_serial_is_not_found() {
        let app = init_app!(build_state("api-hourly-bad-serial"));

        let resp = test::call_service(
            &app,
            hourly_request("123456", 50, "2018-06-30T00:00:00.000Z").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn hourly_reading_with_invalid_body_is_bad_request() {
        let app = init_app!(build_state("api-hourly-invalid"));
        test::call_service(&app, register_request(SERIAL, "tesla").to_request()).await;

        let resp = test::call_service(&app, hourly_request(SERIAL, -5, "not a time").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = body_json(resp).await;
        assert_eq!(json["violations"].as_array().map(Vec::len), Some(2));
    }


    #[actix_web::test]
    async fn hourly_reading_with_five_digit_year_is_bad_request() {
        let app = init_app!(build_state("api-hourly-far-year"));
        test::call_service(&app, register_request(SERIAL, "tesla").to_request()).await;

        let resp =
            test::call_service(&app, hourly_request(SERIAL, 50, "+12345-01-01T00:00:00").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["violations"][0]["field"], "readingAt");

        let req = test::TestRequest::get()
            .uri(&format!("/api/panels/{SERIAL}/hourly-history"))
            .to_request();
        let json = body_json(test::call_service(&app, req).await).await;
        assert_eq!(json["page"]["totalElements"], 0);
    }

    #[actix_web::test]
    async fn hourly_reading_referencing_other_panel_is_bad_request() {
        let app = init_app!(build_state("api-hourly-mismatch"));
        let registered = test::call_service(&app, register_request(SERIAL, "tesla").to_request()).await;
        let panel_id = body_json(registered).await["id"].as_i64().expect("id should be present");

        let req = test::TestRequest::post()
            .uri(&format!("/api/panels/{SERIAL}/hourly"))
            .set_json(json!({
                "panel": { "id": panel_id + 100 },
                "generatedElectricity": 50,
                "readingAt": "2018-06-30T00:00:00.000Z",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn history_for_valid_serial_without_data_is_empty_page() {
        let app = init_app!(build_state("api-history-empty"));

        let req = test::TestRequest::get()
            .uri(&format!("/api/panels/{SERIAL}/hourly-history"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["content"], json!([]));
        assert_eq!(json["page"]["totalElements"], 0);
        assert_eq!(json["page"]["size"], 20);
        assert_eq!(json["page"]["number"], 0);
        assert!(json["links"].get("next").is_none());
    }

    #[actix_web::test]
    async fn history_for_malformed_serial_is_not_found() {
        let app = init_app!(build_state("api-history-bad-serial"));

        let req = test::TestRequest::get()
            .uri("/api/panels/123456/hourly-history")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }


    #[actix_web::test]
    async fn path_serial_with_punctuation_is_not_found() {
        let app = init_app!(build_state("api-path-punctuation"));

        for uri in [
            "/api/panels/1234567890ABCDE-",
            "/api/panels/1234567890ABCDE-/hourly-history",
            "/api/panels/1234567890ABCDE-/daily",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");

            let json = body_json(resp).await;
            let error = json["error"].as_str().unwrap_or_default();
            assert!(error.contains("ASCII letters and digits"), "{uri}: {error}");
        }
    }

    #[actix_web::test]
    async fn stored_readings_show_up_in_history_pages() {
        let app = init_app!(build_state("api-history-pages"));
        test::call_service(&app, register_request(SERIAL, "tesla").to_request()).await;
        for hour in 0..3 {
            let resp = test::call_service(
                &app,
                hourly_request(SERIAL, 10 + hour, &format!("2018-06-30T0{hour}:00:00.000Z")).to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri(&format!("/api/panels/{SERIAL}/hourly-history?page=0&size=2"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        let content = json["content"].as_array().expect("content should be an array");
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["generatedElectricity"], 12);
        assert_eq!(json["page"]["totalElements"], 3);
        assert_eq!(json["page"]["totalPages"], 2);
        assert_eq!(
            json["links"]["next"],
            format!("/api/panels/{SERIAL}/hourly-history?page=1&size=2")
        );
        assert!(json["links"].get("prev").is_none());
    }

    #[actix_web::test]
    async fn daily_for_valid_serial_without_data_is_empty_list() {
        let app = init_app!(build_state("api-daily-empty"));

        let req = test::TestRequest::get()
            .uri(&format!("/api/panels/{SERIAL}/daily"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        assert_eq!(body_json(resp).await, json!([]));
    }


    #[actix_web::test]
    async fn daily_for_malformed_serial_is_not_found() {
        let app = init_app!(build_state("api-daily-bad-serial"));

        let req = test::TestRequest::get()
            .uri("/api/panels/123456/daily")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap_or_default().starts_with("no panel addressable"));
    }

    #[actix_web::test]
    async fn daily_aggregates_only_yesterdays_readings() {
        let app = init_app!(build_state("api-daily-yesterday"));
        test::call_service(&app, register_request(SERIAL, "tesla").to_request()).await;
        for (value, reading_at) in [
            (1000, "2018-06-29T23:00:00.000Z"),
            (50, "2018-06-30T00:00:00.000Z"),
            (70, "2018-06-30T13:00:00.000Z"),
            (2000, "2018-07-01T01:00:00.000Z"),
        ] {
            let resp =
                test::call_service(&app, hourly_request(SERIAL, value, reading_at).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri(&format!("/api/panels/{SERIAL}/daily"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(
            json,
            json!([{ "date": "2018-06-30", "sum": 120, "average": 60.0, "min": 50, "max": 70 }])
        );
    }

    #[actix_web::test]
    async fn daily_since_lists_each_day_until_yesterday() {
        let app = init_app!(build_state("api-daily-since"));
        test::call_service(&app, register_request(SERIAL, "tesla").to_request()).await;
        for (value, reading_at) in [
            (10, "2018-06-28T10:00:00.000Z"),
            (20, "2018-06-30T10:00:00.000Z"),
            (30, "2018-07-01T01:00:00.000Z"),
        ] {
            test::call_service(&app, hourly_request(SERIAL, value, reading_at).to_request()).await;
        }

        let req = test::TestRequest::get()
            .uri(&format!("/api/panels/{SERIAL}/daily?since=2018-06-01"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        let days = json.as_array().expect("response should be an array");
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["date"], "2018-06-28");
        assert_eq!(days[1]["sum"], 20);
    }

    #[actix_web::test]
    async fn daily_rejects_unreadable_since_date() {
        let app = init_app!(build_state("api-daily-bad-since"));

        let req = test::TestRequest::get()
            .uri(&format!("/api/panels/{SERIAL}/daily?since=last-week"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn panel_lookup_distinguishes_unknown_and_registered() {
        let app = init_app!(build_state("api-panel-lookup"));

        let req = test::TestRequest::get()
            .uri(&format!("/api/panels/{SERIAL}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        test::call_service(&app, register_request(SERIAL, "Tesla").to_request()).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/panels/{SERIAL}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["brand"], "tesla");
    }

    #[actix_web::test]
    async fn panel_lookup_for_malformed_serial_is_not_found() {
        let app = init_app!(build_state("api-panel-bad-serial"));

        let req = test::TestRequest::get().uri("/api/panels/123456").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap_or_default().starts_with("no panel addressable"));
    }
}

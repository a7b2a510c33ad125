use actix_web::{
    error::InternalError,
    http::{header::CACHE_CONTROL, StatusCode},
    web, HttpResponse,
};
use serde::{Deserialize, Serialize};
use slotscope_common::utils::time::elapsed_millis;
use slotscope_storage::{ContractStorage, Error as StorageError, StorageQuery, StorageService};
use std::time::Instant;
use tracing::{debug, error, warn};

/// Freshness advertised on successful storage responses: five minutes, then ten more minutes
/// of stale-while-revalidate.
pub const CACHE_CONTROL_VALUE: &str = "public, s-maxage=300, stale-while-revalidate=600";

/// Body of a successful storage response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StorageBody {
    /// Whether the request succeeded
    pub success: bool,
    /// The decoded storage
    pub data: ContractStorage,
    /// Whether `data` was served from the cache
    pub cached: bool,
    /// Milliseconds spent serving the request
    pub latency: u64,
}

/// Body of every failed response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// Whether the request succeeded
    pub success: bool,
    /// A human readable description of the failure
    pub error: String,
    /// Milliseconds spent serving the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<u64>,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthBody {
    /// Always `ok` while the server is accepting requests
    pub status: String,
    /// The crate version of the running server
    pub version: String,
}

/// Query parameters of `GET /storage/{address}`. They are parsed by hand so malformed numbers
/// are reported with the same messages as out of range ones.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageParams {
    chain_id: Option<String>,
    start: Option<String>,
    end: Option<String>,
    block_tag: Option<String>,
}

impl StorageParams {
    fn to_query(&self, address: &str) -> Result<StorageQuery, StorageError> {
        let chain_id = match self.chain_id.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| StorageError::Validation("Invalid chainId".to_string()))?,
        };

        Ok(StorageQuery {
            address: address.to_string(),
            chain_id,
            start: parse_bound("start", self.start.as_deref(), 0)?,
            end: parse_bound("end", self.end.as_deref(), 255)?,
            block_tag: match self.block_tag.as_deref().map(str::trim) {
                None | Some("") => "latest".to_string(),
                Some(tag) => tag.to_string(),
            },
        })
    }
}

fn parse_bound(name: &str, raw: Option<&str>, default: i64) -> Result<i64, StorageError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            StorageError::Validation(format!(
                "Invalid slot range: {name} ({raw}) must be a non-negative integer"
            ))
        }),
    }
}

fn error_response(err: &StorageError, latency: Option<u64>) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ErrorBody { success: false, error: err.to_string(), latency })
}

async fn get_storage(
    path: web::Path<String>,
    params: web::Query<StorageParams>,
    service: web::Data<StorageService>,
) -> HttpResponse {
    let start_time = Instant::now();
    let address = path.into_inner();

    let result = match params.to_query(&address) {
        Ok(query) => service.get_storage(&query).await,
        Err(e) => Err(e),
    };
    let latency = elapsed_millis(start_time);

    match result {
        Ok(response) => {
            debug!("GET /storage/{} served in {}ms (cached: {})", address, latency, response.cached);
            HttpResponse::Ok().insert_header((CACHE_CONTROL, CACHE_CONTROL_VALUE)).json(
                StorageBody { success: true, data: response.data, cached: response.cached, latency },
            )
        }
        Err(e) => {
            match e.status_code() {
                400 | 404 => debug!("GET /storage/{} rejected: {}", address, e),
                429 | 504 => warn!("GET /storage/{} failed upstream: {}", address, e),
                _ => error!("GET /storage/{} failed: {}", address, e),
            }
            error_response(&e, Some(latency))
        }
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthBody {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Registers the slotscope routes. The app must carry a `web::Data<StorageService>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let response =
            error_response(&StorageError::Validation(format!("Invalid query: {err}")), None);
        InternalError::from_response(err, response).into()
    }))
    .service(web::resource("/storage/{address}").route(web::get().to(get_storage)))
    .service(web::resource("/health").route(web::get().to(health)));
}

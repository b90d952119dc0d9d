//! REST API for the pallet placement service.
//!
//! Uses Axum as the web framework and supports CORS. The placement engine is
//! CPU-bound and runs on the blocking pool.

use std::convert::Infallible;
use std::ops::ControlFlow;
use std::sync::OnceLock;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig, RequestLimits};
use crate::metrics::PalletMetrics;
use crate::model::{BoxSpec, PalletSpec, PlacedBox, ValidationError};
use crate::optimizer::{
    PackingResult, PalletOutcome, pack_pallets, pack_pallets_with_progress,
};
use crate::types::Dims;

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
    limits: RequestLimits,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>pallet-stack API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
</html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// A pallet in the request. Ids are assigned from the list order, starting at 1.
#[derive(Deserialize, Clone, ToSchema)]
pub struct PalletRequest {
    pub name: Option<String>,
    /// Length, width and usable stacking height.
    #[schema(value_type = [f64; 3], example = json!([80.0, 60.0, 115.0]))]
    pub dims: (f64, f64, f64),
}

impl PalletRequest {
    fn into_spec(self, id: usize) -> Result<PalletSpec, ValidationError> {
        PalletSpec::new(id, self.name, Dims::from(self.dims))
    }
}

/// A box type in the request.
#[derive(Deserialize, Clone, ToSchema)]
pub struct BoxTypeRequest {
    pub name: String,
    /// Length, width and height.
    #[schema(value_type = [f64; 3], example = json!([40.0, 30.0, 10.0]))]
    pub dims: (f64, f64, f64),
    /// Weight of one box in kg.
    pub weight: f64,
    pub quantity: u32,
}

impl BoxTypeRequest {
    fn into_spec(self) -> Result<BoxSpec, ValidationError> {
        BoxSpec::new(self.name, Dims::from(self.dims), self.weight, self.quantity)
    }
}

#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "pallets": [
            { "name": "EUR", "dims": [80.0, 60.0, 115.0] }
        ],
        "boxes": [
            { "name": "Box 1", "dims": [40.0, 30.0, 10.0], "weight": 1.0, "quantity": 6 }
        ]
    })
)]
pub struct PackRequest {
    pub pallets: Vec<PalletRequest>,
    pub boxes: Vec<BoxTypeRequest>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    pallets: Vec<PalletSpec>,
    boxes: Vec<BoxSpec>,
}

impl ValidatedPackRequest {
    fn unit_count(&self) -> u64 {
        self.boxes.iter().map(|b| u64::from(b.quantity)).sum()
    }
}

#[derive(Debug)]
enum PackRequestValidationError {
    MissingPallets,
    TooManyPallets { count: usize, max: usize },
    TooManyUnits { count: u64, max: u64 },
    InvalidPallet(ValidationError),
    InvalidBox(ValidationError),
}

impl PackRequest {
    fn into_validated(
        self,
        limits: &RequestLimits,
    ) -> Result<ValidatedPackRequest, PackRequestValidationError> {
        if self.pallets.is_empty() {
            return Err(PackRequestValidationError::MissingPallets);
        }
        if self.pallets.len() > limits.max_pallets {
            return Err(PackRequestValidationError::TooManyPallets {
                count: self.pallets.len(),
                max: limits.max_pallets,
            });
        }

        let pallets = self
            .pallets
            .into_iter()
            .enumerate()
            .map(|(idx, spec)| spec.into_spec(idx + 1))
            .collect::<Result<Vec<_>, ValidationError>>()
            .map_err(PackRequestValidationError::InvalidPallet)?;

        let boxes = self
            .boxes
            .into_iter()
            .map(BoxTypeRequest::into_spec)
            .collect::<Result<Vec<_>, ValidationError>>()
            .map_err(PackRequestValidationError::InvalidBox)?;

        let validated = ValidatedPackRequest { pallets, boxes };
        let units = validated.unit_count();
        if units > limits.max_units {
            return Err(PackRequestValidationError::TooManyUnits {
                count: units,
                max: limits.max_units,
            });
        }
        Ok(validated)
    }
}

/// Response with one entry per requested pallet.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub results: Vec<PalletResult>,
    /// True when every pallet received every box.
    pub all_placed: bool,
}

/// Outcome for a single pallet.
///
/// Exactly one of `boxes`/`metrics` (on success) or `failure` is meaningful.
#[derive(Serialize, ToSchema)]
pub struct PalletResult {
    pub id: usize,
    pub label: Option<String>,
    #[schema(value_type = [f64; 3], example = json!([80.0, 60.0, 115.0]))]
    pub dims: (f64, f64, f64),
    pub placed: bool,
    pub boxes: Vec<PackedBox>,
    pub volumetric_weight: Option<f64>,
    pub is_perfect: Option<bool>,
    pub metrics: Option<PalletMetrics>,
    pub failure: Option<PalletFailureInfo>,
}

/// A placed box with everything a renderer needs.
#[derive(Serialize, ToSchema)]
pub struct PackedBox {
    pub id: usize,
    pub name: String,
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub pos: (f64, f64, f64),
    /// Oriented length, width and height.
    #[schema(value_type = [f64; 3], example = json!([30.0, 40.0, 10.0]))]
    pub dims: (f64, f64, f64),
    pub weight: f64,
    pub support_threshold_used: u8,
    pub support_percent: f64,
    pub color: String,
    pub label: String,
}

impl From<&PlacedBox> for PackedBox {
    fn from(placed: &PlacedBox) -> Self {
        Self {
            id: placed.unit.id,
            name: placed.unit.name.clone(),
            pos: placed.position.as_tuple(),
            dims: placed.dims.as_tuple(),
            weight: placed.unit.weight,
            support_threshold_used: placed.support_threshold,
            support_percent: placed.support_percent,
            color: placed.unit.color().to_string(),
            label: placed.label(),
        }
    }
}

/// The first box that could not be placed.
#[derive(Serialize, ToSchema)]
pub struct PalletFailureInfo {
    pub box_id: usize,
    pub box_name: String,
    pub reason_code: String,
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn pallet_config_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid pallet configuration",
        details,
    )
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
    limits: &RequestLimits,
) -> Result<ValidatedPackRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    match payload.into_validated(limits) {
        Ok(validated) => Ok(validated),
        Err(PackRequestValidationError::MissingPallets) => Err(validation_error(
            "At least one pallet must be specified",
        )),
        Err(PackRequestValidationError::TooManyPallets { count, max }) => Err(validation_error(
            format!("{count} pallets requested, at most {max} are allowed"),
        )),
        Err(PackRequestValidationError::TooManyUnits { count, max }) => Err(validation_error(
            format!("{count} boxes requested in total, at most {max} are allowed"),
        )),
        Err(PackRequestValidationError::InvalidPallet(err)) => {
            Err(pallet_config_error(err.to_string()))
        }
        Err(PackRequestValidationError::InvalidBox(err)) => Err(validation_error(err.to_string())),
    }
}

impl PackResponse {
    pub fn from_packing_result(result: PackingResult) -> Self {
        let all_placed = result.all_placed();
        let results = result
            .outcomes
            .into_iter()
            .map(|outcome| match outcome {
                PalletOutcome::Placed(packing) => PalletResult {
                    id: packing.pallet.id,
                    label: packing.pallet.label,
                    dims: packing.pallet.dims.as_tuple(),
                    placed: true,
                    boxes: packing.boxes.iter().map(PackedBox::from).collect(),
                    volumetric_weight: Some(packing.metrics.volumetric_weight),
                    is_perfect: Some(packing.metrics.is_perfect),
                    metrics: Some(packing.metrics),
                    failure: None,
                },
                PalletOutcome::Failed(failure) => PalletResult {
                    id: failure.pallet.id,
                    label: failure.pallet.label,
                    dims: failure.pallet.dims.as_tuple(),
                    placed: false,
                    boxes: Vec::new(),
                    volumetric_weight: None,
                    is_perfect: None,
                    metrics: None,
                    failure: Some(PalletFailureInfo {
                        box_id: failure.box_id,
                        box_name: failure.box_name,
                        reason_code: failure.reason.code().to_string(),
                        reason: failure.reason.to_string(),
                    }),
                },
            })
            .collect();

        Self {
            results,
            all_placed,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream),
    components(
        schemas(
            PackRequest,
            PalletRequest,
            BoxTypeRequest,
            PackResponse,
            PalletResult,
            PackedBox,
            PalletFailureInfo,
            PalletMetrics,
            ErrorResponse
        )
    ),
    tags((name = "packing", description = "Endpoints for pallet placement"))
)]
struct ApiDoc;

/// Builds the router with all endpoints.
pub fn build_router(optimizer_config: OptimizerConfig, limits: RequestLimits) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        optimizer_config,
        limits,
    };

    Router::new()
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(config: ApiConfig, optimizer_config: OptimizerConfig) {
    let app = build_router(optimizer_config, config.limits());

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("Local access: http://localhost:{}", config.port());
    }
    info!("Endpoints: POST /pack, POST /pack_stream, GET /docs, GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        error!("API server terminated with an error: {err}");
    }
}

/// Handler for POST /pack.
///
/// Places every box type on each pallet independently.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Placement results per pallet", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or pallet configuration",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let request = match parse_pack_request(payload, &state.limits) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        pallets = request.pallets.len(),
        box_types = request.boxes.len(),
        units = request.unit_count(),
        "new pack request"
    );

    let packing_config = state.optimizer_config.packing_config();
    let ValidatedPackRequest { pallets, boxes } = request;
    let joined =
        tokio::task::spawn_blocking(move || pack_pallets(&boxes, &pallets, packing_config)).await;

    match joined {
        Ok(result) => {
            info!(
                pallets = result.pallet_count(),
                failed = result.failed_count(),
                "pack request finished"
            );
            let response = PackResponse::from_packing_result(result);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            error!("Packing task failed: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Packing failed",
                err.to_string(),
            )
        }
    }
}

/// Handler for POST /pack_stream (SSE).
///
/// Streams placement events as they happen, one JSON object per event.
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams placement events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or pallet configuration",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let request = match parse_pack_request(payload, &state.limits) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let packing_config = state.optimizer_config.packing_config();
    let ValidatedPackRequest { pallets, boxes } = request;
    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        pack_pallets_with_progress(&boxes, &pallets, packing_config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                if tx.blocking_send(json).is_err() {
                    // Client went away
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });
    });

    let stream =
        ReceiverStream::new(rx).map(|msg| Ok::<_, Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::optimizer::PackingConfig;

    fn router() -> Router {
        let config = PackingConfig::builder().parallel_pallets(false).build();
        build_router(OptimizerConfig::from(config), RequestLimits::default())
    }

    async fn post_json(path: &str, body: &str) -> (StatusCode, String) {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/pack"));
        assert!(paths.contains_key("/pack_stream"));
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        for name in ["PackRequest", "PackResponse", "PalletResult", "ErrorResponse"] {
            assert!(
                components.schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn pallet_ids_follow_request_order() {
        let json = r#"{
            "pallets": [{"dims": [80.0, 60.0, 115.0]}, {"name": "B", "dims": [50.0, 50.0, 50.0]}],
            "boxes": [{"name": "Box 1", "dims": [40.0, 30.0, 10.0], "weight": 1.0, "quantity": 6}]
        }"#;
        let request: PackRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        let validated = request
            .into_validated(&RequestLimits::default())
            .expect("Should validate");
        assert_eq!(validated.pallets[0].id, 1);
        assert_eq!(validated.pallets[1].id, 2);
        assert_eq!(validated.pallets[1].label.as_deref(), Some("B"));
        assert_eq!(validated.unit_count(), 6);
    }

    #[test]
    fn rejects_request_without_pallets() {
        let request = PackRequest {
            pallets: Vec::new(),
            boxes: Vec::new(),
        };
        assert!(matches!(
            request.into_validated(&RequestLimits::default()),
            Err(PackRequestValidationError::MissingPallets)
        ));
    }

    #[test]
    fn rejects_zero_quantity() {
        let request = PackRequest {
            pallets: vec![PalletRequest {
                name: None,
                dims: (80.0, 60.0, 115.0),
            }],
            boxes: vec![BoxTypeRequest {
                name: "Empty".into(),
                dims: (1.0, 1.0, 1.0),
                weight: 1.0,
                quantity: 0,
            }],
        };
        assert!(matches!(
            request.into_validated(&RequestLimits::default()),
            Err(PackRequestValidationError::InvalidBox(ValidationError::InvalidQuantity(_)))
        ));
    }

    #[test]
    fn rejects_requests_above_limits() {
        let limits = RequestLimits {
            max_units: 10,
            max_pallets: 1,
        };
        let pallet = PalletRequest {
            name: None,
            dims: (80.0, 60.0, 115.0),
        };
        let boxes = |quantity| {
            vec![
                BoxTypeRequest {
                    name: "A".into(),
                    dims: (1.0, 1.0, 1.0),
                    weight: 1.0,
                    quantity,
                },
                BoxTypeRequest {
                    name: "B".into(),
                    dims: (2.0, 1.0, 1.0),
                    weight: 1.0,
                    quantity: 5,
                },
            ]
        };

        let request = PackRequest {
            pallets: vec![pallet.clone()],
            boxes: boxes(5),
        };
        assert!(request.into_validated(&limits).is_ok());

        let request = PackRequest {
            pallets: vec![pallet.clone()],
            boxes: boxes(6),
        };
        assert!(matches!(
            request.into_validated(&limits),
            Err(PackRequestValidationError::TooManyUnits { count: 11, max: 10 })
        ));

        let request = PackRequest {
            pallets: vec![pallet.clone(), pallet],
            boxes: boxes(1),
        };
        assert!(matches!(
            request.into_validated(&limits),
            Err(PackRequestValidationError::TooManyPallets { count: 2, max: 1 })
        ));
    }

    #[tokio::test]
    async fn pack_endpoint_rejects_huge_quantity() {
        for path in ["/pack", "/pack_stream"] {
            let (status, body) = post_json(
                path,
                r#"{
                    "pallets": [{"dims": [80.0, 60.0, 115.0]}],
                    "boxes": [{"name": "Flood", "dims": [1.0, 1.0, 1.0], "weight": 1.0, "quantity": 4294967295}]
                }"#,
            )
            .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{path}");
            let json: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(json["error"], "Invalid input data");
            assert!(json["details"].as_str().unwrap().contains("4294967295"));
        }
    }

    #[tokio::test]
    async fn pack_endpoint_places_boxes() {
        let (status, body) = post_json(
            "/pack",
            r#"{
                "pallets": [{"name": "EUR", "dims": [80.0, 60.0, 115.0]}],
                "boxes": [{"name": "Box 1", "dims": [40.0, 30.0, 10.0], "weight": 1.0, "quantity": 1}]
            }"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["all_placed"], true);
        let pallet = &json["results"][0];
        assert_eq!(pallet["id"], 1);
        assert_eq!(pallet["label"], "EUR");
        assert_eq!(pallet["placed"], true);
        assert_eq!(pallet["volumetric_weight"], 8.0);
        assert_eq!(pallet["is_perfect"], false);
        let placed = &pallet["boxes"][0];
        assert_eq!(placed["name"], "Box 1");
        assert_eq!(placed["pos"], json!([0.0, 0.0, 0.0]));
        assert_eq!(placed["dims"], json!([30.0, 40.0, 10.0]));
        assert_eq!(placed["support_threshold_used"], 80);
        assert_eq!(placed["color"], "red");
    }

    #[tokio::test]
    async fn pack_endpoint_reports_failed_pallet() {
        let (status, body) = post_json(
            "/pack",
            r#"{
                "pallets": [{"dims": [80.0, 60.0, 115.0]}],
                "boxes": [{"name": "Too long", "dims": [90.0, 30.0, 10.0], "weight": 1.0, "quantity": 1}]
            }"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["all_placed"], false);
        let pallet = &json["results"][0];
        assert_eq!(pallet["placed"], false);
        assert_eq!(pallet["boxes"], json!([]));
        assert_eq!(pallet["failure"]["box_name"], "Too long");
        assert_eq!(pallet["failure"]["reason_code"], "no_supported_position");
    }

    #[tokio::test]
    async fn pack_endpoint_rejects_invalid_input() {
        let (status, body) = post_json(
            "/pack",
            r#"{
                "pallets": [{"dims": [80.0, 60.0, 115.0]}],
                "boxes": [{"name": "Bad", "dims": [-1.0, 30.0, 10.0], "weight": 1.0, "quantity": 1}]
            }"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Invalid input data");

        let (status, _) = post_json("/pack", "{not json").await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn pack_stream_emits_events() {
        let (status, body) = post_json(
            "/pack_stream",
            r#"{
                "pallets": [{"dims": [80.0, 60.0, 115.0]}],
                "boxes": [{"name": "Box 1", "dims": [40.0, 30.0, 10.0], "weight": 1.0, "quantity": 2}]
            }"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"type\":\"PalletStarted\""));
        assert_eq!(body.matches("\"type\":\"BoxPlaced\"").count(), 2);
        assert!(body.contains("\"type\":\"Finished\""));
    }
}

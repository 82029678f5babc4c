use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    CalcError, IncomeSnapshot, Inputs, Projection, ProjectionMonth, calculate_income,
    run_projection,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const DEFAULT_SYMBOL: &str = "TSLY";
const MAX_DAYS_TO_EXPIRATION: u32 = 30;
const MAX_SHARE_COUNT: i64 = i64::MAX / 2;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    symbol: Option<String>,
    share_count: Option<i64>,
    share_price: Option<f64>,
    strike_price: Option<f64>,
    option_premium: Option<f64>,
    monthly_dividend: Option<f64>,
    days_to_expiration: Option<u32>,
    monthly_contribution: Option<f64>,
}

/// Position and option parameters, shared by the `report` command and the
/// HTTP payload defaults.
#[derive(Args, Debug, Clone)]
pub struct CalcArgs {
    #[arg(long, default_value = DEFAULT_SYMBOL, help = "Ticker shown in labels")]
    pub symbol: String,
    #[arg(long, default_value_t = 2320, help = "Shares currently held")]
    pub share_count: i64,
    #[arg(long, default_value_t = 8.28, help = "Current price per share")]
    pub share_price: f64,
    #[arg(
        long,
        default_value_t = 9.00,
        help = "Strike of the sold call (display only)"
    )]
    pub strike_price: f64,
    #[arg(
        long,
        default_value_t = 0.10,
        allow_negative_numbers = true,
        help = "Premium received per share for the sold call"
    )]
    pub option_premium: f64,
    #[arg(
        long,
        default_value_t = 0.56,
        allow_negative_numbers = true,
        help = "Dividend per share per month"
    )]
    pub monthly_dividend: f64,
    #[arg(
        long,
        default_value_t = 5,
        help = "Days until the option expires, 1 to 30 (display only)"
    )]
    pub days_to_expiration: u32,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help = "Extra cash added every month of the projection"
    )]
    pub monthly_contribution: f64,
}

impl Default for CalcArgs {
    fn default() -> Self {
        let inputs = Inputs::default();
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            share_count: inputs.share_count,
            share_price: inputs.share_price,
            strike_price: inputs.strike_price,
            option_premium: inputs.option_premium,
            monthly_dividend: inputs.monthly_dividend,
            days_to_expiration: inputs.days_to_expiration,
            monthly_contribution: inputs.monthly_contribution,
        }
    }
}

#[derive(Debug)]
struct ApiRequest {
    symbol: String,
    inputs: Inputs,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotResponse {
    lot_count: i64,
    option_income: f64,
    dividend_income: f64,
    total_income: f64,
    portfolio_value: f64,
    annualized_income: f64,
    option_yield_pct: Option<f64>,
    dividend_yield_pct: Option<f64>,
    yield_error: Option<String>,
    new_shares: Option<i64>,
    final_share_count: Option<i64>,
    reinvestment_error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    months: Vec<ProjectionMonth>,
    positions: Vec<i64>,
    incomes: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    symbol: String,
    share_count: i64,
    share_price: f64,
    strike_price: f64,
    option_premium: f64,
    monthly_dividend: f64,
    days_to_expiration: u32,
    monthly_contribution: f64,
    snapshot: SnapshotResponse,
    projection: Option<ProjectionResponse>,
    projection_error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(args: CalcArgs) -> Result<ApiRequest, String> {
    let symbol = args.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err("--symbol must not be empty".to_string());
    }

    if !(0..=MAX_SHARE_COUNT).contains(&args.share_count) {
        return Err(format!(
            "--share-count must be between 0 and {MAX_SHARE_COUNT}"
        ));
    }

    for (name, value) in [
        ("--share-price", args.share_price),
        ("--strike-price", args.strike_price),
        ("--option-premium", args.option_premium),
        ("--monthly-dividend", args.monthly_dividend),
        ("--monthly-contribution", args.monthly_contribution),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }

    if !(1..=MAX_DAYS_TO_EXPIRATION).contains(&args.days_to_expiration) {
        return Err(format!(
            "--days-to-expiration must be between 1 and {MAX_DAYS_TO_EXPIRATION}"
        ));
    }

    Ok(ApiRequest {
        symbol,
        inputs: Inputs {
            share_count: args.share_count,
            share_price: args.share_price,
            strike_price: args.strike_price,
            option_premium: args.option_premium,
            monthly_dividend: args.monthly_dividend,
            days_to_expiration: args.days_to_expiration,
            monthly_contribution: args.monthly_contribution,
        },
    })
}

/// Runs both calculations for the given arguments and renders the same JSON
/// document the HTTP endpoint returns.
pub fn render_report(args: CalcArgs) -> Result<String, String> {
    let request = build_inputs(args)?;
    let response = calculate(&request);
    serde_json::to_string_pretty(&response)
        .map_err(|e| format!("Failed to encode report: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "covered-call income API listening");
    info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(Query(payload): Query<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_post_handler(Json(payload): Json<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            warn!(error = %msg, "rejected calculate payload");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    json_response(StatusCode::OK, calculate(&request))
}

fn calculate(request: &ApiRequest) -> CalculateResponse {
    let inputs = &request.inputs;
    debug!(symbol = %request.symbol, ?inputs, "calculating covered-call income");

    let snapshot = calculate_income(inputs);
    let projection = run_projection(inputs);
    if let Err(err) = &projection {
        debug!(%err, "projection unavailable");
    }

    build_calculate_response(request, &snapshot, projection)
}

fn build_calculate_response(
    request: &ApiRequest,
    snapshot: &IncomeSnapshot,
    projection: Result<Projection, CalcError>,
) -> CalculateResponse {
    let inputs = &request.inputs;
    let (projection, projection_error) = match projection {
        Ok(projection) => (
            Some(ProjectionResponse {
                positions: projection.positions(),
                incomes: projection.incomes(),
                months: projection.into_months(),
            }),
            None,
        ),
        Err(err) => (None, Some(err.to_string())),
    };

    CalculateResponse {
        symbol: request.symbol.clone(),
        share_count: inputs.share_count,
        share_price: inputs.share_price,
        strike_price: inputs.strike_price,
        option_premium: inputs.option_premium,
        monthly_dividend: inputs.monthly_dividend,
        days_to_expiration: inputs.days_to_expiration,
        monthly_contribution: inputs.monthly_contribution,
        snapshot: SnapshotResponse {
            lot_count: snapshot.lot_count,
            option_income: snapshot.option_income,
            dividend_income: snapshot.dividend_income,
            total_income: snapshot.total_income,
            portfolio_value: snapshot.portfolio_value,
            annualized_income: snapshot.annualized_income,
            option_yield_pct: snapshot.yields.as_ref().ok().map(|y| y.option_yield_pct),
            dividend_yield_pct: snapshot
                .yields
                .as_ref()
                .ok()
                .map(|y| y.dividend_yield_pct),
            yield_error: snapshot.yields.as_ref().err().map(ToString::to_string),
            new_shares: snapshot.reinvestment.as_ref().ok().map(|r| r.new_shares),
            final_share_count: snapshot
                .reinvestment
                .as_ref()
                .ok()
                .map(|r| r.final_share_count),
            reinvestment_error: snapshot
                .reinvestment
                .as_ref()
                .err()
                .map(ToString::to_string),
        },
        projection,
        projection_error,
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: CalculatePayload) -> Result<ApiRequest, String> {
    let mut args = CalcArgs::default();

    if let Some(v) = payload.symbol {
        args.symbol = v;
    }
    if let Some(v) = payload.share_count {
        args.share_count = v;
    }
    if let Some(v) = payload.share_price {
        args.share_price = v;
    }
    if let Some(v) = payload.strike_price {
        args.strike_price = v;
    }
    if let Some(v) = payload.option_premium {
        args.option_premium = v;
    }
    if let Some(v) = payload.monthly_dividend {
        args.monthly_dividend = v;
    }
    if let Some(v) = payload.days_to_expiration {
        args.days_to_expiration = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }

    build_inputs(args)
}

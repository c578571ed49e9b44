//! HTTP API over the sales service.
//!
//! Endpoints:
//! - `GET /health` - health check
//! - `POST /data` - record a sale
//! - `GET /data` - list every recorded sale
//! - `POST /calculate` - revenue for one store over a date range

use std::future::{Future, IntoFuture};
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::domain::Sale;
use crate::service::SalesService;
use crate::utils::bootstrap::shutdown_signal;

pub mod dto;
mod error;


pub use error::ApiError;

use dto::{AddSaleResponse, SaleDto, TotalSalesRequest, TotalSalesResponse};

/// Bind the configured address and serve until Ctrl-C or SIGTERM.
pub async fn serve(
    service: SalesService,
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(config.socket_addr()?).await?;
    serve_with_shutdown(
        listener,
        service,
        shutdown_signal(),
        config.shutdown_timeout(),
    )
    .await?;
    Ok(())
}

/// Serve on an already-bound listener until `shutdown` resolves.
///
/// Open connections get `grace` to finish after the signal; the server
/// returns once they drain or the grace period runs out.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    service: SalesService,
    shutdown: F,
    grace: Duration,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    info!(%address, "sales API listening");

    let (signalled_tx, mut signalled_rx) = tokio::sync::watch::channel(false);
    let signal = async move {
        shutdown.await;
        info!("shutting down gracefully");
        let _ = signalled_tx.send(true);
    };

    let server = axum::serve(listener, router(service))
        .with_graceful_shutdown(signal)
        .into_future();

    let deadline = async move {
        if signalled_rx.wait_for(|signalled| *signalled).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result,
        _ = deadline => {
            warn!(?grace, "shutdown timeout exceeded, dropping open connections");
            Ok(())
        }
    }
}

/// Build the axum router (separated for testing).
pub fn router(service: SalesService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/data", post(add_sale).get(list_sales))
        .route("/calculate", post(calculate))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn add_sale(
    State(service): State<SalesService>,
    body: Result<Json<SaleDto>, JsonRejection>,
) -> Result<Json<AddSaleResponse>, ApiError> {
    let Json(dto) = body?;
    let sale = Sale::try_from(dto)?;
    service.add_sale(sale)?;
    Ok(Json(AddSaleResponse {
        status: "ok".to_string(),
    }))
}

async fn list_sales(State(service): State<SalesService>) -> Json<Vec<Sale>> {
    Json(service.get_sales())
}

async fn calculate(
    State(service): State<SalesService>,
    body: Result<Json<TotalSalesRequest>, JsonRejection>,
) -> Result<Json<TotalSalesResponse>, ApiError> {
    let Json(request) = body?;
    let query = request.parse()?;
    let total_sales = service.get_total_sum(&query.store_id, query.start, query.end);

    Ok(Json(TotalSalesResponse {
        store_id: request.store_id,
        total_sales,
        start_date: request.start_date,
        end_date: request.end_date,
    }))
}

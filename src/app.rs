use std::{net::SocketAddr, time::Duration};

use axum::{
    http::{Request, Response},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, field, info, info_span, Span};

use crate::state::AppState;
use crate::{auth, comments, questions};

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(questions::router())
        .merge(comments::router())
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "ok"
}

/// One `http_request` span per request; 5xx responses are logged at error level.
fn with_http_tracing(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request<_>| {
                info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri(),
                    status = field::Empty
                )
            })
            .on_response(|res: &Response<_>, latency: Duration, span: &Span| {
                let status = res.status();
                span.record("status", field::display(status));
                let latency_ms = latency.as_millis() as u64;
                if status.is_server_error() {
                    error!(%status, latency_ms, "response");
                } else {
                    info!(%status, latency_ms, "response");
                }
            }),
    )
}

/// Everything is served under `/api`.
pub fn build_app(state: AppState) -> Router {
    let router = Router::new()
        .nest("/api", api_routes())
        .with_state(state)
        .layer(CorsLayer::permissive());
    with_http_tracing(router)
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

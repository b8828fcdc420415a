//! Reader / dashboard backend (C7): polls the state account, decodes the
//! fixed layout, computes per-asset aggregates, and serves both a pull
//! snapshot and a push (SSE) stream at the same cadence (spec.md §4.7, §6).

mod aggregate;
mod config;
mod error;
mod state;
mod tracing_logger;

use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::stream::{self, Stream};
use solana_sdk::pubkey::Pubkey;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use config::Config;
use state::{SharedStateFetcher, StateFetcher};

#[derive(Clone)]
struct AppState {
    fetcher: SharedStateFetcher,
    poll_ms: u64,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_state(State(app): State<AppState>) -> error::Result<Json<state::StatePayload>> {
    let payload = app.fetcher.fetch().await?;
    Ok(Json(payload))
}

#[derive(Clone, Copy)]
enum StreamTick {
    Initial,
    Polling,
}

fn sse_stream(fetcher: SharedStateFetcher, poll_ms: u64) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(StreamTick::Initial, move |tick| {
        let fetcher = fetcher.clone();
        async move {
            match tick {
                StreamTick::Initial => {
                    let event = Event::default().data(r#"{"connected":true}"#);
                    Some((Ok(event), StreamTick::Polling))
                }
                StreamTick::Polling => {
                    tokio::time::sleep(Duration::from_millis(poll_ms)).await;
                    let event = match fetcher.fetch().await {
                        Ok(payload) => Event::default()
                            .json_data(&payload)
                            .unwrap_or_else(|_| Event::default().data(r#"{"error":"encode failed"}"#)),
                        Err(e) => {
                            warn!(error = %e, "stream: state fetch failed");
                            Event::default().data(format!(r#"{{"error":"{e}"}}"#))
                        }
                    };
                    Some((Ok(event), StreamTick::Polling))
                }
            }
        }
    })
}

async fn get_stream(State(app): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(sse_stream(app.fetcher, app.poll_ms)).keep_alive(KeepAlive::default())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cfg = Config::from_env()?;
    cfg.validate()?;
    tracing_logger::init(&cfg.log_level);

    let program_id = Pubkey::from_str(&cfg.program_id)?;
    let (state_pda, _bump) = Pubkey::find_program_address(&[oracle_common::chain::STATE_SEED], &program_id);

    info!(%program_id, %state_pda, poll_ms = cfg.poll_ms, "starting reader");

    let fetcher: SharedStateFetcher = Arc::new(StateFetcher::new(&cfg, program_id, state_pda));
    let app_state = AppState { fetcher, poll_ms: cfg.poll_ms };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/state", get(get_state))
        .route("/api/stream", get(get_stream))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = format!("{}:{}", cfg.server_host, cfg.server_port).parse()?;
    info!("dashboard backend listening on {}", addr);
    axum::Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}

//! Websocket source client: subscribes once per connection and emits a
//! reading on every book-ticker/trade message. Self-healing: any transport
//! fault closes the connection, emits no reading, and reconnects after
//! `1000 + jitter([0,1000))` ms.

use futures_util::{SinkExt, StreamExt};
use oracle_common::assets::Venue;
use rand::Rng;
use tokio::sync::watch;
use tokio::time::{interval, sleep, Duration};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::{extract_midprice, normalize, now_ms, PriceReading};

/// Application-level ping cadence, a third of the inactivity timeout this
/// venue is assumed to enforce (§5 "WebSocket inactivity heartbeat").
const WS_TIMEOUT_MS: u64 = 15_000;
const RECONNECT_BASE_MS: u64 = 1_000;
const RECONNECT_JITTER_MS: u64 = 1_000;

pub(super) async fn run(
    venue: Venue,
    url: String,
    subscribe_msg: String,
    tx: watch::Sender<Option<PriceReading>>,
) {
    loop {
        let _ = tx.send(None);

        match connect_and_stream(venue, &url, &subscribe_msg, &tx).await {
            Ok(()) => debug!(venue = venue.as_str(), "websocket: closed cleanly"),
            Err(e) => warn!(venue = venue.as_str(), error = %e, "websocket: transport fault"),
        }

        let _ = tx.send(None);
        let jitter = rand::thread_rng().gen_range(0..RECONNECT_JITTER_MS);
        sleep(Duration::from_millis(RECONNECT_BASE_MS + jitter)).await;
    }
}

async fn connect_and_stream(
    venue: Venue,
    url: &str,
    subscribe_msg: &str,
    tx: &watch::Sender<Option<PriceReading>>,
) -> Result<(), anyhow::Error> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
    info!(venue = venue.as_str(), "websocket: connected");
    let (mut write, mut read) = ws_stream.split();

    write.send(Message::Text(subscribe_msg.to_string())).await?;

    let mut heartbeat = interval(Duration::from_millis(WS_TIMEOUT_MS / 3));
    heartbeat.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                write.send(Message::Ping(Vec::new())).await?;
            }
            frame = read.next() => {
                let Some(frame) = frame else {
                    return Ok(());
                };
                match frame? {
                    Message::Text(text) => {
                        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                            if let Some(price) = extract_midprice(venue, &value).and_then(normalize) {
                                let _ = tx.send(Some(PriceReading { venue, price, observed_ms: now_ms() }));
                            }
                        }
                    }
                    Message::Close(_) => return Ok(()),
                    _ => {}
                }
            }
        }
    }
}

//! HTTP-poll source client: emits a reading on each successful fetch at a
//! configured interval (default 1-2 s). Grounded on the teacher's interval-
//! driven `PolymarketPriceFeed::start` (`tokio::spawn` + `tokio::time::interval`
//! loop, log-and-continue on fetch failure).

use oracle_common::assets::Venue;
use tokio::sync::watch;
use tokio::time::{interval, Duration};
use tracing::{debug, warn};

use super::{extract_midprice, normalize, now_ms, PriceReading};

pub(super) async fn run(venue: Venue, url: String, interval_ms: u64, tx: watch::Sender<Option<PriceReading>>) {
    let client = reqwest::Client::new();
    let mut ticker = interval(Duration::from_millis(interval_ms));

    loop {
        ticker.tick().await;

        let response = match client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(venue = venue.as_str(), status = %r.status(), "poll: non-2xx response");
                let _ = tx.send(None);
                continue;
            }
            Err(e) => {
                warn!(venue = venue.as_str(), error = %e, "poll: request failed");
                let _ = tx.send(None);
                continue;
            }
        };

        let body: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(venue = venue.as_str(), error = %e, "poll: invalid JSON body");
                let _ = tx.send(None);
                continue;
            }
        };

        let Some(price) = extract_midprice(venue, &body).and_then(normalize) else {
            debug!(venue = venue.as_str(), "poll: no usable price in response");
            let _ = tx.send(None);
            continue;
        };

        let _ = tx.send(Some(PriceReading { venue, price, observed_ms: now_ms() }));
    }
}

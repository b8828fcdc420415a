//! Source clients (C1): one task per `(asset, venue)`, each a lazy,
//! restartable sequence of `PriceReading`s pushed into a size-1 cell.
//!
//! A concrete tagged union rather than a trait object (§9 "Dynamic dispatch
//! -> tagged variants"): the two modes (`Websocket`, `HttpPoll`) are a
//! closed set and the shared behavior (reconnect-with-jitter, midprice
//! normalization, latest-wins store) lives here rather than behind an
//! interface every venue would reimplement.

mod poll;
mod websocket;

use std::time::{SystemTime, UNIX_EPOCH};

use oracle_common::assets::Venue;
use tokio::sync::watch;

/// A single normalized reading from one venue (§3 `PriceReading`, trimmed to
/// the fields this workspace's aggregator actually consumes).
#[derive(Debug, Clone, Copy)]
pub struct PriceReading {
    pub venue: Venue,
    pub price: f64,
    /// Local monotonic-clock receive time, milliseconds — never venue time,
    /// to keep clock skew from the venue out of the freshness calculation.
    pub observed_ms: u64,
}

#[derive(Debug, Clone)]
pub enum SourceClient {
    Websocket { venue: Venue, url: String, subscribe_msg: String },
    HttpPoll { venue: Venue, url: String, interval_ms: u64 },
}

impl SourceClient {
    pub fn venue(&self) -> Venue {
        match self {
            Self::Websocket { venue, .. } => *venue,
            Self::HttpPoll { venue, .. } => *venue,
        }
    }

    /// Spawns the self-healing client task and returns a receiver over its
    /// single-slot "latest reading" cell (`None` until the first good
    /// reading arrives, and again after the client is disconnected — the
    /// absence of events is the failure signal, per §4.1).
    pub fn spawn(self) -> watch::Receiver<Option<PriceReading>> {
        let (tx, rx) = watch::channel(None);
        match self {
            Self::Websocket { venue, url, subscribe_msg } => {
                tokio::spawn(websocket::run(venue, url, subscribe_msg, tx));
            }
            Self::HttpPoll { venue, url, interval_ms } => {
                tokio::spawn(poll::run(venue, url, interval_ms, tx));
            }
        }
        rx
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Rejects non-finite or non-positive prices (§4.1 "Normalization").
pub(crate) fn normalize(price: f64) -> Option<f64> {
    if price.is_finite() && price > 0.0 {
        Some(price)
    } else {
        None
    }
}

/// Every venue wires prices as either a JSON number or a JSON string (most
/// send strings, to dodge float-precision ambiguity over the wire).
fn parse_num(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

fn midpoint_or_last(bid: Option<f64>, ask: Option<f64>, last: Option<f64>) -> Option<f64> {
    match (bid, ask) {
        (Some(b), Some(a)) => Some((b + a) / 2.0),
        _ => last,
    }
}

/// Kraken's `ticker` push is a bare array, `[channel_id, payload, "ticker",
/// pair]`; bid/ask/last each arrive as `[price, ...]` with the price itself
/// a string (Kraken's public API docs, `b`/`a`/`c` fields).
fn extract_kraken(value: &serde_json::Value) -> Option<f64> {
    let payload = value.as_array()?.get(1)?;
    let first = |key: &str| payload.get(key)?.as_array()?.first().and_then(parse_num);
    midpoint_or_last(first("b"), first("a"), first("c"))
}

/// Coinbase's `ticker` channel message: top-level `best_bid`/`best_ask`/
/// `price`, all strings.
fn extract_coinbase(value: &serde_json::Value) -> Option<f64> {
    let bid = value.get("best_bid").and_then(parse_num);
    let ask = value.get("best_ask").and_then(parse_num);
    let last = value.get("price").and_then(parse_num);
    midpoint_or_last(bid, ask, last)
}

/// Binance's `bookTicker` stream: top-level `b`/`a`, both strings, no last
/// trade price in this payload.
fn extract_binance(value: &serde_json::Value) -> Option<f64> {
    let bid = value.get("b").and_then(parse_num);
    let ask = value.get("a").and_then(parse_num);
    midpoint_or_last(bid, ask, None)
}

/// Bybit v5's `tickers` topic nests the snapshot under `data`; fields are
/// `bid1Price`/`ask1Price`/`lastPrice`, all strings.
fn extract_bybit(value: &serde_json::Value) -> Option<f64> {
    let data = value.get("data")?;
    let bid = data.get("bid1Price").and_then(parse_num);
    let ask = data.get("ask1Price").and_then(parse_num);
    let last = data.get("lastPrice").and_then(parse_num);
    midpoint_or_last(bid, ask, last)
}

/// Kucoin's level-1 orderbook response nests the quote under `data`; fields
/// are `bestBid`/`bestAsk`/`price`, all strings.
fn extract_kucoin(value: &serde_json::Value) -> Option<f64> {
    let data = value.get("data")?;
    let bid = data.get("bestBid").and_then(parse_num);
    let ask = data.get("bestAsk").and_then(parse_num);
    let last = data.get("price").and_then(parse_num);
    midpoint_or_last(bid, ask, last)
}

/// Mexc's `ticker/bookTicker` response: top-level `bidPrice`/`askPrice`,
/// strings, no last trade price in this payload.
fn extract_mexc(value: &serde_json::Value) -> Option<f64> {
    let bid = value.get("bidPrice").and_then(parse_num);
    let ask = value.get("askPrice").and_then(parse_num);
    midpoint_or_last(bid, ask, None)
}

/// Fallback for feeds this workspace doesn't pin a documented shape for
/// (Hyperliquid, and the institutional feed, whose wire format is set by
/// deployment-specific provider config rather than a public API): accepts
/// numeric or string-encoded `bid`/`b`/`ask`/`a` at the top level, else
/// `price`/`p`/`last`.
fn extract_generic(value: &serde_json::Value) -> Option<f64> {
    let bid = value.get("bid").or_else(|| value.get("b")).and_then(parse_num);
    let ask = value.get("ask").or_else(|| value.get("a")).and_then(parse_num);
    if let (Some(b), Some(a)) = (bid, ask) {
        return Some((b + a) / 2.0);
    }
    value
        .get("price")
        .or_else(|| value.get("p"))
        .or_else(|| value.get("last"))
        .and_then(parse_num)
}

/// `midprice = (bid+ask)/2` if both sides are present, else the last trade
/// price — dispatched per venue because each venue's wire shape (flat vs.
/// nested under `data`, array vs. object, string vs. number) is its own
/// (§9 "per-venue code only parses and emits normalized readings").
pub(crate) fn extract_midprice(venue: Venue, value: &serde_json::Value) -> Option<f64> {
    match venue {
        Venue::Kraken => extract_kraken(value),
        Venue::Coinbase => extract_coinbase(value),
        Venue::Binance => extract_binance(value),
        Venue::Bybit => extract_bybit(value),
        Venue::Kucoin => extract_kucoin(value),
        Venue::Mexc => extract_mexc(value),
        Venue::Hyperliquid | Venue::Institutional => extract_generic(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rejects_non_finite_and_non_positive() {
        assert_eq!(normalize(f64::NAN), None);
        assert_eq!(normalize(-1.0), None);
        assert_eq!(normalize(0.0), None);
        assert_eq!(normalize(100.0), Some(100.0));
    }

    #[test]
    fn generic_prefers_bid_ask_over_numeric_or_string() {
        let v: serde_json::Value = serde_json::from_str(r#"{"bid":"99.0","ask":101.0,"price":50.0}"#).unwrap();
        assert_eq!(extract_midprice(Venue::Hyperliquid, &v), Some(100.0));
    }

    #[test]
    fn generic_falls_back_to_last_trade() {
        let v: serde_json::Value = serde_json::from_str(r#"{"price":"42.5"}"#).unwrap();
        assert_eq!(extract_midprice(Venue::Institutional, &v), Some(42.5));
    }

    #[test]
    fn kraken_ticker_array_payload() {
        let v: serde_json::Value = serde_json::from_str(
            r#"[340, {"a":["50001.0","1","1.000"],"b":["49999.0","2","2.000"],"c":["50000.0","0.1"]}, "ticker", "XBT/USD"]"#,
        )
        .unwrap();
        assert_eq!(extract_midprice(Venue::Kraken, &v), Some(50000.0));
    }

    #[test]
    fn kraken_ignores_non_ticker_control_messages() {
        let v: serde_json::Value = serde_json::from_str(r#"{"event":"heartbeat"}"#).unwrap();
        assert_eq!(extract_midprice(Venue::Kraken, &v), None);
    }

    #[test]
    fn coinbase_ticker_string_fields() {
        let v: serde_json::Value = serde_json::from_str(
            r#"{"type":"ticker","product_id":"BTC-USD","price":"50000.50","best_bid":"49999.00","best_ask":"50001.00"}"#,
        )
        .unwrap();
        assert_eq!(extract_midprice(Venue::Coinbase, &v), Some(50000.0));
    }

    #[test]
    fn binance_book_ticker_string_fields() {
        let v: serde_json::Value =
            serde_json::from_str(r#"{"u":123,"s":"BTCUSDT","b":"49999.00","B":"1.0","a":"50001.00","A":"2.0"}"#)
                .unwrap();
        assert_eq!(extract_midprice(Venue::Binance, &v), Some(50000.0));
    }

    #[test]
    fn bybit_tickers_topic_nested_under_data() {
        let v: serde_json::Value = serde_json::from_str(
            r#"{"topic":"tickers.BTCUSDT","type":"snapshot","data":{"symbol":"BTCUSDT","lastPrice":"50000.00","bid1Price":"49999.00","ask1Price":"50001.00"},"ts":123}"#,
        )
        .unwrap();
        assert_eq!(extract_midprice(Venue::Bybit, &v), Some(50000.0));
    }

    #[test]
    fn kucoin_level1_nested_under_data() {
        let v: serde_json::Value = serde_json::from_str(
            r#"{"code":"200000","data":{"sequence":"1","price":"50000.00","bestBid":"49999.00","bestAsk":"50001.00"}}"#,
        )
        .unwrap();
        assert_eq!(extract_midprice(Venue::Kucoin, &v), Some(50000.0));
    }

    #[test]
    fn mexc_book_ticker_string_fields() {
        let v: serde_json::Value = serde_json::from_str(
            r#"{"symbol":"BTCUSDT","bidPrice":"49999.00","bidQty":"1","askPrice":"50001.00","askQty":"2"}"#,
        )
        .unwrap();
        assert_eq!(extract_midprice(Venue::Mexc, &v), Some(50000.0));
    }
}

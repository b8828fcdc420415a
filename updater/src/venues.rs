//! Per-venue connection details: websocket URL templates and subscribe
//! payloads, or poll URL templates, keyed by `Venue`.
//!
//! Compile-time, like the rest of the asset registry (§3 "Venue identity"):
//! a venue's transport shape does not change at runtime, only the per-asset
//! symbol it is given (carried on `oracle_common::assets::VenueMapping`).

use oracle_common::assets::Venue;

use crate::source_clients::SourceClient;

/// Builds the concrete `SourceClient` for one `(venue, symbol)` pair.
pub fn build(venue: Venue, symbol: &str) -> SourceClient {
    match venue {
        Venue::Kraken => SourceClient::Websocket {
            venue,
            url: "wss://ws.kraken.com".to_string(),
            subscribe_msg: format!(
                r#"{{"event":"subscribe","pair":["{symbol}"],"subscription":{{"name":"ticker"}}}}"#
            ),
        },
        Venue::Coinbase => SourceClient::Websocket {
            venue,
            url: "wss://ws-feed.exchange.coinbase.com".to_string(),
            subscribe_msg: format!(
                r#"{{"type":"subscribe","product_ids":["{symbol}"],"channels":["ticker"]}}"#
            ),
        },
        Venue::Binance => SourceClient::Websocket {
            venue,
            url: format!(
                "wss://stream.binance.com:9443/ws/{}@bookTicker",
                symbol.to_lowercase()
            ),
            subscribe_msg: String::new(),
        },
        Venue::Bybit => SourceClient::Websocket {
            venue,
            url: "wss://stream.bybit.com/v5/public/spot".to_string(),
            subscribe_msg: format!(r#"{{"op":"subscribe","args":["tickers.{symbol}"]}}"#),
        },
        Venue::Kucoin => SourceClient::HttpPoll {
            venue,
            url: format!("https://api.kucoin.com/api/v1/market/orderbook/level1?symbol={symbol}"),
            interval_ms: 1_500,
        },
        Venue::Mexc => SourceClient::HttpPoll {
            venue,
            url: format!("https://api.mexc.com/api/v3/ticker/bookTicker?symbol={symbol}"),
            interval_ms: 1_500,
        },
        Venue::Hyperliquid => SourceClient::HttpPoll {
            venue,
            url: "https://api.hyperliquid.xyz/info".to_string(),
            interval_ms: 2_000,
        },
        Venue::Institutional => {
            unreachable!("institutional readings are built via build_institutional, never by symbol lookup")
        }
    }
}

/// Builds the `SourceClient` for an asset's institutional/primary feed
/// (§3 `Asset::primary_feed_id`). Polled, not streamed: the institutional
/// provider's contract in this deployment is a REST endpoint keyed by
/// `feed_id`, templated against `base_url`.
pub fn build_institutional(feed_id: &str, base_url: &str, interval_ms: u64) -> SourceClient {
    SourceClient::HttpPoll {
        venue: Venue::Institutional,
        url: format!("{base_url}/{feed_id}"),
        interval_ms,
    }
}

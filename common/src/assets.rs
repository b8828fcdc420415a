//! Compile-time asset registry.
//!
//! Adding an asset is a code change plus a state-account migration (close +
//! re-init), never a runtime operation.

/// Venue identity. The source field carried on every `PriceReading` is one
/// of these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Venue {
    Kraken,
    Coinbase,
    Kucoin,
    Binance,
    Mexc,
    Bybit,
    Hyperliquid,
    /// Not a composite-aggregation venue: tags a reading pulled from an
    /// asset's institutional/primary feed (§4.3 "Source selection per
    /// asset"), which bypasses `VenueTable`/the composite algorithm
    /// entirely and is never listed in `Asset::venues`.
    Institutional,
}

impl Venue {
    pub const fn as_str(self) -> &'static str {
        match self {
            Venue::Kraken => "kraken",
            Venue::Coinbase => "coinbase",
            Venue::Kucoin => "kucoin",
            Venue::Binance => "binance",
            Venue::Mexc => "mexc",
            Venue::Bybit => "bybit",
            Venue::Hyperliquid => "hyperliquid",
            Venue::Institutional => "institutional",
        }
    }
}

/// Per-venue symbol mapping plus the composite tolerance/staleness knobs
/// configurable per asset (HYPE tolerates fewer venues than BTC).
#[derive(Debug, Clone, Copy)]
pub struct VenueMapping {
    pub venue: Venue,
    /// The symbol this venue calls the asset, e.g. "XBT/USD" on Kraken.
    pub symbol: &'static str,
}

/// Compile-time per-asset configuration.
#[derive(Debug, Clone, Copy)]
pub struct Asset {
    /// Fixed, 0-based position in every on-chain triplet array and in the
    /// wire-format price array of `batch_set_prices`.
    pub index: usize,
    pub symbol: &'static str,
    /// Institutional/primary feed identifier, if this asset has one.
    pub primary_feed_id: Option<&'static str>,
    pub venues: &'static [VenueMapping],
    /// Composite staleness window in milliseconds.
    pub stale_ms: u64,
    /// Composite tight-band tolerance, fraction of median. 0.005 = 0.5%.
    pub tolerance: f64,
}

macro_rules! venues {
    ($(($venue:expr, $symbol:expr)),* $(,)?) => {
        &[$(VenueMapping { venue: $venue, symbol: $symbol }),*]
    };
}

/// The compile-time asset list. Order here is the order used for every
/// on-chain triplet and every `batch_set_prices` price array. Indices MUST
/// NOT be reordered without a state-account migration.
pub const ASSETS: &[Asset] = &[
    Asset {
        index: 0,
        symbol: "BTC",
        primary_feed_id: Some("btc-usd-institutional"),
        venues: venues![
            (Venue::Kraken, "XBT/USD"),
            (Venue::Coinbase, "BTC-USD"),
            (Venue::Binance, "BTCUSDT"),
            (Venue::Bybit, "BTCUSDT"),
        ],
        stale_ms: 2000,
        tolerance: 0.005,
    },
    Asset {
        index: 1,
        symbol: "ETH",
        primary_feed_id: Some("eth-usd-institutional"),
        venues: venues![
            (Venue::Kraken, "ETH/USD"),
            (Venue::Coinbase, "ETH-USD"),
            (Venue::Binance, "ETHUSDT"),
            (Venue::Bybit, "ETHUSDT"),
        ],
        stale_ms: 2000,
        tolerance: 0.005,
    },
    Asset {
        index: 2,
        symbol: "SOL",
        primary_feed_id: Some("sol-usd-institutional"),
        venues: venues![
            (Venue::Kraken, "SOL/USD"),
            (Venue::Coinbase, "SOL-USD"),
            (Venue::Binance, "SOLUSDT"),
            (Venue::Bybit, "SOLUSDT"),
        ],
        stale_ms: 2000,
        tolerance: 0.005,
    },
    Asset {
        index: 3,
        symbol: "HYPE",
        primary_feed_id: None,
        venues: venues![(Venue::Hyperliquid, "HYPE"), (Venue::Mexc, "HYPEUSDT")],
        // HYPE tolerates fewer venues than the other majors.
        stale_ms: 3000,
        tolerance: 0.01,
    },
    Asset {
        index: 4,
        symbol: "ZEC",
        primary_feed_id: None,
        venues: venues![
            (Venue::Kraken, "ZEC/USD"),
            (Venue::Kucoin, "ZEC-USDT"),
            (Venue::Mexc, "ZECUSDT"),
        ],
        stale_ms: 2500,
        tolerance: 0.0075,
    },
    Asset {
        index: 5,
        symbol: "TSLA",
        primary_feed_id: Some("tsla-equity-institutional"),
        venues: venues![],
        stale_ms: 2000,
        tolerance: 0.005,
    },
    Asset {
        index: 6,
        symbol: "NVDA",
        primary_feed_id: Some("nvda-equity-institutional"),
        venues: venues![],
        stale_ms: 2000,
        tolerance: 0.005,
    },
    Asset {
        index: 7,
        symbol: "MSTR",
        primary_feed_id: Some("mstr-equity-institutional"),
        venues: venues![],
        stale_ms: 2000,
        tolerance: 0.005,
    },
    Asset {
        index: 8,
        symbol: "GOLD",
        primary_feed_id: Some("xau-usd-institutional"),
        venues: venues![],
        stale_ms: 2000,
        tolerance: 0.005,
    },
    Asset {
        index: 9,
        symbol: "SILVER",
        primary_feed_id: Some("xag-usd-institutional"),
        venues: venues![],
        stale_ms: 2000,
        tolerance: 0.005,
    },
];

pub const NUM_ASSETS: usize = ASSETS.len();

pub fn by_symbol(symbol: &str) -> Option<&'static Asset> {
    ASSETS.iter().find(|a| a.symbol == symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_ordered() {
        for (i, asset) in ASSETS.iter().enumerate() {
            assert_eq!(asset.index, i);
        }
    }

    #[test]
    fn symbols_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for asset in ASSETS {
            assert!(seen.insert(asset.symbol), "duplicate symbol {}", asset.symbol);
        }
    }

    #[test]
    fn by_symbol_roundtrips() {
        let btc = by_symbol("BTC").expect("BTC registered");
        assert_eq!(btc.index, 0);
        assert!(by_symbol("NOPE").is_none());
    }
}

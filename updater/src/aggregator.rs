//! Composite aggregator (C2): per asset, latest-per-venue map plus a fixed
//! cadence that reduces it to one robust composite price.

use std::collections::BTreeMap;

use oracle_common::assets::Venue;

#[derive(Debug, Clone, Copy)]
pub struct VenueEntry {
    pub price: f64,
    pub observed_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeResult {
    pub price: Option<f64>,
    pub count: u8,
    pub sources: Vec<(Venue, f64, u64)>,
}

/// Holds the latest reading per venue for one asset; not itself async, so
/// the cadence task and the source-client callbacks can share it behind
/// whatever synchronization primitive the caller prefers.
#[derive(Default)]
pub struct VenueTable {
    entries: BTreeMap<Venue, VenueEntry>,
}

impl VenueTable {
    pub fn update(&mut self, venue: Venue, price: f64, observed_ms: u64) {
        self.entries.insert(venue, VenueEntry { price, observed_ms });
    }

    /// Runs the five-step algorithm (§4.2) against `now_ms`.
    pub fn composite(&self, now_ms: u64, stale_ms: u64, tolerance: f64) -> CompositeResult {
        let fresh: Vec<(Venue, VenueEntry)> = self
            .entries
            .iter()
            .filter(|(_, e)| now_ms.saturating_sub(e.observed_ms) <= stale_ms)
            .map(|(v, e)| (*v, *e))
            .collect();

        if fresh.is_empty() {
            return CompositeResult { price: None, count: 0, sources: Vec::new() };
        }

        let median = median_of(fresh.iter().map(|(_, e)| e.price));

        let kept: Vec<(Venue, VenueEntry)> = fresh
            .iter()
            .copied()
            .filter(|(_, e)| median != 0.0 && ((e.price - median).abs() / median) <= tolerance)
            .collect();

        let survivors = if kept.is_empty() { &fresh } else { &kept };
        let price = median_of(survivors.iter().map(|(_, e)| e.price));

        CompositeResult {
            price: Some(price),
            count: fresh.len() as u8,
            sources: fresh
                .iter()
                .map(|(v, e)| (*v, e.price, now_ms.saturating_sub(e.observed_ms)))
                .collect(),
        }
    }
}

fn median_of(values: impl Iterator<Item = f64>) -> f64 {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fresh_set_emits_null() {
        let table = VenueTable::default();
        let result = table.composite(1_000, 2_000, 0.005);
        assert_eq!(result, CompositeResult { price: None, count: 0, sources: vec![] });
    }

    #[test]
    fn median_stability_within_tolerance_band() {
        let mut table = VenueTable::default();
        table.update(Venue::Kraken, 50_000.0, 1_000);
        table.update(Venue::Coinbase, 50_010.0, 1_000);
        table.update(Venue::Binance, 49_990.0, 1_000);
        let result = table.composite(1_000, 2_000, 0.005);
        assert_eq!(result.count, 3);
        assert_eq!(result.price, Some(50_000.0));
    }

    #[test]
    fn outlier_rejection_excludes_far_venue() {
        let mut table = VenueTable::default();
        table.update(Venue::Kraken, 50_123.0, 1_000);
        table.update(Venue::Coinbase, 50_135.0, 1_000);
        table.update(Venue::Binance, 50_140.0, 1_000);
        table.update(Venue::Bybit, 60_000.0, 1_000); // ~20% away
        let result = table.composite(1_000, 2_000, 0.005);
        assert_eq!(result.count, 4);
        // the outlier must not survive into the published composite.
        assert!(result.price.unwrap() < 55_000.0);
    }

    #[test]
    fn stale_entries_are_excluded() {
        let mut table = VenueTable::default();
        table.update(Venue::Kraken, 100.0, 0);
        let result = table.composite(10_000, 2_000, 0.005);
        assert_eq!(result.count, 0);
    }
}

//! Per-asset aggregate computation (spec.md §4.7 steps 2-6): pure over a
//! decoded row set, no RPC or clock access, so the freshness/outlier-filter
//! rules are exhaustively unit-testable.

use serde::Serialize;

const STALE_THRESHOLD_MS: i64 = 15_000;
const OUTLIER_THRESHOLD: f64 = 0.10;

/// One updater slot's raw decoded row, always present even when unset
/// (price 0 / ts 0) so `groups` can report all N slots per asset.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AssetRow {
    pub price: f64,
    pub ts: i64,
    pub age: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AssetAggregate {
    pub avg: f64,
    pub count: usize,
    #[serde(rename = "ageAvg")]
    pub age_avg: f64,
}

pub struct AssetSummary {
    pub rows: Vec<AssetRow>,
    pub aggregate: Option<AssetAggregate>,
    pub latest_ts: Option<i64>,
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Builds one asset's full summary from its raw `(price_q, ts_ms)` slots
/// (§4.7 steps 1-6).
pub fn summarize(raw_slots: &[(i64, i64)], decimals: u8, now_ms: i64) -> AssetSummary {
    let scale = 10f64.powi(decimals as i32);
    let rows: Vec<AssetRow> = raw_slots
        .iter()
        .map(|&(price_q, ts_ms)| AssetRow {
            price: price_q as f64 / scale,
            ts: ts_ms,
            age: now_ms - ts_ms,
        })
        .collect();

    // step 3: discard unset (price_q == 0) or stale rows.
    let fresh: Vec<(f64, i64, i64)> = raw_slots
        .iter()
        .zip(rows.iter())
        .filter(|((price_q, _), row)| *price_q != 0 && row.age <= STALE_THRESHOLD_MS)
        .map(|(_, row)| (row.price, row.ts, row.age))
        .collect();

    if fresh.is_empty() {
        return AssetSummary { rows, aggregate: None, latest_ts: None };
    }

    // step 4: discard outliers relative to the median of the fresh set.
    let med = median(fresh.iter().map(|(p, _, _)| *p).collect());
    let survivors: Vec<(f64, i64, i64)> = if med == 0.0 {
        fresh
    } else {
        fresh.into_iter().filter(|(p, _, _)| ((p - med) / med).abs() <= OUTLIER_THRESHOLD).collect()
    };

    if survivors.is_empty() {
        return AssetSummary { rows, aggregate: None, latest_ts: None };
    }

    let count = survivors.len();
    let avg = survivors.iter().map(|(p, _, _)| p).sum::<f64>() / count as f64;
    let age_avg = survivors.iter().map(|(_, _, age)| *age as f64).sum::<f64>() / count as f64;
    let latest_ts = survivors.iter().map(|(_, ts, _)| *ts).max();

    AssetSummary {
        rows,
        aggregate: Some(AssetAggregate { avg, count, age_avg }),
        latest_ts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_unset_slots_yield_null_aggregate() {
        let slots = vec![(0, 0), (0, 0), (0, 0), (0, 0)];
        let summary = summarize(&slots, 8, 1_000_000);
        assert!(summary.aggregate.is_none());
        assert!(summary.latest_ts.is_none());
        assert_eq!(summary.rows.len(), 4);
    }

    #[test]
    fn stale_rows_are_excluded_from_aggregate() {
        let decimals = 8;
        let scale = 10f64.powi(decimals as i32);
        let now = 1_000_000i64;
        let price_q = (50_000.0 * scale) as i64;
        // one fresh, one far too old.
        let slots = vec![(price_q, now - 1_000), (price_q, now - 20_000)];
        let summary = summarize(&slots, decimals, now);
        assert_eq!(summary.aggregate.unwrap().count, 1);
    }

    #[test]
    fn outlier_slot_is_excluded_but_survivors_kept() {
        let decimals = 8;
        let scale = 10f64.powi(decimals as i32);
        let now = 1_000_000i64;
        let good = (50_000.0 * scale) as i64;
        let bad = (80_000.0 * scale) as i64; // 60% off median, well past 10%.
        let slots = vec![(good, now), (good, now), (good, now), (bad, now)];
        let summary = summarize(&slots, decimals, now);
        let agg = summary.aggregate.unwrap();
        assert_eq!(agg.count, 3);
        assert!((agg.avg - 50_000.0).abs() < 1e-6);
    }

    #[test]
    fn quorum_of_one_still_aggregates() {
        let decimals = 8;
        let scale = 10f64.powi(decimals as i32);
        let now = 1_000_000i64;
        let price_q = (2_500.0 * scale) as i64;
        let slots = vec![(price_q, now), (0, 0), (0, 0), (0, 0)];
        let summary = summarize(&slots, decimals, now);
        let agg = summary.aggregate.unwrap();
        assert_eq!(agg.count, 1);
        assert!((agg.avg - 2_500.0).abs() < 1e-6);
    }
}

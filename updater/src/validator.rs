//! Pure price validator (§4.4.1): reads only the snapshot, the last
//! submitted quantized price/timestamp, and the current time. No I/O, no
//! shared state — easy to unit test exhaustively.

use crate::config::AssetBounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    OutOfBounds,
    ExcessiveChange,
    SubmittedTooSoon,
}

pub struct ValidationInput {
    pub price: f64,
    pub now_ms: u64,
    pub last_submitted_price: Option<f64>,
    pub last_submitted_ts_ms: Option<u64>,
}

pub fn validate(input: &ValidationInput, bounds: &AssetBounds) -> Result<(), RejectionReason> {
    if input.price < bounds.min || input.price > bounds.max {
        return Err(RejectionReason::OutOfBounds);
    }

    if let Some(last) = input.last_submitted_price {
        if last > 0.0 {
            let change = (input.price - last).abs() / last;
            if change > bounds.max_fractional_change {
                return Err(RejectionReason::ExcessiveChange);
            }
        }
    }

    if let Some(last_ts) = input.last_submitted_ts_ms {
        let elapsed = input.now_ms.saturating_sub(last_ts);
        if elapsed < bounds.min_submit_interval_ms {
            return Err(RejectionReason::SubmittedTooSoon);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> AssetBounds {
        AssetBounds { min: 1.0, max: 1_000_000.0, max_fractional_change: 0.10, min_submit_interval_ms: 500 }
    }

    #[test]
    fn accepts_first_submission_regardless_of_history() {
        let input = ValidationInput {
            price: 50_000.0,
            now_ms: 1_000,
            last_submitted_price: None,
            last_submitted_ts_ms: None,
        };
        assert_eq!(validate(&input, &bounds()), Ok(()));
    }

    #[test]
    fn rejects_out_of_bounds() {
        let input = ValidationInput {
            price: 0.5,
            now_ms: 1_000,
            last_submitted_price: None,
            last_submitted_ts_ms: None,
        };
        assert_eq!(validate(&input, &bounds()), Err(RejectionReason::OutOfBounds));
    }

    #[test]
    fn rejects_excessive_change() {
        let input = ValidationInput {
            price: 200.0,
            now_ms: 2_000,
            last_submitted_price: Some(100.0),
            last_submitted_ts_ms: Some(1_000),
        };
        assert_eq!(validate(&input, &bounds()), Err(RejectionReason::ExcessiveChange));
    }

    #[test]
    fn rejects_submitted_too_soon() {
        let input = ValidationInput {
            price: 100.0,
            now_ms: 1_100,
            last_submitted_price: Some(100.0),
            last_submitted_ts_ms: Some(1_000),
        };
        assert_eq!(validate(&input, &bounds()), Err(RejectionReason::SubmittedTooSoon));
    }
}

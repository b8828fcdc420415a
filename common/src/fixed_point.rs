//! Fixed-point conversion between floating-point prices and the integer
//! form stored on-chain.
//!
//! Floats never cross the on-chain boundary: the controller rounds once,
//! the program stores the integer, the reader divides once.

/// `round(price * 10^decimals)`. Returns `None` on overflow or a
/// non-finite input.
pub fn quantize(price: f64, decimals: u8) -> Option<i64> {
    if !price.is_finite() {
        return None;
    }
    let scale = 10f64.powi(decimals as i32);
    let scaled = (price * scale).round();
    if !scaled.is_finite() || scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
        return None;
    }
    Some(scaled as i64)
}

/// `price_q / 10^decimals`, the reader-side inverse.
pub fn dequantize(price_q: i64, decimals: u8) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    price_q as f64 / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_round_trip_fidelity() {
        let price = 50123.456789;
        let decimals = 8;
        let q = quantize(price, decimals).unwrap();
        let back = dequantize(q, decimals);
        assert!((back - price).abs() < 1e-6);
    }

    #[test]
    fn quantize_rejects_non_finite() {
        assert_eq!(quantize(f64::NAN, 8), None);
        assert_eq!(quantize(f64::INFINITY, 8), None);
    }

    #[test]
    fn quantize_matches_worked_example() {
        // BTC=50123.45, decimals=8.
        assert_eq!(quantize(50123.45, 8), Some(5_012_345_000_000));
        assert_eq!(quantize(2999.00, 8), Some(299_900_000_000));
        assert_eq!(quantize(100.50, 8), Some(10_050_000_000));
    }
}

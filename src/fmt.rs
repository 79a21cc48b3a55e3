use std::fmt::{Debug, Display, Formatter};

use serde::Serializer;

/// Round to the specified number of decimal places, half away from zero.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Persisted prices keep five decimals.
#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn serialize_price<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 5))
}

/// Optional price in the comparison output: four decimals, or an empty cell.
pub struct FormattedPrice(pub Option<f64>);

impl Debug for FormattedPrice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for FormattedPrice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value:.4}"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_round_to() {
        assert_abs_diff_eq!(round_to(0.30 + 0.10154 + 0.0484, 5), 0.44994);
        assert_abs_diff_eq!(round_to(0.123_456, 5), 0.12346);
        assert_abs_diff_eq!(round_to(-0.000_004, 5), 0.0);
    }

    #[test]
    fn test_formatted_price() {
        assert_eq!(FormattedPrice(Some(0.449_94)).to_string(), "0.4499");
        assert_eq!(FormattedPrice(Some(1.0)).to_string(), "1.0000");
        assert_eq!(FormattedPrice(None).to_string(), "");
    }
}

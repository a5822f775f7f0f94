//! Line-item quantity.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A line-item quantity, always at least 1.
///
/// Requested quantities are clamped rather than rejected: anything below 1
/// becomes 1, anything above the available stock becomes the stock level.
///
/// ```
/// use heirloom_core::Quantity;
///
/// assert_eq!(Quantity::clamped(0, Some(5)).get(), 1);
/// assert_eq!(Quantity::clamped(-3, None).get(), 1);
/// assert_eq!(Quantity::clamped(9, Some(5)).get(), 5);
/// assert_eq!(Quantity::clamped(3, Some(5)).get(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// A quantity of one.
    pub const ONE: Self = Self(1);

    /// Create a quantity, returning `None` for zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    /// Clamp a requested quantity into `[1, stock]`.
    ///
    /// `stock` of `None` means the upper bound is unknown and only the lower
    /// bound applies. A stock level of zero still yields 1; callers that care
    /// about availability must check stock separately.
    #[must_use]
    pub fn clamped(requested: i64, stock: Option<u32>) -> Self {
        let upper = stock.map_or(u32::MAX, |s| s.max(1));
        let value = requested.clamp(1, i64::from(upper));
        Self(u32::try_from(value).unwrap_or(upper))
    }

    /// The quantity as a plain integer.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Server data that violates the lower bound is clamped, not rejected.
        let raw = i64::deserialize(deserializer)?;
        Ok(Self::clamped(raw, None))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_rejects_zero() {
        assert!(Quantity::new(0).is_none());
        assert_eq!(Quantity::new(4).unwrap().get(), 4);
    }

    #[test]
    fn test_clamp_without_stock() {
        assert_eq!(Quantity::clamped(1_000, None).get(), 1_000);
        assert_eq!(Quantity::clamped(i64::MIN, None).get(), 1);
    }

    #[test]
    fn test_clamp_zero_stock_yields_one() {
        assert_eq!(Quantity::clamped(3, Some(0)).get(), 1);
    }

    #[test]
    fn test_deserialize_clamps_lower_bound() {
        let q: Quantity = serde_json::from_str("0").unwrap();
        assert_eq!(q, Quantity::ONE);
        let q: Quantity = serde_json::from_str("7").unwrap();
        assert_eq!(q.get(), 7);
    }

    proptest! {
        #[test]
        fn clamped_is_always_within_bounds(requested in any::<i64>(), stock in 1u32..10_000) {
            let q = Quantity::clamped(requested, Some(stock)).get();
            prop_assert!(q >= 1);
            prop_assert!(q <= stock);
        }

        #[test]
        fn clamped_keeps_in_range_requests(stock in 1u32..10_000, offset in 0u32..10_000) {
            let requested = 1 + offset % stock;
            prop_assert_eq!(Quantity::clamped(i64::from(requested), Some(stock)).get(), requested);
        }
    }
}

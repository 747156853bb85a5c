//! Numeric identifier types.

use std::fmt::{Debug, Display};

/// An integer type identifiers can be drawn in.
///
/// Stores exchange raw values as `i64`; conversions are checked so a value
/// that does not fit the identifier type is reported instead of wrapped.
pub trait IdValue: Copy + Ord + Debug + Display + Send + Sync + 'static {
    /// The value one.
    const ONE: Self;

    /// Checked addition.
    fn checked_add(self, rhs: Self) -> Option<Self>;

    /// Checked subtraction.
    fn checked_sub(self, rhs: Self) -> Option<Self>;

    /// Converts a raw store value.
    fn from_i64(value: i64) -> Option<Self>;

    /// Converts to a raw store value.
    fn to_i64(self) -> Option<i64>;
}

macro_rules! impl_id_value {
    ($($ty:ty),*) => {
        $(
            impl IdValue for $ty {
                const ONE: Self = 1;

                fn checked_add(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_add(self, rhs)
                }

                fn checked_sub(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_sub(self, rhs)
                }

                fn from_i64(value: i64) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }

                fn to_i64(self) -> Option<i64> {
                    i64::try_from(self).ok()
                }
            }
        )*
    };
}

impl_id_value!(i32, i64, u32, u64);

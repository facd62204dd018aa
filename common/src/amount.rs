use alloy_primitives::U256;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount: {0}")]
    InvalidNumber(String),

    #[error("Amount {input} has more than {decimals} decimal places")]
    TooManyDecimals { input: String, decimals: u8 },

    #[error("Amount overflow: {0}")]
    Overflow(String),
}

/// A power-of-ten scale used to move between human-readable decimal strings
/// and the fixed-point integers contracts work with.
///
/// All conversions are integer arithmetic on `U256`; floats never enter the path.
///
/// # Examples
/// ```
/// use common::amount::ScaleFactor;
///
/// let wei = ScaleFactor::WAD.parse("1.5").unwrap();
/// assert_eq!(ScaleFactor::WAD.format(wei), "1.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactor {
    decimals: u8,
    factor: U256,
}

impl ScaleFactor {
    /// 18 decimals, the scale of ether and the test token
    pub const WAD: Self =
        Self { decimals: 18, factor: U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]) };

    /// Creates a scale of `10^decimals`, or `None` if it does not fit in 256 bits
    pub fn new(decimals: u8) -> Option<Self> {
        let ten = U256::from(10u64);
        let mut factor = U256::from(1u64);
        for _ in 0..decimals {
            factor = factor.checked_mul(ten)?;
        }
        Some(Self { decimals, factor })
    }

    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    pub const fn factor(&self) -> U256 {
        self.factor
    }

    /// Parses a non-negative decimal string such as `"1.5"` into scaled units.
    ///
    /// Surrounding whitespace is ignored and either side of the decimal point may
    /// be omitted (`".5"`, `"2."`). Trailing fractional zeros beyond the scale are
    /// accepted, other digits beyond it are rejected rather than truncated.
    pub fn parse(&self, input: &str) -> Result<U256, AmountError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(AmountError::InvalidNumber(trimmed.to_string()));
        }

        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > self.decimals as usize {
            return Err(AmountError::TooManyDecimals {
                input: trimmed.to_string(),
                decimals: self.decimals,
            });
        }

        let whole_units = parse_digits(whole, trimmed)?;
        let padded = format!("{:0<width$}", fraction, width = self.decimals as usize);
        let fraction_units = parse_digits(&padded, trimmed)?;

        whole_units
            .checked_mul(self.factor)
            .and_then(|scaled| scaled.checked_add(fraction_units))
            .ok_or_else(|| AmountError::Overflow(trimmed.to_string()))
    }

    /// Formats scaled units with every significant fractional digit, keeping at
    /// least one (`1000000000000000000` -> `"1.0"`).
    pub fn format(&self, value: U256) -> String {
        if self.decimals == 0 {
            return value.to_string();
        }

        let whole = value / self.factor;
        let fraction = value % self.factor;
        let digits = format!("{:0>width$}", fraction.to_string(), width = self.decimals as usize);
        let digits = digits.trim_end_matches('0');

        if digits.is_empty() {
            format!("{}.0", whole)
        } else {
            format!("{}.{}", whole, digits)
        }
    }

    /// Formats scaled units rounded half-up to exactly `places` fractional digits.
    pub fn format_fixed(&self, value: U256, places: u8) -> String {
        if places >= self.decimals {
            let full = self.format(value);
            let (whole, fraction) = full.split_once('.').unwrap_or((full.as_str(), ""));
            if places == 0 {
                return whole.to_string();
            }
            return format!("{}.{:0<width$}", whole, fraction, width = places as usize);
        }

        // places < decimals, so both scales are smaller than self and always fit
        let (Some(dropped), Some(kept)) =
            (Self::new(self.decimals - places), Self::new(places))
        else {
            return self.format(value);
        };

        let half = dropped.factor / U256::from(2u64);
        let rounded = value.checked_add(half).unwrap_or(value) / dropped.factor;

        if places == 0 {
            return rounded.to_string();
        }

        let whole = rounded / kept.factor;
        let fraction = rounded % kept.factor;
        format!("{}.{:0>width$}", whole, fraction.to_string(), width = places as usize)
    }
}

fn parse_digits(digits: &str, original: &str) -> Result<U256, AmountError> {
    let ten = U256::from(10u64);
    let mut value = U256::ZERO;

    for c in digits.chars() {
        let digit =
            c.to_digit(10).ok_or_else(|| AmountError::InvalidNumber(original.to_string()))?;
        value = value
            .checked_mul(ten)
            .and_then(|v| v.checked_add(U256::from(digit)))
            .ok_or_else(|| AmountError::Overflow(original.to_string()))?;
    }

    Ok(value)
}

/// Parses an ether-denominated decimal string into wei.
pub fn parse_ether(input: &str) -> Result<U256, AmountError> {
    ScaleFactor::WAD.parse(input)
}

/// Formats wei as an ether-denominated decimal string.
pub fn format_ether(value: U256) -> String {
    ScaleFactor::WAD.format(value)
}

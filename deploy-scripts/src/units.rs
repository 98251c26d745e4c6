//! Exact scaling of human-readable decimal amounts into on-chain base units

use std::fmt::{self, Display};

use alloy_primitives::{
    utils::{format_units, parse_units, ParseUnits},
    U256,
};

use crate::{constants::ETHER_DECIMALS, errors::ScriptError};

/// An amount of a token or of the native currency, in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TokenAmount(U256);

impl TokenAmount {
    /// Scale a decimal string (e.g. `"0.1"`) by `10^decimals`.
    ///
    /// The conversion is done on the decimal string itself, never through a
    /// float. Negative amounts, malformed input, and amounts with more
    /// fractional digits than `decimals` are rejected rather than rounded.
    pub fn parse(amount: &str, decimals: u8) -> Result<Self, ScriptError> {
        let trimmed = amount.trim();
        if trimmed.is_empty() {
            return Err(ScriptError::AmountParsing("empty amount".to_string()));
        }

        if trimmed.starts_with('-') {
            return Err(ScriptError::AmountParsing(format!("{trimmed} is negative")));
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (trimmed, None),
        };
        let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !is_digits(whole) || !fraction.map_or(true, is_digits) {
            return Err(ScriptError::AmountParsing(format!(
                "{trimmed} is not a decimal number"
            )));
        }

        if fraction.is_some_and(|f| f.len() > decimals as usize) {
            return Err(ScriptError::AmountParsing(format!(
                "{trimmed} has more than {decimals} fractional digits"
            )));
        }

        match parse_units(trimmed, decimals)
            .map_err(|e| ScriptError::AmountParsing(format!("{trimmed}: {e}")))?
        {
            ParseUnits::U256(value) => Ok(Self(value)),
            ParseUnits::I256(_) => Err(ScriptError::AmountParsing(format!(
                "{trimmed} is negative"
            ))),
        }
    }

    /// Scale a decimal amount of ether into wei
    pub fn ether(amount: &str) -> Result<Self, ScriptError> {
        Self::parse(amount, ETHER_DECIMALS)
    }

    /// Wrap an amount that is already denominated in base units
    pub const fn from_base_units(value: U256) -> Self {
        Self(value)
    }

    /// The amount in base units
    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    /// Render the amount as a decimal string with the given number of decimals
    pub fn format(&self, decimals: u8) -> String {
        format_units(self.0, decimals).unwrap_or_else(|_| self.0.to_string())
    }
}

impl From<TokenAmount> for U256 {
    fn from(amount: TokenAmount) -> Self {
        amount.0
    }
}

impl Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::TokenAmount;

    #[test]
    fn test_whole_amount() {
        let amount = TokenAmount::parse("10", 18).unwrap();
        assert_eq!(amount.as_u256(), U256::from(10u128.pow(19)));
    }

    #[test]
    fn test_fractional_amount_is_exact() {
        let amount = TokenAmount::ether("0.1").unwrap();
        assert_eq!(amount.as_u256(), U256::from(100_000_000_000_000_000u64));

        let amount = TokenAmount::parse("1.000000000000000001", 18).unwrap();
        assert_eq!(amount.as_u256(), U256::from(1_000_000_000_000_000_001u64));
    }

    #[test]
    fn test_small_decimals() {
        let amount = TokenAmount::parse("12.5", 6).unwrap();
        assert_eq!(amount.as_u256(), U256::from(12_500_000u64));
    }

    #[test]
    fn test_rejects_excess_precision() {
        assert!(TokenAmount::parse("0.0000000000000000001", 18).is_err());
        assert!(TokenAmount::parse("1.234", 2).is_err());
    }

    #[test]
    fn test_rejects_negative_and_malformed() {
        assert!(TokenAmount::parse("-1", 18).is_err());
        assert!(TokenAmount::parse("", 18).is_err());
        assert!(TokenAmount::parse("ten", 18).is_err());
        assert!(TokenAmount::parse("1_0", 18).is_err());
        assert!(TokenAmount::parse(".", 18).is_err());
        assert!(TokenAmount::parse("1.", 18).is_err());
        assert!(TokenAmount::parse(".5", 18).is_err());
        assert!(TokenAmount::parse("1.2.3", 18).is_err());
        assert!(TokenAmount::parse("+1", 18).is_err());
        assert!(TokenAmount::parse("1e18", 18).is_err());
    }

    #[test]
    fn test_format() {
        let amount = TokenAmount::ether("0.1").unwrap();
        assert!(amount.format(18).starts_with("0.1"));
    }
}

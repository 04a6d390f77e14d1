use crate::error::{BingoError, Result};
use serde::{Deserialize, Serialize};

/// Native-unit fee reserved for every ticket purchase.
pub const BUY_TICKET_FEE: &str = "0.0003";

/// Decimal places between base units and display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denomination {
    pub decimals: u32,
}

impl Denomination {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    fn scale(&self) -> Result<u128> {
        10u128
            .checked_pow(self.decimals)
            .ok_or_else(|| BingoError::invalid_response(format!("{} decimals", self.decimals)))
    }

    /// `1234567.25` style rendering with thousands separators and no
    /// trailing fractional zeros.
    pub fn format(&self, amount: u128) -> String {
        let digits = amount.to_string();
        let decimals = self.decimals as usize;
        let (whole, fraction) = if digits.len() > decimals {
            digits.split_at(digits.len() - decimals)
        } else {
            ("0", digits.as_str())
        };

        let mut out = group_thousands(whole);
        let fraction = format!("{:0>width$}", fraction, width = decimals);
        let fraction = fraction.trim_end_matches('0');
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(fraction);
        }
        out
    }

    /// Parse a decimal string such as `"0.0003"` into base units.
    pub fn parse_units(&self, value: &str) -> Result<u128> {
        let value = value.trim();
        let invalid = || BingoError::config(format!("Invalid amount '{}'", value));

        let (whole, fraction) = match value.split_once('.') {
            Some((w, f)) => (w, f),
            None => (value, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let decimals = self.decimals as usize;
        let significant = fraction.trim_end_matches('0');
        if significant.len() > decimals {
            return Err(BingoError::config(format!(
                "Amount '{}' has more than {} decimals",
                value, decimals
            )));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: u128 = if significant.is_empty() {
            0
        } else {
            format!("{:0<width$}", significant, width = decimals)
                .parse()
                .map_err(|_| invalid())?
        };

        whole
            .checked_mul(self.scale()?)
            .and_then(|w| w.checked_add(fraction))
            .ok_or_else(invalid)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Base-unit integer carried as a decimal string in API responses.
pub fn parse_decimal_u128(value: &str) -> Result<u128> {
    value
        .trim()
        .parse()
        .map_err(|_| BingoError::invalid_response(format!("Invalid integer '{}'", value)))
}

/// Big-endian unsigned integer as returned by contract views. Empty is zero.
pub fn u128_from_be(bytes: &[u8]) -> Result<u128> {
    let significant = strip_leading_zeros(bytes);
    if significant.len() > 16 {
        return Err(BingoError::invalid_response(format!(
            "{}-byte integer does not fit in 128 bits",
            significant.len()
        )));
    }
    Ok(significant
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | u128::from(b)))
}

pub fn u64_from_be(bytes: &[u8]) -> Result<u64> {
    let value = u128_from_be(bytes)?;
    u64::try_from(value).map_err(|_| {
        BingoError::invalid_response(format!("{} does not fit in 64 bits", value))
    })
}

/// Minimal big-endian bytes; zero encodes to nothing.
pub fn u128_to_be_minimal(value: u128) -> Vec<u8> {
    strip_leading_zeros(&value.to_be_bytes()).to_vec()
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

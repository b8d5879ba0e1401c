//! # Unit Conversion
//!
//! wei <-> ETH conversion and the threshold rendering rule used for every
//! amount shown to the user.

use crate::domain::VaultSyncError;
use primitive_types::U256;

/// Label for the smallest unit.
pub const SMALL_UNIT_LABEL: &str = "wei";

/// Label for the human-scale unit.
pub const LARGE_UNIT_LABEL: &str = "ETH";

/// Decimal places between wei and ETH.
pub const ETHER_DECIMALS: usize = 18;

/// Amounts below this many wei are rendered as raw integers.
pub const DEFAULT_RENDER_THRESHOLD: u64 = 100_000;

fn wei_per_ether() -> U256 {
    U256::exp10(ETHER_DECIMALS)
}

/// Threshold-based amount renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitConverter {
    threshold: U256,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_THRESHOLD)
    }
}

impl UnitConverter {
    /// Create a converter with a custom wei threshold.
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold: U256::from(threshold),
        }
    }

    /// Render a wei amount: raw below the threshold, ETH otherwise.
    pub fn render(&self, amount: U256) -> String {
        if amount < self.threshold {
            format!("{} {}", amount, SMALL_UNIT_LABEL)
        } else {
            format!("{} {}", to_ether_string(amount), LARGE_UNIT_LABEL)
        }
    }

    /// Render untyped input. Anything that is not a non-negative integer
    /// counts as zero.
    pub fn render_str(&self, raw: &str) -> String {
        let amount = U256::from_dec_str(raw.trim()).unwrap_or_else(|_| U256::zero());
        self.render(amount)
    }

    /// Render an optional balance, `None` as zero.
    pub fn render_opt(&self, amount: Option<U256>) -> String {
        self.render(amount.unwrap_or_default())
    }
}

/// Exact decimal ETH value of a wei amount, trailing zeros trimmed.
pub fn to_ether_string(wei: U256) -> String {
    let unit = wei_per_ether();
    let whole = wei / unit;
    let frac = wei % unit;

    if frac.is_zero() {
        return whole.to_string();
    }

    let frac = format!("{:0>width$}", frac.to_string(), width = ETHER_DECIMALS);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Parse a user-entered ETH amount into wei.
///
/// # Errors
/// `InvalidAmount` for empty, negative, malformed, zero, overly precise
/// or overflowing input.
pub fn parse_ether(input: &str) -> Result<U256, VaultSyncError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(VaultSyncError::InvalidAmount("empty".to_string()));
    }

    let (whole, frac) = match input.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (input, ""),
    };

    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
        return Err(VaultSyncError::InvalidAmount(format!("not a number: {input}")));
    }
    if frac.len() > ETHER_DECIMALS {
        return Err(VaultSyncError::InvalidAmount(format!(
            "more than {ETHER_DECIMALS} decimal places: {input}"
        )));
    }

    let overflow = || VaultSyncError::InvalidAmount(format!("too large: {input}"));
    let parse = |digits: &str| -> Result<U256, VaultSyncError> {
        if digits.is_empty() {
            Ok(U256::zero())
        } else {
            U256::from_dec_str(digits).map_err(|_| overflow())
        }
    };

    let whole_wei = parse(whole)?
        .checked_mul(wei_per_ether())
        .ok_or_else(overflow)?;
    let frac_wei = parse(&format!("{:0<width$}", frac, width = ETHER_DECIMALS))?;
    let wei = whole_wei.checked_add(frac_wei).ok_or_else(overflow)?;

    if wei.is_zero() {
        return Err(VaultSyncError::InvalidAmount("must be positive".to_string()));
    }
    Ok(wei)
}

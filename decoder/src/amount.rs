//! Lossless raw-to-unit amount conversion.

use num_bigint::BigUint;

/// Divide `amount` by `10^decimals` and render the exact decimal result.
///
/// Trailing fractional zeros are trimmed but at least one fractional digit is
/// kept, so `1_000_000` with 6 decimals renders as `"1.0"`.
pub fn format_ui_amount(amount: &BigUint, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{fraction}")
    }
}

pub fn format_ui_amount_u64(amount: u64, decimals: u8) -> String {
    format_ui_amount(&BigUint::from(amount), decimals)
}

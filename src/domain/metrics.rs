//! Display-count parsing for engagement metrics
//!
//! Social pages render counts the way users read them: "842", "12.3K",
//! "1.2M", or an empty string while the counter is still loading. This
//! module converts those display strings into numeric counts with a
//! fail-soft contract: anything unparseable resolves to 0 so a single
//! garbled counter never aborts a post.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A display count: a non-negative decimal number with an optional
    /// thousand ("k") or million ("m") suffix, already lower-cased.
    static ref DISPLAY_COUNT: Regex =
        Regex::new(r"^([0-9]*\.?[0-9]+)\s*([km])?$").expect("display count pattern is valid");
}

/// Parse a raw display string into a numeric count.
///
/// Rules, in order: trim and lower-case; empty input is 0; a `k` suffix
/// multiplies by 1,000; an `m` suffix multiplies by 1,000,000; otherwise the
/// string is parsed as a plain number. Any failure resolves to 0.
///
/// Inputs mixing a thousands separator with a suffix ("1,2k") are
/// unsupported and resolve through the fail-soft path to 0.
pub fn parse_display_count(raw: &str) -> f64 {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return 0.0;
    }

    let Some(captures) = DISPLAY_COUNT.captures(&normalized) else {
        return 0.0;
    };

    let Ok(value) = captures[1].parse::<f64>() else {
        return 0.0;
    };

    let multiplier = match captures.get(2).map(|m| m.as_str()) {
        Some("k") => 1_000.0,
        Some("m") => 1_000_000.0,
        _ => 1.0,
    };

    value * multiplier
}

/// Parse a raw display string directly into a whole count.
///
/// Fractional remainders from suffix expansion are truncated ("1.2345k" is
/// 1234), matching how the counts are consumed downstream.
pub fn parse_display_count_whole(raw: &str) -> u64 {
    parse_display_count(raw).max(0.0) as u64
}

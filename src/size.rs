use anyhow::{bail, Result};
use std::cmp::Ordering;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Parse human-readable size strings to bytes
///
/// Supports: B, KB, MB, GB, TB (case-insensitive)
/// Examples:
/// - "100MB" -> 104_857_600
/// - "1GB"   -> 1_073_741_824
/// - "500KB" -> 512_000
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();

    if s.is_empty() {
        bail!("Empty size string");
    }

    let num_end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    if num_end == s.len() {
        // No unit, plain bytes
        return Ok(s.parse::<u64>()?);
    }

    if num_end == 0 {
        bail!("Size string must start with a number: {}", s);
    }

    let num_str = &s[..num_end];
    let unit_str = s[num_end..].trim().to_uppercase();

    let num: f64 = num_str
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid number: {}", num_str))?;

    let multiplier = match unit_str.as_str() {
        "B" => 1u64,
        "KB" | "K" => 1024u64,
        "MB" | "M" => 1024u64 * 1024,
        "GB" | "G" => 1024u64 * 1024 * 1024,
        "TB" | "T" => 1024u64 * 1024 * 1024 * 1024,
        _ => bail!("Unknown size unit: {}. Supported: B, KB, MB, GB, TB", unit_str),
    };

    Ok((num * multiplier as f64) as u64)
}

/// Size in mebibytes, as shown to users.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Descending total order over floating-point sizes.
///
/// Non-finite values (NaN, infinities) sort after every finite value and
/// compare equal to each other, so sorting never panics.
pub fn cmp_size_desc(a: f64, b: f64) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => b.total_cmp(&a),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Sort largest first by a floating-point size key, non-finite keys last.
///
/// The sort is stable, so callers pre-sort by their tie-breaker.
pub fn sort_by_size_desc<T>(items: &mut [T], size_mb: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| cmp_size_desc(size_mb(a), size_mb(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("100MB").unwrap(), 104_857_600);
        assert_eq!(parse_size("1GB").unwrap(), 1_073_741_824);
        assert_eq!(parse_size("500KB").unwrap(), 512_000);
        assert_eq!(parse_size("1024B").unwrap(), 1024);
        assert_eq!(parse_size("2TB").unwrap(), 2_199_023_255_552);
        assert_eq!(parse_size("100").unwrap(), 100);
        assert_eq!(parse_size("1.5GB").unwrap(), 1_610_612_736);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(parse_size("100mb").unwrap(), parse_size("100MB").unwrap());
        assert_eq!(parse_size("1gb").unwrap(), parse_size("1GB").unwrap());
        assert_eq!(parse_size("10m").unwrap(), parse_size("10MB").unwrap());
    }

    #[test]
    fn test_parse_size_errors() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("MB").is_err());
        assert!(parse_size("10XB").is_err());
    }

    #[test]
    fn test_bytes_to_mb() {
        assert_eq!(bytes_to_mb(1024 * 1024), 1.0);
        assert_eq!(bytes_to_mb(0), 0.0);
    }

    #[test]
    fn test_sort_nan_and_infinity_last() {
        let mut sizes = vec![1.0, f64::NAN, 50.0, f64::INFINITY, 3.5, f64::NEG_INFINITY];
        sort_by_size_desc(&mut sizes, |s| *s);
        assert_eq!(&sizes[..3], &[50.0, 3.5, 1.0]);
        assert!(sizes[3..].iter().all(|s| !s.is_finite()));
    }

    #[test]
    fn test_sort_only_non_finite_does_not_panic() {
        let mut sizes = vec![f64::NAN, f64::NAN, f64::INFINITY];
        sort_by_size_desc(&mut sizes, |s| *s);
        assert_eq!(sizes.len(), 3);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut items = vec![("a", 2.0), ("b", f64::NAN), ("c", 2.0), ("d", 9.0)];
        sort_by_size_desc(&mut items, |(_, s)| *s);
        let names: Vec<&str> = items.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["d", "a", "c", "b"]);
    }
}

//! Storage size parsing for plan comparisons
//!
//! A quantity is a non-negative decimal number followed by an optional unit
//! suffix. Binary suffixes (`Ki`, `Mi`, `Gi`, `Ti`) are powers of 1024,
//! decimal suffixes (`K`, `M`, `G`, `T`) powers of 1000. No suffix, or one we
//! don't know, means bytes. A missing or malformed number parses as 0.

/// Parse a quantity string into bytes
pub fn parse_quantity(quantity: &str) -> u64 {
    let quantity = quantity.trim();
    let split = quantity
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(quantity.len());
    let (number, suffix) = quantity.split_at(split);

    let value: f64 = match number.parse() {
        Ok(value) => value,
        Err(_) => return 0,
    };

    (value * multiplier(suffix) as f64) as u64
}

fn multiplier(suffix: &str) -> u64 {
    match suffix {
        "Ki" => 1 << 10,
        "Mi" => 1 << 20,
        "Gi" => 1 << 30,
        "Ti" => 1 << 40,
        "K" => 1_000,
        "M" => 1_000_000,
        "G" => 1_000_000_000,
        "T" => 1_000_000_000_000,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_suffixes() {
        assert_eq!(parse_quantity("10Gi"), 10 * 1024 * 1024 * 1024);
        assert_eq!(parse_quantity("512Mi"), 512 * 1024 * 1024);
        assert_eq!(parse_quantity("4Ki"), 4096);
    }

    #[test]
    fn test_decimal_suffixes() {
        assert_eq!(parse_quantity("500M"), 500 * 1000 * 1000);
        assert_eq!(parse_quantity("2G"), 2_000_000_000);
        assert_eq!(parse_quantity("3K"), 3_000);
    }

    #[test]
    fn test_plain_and_empty() {
        assert_eq!(parse_quantity("5"), 5);
        assert_eq!(parse_quantity(""), 0);
    }

    #[test]
    fn test_fractional_value() {
        assert_eq!(parse_quantity("1.5Gi"), 3 * 512 * 1024 * 1024);
    }

    #[test]
    fn test_malformed_number_is_zero() {
        assert_eq!(parse_quantity("Gi"), 0);
        assert_eq!(parse_quantity("abc"), 0);
        assert_eq!(parse_quantity("1.2.3Gi"), 0);
    }

    #[test]
    fn test_binary_and_decimal_ordering() {
        assert!(parse_quantity("50Gi") > parse_quantity("50G"));
        assert!(parse_quantity("10Gi") < parse_quantity("50Gi"));
    }
}

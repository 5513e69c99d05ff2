//! Number rendering for currency amounts.

/// Render an amount for display.
///
/// Grouped mode gives `1,234,567` (one decimal when the fraction shows).
/// Exponential mode gives `1.23e6` for amounts of a thousand or more and
/// falls back to grouped below that.
pub fn format_amount(n: f64, exponential: bool) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_amount(-n, exponential));
    }
    if exponential && n >= 1_000.0 {
        return format!("{n:.2e}");
    }
    format_grouped(n)
}

fn format_grouped(n: f64) -> String {
    let tenths = (n.abs() * 10.0).round();
    let int_part = (tenths / 10.0).trunc();
    // Past 2^53 an f64 carries no fractional digit.
    let frac = if tenths < 9e15 {
        (tenths - int_part * 10.0) as u8
    } else {
        0
    };

    let s = format!("{int_part:.0}");
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    let result: String = result.chars().rev().collect();

    if frac > 0 {
        format!("{result}.{frac}")
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_basic() {
        assert_eq!(format_amount(0.0, false), "0");
        assert_eq!(format_amount(123.0, false), "123");
        assert_eq!(format_amount(1234.0, false), "1,234");
        assert_eq!(format_amount(1234567.0, false), "1,234,567");
    }

    #[test]
    fn grouped_with_fraction() {
        assert_eq!(format_amount(12.5, false), "12.5");
        assert_eq!(format_amount(12.96, false), "13");
        assert_eq!(format_amount(0.04, false), "0");
    }

    #[test]
    fn grouped_beyond_integer_range() {
        assert_eq!(format_amount(1e20, false), "100,000,000,000,000,000,000");
        assert_eq!(format_amount(2.5e19, false), "25,000,000,000,000,000,000");
        assert_eq!(format_amount(1e300, false).replace(',', "").len(), 301);
    }

    #[test]
    fn grouped_near_float_precision_limit() {
        assert_eq!(format_amount(123_456_789_012.5, false), "123,456,789,012.5");
        assert_eq!(format_amount(-0.0, false), "0");
    }

    #[test]
    fn exponential_large_values() {
        assert_eq!(format_amount(1234567.0, true), "1.23e6");
        assert_eq!(format_amount(1000.0, true), "1.00e3");
        assert_eq!(format_amount(2.5e15, true), "2.50e15");
    }

    #[test]
    fn exponential_small_values_stay_plain() {
        assert_eq!(format_amount(999.0, true), "999");
        assert_eq!(format_amount(3.5, true), "3.5");
    }

    #[test]
    fn negative_and_non_finite() {
        assert_eq!(format_amount(-1234.0, false), "-1,234");
        assert_eq!(format_amount(f64::INFINITY, false), "inf");
        assert_eq!(format_amount(f64::NAN, true), "NaN");
    }
}

//! Fixed-point amount parsing and Brazilian currency formatting.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Parse an amount written with `.` as decimal separator, as used in NF-e and
/// CT-e XML (e.g. `1500.00`).
pub fn parse_xml_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s).ok()
}

/// Parse a Brazilian-formatted amount such as `R$ 1.234,56`.
pub fn parse_brl(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .replace("R$", "")
        .trim()
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Round to cents, half away from zero.
pub fn round_cents(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as Brazilian Real: `R$ 1.234,56`.
pub fn format_brl(d: Decimal) -> String {
    let rounded = round_cents(d);
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("R$ {sign}{grouped},{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn xml_amounts() {
        assert_eq!(parse_xml_amount("1500.00"), Some(dec!(1500.00)));
        assert_eq!(parse_xml_amount(" 49.9 "), Some(dec!(49.9)));
        assert_eq!(parse_xml_amount(""), None);
        assert_eq!(parse_xml_amount("1.500,00"), None);
    }

    #[test]
    fn brl_parsing() {
        assert_eq!(parse_brl("R$ 1.234,56"), Some(dec!(1234.56)));
        assert_eq!(parse_brl("1.500,04"), Some(dec!(1500.04)));
        assert_eq!(parse_brl("R$ 87,10"), Some(dec!(87.10)));
        assert_eq!(parse_brl(""), None);
        assert_eq!(parse_brl("R$"), None);
        assert_eq!(parse_brl("abc"), None);
    }

    #[test]
    fn brl_formatting() {
        assert_eq!(format_brl(dec!(1500)), "R$ 1.500,00");
        assert_eq!(format_brl(dec!(1234567.891)), "R$ 1.234.567,89");
        assert_eq!(format_brl(dec!(0.5)), "R$ 0,50");
        assert_eq!(format_brl(dec!(999.995)), "R$ 1.000,00");
        assert_eq!(format_brl(dec!(100)), "R$ 100,00");
        assert_eq!(format_brl(dec!(-12.3)), "R$ -12,30");
    }
}

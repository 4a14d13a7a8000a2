use chrono::{Datelike, NaiveDate};

/// Portuguese three-letter month abbreviations, January first.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Month abbreviation for a date, e.g. "Nov".
pub fn month_abbreviation(date: NaiveDate) -> &'static str {
    MONTH_ABBREVIATIONS[date.month0() as usize]
}

/// Format a date the way the ledger stores it: `dd/mm/yyyy`.
pub fn format_br_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Parse an XML date (`yyyy-mm-dd`). A trailing time part is ignored.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Parse either `yyyy-mm-dd` or `dd/mm/yyyy`.
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    parse_iso_date(s).or_else(|| NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok())
}

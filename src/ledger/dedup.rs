use chrono::NaiveDate;

use crate::core::format_br_date;

use super::row::{DUE_DATE_COLUMN, NUMBER_COLUMN};

/// Whether a worksheet row holds an entry (rather than the header, a blank
/// line or a hand-written note).
pub fn is_entry_row(row: &[String]) -> bool {
    row.len() > NUMBER_COLUMN
        && !row[DUE_DATE_COLUMN].trim().is_empty()
        && !row[NUMBER_COLUMN].trim().is_empty()
        && !row[DUE_DATE_COLUMN].contains("Vencimento")
}

/// Whether `rows` already record `document_number` due on `due_date`.
pub fn contains_installment(rows: &[Vec<String>], document_number: &str, due_date: NaiveDate) -> bool {
    let number = document_number.trim();
    let due = format_br_date(due_date);
    rows.iter()
        .filter(|row| is_entry_row(row))
        .any(|row| row[NUMBER_COLUMN].trim() == number && row[DUE_DATE_COLUMN].trim() == due)
}

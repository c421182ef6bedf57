//! Utilities for parsing and formatting Excel-style cell references and ranges.

/// Parse a cell reference like "A1" into (col, row) where col and row are 0-indexed.
///
/// Dollar anchors (`$B$2`) are ignored.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for ch in cell_ref.trim().chars() {
        if ch == '$' {
            continue;
        }
        if ch.is_ascii_alphabetic() {
            let upper = ch.to_ascii_uppercase();
            col = col * 26 + (upper as u32 - 'A' as u32 + 1);
            saw_col = true;
        } else if ch.is_ascii_digit() {
            row = row * 10 + (ch as u32 - '0' as u32);
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row {
        return None;
    }

    Some((col.saturating_sub(1), row.saturating_sub(1)))
}

/// Parse a cell range like "A1:B10" or "A1" into (start_row, start_col, end_row, end_col).
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    if let Some((start, end)) = range.split_once(':') {
        let (start_col, start_row) = parse_cell_ref(start)?;
        let (end_col, end_row) = parse_cell_ref(end)?;
        Some((start_row, start_col, end_row, end_col))
    } else {
        let (start_col, start_row) = parse_cell_ref(range)?;
        Some((start_row, start_col, start_row, start_col))
    }
}

/// Convert a 0-based column index to Excel column letters (A, B, ..., Z, AA, AB, ...).
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col + 1; // 1-based
    while n > 0 {
        n -= 1;
        #[allow(clippy::cast_possible_truncation)]
        let c = char::from(b'A' + (n % 26) as u8);
        result.insert(0, c);
        n /= 26;
    }
    result
}

/// Format 0-based (col, row) as an A1-style reference.
pub fn format_cell_ref(col: u32, row: u32) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

/// The column letters of a cell reference ("B7" -> "B", "$AA$3" -> "AA").
pub fn column_letters(cell_ref: &str) -> String {
    cell_ref
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Parse a sqref string ("A1:B2 D4") into a list of (start_row, start_col, end_row, end_col).
pub fn parse_sqref(sqref: &str) -> Vec<(u32, u32, u32, u32)> {
    sqref
        .split_whitespace()
        .filter_map(parse_cell_range)
        .collect()
}

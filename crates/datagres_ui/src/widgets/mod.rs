pub mod hotkey;
pub mod status_line;
pub mod table;
pub mod text_input;
pub mod top_bar;
pub mod where_input;

use datagres_db::{Row, Value};
pub use status_line::StatusLine;
use unicode_width::UnicodeWidthStr;

/// Column widths wide enough for the header and the widest line of any cell
#[must_use]
pub fn column_widths(columns: &[String], rows: &[Row]) -> Vec<u16> {
    let mut widths = columns
        .iter()
        .map(|name| UnicodeWidthStr::width(name.as_str()))
        .collect::<Vec<usize>>();

    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            let cell = cell_text(value);
            let longest = cell
                .lines()
                .map(UnicodeWidthStr::width)
                .max()
                .unwrap_or(0);
            *width = (*width).max(longest);
        }
    }

    widths
        .into_iter()
        .map(|w| u16::try_from(w).unwrap_or(u16::MAX))
        .collect()
}

/// How a cell value is shown in the grid
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Value::Null), "NULL");
        assert_eq!(cell_text(&json!("Bob")), "Bob");
        assert_eq!(cell_text(&json!(4)), "4");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_column_widths() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            vec![json!(1), json!("Alexandra")],
            vec![json!(12345), Value::Null],
            vec![json!(2), json!("名前")],
        ];
        assert_eq!(column_widths(&columns, &rows), vec![5, 9]);
    }
}

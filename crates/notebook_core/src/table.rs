//! Fixed-width text rendering of SQL result sets.

use serde_json::Value;

const MAX_RENDERED_ROWS: usize = 100;

/// Render rows (JSON objects keyed by column) as a bordered text table.
/// Column order follows the first row's keys; each column is as wide as its
/// header or its widest value, whichever is larger. At most 100 data rows
/// are rendered; the trailing count line says when truncation happened.
pub fn render_table(rows: &[Value]) -> String {
    if rows.is_empty() {
        return "No rows returned".to_string();
    }

    let headers: Vec<String> = rows[0]
        .as_object()
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();
    let widths: Vec<usize> = headers
        .iter()
        .map(|header| {
            rows.iter()
                .map(|row| cell_text(row, header).chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let separator = format!(
        "+-{}-+",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    let header_row = format!(
        "| {} |",
        headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad(h, *w))
            .collect::<Vec<_>>()
            .join(" | ")
    );

    let mut lines = vec![separator.clone(), header_row, separator.clone()];
    for row in rows.iter().take(MAX_RENDERED_ROWS) {
        lines.push(format!(
            "| {} |",
            headers
                .iter()
                .zip(&widths)
                .map(|(h, w)| pad(&cell_text(row, h), *w))
                .collect::<Vec<_>>()
                .join(" | ")
        ));
    }
    lines.push(separator);
    lines.push(format!(
        "\n{} row(s) returned{}",
        rows.len(),
        if rows.len() > MAX_RENDERED_ROWS {
            " (showing first 100)"
        } else {
            ""
        }
    ));
    lines.join("\n")
}

fn cell_text(row: &Value, key: &str) -> String {
    match row.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_width_is_max_of_header_and_values() {
        let rows = vec![json!({"a": 1, "b": "x"}), json!({"a": 22, "b": "yy"})];
        let table = render_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "+----+----+");
        assert_eq!(lines[1], "| a  | b  |");
        assert_eq!(lines[2], "+----+----+");
        assert_eq!(lines[3], "| 1  | x  |");
        assert_eq!(lines[4], "| 22 | yy |");
        assert_eq!(lines[5], "+----+----+");
        assert!(table.ends_with("\n2 row(s) returned"));
    }

    #[test]
    fn empty_result_set_has_a_fixed_message() {
        assert_eq!(render_table(&[]), "No rows returned");
    }

    #[test]
    fn caps_rendering_at_100_rows_and_reports_truncation() {
        let rows: Vec<_> = (0..150).map(|i| json!({"n": i})).collect();
        let table = render_table(&rows);
        // 3 frame lines, 100 data rows, closing separator, count line (the
        // count line itself starts with a blank line).
        assert_eq!(table.lines().filter(|l| l.starts_with("| ")).count(), 101);
        assert!(table.ends_with("150 row(s) returned (showing first 100)"));
    }

    #[test]
    fn null_and_missing_values_render_empty() {
        let rows = vec![json!({"a": Value::Null, "b": "set"}), json!({"b": "only"})];
        let table = render_table(&rows);
        assert!(table.contains("|   | set  |"));
    }
}

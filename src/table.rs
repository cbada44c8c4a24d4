use crate::data::{Field, Record};
use serde::Serialize;

pub const DEFAULT_MAX_ROWS: i64 = 10;

/// Header plus body rows, already formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Take the first `max_rows` records in dataset order. `max_rows <= 0` keeps the header only.
pub fn render_table(rows: &[Record], max_rows: i64) -> Grid {
    let limit = usize::try_from(max_rows).unwrap_or(0);
    let header = Field::ALL.iter().map(|f| f.name().to_string()).collect();
    let rows = rows
        .iter()
        .take(limit)
        .map(|record| {
            Field::ALL
                .iter()
                .map(|&f| record.value(f).to_string())
                .collect()
        })
        .collect();

    Grid { header, rows }
}

impl Grid {
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table class=\"table_dataset\">\n<tr>");
        for col in &self.header {
            html.push_str(&format!("<th class=\"table_dataset\">{}</th>", escape_html(col)));
        }
        html.push_str("</tr>\n");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td class=\"table_dataset\">{}</td>", escape_html(cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>");
        html
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

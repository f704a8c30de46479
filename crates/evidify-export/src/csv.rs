//! Minimal RFC 4180 writer for the one-row metrics file.

/// Quotes a cell when it contains a comma, quote or line break.
pub fn escape_cell(cell: &str) -> String {
    if cell.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Renders one header row and one value row, each terminated by `\n`.
pub fn render_table<H, V>(header: H, values: V) -> String
where
    H: IntoIterator,
    H::Item: AsRef<str>,
    V: IntoIterator,
    V::Item: AsRef<str>,
{
    let mut out = String::new();
    push_row(&mut out, header);
    push_row(&mut out, values);
    out
}

fn push_row<I>(out: &mut String, cells: I)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    for (idx, cell) in cells.into_iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&escape_cell(cell.as_ref()));
    }
    out.push('\n');
}

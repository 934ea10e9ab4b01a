// Fixed-width preview tables for the terminal

use unicode_width::UnicodeWidthStr;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
/// Uses Unicode display width so CJK/emoji alignment stays correct.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if width < 3 {
        // Just return the first char if it fits, else empty
        for ch in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if cw <= width {
                return ch.to_string();
            }
        }
        return String::new();
    }

    let str_width = UnicodeWidthStr::width(s);
    if str_width <= width {
        return s.to_string();
    }

    // Walk chars, accumulating display width, stop at width - 2 to leave room for ".."
    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

/// Pad or truncate a string to exactly `width` display columns.
/// If shorter, right-pads with spaces. If longer, truncates with "..".
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = UnicodeWidthStr::width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Spell out line breaks and tabs so a cell stays on its table line.
fn escape_cell(s: &str) -> String {
    if !s.contains(['\n', '\r', '\t']) {
        return s.to_string();
    }
    s.replace('\r', "\\r").replace('\n', "\\n").replace('\t', "\\t")
}

/// Widest a preview column may get before its cells are truncated.
pub(crate) const MAX_COLUMN_WIDTH: usize = 24;

/// Render a text table with a leading row-number column.
///
/// Rows are numbered from `first_row`. Every column is as wide as its widest
/// cell, capped at `MAX_COLUMN_WIDTH`. Embedded line breaks are shown as `\n`.
pub(crate) fn render_table(headers: &[String], rows: &[Vec<String>], first_row: usize) -> String {
    let headers: Vec<String> = headers.iter().map(|h| escape_cell(h)).collect();
    let rows: Vec<Vec<String>> = rows.iter().map(|r| r.iter().map(|c| escape_cell(c)).collect()).collect();

    let last_row = first_row + rows.len().saturating_sub(1);
    let num_width = display_width(&last_row.to_string()).max(1);

    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i >= widths.len() {
                widths.push(0);
            }
            widths[i] = widths[i].max(display_width(cell));
        }
    }
    for w in &mut widths {
        *w = (*w).clamp(1, MAX_COLUMN_WIDTH);
    }

    let line = |num: &str, cells: &[String]| {
        let mut parts = vec![pad_right(num, num_width)];
        for (i, w) in widths.iter().enumerate() {
            parts.push(pad_right(cells.get(i).map(String::as_str).unwrap_or(""), *w));
        }
        format!("{}\n", parts.join(" | ").trim_end())
    };

    let mut out = line("", &headers);
    let rule: Vec<String> = std::iter::once(num_width)
        .chain(widths.iter().copied())
        .map(|w| "-".repeat(w))
        .collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&line(&(first_row + i).to_string(), row));
    }
    out
}

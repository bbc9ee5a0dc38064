//! Shared text helpers for rendering log lines in terminal cells

use unicode_width::UnicodeWidthChar;

/// Columns a tab expands to
const TAB_WIDTH: usize = 4;

/// Fit a raw log line into `max_cols` terminal columns
///
/// Tabs become spaces and other control characters are dropped, since they
/// would move the cursor. Wide characters that would straddle the edge are
/// left out rather than split.
pub fn fit_to_width(line: &str, max_cols: usize) -> String {
    let mut out = String::with_capacity(line.len().min(max_cols * 4));
    let mut used = 0;

    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - used % TAB_WIDTH;
            if used + pad > max_cols {
                break;
            }
            out.extend(std::iter::repeat(' ').take(pad));
            used += pad;
            continue;
        }
        if ch.is_control() {
            continue;
        }
        let w = ch.width().unwrap_or(0);
        if used + w > max_cols {
            break;
        }
        out.push(ch);
        used += w;
    }
    out
}

/// Format large counts compactly: 950, 1.2K, 3.4M
pub fn format_compact_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

use chron_timeline::{OperationAccent, operation_accent};

#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

/// Header of the column colored by operation.
pub const OPERATION_HEADER: &str = "operation";

/// Render a simple aligned table for string rows.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>], options: TableOptions) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
                .max(6)
        })
        .collect();

    fit_widths(&mut widths, headers, options.max_width);

    let header_line = headers
        .iter()
        .zip(widths.iter())
        .map(|(header, width)| format_cell(&truncate_text(header, *width), *width, 0))
        .collect::<Vec<_>>()
        .join("  ");

    let divider = "-".repeat(header_line.chars().count());

    let row_lines = rows.iter().map(|row| {
        widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let value = row.get(index).cloned().unwrap_or_default();
                let truncated = truncate_text(&value, *width);
                let plain_len = truncated.chars().count();
                let cell = if options.color && headers.get(index) == Some(&OPERATION_HEADER) {
                    colorize_operation(&truncated)
                } else {
                    truncated
                };
                format_cell(&cell, *width, plain_len)
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    });

    let mut lines = Vec::with_capacity(2 + rows.len());
    lines.push(header_line.trim_end().to_string());
    lines.push(divider);
    lines.extend(row_lines);
    lines.join("\n")
}

fn fit_widths(widths: &mut [usize], headers: &[&str], max_width: Option<usize>) {
    let Some(max_width) = max_width else {
        return;
    };

    if widths.is_empty() {
        return;
    }

    let separators = widths.len().saturating_sub(1) * 2;
    let mut total = widths.iter().sum::<usize>() + separators;

    while total > max_width {
        let mut candidate_idx = None;
        let mut candidate_width = 0usize;
        for (idx, width) in widths.iter().enumerate() {
            let min_width = headers[idx].len().max(6);
            if *width > min_width && *width > candidate_width {
                candidate_idx = Some(idx);
                candidate_width = *width;
            }
        }

        let Some(idx) = candidate_idx else {
            break;
        };

        widths[idx] = widths[idx].saturating_sub(1);
        total = widths.iter().sum::<usize>() + separators;
    }
}

fn truncate_text(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 1 {
        return "…".to_string();
    }

    let mut out: String = value.chars().take(width - 1).collect();
    out.push('…');
    out
}

/// Pad to `width`. `plain_len` is the visible length when `value` carries
/// escape codes; 0 means measure `value` itself.
fn format_cell(value: &str, width: usize, plain_len: usize) -> String {
    let len = if plain_len == 0 {
        value.chars().count()
    } else {
        plain_len
    };
    format!("{value}{}", " ".repeat(width.saturating_sub(len)))
}

fn colorize_operation(value: &str) -> String {
    let code = match operation_accent(value) {
        OperationAccent::Create => "32",
        OperationAccent::Update => "34",
        OperationAccent::Delete => "31",
        OperationAccent::Other => "35",
        OperationAccent::None => return value.to_string(),
    };
    format!("\u{1b}[{code}m{value}\u{1b}[0m")
}

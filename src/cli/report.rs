//! Terminal rendering of results and errors.

use crate::Error;
use clap::builder::styling::{AnsiColor, Effects, Style};

const HORIZONTAL: &str = "─";
const VERTICAL: &str = "│";

struct Border {
    left: &'static str,
    middle: &'static str,
    right: &'static str,
}

const TOP: Border = Border {
    left: "╭",
    middle: "┬",
    right: "╮",
};
const SEPARATOR: Border = Border {
    left: "├",
    middle: "┼",
    right: "┤",
};
const BOTTOM: Border = Border {
    left: "╰",
    middle: "┴",
    right: "╯",
};

fn border(widths: &[usize], border: &Border) -> String {
    let segments: Vec<String> = widths
        .iter()
        .map(|width| HORIZONTAL.repeat(width + 2))
        .collect();
    format!("{}{}{}", border.left, segments.join(border.middle), border.right)
}

fn line(row: &[String], widths: &[usize]) -> String {
    let cells: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let value = row.get(i).map_or("", String::as_str);
            format!(" {value:>width$} ")
        })
        .collect();
    format!("{VERTICAL}{}{VERTICAL}", cells.join(VERTICAL))
}

/// Box table with right-aligned columns; the first row is the header.
#[must_use]
pub fn table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = vec![border(&widths, &TOP)];
    for (index, row) in rows.iter().enumerate() {
        lines.push(line(row, &widths));
        if index == 0 && rows.len() > 1 {
            lines.push(border(&widths, &SEPARATOR));
        }
    }
    lines.push(border(&widths, &BOTTOM));

    lines.join("\n")
}

/// The error chain on one line, skipping causes already quoted by their parent.
#[must_use]
pub fn message(err: &anyhow::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if parts.last().is_some_and(|last| last.contains(&text)) {
            continue;
        }
        parts.push(text);
    }
    parts.join(": ")
}

fn title(err: &anyhow::Error) -> &'static str {
    let rejected = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<Error>(),
            Some(Error::Authentication { .. } | Error::StepUp { .. })
        )
    });

    if rejected {
        "AUTHENTICATION ERROR"
    } else {
        "ERROR"
    }
}

/// Print `err` in red on stderr.
pub fn error(err: &anyhow::Error) {
    let style: Style = AnsiColor::Red.on_default() | Effects::BOLD;
    eprintln!(
        "\n{}/!\\ {} /!\\{}\n{}\n",
        style.render(),
        title(err),
        style.render_reset(),
        message(err)
    );
}

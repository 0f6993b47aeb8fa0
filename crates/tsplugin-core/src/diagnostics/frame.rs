//! Source code frames for human-readable error output.

/// Render a code frame around `line` (1-based) and `column` (0-based).
///
/// Shows up to two lines of context before and after the error line,
/// right-aligned line numbers, and a `^` marker under the column. Tabs are
/// rendered as two spaces and trailing blank lines after the error line are
/// dropped.
#[must_use]
pub fn code_frame(source: &str, line: usize, column: usize) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let frame_start = line.saturating_sub(3);
    let mut frame_end = (line + 2).min(lines.len());
    if frame_start >= frame_end {
        return String::new();
    }

    let mut window: Vec<&str> = lines[frame_start..frame_end]
        .iter()
        .map(|l| l.trim_end_matches('\r'))
        .collect();
    while frame_end > line && window.last().is_some_and(|l| l.trim().is_empty()) {
        window.pop();
        frame_end -= 1;
    }

    let digits = frame_end.to_string().len();

    window
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let number = frame_start + i + 1;
            let rendered = tabs_to_spaces(text);
            if number == line {
                let prefix: String = text.chars().take(column).collect();
                let indent = digits + 2 + tabs_to_spaces(&prefix).chars().count();
                format!(
                    "{number:>digits$}: {rendered}\n{}^",
                    " ".repeat(indent)
                )
            } else {
                format!("{number:>digits$}: {rendered}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn tabs_to_spaces(text: &str) -> String {
    text.replace('\t', "  ")
}

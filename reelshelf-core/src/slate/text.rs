//! Title cleanup and line wrapping for slate text.

/// Longest line, in characters, that fits the title region at the title size.
pub const MAX_LINE_CHARS: usize = 24;

/// Lines the title region can hold before the title is truncated.
pub const MAX_LINES: usize = 3;

const ELLIPSIS: char = '\u{2026}';

/// Strip characters that would break the surrounding markup and collapse
/// whitespace runs (including newlines) into single spaces.
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '&'))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap into at most [`MAX_LINES`] lines of [`MAX_LINE_CHARS`].
///
/// Words longer than a line are split hard. Overflow is cut and marked with
/// an ellipsis on the last line.
pub fn wrap(title: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in title.split_whitespace() {
        for chunk in split_long(word) {
            let needed = if current.is_empty() {
                char_len(&chunk)
            } else {
                char_len(&current) + 1 + char_len(&chunk)
            };

            if needed > MAX_LINE_CHARS && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&chunk);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > MAX_LINES {
        lines.truncate(MAX_LINES);
        if let Some(last) = lines.last_mut() {
            let kept: String = last.chars().take(MAX_LINE_CHARS - 1).collect();
            *last = format!("{}{ELLIPSIS}", kept.trim_end());
        }
    }

    lines
}

fn split_long(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(MAX_LINE_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_removes_markup_characters() {
        assert_eq!(sanitize("<script>alert(1)</script>"), "scriptalert(1)/script");
        assert_eq!(sanitize("Tom & Jerry"), "Tom Jerry");
        assert_eq!(sanitize("  two\n\tlines  "), "two lines");
    }

    #[test]
    fn short_titles_stay_on_one_line() {
        assert_eq!(wrap("lesson1"), vec!["lesson1"]);
    }

    #[test]
    fn wrap_respects_line_width() {
        let lines = wrap("Introduction to linear equations with two unknowns");
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.chars().count() <= MAX_LINE_CHARS));
        assert_eq!(lines.join(" "), "Introduction to linear equations with two unknowns");
    }

    #[test]
    fn overlong_titles_are_truncated_with_ellipsis() {
        let title = "word ".repeat(40);
        let lines = wrap(&title);
        assert_eq!(lines.len(), MAX_LINES);
        assert!(lines[MAX_LINES - 1].ends_with('\u{2026}'));
        assert!(lines.iter().all(|line| line.chars().count() <= MAX_LINE_CHARS));
    }

    #[test]
    fn unbroken_words_are_split() {
        let word = "x".repeat(MAX_LINE_CHARS + 5);
        let lines = wrap(&word);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].chars().count(), MAX_LINE_CHARS);
        assert_eq!(lines[1].chars().count(), 5);
    }
}

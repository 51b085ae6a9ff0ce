/// Telegram's single-message character limit.
pub const MESSAGE_LIMIT: usize = 4096;

/// Splits `text` into parts of at most `limit` characters, breaking at
/// the last newline at-or-before the limit so no line is cut in half.
/// A single line longer than the limit is the one exception; it is
/// hard-chunked at character boundaries.
pub fn split_text(text: &str, limit: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if current.is_empty() {
            line_len
        } else {
            line_len + 1
        };

        if current_len + needed <= limit {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            current_len += needed;
            continue;
        }

        if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
        } else {
            let mut chunk_len = 0usize;
            for ch in line.chars() {
                current.push(ch);
                chunk_len += 1;
                if chunk_len == limit {
                    parts.push(std::mem::take(&mut current));
                    chunk_len = 0;
                }
            }
            current_len = chunk_len;
        }
    }

    if !(parts.is_empty() && current.is_empty()) {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_part() {
        assert_eq!(split_text("hello\nworld", 100), vec!["hello\nworld"]);
    }

    #[test]
    fn empty_text_yields_no_parts() {
        assert!(split_text("", 100).is_empty());
    }

    #[test]
    fn splits_at_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc";
        let parts = split_text(text, 9);
        assert_eq!(parts, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn rejoining_reproduces_original() {
        let text: String = (0..200)
            .map(|i| format!("lesson line number {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let parts = split_text(&text, 120);
        assert!(parts.len() > 1);
        assert!(parts.iter().all(|p| p.chars().count() <= 120));
        assert_eq!(parts.join("\n"), text);
    }

    #[test]
    fn trailing_newline_survives_rejoin() {
        let text = "aaaa\nbbbb\n";
        assert_eq!(split_text(text, 9).join("\n"), text);
    }

    #[test]
    fn oversized_line_is_hard_chunked() {
        let text = "x".repeat(25);
        let parts = split_text(&text, 10);
        assert_eq!(parts, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Cyrillic is two bytes per char; the limit is in characters.
        let text = format!("{}\n{}", "п".repeat(6), "и".repeat(6));
        let parts = split_text(&text, 6);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts.join("\n"), text);
    }
}

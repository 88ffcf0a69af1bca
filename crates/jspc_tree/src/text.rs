/// Piece of template text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSegment<'t> {
    Text(&'t str),
    /// Whole `${...}` including the delimiters
    El(&'t str),
}

/// Separates raw template text into literal runs and `${...}` expressions.
/// An unterminated or escaped (`\${`) start is kept as text.
pub fn split_el(raw: &str) -> Vec<TextSegment<'_>> {
    let mut out = Vec::new();
    let mut text_start_idx = 0;

    // Find expression start
    for (match_idx, _) in raw.match_indices("${") {
        // Inside the previous expression
        if match_idx < text_start_idx {
            continue;
        }

        if match_idx > 0 && raw.as_bytes()[match_idx - 1] == b'\\' {
            continue;
        }

        let Some(el_end_idx) = find_el_end(&raw[match_idx + 2..]) else {
            continue;
        };
        let el_end_idx = match_idx + 2 + el_end_idx + 1;

        // Add any previous text
        if text_start_idx < match_idx {
            out.push(TextSegment::Text(&raw[text_start_idx..match_idx]));
        }

        out.push(TextSegment::El(&raw[match_idx..el_end_idx]));
        text_start_idx = el_end_idx;
    }

    // Add the remaining text if any
    if text_start_idx < raw.len() {
        out.push(TextSegment::Text(&raw[text_start_idx..]));
    }

    out
}

/// Index of the `}` closing an expression body, skipping string literals and nested braces
fn find_el_end(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' => quote = Some(ch),
            '{' => depth += 1,
            '}' if depth == 0 => return Some(idx),
            '}' => depth -= 1,
            _ => {}
        }
    }

    None
}

pub fn is_whitespace(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use TextSegment::*;

    #[test]
    fn it_splits_expressions() {
        assert_eq!(
            split_el("Hello ${user.name}!"),
            vec![Text("Hello "), El("${user.name}"), Text("!")]
        );
        assert_eq!(split_el("${a}${b}"), vec![El("${a}"), El("${b}")]);
        assert_eq!(split_el("plain"), vec![Text("plain")]);
        assert!(split_el("").is_empty());
    }

    #[test]
    fn it_skips_braces_in_strings() {
        assert_eq!(
            split_el("${x == '}' ? \"{\" : y} tail"),
            vec![El("${x == '}' ? \"{\" : y}"), Text(" tail")]
        );
        assert_eq!(split_el("${ {1, 2} }"), vec![El("${ {1, 2} }")]);
    }

    #[test]
    fn it_keeps_escaped_and_unterminated_as_text() {
        assert_eq!(split_el("cost: \\${x}"), vec![Text("cost: \\${x}")]);
        assert_eq!(split_el("open ${x"), vec![Text("open ${x")]);
    }
}

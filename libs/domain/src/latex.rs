//! Escaping for text that is interpolated into LaTeX source.

/// Escapes every LaTeX special character in `text`.
///
/// `\%` and `\&` are kept verbatim: the review step stores those characters
/// pre-escaped, and escaping the backslash again would print it.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next @ ('%' | '&')) => {
                    chars.next();
                    out.push('\\');
                    out.push(next);
                }
                _ => out.push_str("\\textbackslash{}"),
            },
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '^' => out.push_str("\\textasciicircum{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Makes a URL safe inside `\href{...}`, where only `%` and `#` need escaping.
pub fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        if matches!(c, '%' | '#') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_specials() {
        assert_eq!(escape_latex("a_b & c"), "a\\_b \\& c");
        assert_eq!(escape_latex("$5 #1 {x}"), "\\$5 \\#1 \\{x\\}");
        assert_eq!(escape_latex("x^2~y"), "x\\textasciicircum{}2\\textasciitilde{}y");
        assert_eq!(escape_latex("C:\\dir"), "C:\\textbackslash{}dir");
    }

    #[test]
    fn test_pre_escaped_not_doubled() {
        assert_eq!(escape_latex("R\\&D at 10\\%"), "R\\&D at 10\\%");
    }

    #[test]
    fn test_escape_url() {
        assert_eq!(
            escape_url("https://x.dev/a%20b#top"),
            "https://x.dev/a\\%20b\\#top"
        );
    }
}

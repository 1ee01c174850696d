#![forbid(unsafe_code)]

//! Character escaping shared by the writer and canonicalization.
//!
//! - Text nodes: `&`, `<`, `>` and carriage return
//! - Attribute values: `&`, `<`, `"`, tab, newline and carriage return

/// Escape text node content.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_keeps_quotes_and_whitespace() {
        assert_eq!(escape_text("https://auth/sts?a=1&b=\"2\""), "https://auth/sts?a=1&amp;b=\"2\"");
        assert_eq!(escape_text("x > y\r\n"), "x &gt; y&#xD;\n");
    }

    #[test]
    fn attribute_escapes_whitespace_but_not_gt() {
        assert_eq!(escape_attr("#_0"), "#_0");
        assert_eq!(escape_attr("a>b&c"), "a>b&amp;c");
        assert_eq!(escape_attr("\"\t\n\r"), "&quot;&#x9;&#xA;&#xD;");
    }
}

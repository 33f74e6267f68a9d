//! Decodes the XML-entity contamination the (out-of-scope) XML parser
//! introduces inside `{{ ... }}` expressions (spec §4.2, design note in §9):
//! `&lt;`, `&gt;`, `&amp;` have to come back to `<`, `>`, `&` before the
//! text reaches the script engine, or comparisons like `a < b` never work.

pub fn decode_xml_entities(expr: &str) -> String {
    expr.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

/// Strips a single leading `await ` keyword, as the embedded engine has no
/// real async/await — `evalAndUnwrap` (spec §4.2) treats it as a no-op hint
/// and unwraps the result structurally instead.
pub fn strip_leading_await(expr: &str) -> &str {
    expr.trim_start().strip_prefix("await ").map(str::trim_start).unwrap_or(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_three_entities() {
        assert_eq!(decode_xml_entities("a &lt; b &gt; c &amp; d"), "a < b > c & d");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(decode_xml_entities("no entities here"), "no entities here");
    }

    #[test]
    fn strips_leading_await_keyword() {
        assert_eq!(strip_leading_await("await fetchData()"), "fetchData()");
    }

    #[test]
    fn leaves_expression_without_await_untouched() {
        assert_eq!(strip_leading_await("count + 1"), "count + 1");
    }

    #[test]
    fn does_not_strip_await_mid_expression() {
        assert_eq!(strip_leading_await("x.await_count"), "x.await_count");
    }
}

//! `{{ expr }}` template scanning (spec §4.1).
//!
//! Honours brace nesting (`{{ {a:b} }}`), quoted strings (`'`, `"`, `` ` ``)
//! including escape sequences, and template-literal interpolations
//! (`` `${...}` ``) inside backtick strings. Operates on `char` indices
//! throughout so multi-byte UTF-8 content never shifts an offset.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionSpan {
    /// Char index of the first `{` of `{{`.
    pub start: usize,
    /// Char index one past the second `}` of the closing `}}`.
    pub end: usize,
    /// Trimmed expression text between the braces.
    pub expression: String,
}

pub struct TemplateParser;

impl TemplateParser {
    /// Extract every `{{...}}` run in `input`.
    pub fn parse(input: &str) -> Vec<ExpressionSpan> {
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut spans = Vec::new();
        let mut i = 0;
        while i < len {
            if chars[i] == '{' && i + 1 < len && chars[i + 1] == '{' {
                if let Some(close_start) = find_expr_end(&chars, i + 2) {
                    let expression: String = chars[i + 2..close_start].iter().collect();
                    spans.push(ExpressionSpan {
                        start: i,
                        end: close_start + 2,
                        expression: expression.trim().to_string(),
                    });
                    i = close_start + 2;
                    continue;
                }
                // Unclosed `{{`: no-op, move past it as literal text.
                i += 2;
                continue;
            }
            i += 1;
        }
        spans
    }

    /// Substitute every expression span with `eval(expression)`, working
    /// from the last match to the first so earlier offsets stay valid.
    pub fn render(template: &str, mut eval: impl FnMut(&str) -> String) -> String {
        let spans = Self::parse(template);
        let mut chars: Vec<char> = template.chars().collect();
        for span in spans.iter().rev() {
            let replacement: Vec<char> = eval(&span.expression).chars().collect();
            chars.splice(span.start..span.end, replacement);
        }
        chars.into_iter().collect()
    }

    /// Async twin: evaluates every span sequentially (first to last), then
    /// substitutes all of them (last to first), exactly like `render`.
    pub async fn render_async<F, Fut>(template: &str, mut eval: F) -> String
    where
        F: FnMut(&str) -> Fut,
        Fut: std::future::Future<Output = String>,
    {
        let spans = Self::parse(template);
        let mut evaluated = Vec::with_capacity(spans.len());
        for span in &spans {
            evaluated.push(eval(&span.expression).await);
        }
        let mut chars: Vec<char> = template.chars().collect();
        for (span, value) in spans.iter().zip(evaluated.iter()).rev() {
            let replacement: Vec<char> = value.chars().collect();
            chars.splice(span.start..span.end, replacement);
        }
        chars.into_iter().collect()
    }
}

/// Find the char index of the first `}` of the `}}` that closes an
/// expression starting at `start` (the position right after `{{`).
/// Returns `None` if the expression is never closed.
fn find_expr_end(chars: &[char], start: usize) -> Option<usize> {
    let len = chars.len();
    let mut i = start;
    let mut depth: i32 = 0;
    while i < len {
        match chars[i] {
            '\'' | '"' | '`' => {
                i = skip_string(chars, i)?;
            }
            '{' => {
                depth += 1;
                i += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    i += 1;
                } else if i + 1 < len && chars[i + 1] == '}' {
                    return Some(i);
                } else {
                    // Stray single close brace at depth 0: treat as literal.
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Skip a quoted string literal starting at `chars[start]` (the opening
/// quote), returning the index one past the closing quote. Backtick strings
/// recurse into `${...}` interpolations, which may themselves contain
/// nested strings and braces.
fn skip_string(chars: &[char], start: usize) -> Option<usize> {
    let quote = chars[start];
    let len = chars.len();
    let mut i = start + 1;
    while i < len {
        let c = chars[i];
        if c == '\\' {
            i = (i + 2).min(len);
            continue;
        }
        if quote == '`' && c == '$' && i + 1 < len && chars[i + 1] == '{' {
            i += 2;
            let mut depth: i32 = 1;
            while i < len && depth > 0 {
                match chars[i] {
                    '\'' | '"' | '`' => {
                        i = skip_string(chars, i)?;
                    }
                    '{' => {
                        depth += 1;
                        i += 1;
                    }
                    '}' => {
                        depth -= 1;
                        i += 1;
                    }
                    _ => i += 1,
                }
            }
            if depth != 0 {
                return None;
            }
            continue;
        }
        if c == quote {
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

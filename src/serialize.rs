//! Rule-list serialization (spec §6 "Rule list serialization").
//!
//! Two output formats, both grounded line-for-line on
//! `examples/original_source/write_regex_json.py`:
//!
//!  - JSON: a flat array of `[pattern, replacement]` pairs, prefixed with a
//!    bootstrap rule (`^$` → a sentinel `<`) and suffixed with a rule that
//!    expands the sentinel into the opening board banner plus the move
//!    prompt.
//!  - JavaScript source declaring `initialState` and a `regexOperation` list
//!    of `[name, /pattern/flags, replacement]` triples, with backreferences
//!    rewritten from the instruction library's Python-`re.sub` style
//!    (`\N`, `\g<N>`) to JS's `$N`, and non-ASCII characters `\uXXXX`-escaped.

use crate::rule::RuleList;
use serde_json::Value;

/// The opening board banner plus move prompt, shared by both output formats
/// (spec §6; identical text in `write_regex_json.py`'s `write_js_output` and
/// the `^<$` suffix rule of `write_json_output`).
pub const INITIAL_BANNER: &str = "  ╔═════════════════╗\n\
8 ║ ♜ ♞ ♝ ♛ ♚ ♝ ♞ ♜ ║\n\
7 ║ ♟ ♟ ♟ ♟ ♟ ♟ ♟ ♟ ║\n\
6 ║                 ║\n\
5 ║                 ║\n\
4 ║                 ║\n\
3 ║                 ║\n\
2 ║ ♙ ♙ ♙ ♙ ♙ ♙ ♙ ♙ ║\n\
1 ║ ♖ ♘ ♗ ♕ ♔ ♗ ♘ ♖ ║\n\
  ╚═════════════════╝\n\
    a b c d e f g h\n\
\n\
Move notation: [src][dest] (e.g. e2e4) or 'q' to quit\n\
[Castling Rights: KQkq, En Passant: -]\n\
Enter Your Move: ";

const BOOTSTRAP_PATTERN: &str = "^$";
const BOOTSTRAP_REPLACEMENT: &str = "<";
const SENTINEL_PATTERN: &str = "^<$";

/// Serialize a rule list to the JSON array format (spec §6, format 1).
pub fn to_json(rules: &RuleList) -> Value {
    let mut operations: Vec<(String, String)> = Vec::with_capacity(rules.len() + 2);
    operations.push((BOOTSTRAP_PATTERN.to_string(), BOOTSTRAP_REPLACEMENT.to_string()));
    for r in rules.iter() {
        operations.push((r.pattern.clone(), r.replacement.clone()));
    }
    operations.push((SENTINEL_PATTERN.to_string(), INITIAL_BANNER.to_string()));

    Value::Array(operations.into_iter().map(|(p, r)| Value::Array(vec![Value::String(p), Value::String(r)])).collect())
}

/// Serialize a rule list to the JSON array format as a pretty-printed string
/// (mirrors `json.dump(operations, f, indent=2, ensure_ascii=False)`).
pub fn to_json_string(rules: &RuleList) -> String {
    serde_json::to_string_pretty(&to_json(rules)).expect("JSON values built from strings always serialize")
}

/// Serialize a rule list to the JavaScript source format (spec §6, format
/// 2), mirroring `write_regex_json.py`'s `write_js_output`.
pub fn to_js(rules: &RuleList) -> String {
    let mut out = String::new();
    out.push_str(&format!("let initialState = {};\n", js_string_literal(INITIAL_BANNER)));
    out.push_str("let regexOperation = [\n");

    for r in rules.iter() {
        let replacement = rewrite_backreferences(&r.replacement);
        let pattern = escape_pattern_for_js(&r.pattern);
        let flags = if r.pattern.starts_with('^') { "g" } else { "gm" };
        let op_name = if r.op.is_empty() { "op" } else { r.op.as_str() };
        let line = format!(
            "['{}', /{}/{flags}, {}],",
            op_name.replace('\'', "\""),
            pattern,
            js_string_literal(&replacement)
        );
        out.push_str(&escape_non_ascii(&line));
        out.push('\n');
    }

    out.push_str("]\n");
    out
}

/// Rewrite Python `re.sub`-template backreferences to JS `$N` replacement
/// syntax: `\g<N>` first (unambiguous, any width), then bare `\N`.
fn rewrite_backreferences(repl: &str) -> String {
    let bytes = repl.as_bytes();
    let mut out = String::with_capacity(repl.len());
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 2 < bytes.len() && bytes[i + 1] == b'g' && bytes[i + 2] == b'<' {
            if let Some(close) = repl[i + 3..].find('>') {
                let num = &repl[i + 3..i + 3 + close];
                if num.chars().all(|c| c.is_ascii_digit()) {
                    out.push('$');
                    out.push_str(num);
                    i = i + 3 + close + 1;
                    continue;
                }
            }
        }
        if bytes[i] == b'\\' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            out.push('$');
            out.push_str(&repl[i + 1..j]);
            i = j;
            continue;
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

/// Escape a pattern string for embedding in a JS `/pattern/flags` literal:
/// newlines become the two-character sequence `\n`, and `/` is escaped so it
/// does not terminate the literal early.
fn escape_pattern_for_js(pattern: &str) -> String {
    pattern.replace('\n', "\\n").replace('/', "\\/")
}

/// Render a Rust string as a double-quoted JS string literal, the way
/// `json.dumps` does for `write_js_output`'s `initialState` and per-rule
/// replacement text (JSON string literal syntax is valid JS string literal
/// syntax).
fn js_string_literal(s: &str) -> String {
    serde_json::to_string(s).expect("string serialization cannot fail")
}

/// Replace every non-ASCII character with its `\uXXXX` escape (mirrors
/// `write_regex_json.py`'s `escape_non_ascii`).
fn escape_non_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&format!("\\u{:04x}", c as u32));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    #[test]
    fn json_output_brackets_bootstrap_and_sentinel() {
        let rules = RuleList(vec![Rule::new("a", "b").unwrap()]);
        let json = to_json(&rules);
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[0], Value::Array(vec![Value::String("^$".into()), Value::String("<".into())]));
        assert_eq!(arr[2][0], Value::String("^<$".into()));
        assert_eq!(arr[2][1], Value::String(INITIAL_BANNER.to_string()));
    }

    #[test]
    fn js_output_rewrites_bare_backreference() {
        let rules = RuleList(vec![Rule::new_named("swap", r"(a)(b)", r"\2\1").unwrap()]);
        let js = to_js(&rules);
        assert!(js.contains("$2$1"), "js output was: {js}");
        assert!(js.contains("'swap'"));
    }

    #[test]
    fn js_output_rewrites_angle_bracket_backreference() {
        let rules = RuleList(vec![Rule::new("(a)", r"\g<1>\g<1>").unwrap()]);
        let js = to_js(&rules);
        assert!(js.contains("$1$1"), "js output was: {js}");
    }

    #[test]
    fn js_output_escapes_forward_slash_and_newline_in_pattern() {
        let rules = RuleList(vec![Rule::new("a/b\nc", "x").unwrap()]);
        let js = to_js(&rules);
        assert!(js.contains(r"a\/b\nc"), "js output was: {js}");
    }

    #[test]
    fn js_output_escapes_non_ascii() {
        let rules = RuleList(vec![Rule::new("x", "♔").unwrap()]);
        let js = to_js(&rules);
        assert!(js.contains(r"\u2654"), "js output was: {js}");
    }

    #[test]
    fn global_flag_used_for_anchored_pattern_multiline_otherwise() {
        let rules = RuleList(vec![Rule::new("^$", "<").unwrap(), Rule::new("x", "y").unwrap()]);
        let js = to_js(&rules);
        assert!(js.contains("/^$/g,"));
        assert!(js.contains("/x/gm,"));
    }
}

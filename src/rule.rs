//! Rewrite rules and the machine that runs them (spec §3 "Rewrite rule",
//! §4.A, §6 "Consumer contract").
//!
//! A `Rule` is a `(pattern, replacement)` pair applied as a *global*
//! substitution to the entire text state, left to right, exactly once per
//! rule (spec §3). The instruction library's patterns rely on
//! pattern-side backreferences (e.g. `eq`'s `([^\n]*)\n\2\n`), which the
//! backtracking-free `regex` crate cannot express, so this module executes
//! rules with `fancy_regex`, a real backtracking engine (see DESIGN.md).
//!
//! Numbered backreferences in the replacement template mirror Python
//! `re.sub`'s replacement-template escaping, which the instruction library
//! was written against: a bare `\N` greedily consumes two digits when a
//! group with that two-digit number exists (so `\12` means group 12, not
//! group 1 followed by a literal `2`), falling back to one digit otherwise;
//! `\g<n>` is an explicit, unambiguous group reference of any width; and
//! `\n`/`\t`/`\\` fall back to their literal-character meaning when the
//! digits don't resolve to a real group.

use fancy_regex::Regex;
use std::fmt;

/// One compiled `(pattern, replacement)` rewrite rule.
///
/// `op` names the opcode that produced this rule (e.g. `eq`, `push_int`); it
/// has no effect on matching and exists only so the JS serialization format
/// (spec §6, mirroring `write_regex_json.py`'s `[op, /pattern/gm, repl]`
/// triples) can tag each rule with its originating instruction.
#[derive(Clone)]
pub struct Rule {
    pub pattern: String,
    pub replacement: String,
    pub op: String,
    regex: Regex,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("op", &self.op)
            .field("pattern", &self.pattern)
            .field("replacement", &self.replacement)
            .finish()
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.replacement == other.replacement
    }
}
impl Eq for Rule {}

#[derive(Debug, thiserror::Error)]
#[error("invalid rewrite rule pattern `{pattern}`: {source}")]
pub struct RuleCompileError {
    pattern: String,
    #[source]
    source: fancy_regex::Error,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Result<Self, RuleCompileError> {
        Rule::new_named("", pattern, replacement)
    }

    pub fn new_named(
        op: impl Into<String>,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, RuleCompileError> {
        let pattern = pattern.into();
        let regex = Regex::new(&pattern).map_err(|source| RuleCompileError { pattern: pattern.clone(), source })?;
        Ok(Rule { pattern, replacement: replacement.into(), op: op.into(), regex })
    }

    /// Apply this rule once, as a global substitution, to `text`.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last_end = 0usize;
        let mut search_from = 0usize;

        while search_from <= text.len() {
            let Ok(Some(m)) = self.regex.captures_from_pos(text, search_from).map(|o| o) else { break };
            let Some(caps) = m else { break };
            let whole = caps.get(0).expect("capture group 0 always present on a match");
            out.push_str(&text[last_end..whole.start()]);
            expand_replacement(&caps, &self.replacement, &mut out);
            last_end = whole.end();

            search_from = if whole.end() > whole.start() {
                whole.end()
            } else {
                // Zero-width match: advance one char to avoid looping forever,
                // copying the skipped character through unchanged.
                match text[whole.end()..].chars().next() {
                    Some(c) => {
                        out.push_str(&text[last_end..last_end + c.len_utf8()]);
                        last_end += c.len_utf8();
                        whole.end() + c.len_utf8()
                    }
                    None => break,
                }
            };
        }
        out.push_str(&text[last_end..]);
        out
    }
}

/// An ordered list of rules, applied left-to-right, once each, to a single
/// text buffer (spec §4.F "Assembler": "The full program rule list is the
/// in-order concatenation").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleList(pub Vec<Rule>);

impl RuleList {
    pub fn new() -> Self {
        RuleList(Vec::new())
    }

    pub fn extend_from(&mut self, other: impl IntoIterator<Item = Rule>) {
        self.0.extend(other);
    }

    /// Apply every rule once, in order, to `state` (spec §5 "Ordering
    /// guarantees": "across rules in one opcode, strictly sequential").
    pub fn apply_all(&self, mut state: String) -> String {
        for rule in &self.0 {
            state = rule.apply(&state);
        }
        state
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }
}

/// Expand a Python-`re.sub`-style replacement template against one match's
/// captures, appending the result to `out`.
fn expand_replacement(caps: &fancy_regex::Captures, template: &str, out: &mut String) {
    let bytes = template.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] != b'\\' || i + 1 >= bytes.len() {
            out.push(bytes[i] as char);
            i += 1;
            continue;
        }

        let next = bytes[i + 1];
        if next == b'g' && i + 2 < bytes.len() && bytes[i + 2] == b'<' {
            if let Some(close) = template[i + 3..].find('>') {
                let num_str = &template[i + 3..i + 3 + close];
                if let Ok(n) = num_str.parse::<usize>() {
                    push_group(caps, n, out);
                    i = i + 3 + close + 1;
                    continue;
                }
            }
            out.push('\\');
            i += 1;
            continue;
        }

        if next.is_ascii_digit() && next != b'0' {
            let one_digit = (next - b'0') as usize;
            if i + 2 < bytes.len() && bytes[i + 2].is_ascii_digit() {
                let two_digit = one_digit * 10 + (bytes[i + 2] - b'0') as usize;
                if caps.get(two_digit).is_some() {
                    push_group(caps, two_digit, out);
                    i += 3;
                    continue;
                }
            }
            push_group(caps, one_digit, out);
            i += 2;
            continue;
        }

        if next == b'n' {
            out.push('\n');
            i += 2;
            continue;
        }
        if next == b't' {
            out.push('\t');
            i += 2;
            continue;
        }
        if next == b'\\' {
            out.push('\\');
            i += 2;
            continue;
        }

        out.push(next as char);
        i += 2;
    }
}

fn push_group(caps: &fancy_regex::Captures, n: usize, out: &mut String) {
    if let Some(m) = caps.get(n) {
        out.push_str(m.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_replaces_all_non_overlapping_matches() {
        let rule = Rule::new("a", "b").unwrap();
        assert_eq!(rule.apply("aaa"), "bbb");
    }

    #[test]
    fn apply_supports_pattern_side_backreference() {
        // Mirrors `eq`'s identical-stack-values pattern.
        let rule = Rule::new(r"(%%\n#stack:\n)([^\n]*)\n\2\n", "\\1`True\n").unwrap();
        assert_eq!(rule.apply("%%\n#stack:\nx\nx\n"), "%%\n#stack:\n`True\n");
        assert_eq!(rule.apply("%%\n#stack:\nx\ny\n"), "%%\n#stack:\nx\ny\n");
    }

    #[test]
    fn replacement_distinguishes_group_ref_from_newline_escape() {
        let rule = Rule::new(r"(a)(b)", "\\1\\n\\2").unwrap();
        assert_eq!(rule.apply("ab"), "a\nb");
    }

    #[test]
    fn replacement_supports_g_angle_bracket_form() {
        let rule = Rule::new(r"(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)", "\\g<10>").unwrap();
        assert_eq!(rule.apply("abcdefghij"), "j");
    }

    #[test]
    fn replacement_greedily_parses_two_digit_bare_backreference() {
        let pattern = "(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)(l)";
        let rule = Rule::new(pattern, "\\12").unwrap();
        assert_eq!(rule.apply("abcdefghijkl"), "l");
    }

    #[test]
    fn replacement_falls_back_to_one_digit_when_two_digit_group_absent() {
        let rule = Rule::new("(a)(b)", "\\12").unwrap();
        assert_eq!(rule.apply("ab"), "a2");
    }
}

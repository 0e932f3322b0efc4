//! Canonical text-state encoding (spec §3 "Text state S", §4.A, §6 "Text
//! state grammar on the wire").
//!
//! ```text
//! state   := thread+
//! thread  := header "\n#stack:\n" line* var*
//! header  := "%%" | "%" tag
//! line    := [^%#\n]* "\n"
//! var     := "#" name ": " value "\n"
//! ```
//!
//! This module only parses and renders the format; it does not interpret
//! opcodes (that is the Assembler's and the runtime rule-applier's job).
//! Kept as a structured view purely so §8 property 1 ("state round-trip")
//! and the rest of the test suite can build and inspect states without
//! hand-writing the `%%\n#stack:\n...` text.

use std::fmt;
use thiserror::Error;

/// A thread's header: active (`%%`) or tagged-inactive (`%TAG`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadHeader {
    Active,
    Tagged(String),
}

impl ThreadHeader {
    pub fn is_active(&self) -> bool {
        matches!(self, ThreadHeader::Active)
    }
}

/// One thread: a header, a stack, and an ordered list of `#name: value`
/// variables (spec §3: "Variable names are unique within a thread").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Thread {
    pub header: Option<ThreadHeader>,
    pub stack: Vec<String>,
    pub vars: Vec<(String, String)>,
}

impl Thread {
    pub fn active(stack: Vec<String>, vars: Vec<(String, String)>) -> Self {
        Thread { header: Some(ThreadHeader::Active), stack, vars }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.header, Some(ThreadHeader::Active))
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    fn render(&self, out: &mut String) {
        match &self.header {
            Some(ThreadHeader::Active) => out.push_str("%%"),
            Some(ThreadHeader::Tagged(tag)) => {
                out.push('%');
                out.push_str(tag);
            }
            None => unreachable!("thread without a header cannot be rendered"),
        }
        out.push('\n');
        out.push_str("#stack:\n");
        for value in &self.stack {
            out.push_str(value);
            out.push('\n');
        }
        for (name, value) in &self.vars {
            out.push('#');
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }
}

/// The complete text state: a concatenation of threads (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextState {
    pub threads: Vec<Thread>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("thread body does not end with a newline")]
    UnterminatedThread,
    #[error("expected a header line (`%%` or `%TAG`), found `{0}`")]
    BadHeader(String),
    #[error("expected `#stack:`, found `{0}`")]
    MissingStackHeader(String),
    #[error("malformed variable line `{0}`")]
    BadVariableLine(String),
    #[error("stack value `{0}` appears after the variable section started")]
    StackAfterVariables(String),
}

impl TextState {
    pub fn new(threads: Vec<Thread>) -> Self {
        TextState { threads }
    }

    /// Parse the wire grammar. Threads are delimited by a `%` that
    /// immediately follows a newline (or begins the string); this is safe
    /// because the grammar forbids `%` inside any value or variable name.
    pub fn parse(s: &str) -> Result<TextState, StateError> {
        if s.is_empty() {
            return Ok(TextState::default());
        }
        let threads = split_threads(s)
            .into_iter()
            .map(parse_thread)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TextState { threads })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for thread in &self.threads {
            thread.render(&mut out);
        }
        out
    }

    pub fn active_threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.iter().filter(|t| t.is_active())
    }
}

impl fmt::Display for TextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

fn split_threads(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut start = 0usize;
    for i in 1..bytes.len() {
        if bytes[i] == b'%' && bytes[i - 1] == b'\n' {
            out.push(&s[start..i]);
            start = i;
        }
    }
    out.push(&s[start..]);
    out
}

fn parse_thread(chunk: &str) -> Result<Thread, StateError> {
    if !chunk.ends_with('\n') {
        return Err(StateError::UnterminatedThread);
    }
    let mut lines = chunk.split_terminator('\n');

    let header_line = lines.next().unwrap_or("");
    let header = if header_line == "%%" {
        ThreadHeader::Active
    } else if let Some(tag) = header_line.strip_prefix('%') {
        if tag.is_empty() {
            return Err(StateError::BadHeader(header_line.to_string()));
        }
        ThreadHeader::Tagged(tag.to_string())
    } else {
        return Err(StateError::BadHeader(header_line.to_string()));
    };

    let stack_header = lines.next().unwrap_or("");
    if stack_header != "#stack:" {
        return Err(StateError::MissingStackHeader(stack_header.to_string()));
    }

    let mut stack = Vec::new();
    let mut vars = Vec::new();
    for line in lines {
        if let Some(rest) = line.strip_prefix('#') {
            let (name, value) = rest
                .split_once(": ")
                .ok_or_else(|| StateError::BadVariableLine(line.to_string()))?;
            vars.push((name.to_string(), value.to_string()));
        } else if vars.is_empty() {
            stack.push(line.to_string());
        } else {
            return Err(StateError::StackAfterVariables(line.to_string()));
        }
    }

    Ok(Thread { header: Some(header), stack, vars })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_single_active_thread() {
        let s = "%%\n#stack:\nint0000000001\n#a1: R\n#turn: w\n";
        let parsed = TextState::parse(s).unwrap();
        assert_eq!(parsed.render(), s);
        assert_eq!(parsed.threads.len(), 1);
        assert!(parsed.threads[0].is_active());
        assert_eq!(parsed.threads[0].var("turn"), Some("w"));
    }

    #[test]
    fn round_trips_active_and_tagged_threads() {
        let s = "%%\n#stack:\nx\n%MAIN\n#stack:\ny\n#p: 1\n";
        let parsed = TextState::parse(s).unwrap();
        assert_eq!(parsed.render(), s);
        assert_eq!(parsed.threads.len(), 2);
        assert!(parsed.threads[0].is_active());
        assert_eq!(parsed.threads[1].header, Some(ThreadHeader::Tagged("MAIN".into())));
    }

    #[test]
    fn empty_state_round_trips() {
        assert_eq!(TextState::parse("").unwrap(), TextState::default());
        assert_eq!(TextState::default().render(), "");
    }

    #[test]
    fn rejects_stack_value_after_variables() {
        let s = "%%\n#stack:\n#a: 1\nstray\n";
        assert!(matches!(TextState::parse(s), Err(StateError::StackAfterVariables(_))));
    }
}

use crate::error::{Result, SmashError};

const WHITESPACE: &[char] = &[' ', '\n', '\r', '\t', '\x0c', '\x0b'];

pub fn trim(s: &str) -> &str {
    s.trim_matches(WHITESPACE)
}

pub fn words(s: &str) -> Vec<String> {
    s.split(WHITESPACE)
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

pub fn first_word(s: &str) -> &str {
    let s = trim(s);
    match s.find(WHITESPACE) {
        Some(end) => &s[..end],
        None => s,
    }
}

/// Everything after the first word, trimmed again.
pub fn rest(s: &str) -> &str {
    let s = trim(s);
    trim(&s[first_word(s).len()..])
}

/// 1-based word access. Empty when the line has fewer than `n` words.
pub fn nth_word(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let mut remaining = trim(s);
    for _ in 1..n {
        if remaining.is_empty() {
            break;
        }
        remaining = rest(remaining);
    }
    first_word(remaining)
}

pub fn is_background(line: &str) -> bool {
    line.trim_end_matches(WHITESPACE).ends_with('&')
}

/// Drops a trailing `&` and the whitespace before it. Lines without the
/// marker come back unchanged.
pub fn strip_background_marker(line: &str) -> String {
    let end = line.trim_end_matches(WHITESPACE);
    match end.strip_suffix('&') {
        Some(without) => without.trim_end_matches(WHITESPACE).to_string(),
        None => line.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Overwrite,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeTarget {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    /// Line to run with stdout redirected, background marker re-appended.
    pub command: String,
    pub path: String,
    pub mode: RedirectMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeSplit {
    pub left: String,
    pub right: String,
    pub target: PipeTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wiring {
    None,
    Redirect(Redirection),
    Pipe(PipeSplit),
}

/// Finds the first `>`/`>>`/`|`/`|&` in the raw line. Whichever operator
/// comes first owns the line; anything after it belongs to its operand.
pub fn detect_wiring(line: &str) -> Result<Wiring> {
    let Some(pos) = line.find(&['>', '|'][..]) else {
        return Ok(Wiring::None);
    };
    let (left, operator) = line.split_at(pos);

    if operator.starts_with('>') {
        let (mode, after) = match operator.strip_prefix(">>") {
            Some(after) => (RedirectMode::Append, after),
            None => (RedirectMode::Overwrite, &operator[1..]),
        };
        let path = first_word(&strip_background_marker(after)).to_string();
        if path.is_empty() {
            return Err(SmashError::MissingRedirectTarget);
        }
        let mut command = trim(left).to_string();
        if is_background(line) && !command.is_empty() {
            command.push_str(" &");
        }
        return Ok(Wiring::Redirect(Redirection { command, path, mode }));
    }

    let (target, after) = match operator.strip_prefix("|&") {
        Some(after) => (PipeTarget::Stderr, after),
        None => (PipeTarget::Stdout, &operator[1..]),
    };
    let left = trim(left);
    let right = trim(after);
    if left.is_empty() || right.is_empty() {
        return Err(SmashError::InvalidArguments("pipe"));
    }
    Ok(Wiring::Pipe(PipeSplit {
        left: left.to_string(),
        right: right.to_string(),
        target,
    }))
}

/// One submitted line, split into words with its trailing `&` and any
/// redirection or pipe operator already identified.
#[derive(Debug, Clone)]
pub struct ParsedLine {
    text: String,
    words: Vec<String>,
    background: bool,
    wiring: Wiring,
}

impl ParsedLine {
    pub fn parse(line: &str) -> Result<Self> {
        let wiring = detect_wiring(line)?;
        let background = is_background(line);
        let text = trim(&strip_background_marker(line)).to_string();
        let words = words(&text);

        Ok(Self {
            text,
            words,
            background,
            wiring,
        })
    }

    /// The line with surrounding whitespace and the background marker removed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn first_word(&self) -> &str {
        self.words.first().map(String::as_str).unwrap_or("")
    }

    pub fn args(&self) -> &[String] {
        self.words.get(1..).unwrap_or(&[])
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

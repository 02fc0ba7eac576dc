//! Key map – routes physical keys to logical engine actions.
//!
//! Which keys do what is a front-end concern, so the map is plain data that
//! callers can extend with [`KeyMap::bind`]. Key strings are written compactly:
//! single characters stand for themselves and named keys go in braces,
//! e.g. `"12+3{Backspace}4="`.

use crate::types::Operator;
use std::collections::HashMap;
use std::str::FromStr;

/// One logical edit or evaluation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Digit(char),
    DecimalPoint,
    Operator(Operator),
    Delete,
    ClearAll,
    ClearEntry,
    Finalize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyMapError {
    #[error("unterminated key name starting at offset {0}")]
    UnterminatedKeyName(usize),
    #[error("empty key name at offset {0}")]
    EmptyKeyName(usize),
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl FromStr for Action {
    type Err = KeyMapError;

    /// Parse an action name as used in configuration files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if let Some(op) = Operator::from_symbol(name) {
            return Ok(Action::Operator(op));
        }
        let action = match name {
            "decimal" | "." => Action::DecimalPoint,
            "delete" | "backspace" => Action::Delete,
            "clear" | "clear_all" => Action::ClearAll,
            "clear_entry" => Action::ClearEntry,
            "equals" | "finalize" | "=" => Action::Finalize,
            "add" => Action::Operator(Operator::Add),
            "subtract" => Action::Operator(Operator::Subtract),
            "multiply" => Action::Operator(Operator::Multiply),
            "divide" => Action::Operator(Operator::Divide),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(d), None) if d.is_ascii_digit() => Action::Digit(d),
                    _ => return Err(KeyMapError::UnknownAction(other.to_string())),
                }
            }
        };
        Ok(action)
    }
}

#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: HashMap<String, Action>,
}

impl KeyMap {
    /// A map with no bindings at all.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, key: impl Into<String>, action: Action) {
        self.bindings.insert(key.into(), action);
    }

    pub fn resolve(&self, key: &str) -> Option<Action> {
        self.bindings.get(key).copied()
    }

    /// Split a compact key string into individual key names.
    ///
    /// Whitespace between keys is ignored.
    pub fn tokenize(keys: &str) -> Result<Vec<String>, KeyMapError> {
        let mut out = Vec::new();
        let mut chars = keys.char_indices();
        while let Some((i, c)) = chars.next() {
            if c.is_whitespace() {
                continue;
            }
            if c != '{' {
                out.push(c.to_string());
                continue;
            }
            let mut name = String::new();
            let mut closed = false;
            for (_, n) in chars.by_ref() {
                if n == '}' {
                    closed = true;
                    break;
                }
                name.push(n);
            }
            if !closed {
                return Err(KeyMapError::UnterminatedKeyName(i));
            }
            if name.is_empty() {
                return Err(KeyMapError::EmptyKeyName(i));
            }
            out.push(name);
        }
        Ok(out)
    }

    /// Resolve a whole key string. Keys with no binding are returned
    /// separately so the caller can report them.
    pub fn translate(&self, keys: &str) -> Result<(Vec<Action>, Vec<String>), KeyMapError> {
        let mut actions = Vec::new();
        let mut unknown = Vec::new();
        for key in Self::tokenize(keys)? {
            match self.resolve(&key) {
                Some(a) => actions.push(a),
                None => unknown.push(key),
            }
        }
        Ok((actions, unknown))
    }
}

impl Default for KeyMap {
    /// Bindings of the classic desktop calculator keyboard handler.
    fn default() -> Self {
        let mut map = Self::empty();
        for d in '0'..='9' {
            map.bind(d.to_string(), Action::Digit(d));
        }
        for sym in ["+", "-", "−", "*", "×", "/", "÷"] {
            if let Some(op) = Operator::from_symbol(sym) {
                map.bind(sym, Action::Operator(op));
            }
        }
        map.bind(".", Action::DecimalPoint);
        map.bind(",", Action::DecimalPoint);
        map.bind("=", Action::Finalize);
        map.bind("Enter", Action::Finalize);
        map.bind("Escape", Action::ClearAll);
        map.bind("c", Action::ClearAll);
        map.bind("C", Action::ClearAll);
        map.bind("Backspace", Action::Delete);
        map.bind("Delete", Action::ClearEntry);
        map
    }
}

//! Command registry and the built-in calculator commands.
//!
//! Commands are registered by name and invoked with JSON input/output
//! against a caller-owned [`Session`].

use crate::context::Session;
use crate::keymap::KeyMapError;
use crate::types::*;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

/// Signature for all session commands.
pub type CommandHandler = fn(Value, &mut Session) -> Result<Value, CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("key string: {0}")]
    Keys(#[from] KeyMapError),
    #[error("{0}")]
    Other(String),
}

impl CommandError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CommandError::InvalidInput(_) | CommandError::Keys(_) => ErrorCode::InvalidInput,
            CommandError::Other(_) => ErrorCode::InternalError,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            handlers: HashMap::new(),
        };
        reg.register("digit", cmd_digit);
        reg.register("decimal", cmd_decimal);
        reg.register("operator", cmd_operator);
        reg.register("delete", cmd_delete);
        reg.register("clear", cmd_clear);
        reg.register("clear_entry", cmd_clear_entry);
        reg.register("equals", cmd_equals);
        reg.register("keys", cmd_keys);
        reg.register("display", cmd_display);
        reg.register("state", cmd_state);
        reg
    }

    pub fn register(&mut self, name: &str, handler: CommandHandler) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Execute a command by name and return a full CommandResult.
    pub fn execute(&self, name: &str, args: Value, session: &mut Session) -> CommandResult {
        let run_id = new_run_id();
        let start = Instant::now();

        let handler = match self.handlers.get(name) {
            Some(h) => h,
            None => {
                return result_err(
                    "call",
                    name,
                    &run_id,
                    start.elapsed().as_millis() as u64,
                    ErrorCode::InvalidInput,
                    format!("unknown command: {}", name),
                );
            }
        };

        match handler(args, session) {
            Ok(data) => {
                let mut r = result_ok("call", name, &run_id, start.elapsed().as_millis() as u64);
                r.data = Some(data);
                r
            }
            Err(e) => {
                tracing::debug!(command = name, error = %e, "command failed");
                result_err(
                    "call",
                    name,
                    &run_id,
                    start.elapsed().as_millis() as u64,
                    e.error_code(),
                    e.to_string(),
                )
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Built-in commands
// ===========================================================================

/// Payload every successful command returns.
fn snapshot(session: &Session) -> Result<Value, CommandError> {
    let state = serde_json::to_value(session.state())
        .map_err(|e| CommandError::Other(format!("cannot encode state: {}", e)))?;
    Ok(serde_json::json!({
        "display": session.display(),
        "state": state,
    }))
}

fn str_arg<'a>(args: &'a Value, field: &str) -> Result<&'a str, CommandError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| CommandError::InvalidInput(format!("missing '{}' string field", field)))
}

/// `digit` – append one digit.
///
/// Args: `{ "digit": "7" }`
fn cmd_digit(args: Value, session: &mut Session) -> Result<Value, CommandError> {
    let raw = str_arg(&args, "digit")?;
    let mut chars = raw.chars();
    let digit = match (chars.next(), chars.next()) {
        (Some(d), None) if d.is_ascii_digit() => d,
        _ => {
            return Err(CommandError::InvalidInput(format!(
                "'digit' must be a single character 0-9, got {:?}",
                raw
            )))
        }
    };
    session.engine_mut().append_digit(digit);
    snapshot(session)
}

fn cmd_decimal(_args: Value, session: &mut Session) -> Result<Value, CommandError> {
    session.engine_mut().append_decimal_point();
    snapshot(session)
}

/// `operator` – apply a binary operator.
///
/// Args: `{ "op": "+" }` (also `-`, `*`, `/`, `×`, `÷`, `−`)
/// Any other symbol is accepted and passes its right operand through;
/// `"recognised"` in the result tells the two cases apart.
fn cmd_operator(args: Value, session: &mut Session) -> Result<Value, CommandError> {
    let symbol = str_arg(&args, "op")?;
    let recognised = session.engine_mut().apply_symbol(symbol);
    let mut data = snapshot(session)?;
    data["recognised"] = Value::from(recognised);
    Ok(data)
}

fn cmd_delete(_args: Value, session: &mut Session) -> Result<Value, CommandError> {
    session.engine_mut().delete_last();
    snapshot(session)
}

fn cmd_clear(_args: Value, session: &mut Session) -> Result<Value, CommandError> {
    session.engine_mut().clear_all();
    snapshot(session)
}

fn cmd_clear_entry(_args: Value, session: &mut Session) -> Result<Value, CommandError> {
    session.engine_mut().clear_entry();
    snapshot(session)
}

fn cmd_equals(_args: Value, session: &mut Session) -> Result<Value, CommandError> {
    session.engine_mut().finalize_calculation();
    snapshot(session)
}

/// `keys` – feed a key string through the session's key map.
///
/// Args: `{ "keys": "2+3=" }`
/// Returns the usual snapshot plus `"ignored": [...]` for unbound keys.
fn cmd_keys(args: Value, session: &mut Session) -> Result<Value, CommandError> {
    let keys = str_arg(&args, "keys")?;
    let outcome = session.press_keys(keys)?;
    let mut data = snapshot(session)?;
    data["applied"] = Value::from(outcome.applied);
    data["ignored"] = Value::from(outcome.ignored);
    Ok(data)
}

fn cmd_display(_args: Value, session: &mut Session) -> Result<Value, CommandError> {
    Ok(serde_json::json!({ "display": session.display() }))
}

fn cmd_state(_args: Value, session: &mut Session) -> Result<Value, CommandError> {
    snapshot(session)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(reg: &CommandRegistry, session: &mut Session, name: &str, args: Value) -> CommandResult {
        reg.execute(name, args, session)
    }

    #[test]
    fn test_unknown_command() {
        let mut session = Session::default();
        let reg = CommandRegistry::new();
        let result = run(&reg, &mut session, "sqrt", json!({}));
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.error.unwrap().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_chain_through_commands() {
        let mut session = Session::default();
        let reg = CommandRegistry::new();
        run(&reg, &mut session, "digit", json!({ "digit": "2" }));
        run(&reg, &mut session, "operator", json!({ "op": "+" }));
        run(&reg, &mut session, "digit", json!({ "digit": "3" }));
        let folded = run(&reg, &mut session, "operator", json!({ "op": "×" }));
        assert_eq!(folded.data.unwrap()["display"], "5");
        run(&reg, &mut session, "digit", json!({ "digit": "4" }));
        let result = run(&reg, &mut session, "equals", json!({}));
        assert_eq!(result.status, Status::Pass);
        let data = result.data.unwrap();
        assert_eq!(data["display"], "20");
        assert_eq!(data["state"]["pending_operator"], Value::Null);
        assert_eq!(data["state"]["awaiting_fresh_entry"], true);
    }

    #[test]
    fn test_digit_validation() {
        let mut session = Session::default();
        let reg = CommandRegistry::new();
        for bad in [json!({}), json!({ "digit": "12" }), json!({ "digit": "x" })] {
            let r = run(&reg, &mut session, "digit", bad);
            assert_eq!(r.status, Status::Error);
        }
        assert_eq!(session.display(), "0");
    }

    #[test]
    fn test_unknown_operator_is_kept_pending() {
        let mut session = Session::default();
        let reg = CommandRegistry::new();
        run(&reg, &mut session, "keys", json!({ "keys": "2+3" }));
        let r = run(&reg, &mut session, "operator", json!({ "op": "^" }));
        assert_eq!(r.status, Status::Pass);
        let data = r.data.unwrap();
        assert_eq!(data["recognised"], false);
        assert_eq!(data["display"], "5");
        assert_eq!(data["state"]["pending_operator"], "^");
        assert_eq!(data["state"]["previous_value"], 5.0);
        assert_eq!(data["state"]["awaiting_fresh_entry"], true);

        run(&reg, &mut session, "digit", json!({ "digit": "9" }));
        let r = run(&reg, &mut session, "equals", json!({}));
        assert_eq!(r.data.unwrap()["display"], "9");
    }

    #[test]
    fn test_operator_requires_op_field() {
        let mut session = Session::default();
        let reg = CommandRegistry::new();
        let r = run(&reg, &mut session, "operator", json!({}));
        assert_eq!(r.status, Status::Error);
        assert_eq!(r.error.unwrap().code, ErrorCode::InvalidInput);
        assert_eq!(session.state().pending_operator, None);
    }

    #[test]
    fn test_keys_command() {
        let mut session = Session::default();
        let reg = CommandRegistry::new();
        let r = run(&reg, &mut session, "keys", json!({ "keys": "5/0=" }));
        let data = r.data.unwrap();
        assert_eq!(data["display"], "0");
        assert_eq!(data["applied"], 4);

        let bad = run(&reg, &mut session, "keys", json!({ "keys": "{Enter" }));
        assert_eq!(bad.status, Status::Error);
    }

    #[test]
    fn test_editing_commands() {
        let mut session = Session::default();
        let reg = CommandRegistry::new();
        run(&reg, &mut session, "keys", json!({ "keys": "12" }));
        run(&reg, &mut session, "decimal", json!({}));
        run(&reg, &mut session, "decimal", json!({}));
        let r = run(&reg, &mut session, "display", json!({}));
        assert_eq!(r.data.unwrap()["display"], "12.");
        run(&reg, &mut session, "delete", json!({}));
        run(&reg, &mut session, "clear_entry", json!({}));
        let r = run(&reg, &mut session, "state", json!({}));
        assert_eq!(r.data.unwrap()["display"], "0");
        run(&reg, &mut session, "keys", json!({ "keys": "7+" }));
        let r = run(&reg, &mut session, "clear", json!({}));
        assert_eq!(r.data.unwrap()["state"]["previous_value"], Value::Null);
    }

    #[test]
    fn test_list_commands() {
        let reg = CommandRegistry::new();
        let names = reg.list();
        for expected in ["digit", "decimal", "operator", "equals", "keys", "state"] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }
}

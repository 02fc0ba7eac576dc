//! Session – one engine and the key map that feeds it.

use crate::calculator::ExpressionEngine;
use crate::keymap::{KeyMap, KeyMapError};
use crate::types::{EngineOptions, EngineState};

/// Central context passed to all session commands.
///
/// Each CLI run, REPL, or daemon connection creates its own session; nothing
/// here is shared between callers.
#[derive(Debug, Clone, Default)]
pub struct Session {
    engine: ExpressionEngine,
    keymap: KeyMap,
}

/// What happened when a key string was fed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOutcome {
    pub applied: usize,
    pub ignored: Vec<String>,
}

impl Session {
    pub fn new(options: EngineOptions, keymap: KeyMap) -> Self {
        Self {
            engine: ExpressionEngine::with_options(options),
            keymap,
        }
    }

    pub fn engine_mut(&mut self) -> &mut ExpressionEngine {
        &mut self.engine
    }

    pub fn display(&self) -> &str {
        self.engine.display()
    }

    pub fn state(&self) -> &EngineState {
        self.engine.state()
    }

    /// Resolve and apply every key in `keys`. Unbound keys are skipped.
    pub fn press_keys(&mut self, keys: &str) -> Result<KeyOutcome, KeyMapError> {
        let (actions, ignored) = self.keymap.translate(keys)?;
        for action in &actions {
            self.engine.dispatch(*action);
        }
        if !ignored.is_empty() {
            tracing::debug!(?ignored, "skipped unbound keys");
        }
        Ok(KeyOutcome {
            applied: actions.len(),
            ignored,
        })
    }

    /// Drop all entry state, keeping options and key bindings.
    pub fn reset(&mut self) {
        self.engine.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Action;
    use crate::types::{DisplayFormat, DivisionByZero};

    #[test]
    fn test_press_keys_chain() {
        let mut session = Session::default();
        let outcome = session.press_keys("2+3*4=").unwrap();
        assert_eq!(outcome.applied, 6);
        assert!(outcome.ignored.is_empty());
        assert_eq!(session.display(), "20");
    }

    #[test]
    fn test_press_keys_named() {
        let mut session = Session::default();
        session.press_keys("123{Backspace}{Backspace}9").unwrap();
        assert_eq!(session.display(), "19");
        session.press_keys("{Escape}").unwrap();
        assert_eq!(session.state(), &EngineState::default());
    }

    #[test]
    fn test_press_keys_reports_ignored() {
        let mut session = Session::default();
        let outcome = session.press_keys("5?").unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.ignored, vec!["?"]);
    }

    #[test]
    fn test_custom_keymap_and_options() {
        let mut keymap = KeyMap::default();
        keymap.bind("x", Action::Operator(crate::types::Operator::Multiply));
        let options = EngineOptions {
            division_by_zero: DivisionByZero::Ieee,
            display_format: DisplayFormat::Rounded { decimals: 2 },
        };
        let mut session = Session::new(options, keymap);
        session.press_keys("2x3=").unwrap();
        assert_eq!(session.display(), "6");
        session.press_keys("1/3=").unwrap();
        assert_eq!(session.display(), "0.33");
        session.press_keys("1/0=").unwrap();
        assert_eq!(session.display(), "Infinity");
    }

    #[test]
    fn test_reset() {
        let mut session = Session::default();
        session.press_keys("9*").unwrap();
        session.reset();
        assert_eq!(session.display(), "0");
        assert_eq!(session.state().pending_operator, None);
    }
}

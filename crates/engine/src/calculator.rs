//! Chained expression-entry engine.
//!
//! Every operator press folds the pending operation into a running value, so
//! evaluation is strictly left to right: `2 + 3 × 4 =` shows `20`.

use crate::format::{format_value, is_numeral, parse_entry};
use crate::keymap::Action;
use crate::types::{DivisionByZero, EngineOptions, EngineState, Operator, PendingOperator};

/// Apply `op` to `a` and `b`.
pub fn evaluate(a: f64, b: f64, op: Operator, division_by_zero: DivisionByZero) -> f64 {
    match op {
        Operator::Add => a + b,
        Operator::Subtract => a - b,
        Operator::Multiply => a * b,
        Operator::Divide => {
            if b == 0.0 && division_by_zero == DivisionByZero::Zero {
                tracing::warn!(dividend = a, "division by zero, result forced to 0");
                0.0
            } else {
                a / b
            }
        }
    }
}

/// Resolve a pending operation. Symbols without a rule yield `b`.
pub fn resolve(a: f64, b: f64, op: &PendingOperator, division_by_zero: DivisionByZero) -> f64 {
    match op {
        PendingOperator::Known(op) => evaluate(a, b, *op, division_by_zero),
        PendingOperator::Other(_) => b,
    }
}

/// One calculator's worth of entry state plus the policies it was built with.
///
/// Owned by whichever session drives it; there is no shared instance.
#[derive(Debug, Clone, Default)]
pub struct ExpressionEngine {
    state: EngineState,
    options: EngineOptions,
}

impl ExpressionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            state: EngineState::default(),
            options,
        }
    }

    /// Text the front-end should render.
    pub fn display(&self) -> &str {
        &self.state.current_text
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    pub fn append_digit(&mut self, digit: char) {
        if !digit.is_ascii_digit() {
            tracing::debug!(%digit, "ignoring non-digit input");
            return;
        }
        let state = &mut self.state;
        if state.awaiting_fresh_entry || !is_numeral(&state.current_text) {
            state.current_text = digit.to_string();
            state.awaiting_fresh_entry = false;
        } else if state.current_text == "0" {
            state.current_text = digit.to_string();
        } else {
            state.current_text.push(digit);
        }
    }

    pub fn append_decimal_point(&mut self) {
        let state = &mut self.state;
        if state.awaiting_fresh_entry || !is_numeral(&state.current_text) {
            state.current_text = "0.".to_string();
            state.awaiting_fresh_entry = false;
        } else if !state.current_text.contains('.') {
            state.current_text.push('.');
        }
    }

    /// Backspace. Leaves the pending operation alone.
    pub fn delete_last(&mut self) {
        let text = &mut self.state.current_text;
        if !is_numeral(text) || text.chars().count() <= 1 {
            *text = "0".to_string();
            return;
        }
        text.pop();
        // A folded negative result like "-5" must not shrink to a bare sign.
        if *text == "-" {
            *text = "0".to_string();
        }
    }

    pub fn clear_all(&mut self) {
        self.state = EngineState::default();
    }

    /// Discard only the operand being typed.
    pub fn clear_entry(&mut self) {
        self.state.current_text = "0".to_string();
        self.state.awaiting_fresh_entry = false;
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    pub fn apply_operator(&mut self, op: Operator) {
        self.apply_pending(PendingOperator::Known(op));
    }

    /// Apply an operator given by symbol and report whether it was one of
    /// the four known operators. Unknown symbols still fold and become the
    /// pending operator; they resolve to the right operand.
    pub fn apply_symbol(&mut self, symbol: &str) -> bool {
        let pending = PendingOperator::from_symbol(symbol);
        let known = pending.is_known();
        if !known {
            tracing::debug!(symbol, "unknown operator symbol, kept as pending");
        }
        self.apply_pending(pending);
        known
    }

    fn apply_pending(&mut self, next: PendingOperator) {
        let input = parse_entry(&self.state.current_text);

        match (self.state.previous_value, self.state.pending_operator.take()) {
            (None, _) => {
                self.state.previous_value = Some(input);
            }
            (Some(prev), Some(pending)) => {
                let folded = resolve(prev, input, &pending, self.options.division_by_zero);
                tracing::debug!(
                    lhs = prev,
                    rhs = input,
                    op = %pending,
                    result = folded,
                    "folded pending operation"
                );
                self.state.current_text = format_value(folded, self.options.display_format);
                self.state.previous_value = Some(folded);
            }
            // A left operand without an operator is never produced.
            (Some(_), None) => {}
        }

        self.state.pending_operator = Some(next);
        self.state.awaiting_fresh_entry = true;
    }

    /// `=`. Does nothing unless an operation is pending.
    pub fn finalize_calculation(&mut self) {
        let (Some(prev), Some(op)) = (self.state.previous_value, &self.state.pending_operator)
        else {
            return;
        };

        let input = parse_entry(&self.state.current_text);
        let result = resolve(prev, input, op, self.options.division_by_zero);
        tracing::debug!(lhs = prev, rhs = input, op = %op, result, "finalized calculation");

        self.state.current_text = format_value(result, self.options.display_format);
        self.state.previous_value = None;
        self.state.pending_operator = None;
        self.state.awaiting_fresh_entry = true;
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Digit(d) => self.append_digit(d),
            Action::DecimalPoint => self.append_decimal_point(),
            Action::Operator(op) => self.apply_operator(op),
            Action::Delete => self.delete_last(),
            Action::ClearAll => self.clear_all(),
            Action::ClearEntry => self.clear_entry(),
            Action::Finalize => self.finalize_calculation(),
        }
    }
}

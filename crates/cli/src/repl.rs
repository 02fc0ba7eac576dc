//! Interactive mode – type key strings, see the display after each line.

use dialoguer::Input;
use engine::Session;

#[derive(Debug, PartialEq, Eq)]
pub enum ReplOutcome {
    Continue(String),
    Quit,
}

/// Apply one input line to the session and return what to print.
pub fn handle_line(session: &mut Session, line: &str) -> ReplOutcome {
    match line.trim() {
        ":q" | ":quit" | ":exit" => ReplOutcome::Quit,
        ":state" => ReplOutcome::Continue(
            serde_json::to_string_pretty(session.state()).unwrap_or_default(),
        ),
        ":reset" => {
            session.reset();
            ReplOutcome::Continue(session.display().to_string())
        }
        keys => match session.press_keys(keys) {
            Ok(outcome) if outcome.ignored.is_empty() => {
                ReplOutcome::Continue(session.display().to_string())
            }
            Ok(outcome) => ReplOutcome::Continue(format!(
                "{}   (ignored: {})",
                session.display(),
                outcome.ignored.join(" ")
            )),
            Err(e) => ReplOutcome::Continue(format!("error: {}", e)),
        },
    }
}

pub fn run_repl(mut session: Session) {
    eprintln!("calcctl repl – enter keys (e.g. 12+3=, {{Backspace}}), :state, :reset, :quit");
    loop {
        let line: String = match Input::new()
            .with_prompt(session.display().to_string())
            .allow_empty(true)
            .interact_text()
        {
            Ok(l) => l,
            Err(e) => {
                tracing::debug!(error = %e, "repl input closed");
                break;
            }
        };
        match handle_line(&mut session, &line) {
            ReplOutcome::Continue(out) => println!("{}", out),
            ReplOutcome::Quit => break,
        }
    }
}

//! Scenario runner – replay scripted key flows from YAML files.

use crate::commands::CommandRegistry;
use crate::context::Session;
use crate::keymap::KeyMap;
use crate::types::*;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to parse scenario YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load a scenario from a YAML string.
pub fn load_scenario(yaml: &str) -> Result<Scenario, ScenarioError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Execute a scenario on a fresh session and return the overall result.
///
/// The scenario's own `options` decide the engine policies; `keymap` comes
/// from the caller.
pub fn run_scenario(
    scenario: &Scenario,
    keymap: &KeyMap,
    registry: &CommandRegistry,
) -> ScenarioResult {
    let mut session = Session::new(scenario.options, keymap.clone());
    let mut step_results = Vec::new();
    let mut overall = Status::Pass;

    for (i, step) in scenario.steps.iter().enumerate() {
        let (result, expect_status, expect_display) = match step {
            ScenarioStep::Call {
                call,
                args,
                expect_status,
                expect_display,
            } => (
                registry.execute(call, args.clone(), &mut session),
                expect_status.as_str(),
                expect_display,
            ),
            ScenarioStep::Keys {
                keys,
                expect_display,
            } => (
                registry.execute("keys", serde_json::json!({ "keys": keys }), &mut session),
                "pass",
                expect_display,
            ),
        };

        let actual_status = result.status.as_str();
        if actual_status != expect_status {
            tracing::warn!(
                step = i,
                expected = %expect_status,
                actual = %actual_status,
                "scenario step status mismatch"
            );
            overall = Status::Fail;
        }
        if let Some(expected) = expect_display {
            if session.display() != expected.as_str() {
                tracing::warn!(
                    step = i,
                    expected = %expected,
                    actual = %session.display(),
                    "scenario step display mismatch"
                );
                overall = Status::Fail;
            }
        }
        step_results.push(result);
    }

    ScenarioResult {
        name: scenario.name.clone(),
        overall_status: overall,
        final_display: session.display().to_string(),
        step_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_yaml(yaml: &str) -> ScenarioResult {
        let scenario = load_scenario(yaml).expect("should parse");
        run_scenario(&scenario, &KeyMap::default(), &CommandRegistry::new())
    }

    #[test]
    fn test_parse_scenario() {
        let yaml = r#"
name: basic test
steps:
  - call: "digit"
    args: { digit: "4" }
    expect_status: "pass"
  - keys: "+1="
    expect_display: "5"
"#;
        let s = load_scenario(yaml).expect("should parse");
        assert_eq!(s.name, Some("basic test".into()));
        assert_eq!(s.steps.len(), 2);
        assert!(matches!(s.steps[1], ScenarioStep::Keys { .. }));
    }

    #[test]
    fn test_run_scenario_chain() {
        let result = run_yaml(
            r#"
name: no precedence
steps:
  - keys: "2+3*"
    expect_display: "5"
  - keys: "4="
    expect_display: "20"
"#,
        );
        assert_eq!(result.overall_status, Status::Pass);
        assert_eq!(result.final_display, "20");
        assert_eq!(result.step_results.len(), 2);
    }

    #[test]
    fn test_display_mismatch_fails() {
        let result = run_yaml(
            r#"
steps:
  - keys: "2+3*4="
    expect_display: "14"
"#,
        );
        assert_eq!(result.overall_status, Status::Fail);
    }

    #[test]
    fn test_expected_error_status() {
        let result = run_yaml(
            r#"
steps:
  - call: "operator"
    args: {}
    expect_status: "error"
"#,
        );
        assert_eq!(result.overall_status, Status::Pass);
        assert_eq!(result.step_results[0].status, Status::Error);
    }

    #[test]
    fn test_scenario_options() {
        let result = run_yaml(
            r#"
options:
  division_by_zero: ieee
  display_format: { mode: rounded, decimals: 8 }
steps:
  - keys: ".1+.2="
    expect_display: "0.3"
  - keys: "5/0="
    expect_display: "Infinity"
"#,
        );
        assert_eq!(result.overall_status, Status::Pass);
    }

    #[test]
    fn test_bundled_scenarios_pass() {
        for yaml in [
            include_str!("../../../scenarios/chained.yaml"),
            include_str!("../../../scenarios/rounded.yaml"),
        ] {
            let result = run_yaml(yaml);
            assert_eq!(result.overall_status, Status::Pass, "{:?}", result.name);
        }
    }

    #[test]
    fn test_bad_yaml() {
        assert!(load_scenario("steps: 12").is_err());
    }
}

use std::sync::Arc;

use load_driver_runner::prelude::{
    run, HookResult, ReporterOpt, RunnerContext, ScenarioCli, ScenarioDefinitionBuilder,
    UserValuesConstraint, VirtualUserBailError, VirtualUserContext,
};

#[derive(Default, Debug)]
struct RunnerContextValue {}

impl UserValuesConstraint for RunnerContextValue {}

#[derive(Default, Debug)]
struct VirtualUserValue {
    value: i32,
}

impl UserValuesConstraint for VirtualUserValue {}

type Ctx = VirtualUserContext<RunnerContextValue, VirtualUserValue>;

fn sample_cli_cfg() -> ScenarioCli {
    ScenarioCli {
        base_url: Some("http://localhost:8080".to_string()),
        virtual_users: None,
        behaviour: vec![],
        duration: None,
        soak: false,
        no_progress: true,
        reporter: ReporterOpt::Noop,
        reports_dir: "reports".into(),
        run_id: None,
        run_summary_path: None,
    }
}

#[test]
fn propagate_error_in_setup_hook() {
    fn setup(_ctx: &mut RunnerContext<RunnerContextValue>) -> HookResult {
        Err(anyhow::anyhow!("Error in setup hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, VirtualUserValue>::new(
        "propagate_error_in_setup_hook",
        sample_cli_cfg(),
    )
    .with_default_duration_s(5)
    .use_setup(setup);

    let result = run(scenario);

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().to_string(), "Error in setup hook");
}

#[test]
fn reject_missing_base_url() {
    let mut cfg = sample_cli_cfg();
    cfg.base_url = None;

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, VirtualUserValue>::new(
        "reject_missing_base_url",
        cfg,
    )
    .with_default_duration_s(1);

    assert!(run(scenario).is_err());
}

#[test]
fn reject_base_url_without_http_scheme() {
    fn agent_setup(_ctx: &mut Ctx) -> HookResult {
        panic!("No virtual user should start with an unusable base URL");
    }

    fn behaviour(_ctx: &mut Ctx) -> HookResult {
        Ok(())
    }

    let mut cfg = sample_cli_cfg();
    cfg.base_url = Some("localhost:8080".to_string());

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, VirtualUserValue>::new(
        "reject_base_url_without_http_scheme",
        cfg,
    )
    .with_default_duration_s(1)
    .use_agent_setup(agent_setup)
    .use_agent_behaviour(behaviour);

    let result = run(scenario);

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("http or https"));
}

#[test]
fn capture_error_in_agent_setup() {
    fn agent_setup(_ctx: &mut Ctx) -> HookResult {
        Err(anyhow::anyhow!("Error in agent setup hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, VirtualUserValue>::new(
        "capture_error_in_agent_setup",
        sample_cli_cfg(),
    )
    .with_default_duration_s(5)
    .use_agent_setup(agent_setup);

    let result = run(scenario);

    assert!(result.is_ok());
    assert_eq!(0, result.unwrap());
}

#[test]
fn capture_error_in_agent_behaviour_and_continue() {
    fn agent_behaviour(ctx: &mut Ctx) -> HookResult {
        if ctx.get().value < 5 {
            ctx.get_mut().value += 1;
        } else {
            // Save time running this test by shutting down once this has run a few times.
            ctx.runner_context().force_stop_scenario();
        }

        Err(anyhow::anyhow!("Error in agent behaviour hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, VirtualUserValue>::new(
        "capture_error_in_agent_behaviour_and_continue",
        sample_cli_cfg(),
    )
    .with_default_duration_s(5)
    .use_agent_behaviour(agent_behaviour);

    let result = run(scenario);

    assert!(result.is_ok());
    assert_eq!(1, result.unwrap());
}

#[test]
fn bail_error_stops_agent_behaviour() {
    fn agent_behaviour_1(_ctx: &mut Ctx) -> HookResult {
        Err(VirtualUserBailError::default().into())
    }

    fn agent_behaviour_2(_ctx: &mut Ctx) -> HookResult {
        std::thread::sleep(std::time::Duration::from_millis(10));
        Ok(())
    }

    let mut cfg = sample_cli_cfg();
    cfg.virtual_users = Some(2);
    cfg.behaviour = vec![("bail".to_string(), 1), ("continue".to_string(), 1)];
    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, VirtualUserValue>::new(
        "bail_error_stops_agent_behaviour",
        cfg,
    )
    .with_default_duration_s(1)
    .use_named_agent_behaviour("bail", agent_behaviour_1)
    .use_named_agent_behaviour("continue", agent_behaviour_2);

    let result = run(scenario);

    assert!(result.is_ok());
    assert_eq!(1, result.unwrap());
}

#[test]
fn iterations_are_counted_per_virtual_user() {
    fn agent_behaviour(ctx: &mut Ctx) -> HookResult {
        ctx.get_mut().value += 1;
        // A mismatch keeps the user running until the duration ends, failing the assertion below
        if ctx.iteration() == 3 && ctx.get().value == 3 {
            return Err(VirtualUserBailError::new("done").into());
        }
        Ok(())
    }

    let mut cfg = sample_cli_cfg();
    cfg.virtual_users = Some(3);
    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, VirtualUserValue>::new(
        "iterations_are_counted_per_virtual_user",
        cfg,
    )
    .with_default_duration_s(5)
    .use_agent_behaviour(agent_behaviour);

    // Every user bails on its third iteration, long before the duration runs out
    assert_eq!(0, run(scenario).unwrap());
}

#[test]
fn capture_error_in_agent_teardown() {
    fn agent_teardown(_ctx: &mut Ctx) -> HookResult {
        Err(anyhow::anyhow!("Error in agent teardown hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, VirtualUserValue>::new(
        "capture_error_in_agent_teardown",
        sample_cli_cfg(),
    )
    .with_default_duration_s(5)
    .use_agent_teardown(agent_teardown);

    let result = run(scenario);

    assert!(result.is_ok());
}

#[test]
fn capture_error_in_teardown() {
    fn teardown(_ctx: Arc<RunnerContext<RunnerContextValue>>) -> HookResult {
        Err(anyhow::anyhow!("Error in teardown hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, VirtualUserValue>::new(
        "capture_error_in_teardown",
        sample_cli_cfg(),
    )
    .with_default_duration_s(5)
    .use_teardown(teardown);

    let result = run(scenario);

    assert!(result.is_ok());
}

#[test]
fn run_summary_is_appended() {
    fn agent_behaviour(ctx: &mut Ctx) -> HookResult {
        ctx.runner_context()
            .reporter()
            .add_check(load_driver_runner::prelude::CheckRecord::new("always passes", true));
        ctx.runner_context().force_stop_scenario();
        Ok(())
    }

    let dir = tempfile::tempdir().unwrap();
    let summary_path = dir.path().join("run_summary.jsonl");

    let mut cfg = sample_cli_cfg();
    cfg.run_id = Some("summary-run".to_string());
    cfg.run_summary_path = Some(summary_path.clone());
    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, VirtualUserValue>::new(
        "run_summary_is_appended",
        cfg,
    )
    .with_default_virtual_users(1)
    .with_default_duration_s(5)
    .use_agent_behaviour(agent_behaviour);

    assert_eq!(1, run(scenario).unwrap());

    let content = std::fs::read_to_string(summary_path).unwrap();
    let summary: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!("summary-run", summary["run_id"]);
    assert_eq!("run_summary_is_appended", summary["scenario_name"]);
    assert_eq!(1, summary["virtual_user_count"]);
    assert_eq!(1, summary["virtual_user_end_count"]);
    assert_eq!(1, summary["checks_passed"]);
    assert_eq!(0, summary["checks_failed"]);
}

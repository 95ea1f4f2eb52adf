use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use load_driver_core::prelude::{ShutdownSignalError, VirtualUserBailError};
use load_driver_instruments::ReportConfig;
use load_driver_summary_model::{append_run_summary, RunSummary};

use crate::cli::ReporterOpt;
use crate::context::{RunnerContext, UserValuesConstraint, VirtualUserContext};
use crate::definition::{ScenarioDefinition, ScenarioDefinitionBuilder};
use crate::executor::Executor;
use crate::monitor::start_monitor;
use crate::progress::start_progress;
use crate::shutdown::start_shutdown_listener;

/// Run a scenario to completion.
///
/// Returns the number of virtual users that were still running when the run ended. Users that
/// failed their setup hook, bailed or panicked are not counted.
pub fn run<RV: UserValuesConstraint, V: UserValuesConstraint>(
    definition: ScenarioDefinitionBuilder<RV, V>,
) -> anyhow::Result<usize> {
    let definition = definition.build()?;

    log::info!("Running scenario: {}", definition.name);

    let run_id = definition
        .cli
        .run_id
        .clone()
        .unwrap_or_else(|| nanoid::nanoid!());
    let started_at = chrono::Utc::now().timestamp();

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime);
    let executor = Arc::new(Executor::new(runtime, shutdown_handle.clone()));
    let reporter = Arc::new(report_config(&definition, &run_id).init()?);
    let mut runner_context = RunnerContext::new(
        executor,
        reporter,
        shutdown_handle.clone(),
        definition.base_url.clone(),
    );

    if let Some(setup_fn) = definition.setup_fn {
        setup_fn(&mut runner_context)?;
    }

    // Only time bounded runs get a timer and a progress bar, soak runs end on Ctrl-C
    if let Some(duration) = definition.duration_s {
        if !definition.no_progress {
            if let Err(e) = start_progress(
                Duration::from_secs(duration),
                shutdown_handle.new_listener(),
            ) {
                log::warn!("Failed to start progress bar: {e:?}");
            }
        }

        let shutdown_handle = shutdown_handle.clone();
        runner_context.executor().spawn(async move {
            tokio::time::sleep(Duration::from_secs(duration)).await;
            shutdown_handle.shutdown();
        });
    }

    let runner_context = Arc::new(runner_context);

    // Virtual users are about to start, watch for the driver itself becoming the bottleneck.
    if let Err(e) = start_monitor(shutdown_handle.new_listener()) {
        log::warn!("Failed to start resource monitor: {e:?}");
    }

    let assigned_behaviours = definition.assigned_behaviours_flat();

    let mut handles = Vec::with_capacity(assigned_behaviours.len());
    for (index, assigned_behaviour) in assigned_behaviours.iter().enumerate() {
        let runner_context = runner_context.clone();

        let setup_agent_fn = definition.setup_agent_fn;
        let behaviour_fn = definition.agent_behaviour.get(assigned_behaviour).copied();
        let teardown_agent_fn = definition.teardown_agent_fn;

        let delegated_shutdown_listener = shutdown_handle.new_listener();

        let virtual_user_id = format!("vu-{index}");

        let handle = std::thread::Builder::new()
            .name(virtual_user_id.clone())
            .spawn(move || {
                let mut context = VirtualUserContext::new(
                    virtual_user_id.clone(),
                    runner_context,
                    delegated_shutdown_listener,
                );

                if let Some(setup_agent_fn) = setup_agent_fn {
                    if let Err(e) = setup_agent_fn(&mut context) {
                        log::error!("Setup failed for virtual user {virtual_user_id}: {e:?}");
                        return false;
                    }
                }

                let mut still_running = true;
                if let Some(behaviour) = behaviour_fn {
                    loop {
                        if context.shutdown_listener().should_shutdown() {
                            log::debug!(
                                "Stopping virtual user {virtual_user_id} after {} iterations",
                                context.iteration()
                            );
                            break;
                        }

                        context.next_iteration();
                        match behaviour(&mut context) {
                            Ok(()) => {}
                            Err(e) if e.is::<ShutdownSignalError>() => {
                                // Expected when the run ends mid-iteration, the check at the top
                                // of the loop stops this user.
                            }
                            Err(e) if e.is::<VirtualUserBailError>() => {
                                log::warn!("Virtual user {virtual_user_id} is bailing: {e}");
                                still_running = false;
                                break;
                            }
                            Err(e) => {
                                log::error!(
                                    "Behaviour failed for virtual user {virtual_user_id}: {e:?}"
                                );
                            }
                        }
                    }
                }

                if let Some(teardown_agent_fn) = teardown_agent_fn {
                    if let Err(e) = teardown_agent_fn(&mut context) {
                        log::error!("Teardown failed for virtual user {virtual_user_id}: {e:?}");
                    }
                }

                still_running
            });

        match handle {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                // Stop the users already started rather than leaving them running
                shutdown_handle.shutdown();
                return Err(e).context("Failed to spawn thread for virtual user");
            }
        }
    }

    let mut virtual_user_end_count = 0;
    for handle in handles {
        match handle.join() {
            Ok(true) => virtual_user_end_count += 1,
            Ok(false) => {}
            Err(e) => log::error!("Virtual user thread panicked: {e:?}"),
        }
    }

    // Every user has stopped, make sure the background threads do too
    shutdown_handle.shutdown();

    if let Some(teardown_fn) = definition.teardown_fn {
        // Best effort, reporting should still happen
        if let Err(e) = teardown_fn(runner_context.clone()) {
            log::error!("Teardown failed: {e:?}");
        }
    }

    let reporter = runner_context.reporter();
    reporter.finalize();

    let checks = reporter.check_tally();
    log::info!(
        "Scenario {} finished with {virtual_user_end_count}/{} virtual users running, checks passed: {}, failed: {}",
        definition.name,
        definition.virtual_user_count,
        checks.total_passed(),
        checks.total_failed()
    );

    if let Some(path) = &definition.cli.run_summary_path {
        let mut summary = RunSummary::new(
            run_id,
            definition.name.clone(),
            started_at,
            definition.duration_s,
            definition.virtual_user_count,
            definition.behaviour_counts(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        summary.set_virtual_user_end_count(virtual_user_end_count);
        summary.set_check_totals(checks.total_passed(), checks.total_failed());
        for key in &definition.capture_env {
            if let Ok(value) = std::env::var(key) {
                summary.add_env(key.clone(), value);
            }
        }

        append_run_summary(&summary, path)
            .with_context(|| format!("Failed to write run summary to {path:?}"))?;
    }

    Ok(virtual_user_end_count)
}

fn report_config<RV: UserValuesConstraint, V: UserValuesConstraint>(
    definition: &ScenarioDefinition<RV, V>,
    run_id: &str,
) -> ReportConfig {
    let config = ReportConfig::new(run_id, definition.name.clone());
    match definition.cli.reporter {
        ReporterOpt::InMemory => config.enable_in_memory(),
        ReporterOpt::JsonlFile => config.enable_jsonl_file(definition.cli.reports_dir.clone()),
        ReporterOpt::Noop => config,
    }
}

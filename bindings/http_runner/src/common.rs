use std::time::Duration;

use anyhow::Context;
use http_client_instrumented::prelude::{
    check_status, HeaderName, HeaderValue, HttpClient, StatusCode,
};
use load_driver_runner::prelude::{
    HookResult, LoadDriverResult, RunnerContext, ScenarioDefinitionBuilder, UserValuesConstraint,
    VirtualUserContext,
};

use crate::context::HttpAgentContext;
use crate::runner_context::HttpRunnerContext;

fn parse_header(name: &str, value: &str) -> anyhow::Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .with_context(|| format!("Invalid header name [{name}]"))?;
    let header_value = HeaderValue::from_str(value)
        .with_context(|| format!("Invalid value for header [{name}]"))?;
    Ok((header_name, header_value))
}

/// Add a header that is sent with every request made by [get_and_check].
///
/// Call this from the global setup hook:
/// ```rust
/// use http_load_runner::prelude::*;
///
/// fn setup(ctx: &mut RunnerContext<HttpRunnerContext>) -> HookResult {
///     set_default_header(ctx, "Host", "api.demo.local")?;
///     Ok(())
/// }
/// ```
pub fn set_default_header(
    ctx: &mut RunnerContext<HttpRunnerContext>,
    name: &str,
    value: &str,
) -> HookResult {
    let (name, value) = parse_header(name, value)?;
    ctx.get_mut().default_headers.insert(name, value);
    Ok(())
}

/// Create the instrumented HTTP client for this virtual user, pointing at the run's base URL.
///
/// After calling this in the agent setup hook, [get_and_check] can be used in the behaviour.
pub fn connect_http_client<SV: UserValuesConstraint>(
    ctx: &mut VirtualUserContext<HttpRunnerContext, HttpAgentContext<SV>>,
) -> HookResult {
    let client = HttpClient::new(
        ctx.runner_context().get_base_url(),
        ctx.virtual_user_id(),
        ctx.runner_context().reporter(),
    )?;
    log::debug!(
        "Virtual user {} sending requests to {}",
        ctx.virtual_user_id(),
        client.base_url()
    );
    ctx.get_mut().client = Some(client);
    Ok(())
}

/// GET `path` and record a check named `check_name` that passes when the status is `expected`.
///
/// The request carries the default headers plus `extra_headers`, which win on conflict.
///
/// A failed check doesn't fail the hook. Transport failures are logged and recorded as a failed
/// check too, so the caller can carry on with its next request. The only error returned for a sent
/// request is the shutdown signal, when the run ends while the request is in flight. Nothing is
/// recorded for the check in that case.
///
/// Returns whether the check passed.
pub fn get_and_check<SV: UserValuesConstraint>(
    ctx: &mut VirtualUserContext<HttpRunnerContext, HttpAgentContext<SV>>,
    path: &str,
    extra_headers: &[(&str, &str)],
    check_name: &str,
    expected: StatusCode,
) -> LoadDriverResult<bool> {
    let client = ctx.get().client()?;

    let mut headers = ctx.runner_context().get().default_headers().clone();
    for (name, value) in extra_headers {
        let (name, value) = parse_header(name, value)?;
        headers.insert(name, value);
    }

    let virtual_user = ctx.virtual_user_id().to_string();
    let status = ctx
        .runner_context()
        .executor()
        .execute_in_place(async {
            match client.get(path, headers).await {
                Ok(response) => {
                    let status = response.status();
                    // Drain the body so the connection can be reused
                    if let Err(e) = response.bytes().await {
                        log::debug!("Failed to read response body from {path}: {e}");
                    }
                    Ok(Some(status))
                }
                Err(e) => {
                    log::warn!("Request to {path} failed for {virtual_user}: {e}");
                    Ok(None)
                }
            }
        })?;

    Ok(check_status(
        &ctx.runner_context().reporter(),
        check_name,
        &virtual_user,
        status,
        expected,
    ))
}

/// Sleep between iterations.
///
/// The pause is cut short by the shutdown signal, in which case the shutdown error is returned and
/// the runner stops this virtual user.
pub fn pause<SV: UserValuesConstraint>(
    ctx: &mut VirtualUserContext<HttpRunnerContext, HttpAgentContext<SV>>,
    duration: Duration,
) -> HookResult {
    ctx.runner_context()
        .executor()
        .execute_in_place(async move {
            tokio::time::sleep(duration).await;
            Ok(())
        })
}

/// Run an HTTP scenario with the load driver runner.
pub fn run<SV: UserValuesConstraint>(
    definition: ScenarioDefinitionBuilder<HttpRunnerContext, HttpAgentContext<SV>>,
) -> LoadDriverResult<usize> {
    load_driver_runner::prelude::run(definition)
}

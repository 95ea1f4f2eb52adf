use std::time::Duration;

use http_load_runner::prelude::*;

/// Host the API gateway routes on.
pub const GATEWAY_HOST: &str = "api.demo.local";

/// Header that asks the gateway to route to the canary deployment.
pub const CANARY_HEADER: (&str, &str) = ("X-Canary", "true");

/// Pause at the end of each iteration.
pub const THINK_TIME: Duration = Duration::from_secs(5);

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_VIRTUAL_USERS: usize = 2;
pub const DEFAULT_DURATION_S: u64 = 15;

/// One step of an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayRequest {
    pub check: &'static str,
    pub path: &'static str,
    pub canary: bool,
}

/// The requests made by every iteration, in order.
pub const GATEWAY_REQUESTS: [GatewayRequest; 5] = [
    GatewayRequest {
        check: "service-a hello status is 200",
        path: "/api/service-a/hello",
        canary: false,
    },
    GatewayRequest {
        check: "service-a slow status is 200",
        path: "/api/service-a/slow",
        canary: false,
    },
    GatewayRequest {
        check: "service-b hello status is 200",
        path: "/api/service-b/hello",
        canary: false,
    },
    GatewayRequest {
        check: "service-a chain status is 200",
        path: "/api/service-a/chain",
        canary: false,
    },
    GatewayRequest {
        check: "service-a canary status is 200",
        path: "/api/service-a/hello",
        canary: true,
    },
];

pub fn setup(ctx: &mut RunnerContext<HttpRunnerContext>) -> HookResult {
    set_default_header(ctx, "Host", GATEWAY_HOST)?;
    Ok(())
}

pub fn agent_setup(ctx: &mut VirtualUserContext<HttpRunnerContext, HttpAgentContext>) -> HookResult {
    connect_http_client(ctx)?;
    Ok(())
}

pub fn agent_behaviour(
    ctx: &mut VirtualUserContext<HttpRunnerContext, HttpAgentContext>,
) -> HookResult {
    for request in GATEWAY_REQUESTS {
        let extra_headers: &[(&str, &str)] = if request.canary {
            &[CANARY_HEADER]
        } else {
            &[]
        };

        get_and_check(ctx, request.path, extra_headers, request.check, StatusCode::OK)?;
    }

    pause(ctx, THINK_TIME)?;

    Ok(())
}

/// The scenario definition with its defaults applied. A base URL given on the command line wins
/// over [DEFAULT_BASE_URL].
pub fn scenario(
    name: &str,
    mut cli: ScenarioCli,
) -> ScenarioDefinitionBuilder<HttpRunnerContext, HttpAgentContext> {
    if cli.base_url.is_none() {
        cli.base_url = Some(DEFAULT_BASE_URL.to_string());
    }

    ScenarioDefinitionBuilder::<HttpRunnerContext, HttpAgentContext>::new(name, cli)
        .with_default_virtual_users(DEFAULT_VIRTUAL_USERS)
        .with_default_duration_s(DEFAULT_DURATION_S)
        .add_capture_env("RUST_LOG")
        .use_setup(setup)
        .use_agent_setup(agent_setup)
        .use_agent_behaviour(agent_behaviour)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_last_request_is_canary() {
        let canary = GATEWAY_REQUESTS
            .iter()
            .map(|r| r.canary)
            .collect::<Vec<_>>();
        assert_eq!(vec![false, false, false, false, true], canary);
    }

    #[test]
    fn check_names_are_unique() {
        let mut names = GATEWAY_REQUESTS.iter().map(|r| r.check).collect::<Vec<_>>();
        names.sort();
        names.dedup();
        assert_eq!(GATEWAY_REQUESTS.len(), names.len());
    }
}

use anyhow::Context;
use http_client_instrumented::prelude::HttpClient;
use load_driver_runner::prelude::UserValuesConstraint;

/// Scenario values for scenarios that don't need to keep any state of their own.
#[derive(Default, Debug)]
pub struct DefaultScenarioValues;

impl UserValuesConstraint for DefaultScenarioValues {}

/// HTTP specific virtual user context values.
#[derive(Default, Debug)]
pub struct HttpAgentContext<SV: UserValuesConstraint = DefaultScenarioValues> {
    pub(crate) client: Option<HttpClient>,
    /// Values owned by the scenario itself.
    pub scenario_values: SV,
}

impl<SV: UserValuesConstraint> UserValuesConstraint for HttpAgentContext<SV> {}

impl<SV: UserValuesConstraint> HttpAgentContext<SV> {
    pub fn client(&self) -> anyhow::Result<HttpClient> {
        self.client.clone().context(
            "HTTP client is not set, did you forget to call `connect_http_client` in your agent setup?",
        )
    }
}

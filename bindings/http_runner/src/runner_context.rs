use http_client_instrumented::prelude::HeaderMap;
use load_driver_runner::prelude::UserValuesConstraint;

/// HTTP specific runner context values.
#[derive(Default, Debug)]
pub struct HttpRunnerContext {
    /// Headers sent with every request made through [crate::prelude::get_and_check].
    ///
    /// Populate these in the global setup hook with [crate::prelude::set_default_header].
    pub(crate) default_headers: HeaderMap,
}

impl UserValuesConstraint for HttpRunnerContext {}

impl HttpRunnerContext {
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }
}

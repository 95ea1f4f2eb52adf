mod check;
mod client;

pub mod prelude {
    pub use crate::check::check_status;
    pub use crate::client::HttpClientInstrumented as HttpClient;

    // Types from reqwest that scenarios need to talk to the client, re-exported so that scenarios
    // don't need a direct dependency on reqwest.
    pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    pub use reqwest::{Response, StatusCode};
}

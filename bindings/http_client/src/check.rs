use load_driver_instruments::{CheckRecord, Reporter};
use reqwest::StatusCode;

/// Record whether a request came back with the expected status.
///
/// `status` is `None` when the request never got a response, which always fails the check.
/// Returns whether the check passed.
pub fn check_status(
    reporter: &Reporter,
    name: &str,
    virtual_user: &str,
    status: Option<StatusCode>,
    expected: StatusCode,
) -> bool {
    let passed = status == Some(expected);
    if !passed {
        log::debug!("Check [{name}] failed for {virtual_user}: expected {expected}, got {status:?}");
    }

    reporter.add_check(CheckRecord::new(name, passed).with_virtual_user(virtual_user));
    passed
}

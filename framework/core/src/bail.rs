/// Return this error from a behaviour hook to indicate that the virtual user is bailing.
///
/// Use this when a virtual user hits a problem that makes further iterations pointless for that
/// user but should not stop the run. The runner stops scheduling the bailing user and keeps the
/// others going until the run ends.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct VirtualUserBailError {
    msg: String,
}

impl VirtualUserBailError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl Default for VirtualUserBailError {
    fn default() -> Self {
        Self::new("Virtual user is bailing")
    }
}

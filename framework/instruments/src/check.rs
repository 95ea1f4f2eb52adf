/// The outcome of a named assertion against a response.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRecord {
    name: String,
    passed: bool,
    virtual_user: Option<String>,
    timestamp_ms: i64,
}

impl CheckRecord {
    pub fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
            virtual_user: None,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_virtual_user(mut self, virtual_user: impl Into<String>) -> Self {
        self.virtual_user = Some(virtual_user.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn virtual_user(&self) -> Option<&str> {
        self.virtual_user.as_deref()
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }
}

use crate::common::DEFAULT_MAX_REQUESTS_PER_SESSION;

/// Per-session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    max_requests: u32,
}

impl SessionOptions {
    pub fn new() -> Self {
        SessionOptions {
            max_requests: DEFAULT_MAX_REQUESTS_PER_SESSION,
        }
    }

    /// Caps the number of store requests the session may make. Going over
    /// the cap fails with
    /// [InvalidOperation](crate::errors::ErrorKind::InvalidOperation).
    pub fn max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    pub fn get_max_requests(&self) -> u32 {
        self.max_requests
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions::new()
    }
}

pub mod handlers;

use serde::Serialize;
use std::time::Duration;

/// How long `/slow` waits before answering.
pub const SLOW_RESPONSE_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub message: &'static str,
}

impl StatusMessage {
    pub const fn up() -> Self {
        Self {
            message: "Server is up and running",
        }
    }
}

//! Send flow configuration.

use std::time::Duration;

/// Runtime settings for the send-confirmation flow.
#[derive(Debug, Clone)]
pub struct SendConfig {
    /// Upper bound for a single engine step (build, sign, broadcast, save).
    /// Expiry is treated as a failure of that step.
    pub step_timeout: Duration,
    /// Notification title on success.
    pub success_title: String,
    /// Notification message on success.
    pub success_message: String,
    /// Notification title on failure; the message is the error text.
    pub failure_title: String,
}

impl SendConfig {
    /// Create a new SendConfig with the default notification texts.
    pub fn new(step_timeout: Duration) -> Self {
        Self {
            step_timeout,
            ..Self::default()
        }
    }
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(60),
            success_title: "Transaction Sent".to_string(),
            success_message: "Your transaction has been successfully sent.".to_string(),
            failure_title: "Transaction Failure".to_string(),
        }
    }
}

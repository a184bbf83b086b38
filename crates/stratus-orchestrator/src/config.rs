//! Orchestrator configuration

use std::time::Duration;

/// Timing and defaults shared by the submission and teardown orchestrators
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Fixed sleep between remote polls
    pub poll_interval: Duration,
    /// How long a submission may wait for deployment acknowledgment
    pub submission_timeout: Duration,
    /// Ceiling on any single async-job poll-to-completion
    pub job_poll_ceiling: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            submission_timeout: Duration::from_secs(600),
            job_poll_ceiling: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.job_poll_ceiling, Duration::from_secs(300));
    }
}

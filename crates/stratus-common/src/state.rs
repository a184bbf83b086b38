//! Remote-reported lifecycle states
//!
//! The resource manager reports every lifecycle stage as a string. Each
//! enumeration here owns exactly one translation function from that string
//! form, defaulting to `Unrecognized` instead of failing: new remote states
//! must never break an in-flight poll loop.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Provisioning state of a deployment as reported by the resource manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisioningState {
    /// Submission accepted, work not started
    Accepted,
    /// Resources ready
    Ready,
    /// Provisioning in progress
    Running,
    /// Canceled remotely
    Canceled,
    /// Provisioning failed
    Failed,
    /// Deployment deleted
    Deleted,
    /// All resources provisioned
    Succeeded,
    /// Any state this client does not know
    Unrecognized,
}

impl ProvisioningState {
    /// Sole translation from the remote string form
    pub fn from_status_str(s: &str) -> Self {
        match s {
            "Accepted" => Self::Accepted,
            "Ready" => Self::Ready,
            "Running" => Self::Running,
            "Canceled" => Self::Canceled,
            "Failed" => Self::Failed,
            "Deleted" => Self::Deleted,
            "Succeeded" => Self::Succeeded,
            _ => Self::Unrecognized,
        }
    }

    /// Wire string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::Canceled => "Canceled",
            Self::Failed => "Failed",
            Self::Deleted => "Deleted",
            Self::Succeeded => "Succeeded",
            Self::Unrecognized => "Unrecognized",
        }
    }
}

impl Serialize for ProvisioningState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProvisioningState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_status_str(&s))
    }
}

/// Opaque handle to an asynchronous remote job.
///
/// Certain delete/restart operations return a job URI instead of blocking;
/// the handle is held only for the duration of one poll-to-completion and
/// discarded once the job reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AsyncJobHandle(pub String);

impl AsyncJobHandle {
    /// Wrap a job URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The job URI
    pub fn uri(&self) -> &str {
        &self.0
    }
}

/// Status of an asynchronous remote job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Job finished
    Done,
    /// Job finished, resource already gone
    NoContent,
    /// Still running
    InProgress,
    /// Job failed remotely
    Failed,
    /// Any status this client does not know
    Unrecognized,
}

impl JobStatus {
    /// Sole translation from the remote string form
    pub fn from_status_str(s: &str) -> Self {
        match s {
            "Done" => Self::Done,
            "NoContent" => Self::NoContent,
            "InProgress" => Self::InProgress,
            "Failed" => Self::Failed,
            _ => Self::Unrecognized,
        }
    }

    /// True when the job will make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::NoContent | Self::Failed)
    }
}

/// VM power state parsed from instance-view status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// VM running
    Running,
    /// VM starting up
    Starting,
    /// VM stopped, still allocated
    Stopped,
    /// VM stopped and deallocated
    Deallocated,
    /// Any code this client does not know
    Unrecognized,
}

impl PowerState {
    /// Sole translation from an instance-view code such as
    /// `PowerState/running`
    pub fn from_code(code: &str) -> Self {
        match code.strip_prefix("PowerState/") {
            Some("running") => Self::Running,
            Some("starting") => Self::Starting,
            Some("stopped") => Self::Stopped,
            Some("deallocated") => Self::Deallocated,
            _ => Self::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisioning_state_translation() {
        assert_eq!(
            ProvisioningState::from_status_str("Succeeded"),
            ProvisioningState::Succeeded
        );
        assert_eq!(
            ProvisioningState::from_status_str("SomethingNew"),
            ProvisioningState::Unrecognized
        );
    }

    #[test]
    fn test_provisioning_state_serde_round_trip() {
        let json = serde_json::to_string(&ProvisioningState::Accepted).unwrap();
        assert_eq!(json, "\"Accepted\"");

        let state: ProvisioningState = serde_json::from_str("\"Running\"").unwrap();
        assert_eq!(state, ProvisioningState::Running);

        let state: ProvisioningState = serde_json::from_str("\"Zombified\"").unwrap();
        assert_eq!(state, ProvisioningState::Unrecognized);
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::NoContent.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(!JobStatus::from_status_str("Queued").is_terminal());
    }

    #[test]
    fn test_power_state_codes() {
        assert_eq!(PowerState::from_code("PowerState/running"), PowerState::Running);
        assert_eq!(
            PowerState::from_code("PowerState/deallocated"),
            PowerState::Deallocated
        );
        assert_eq!(PowerState::from_code("ProvisioningState/updating"), PowerState::Unrecognized);
        assert_eq!(PowerState::from_code("PowerState/hibernated"), PowerState::Unrecognized);
    }
}

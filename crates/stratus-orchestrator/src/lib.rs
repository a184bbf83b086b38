//! Stratus Orchestrator
//!
//! Drives the asynchronous lifecycle around a deployment graph: submission
//! with bounded acknowledgment polling, the strictly sequential teardown the
//! remote API cannot perform atomically, dependency resolution over
//! remote-reported edges, and catalog availability aggregation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        COMPUTE SERVICE                           │
//! │        create / destroy / get / list / restart / catalogs        │
//! │                                                                  │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────┐  ┌────────────┐  │
//! │  │ Submission │  │  Teardown  │  │ Dependency │  │Availability│  │
//! │  │Orchestrator│  │Orchestrator│  │  Resolver  │  │ Aggregator │  │
//! │  └─────┬──────┘  └─────┬──────┘  └─────┬──────┘  └─────┬──────┘  │
//! │        │               │               │               │         │
//! │        └───────────────┴───────┬───────┴───────────────┘         │
//! │                                ▼                                 │
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │           collaborator traits (api module)                 │  │
//! │  │   groups · deployments · storage · IPs · NICs · VMs ·      │  │
//! │  │   virtual networks · async jobs · catalogs                 │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One logical task per call: all polling is sleep-and-retry on the calling
//! task, steps are strictly sequential, and no state is held locally;
//! everything is re-derived from the remote API.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod catalog;
pub mod compute;
pub mod config;
pub mod deploy;
pub mod jobs;
pub mod resolver;
pub mod teardown;

#[cfg(test)]
mod fakes;

pub use api::CloudApis;
pub use catalog::{aggregate_images, aggregate_sizes, ImageAvailability, SizeAvailability};
pub use compute::{ComputeError, ComputeService, NodeHandle, NodeTemplate};
pub use config::OrchestratorConfig;
pub use deploy::{SubmissionOrchestrator, SubmitError};
pub use resolver::DependencyResolver;
pub use teardown::{TeardownError, TeardownOrchestrator, TeardownReport, TeardownStep};

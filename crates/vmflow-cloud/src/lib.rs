//! VMFlow Cloud Infrastructure
//!
//! Provider-neutral pieces shared by VMFlow's cloud backends: the
//! [`CloudProvider`] trait, deletion results, and the local state file that
//! remembers what a previous `vmflow up` created.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   VMFlow CLI                     │
//! │          (vmflow run / up / ops / down)          │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 vmflow-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   trait CloudProvider { ... }             │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ ApplyResult  │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼────────────┐
//! │ vmflow-cloud-azure │
//! │   (ARM REST API)   │
//! └────────────────────┘
//! ```

pub mod action;
pub mod error;
pub mod provider;
pub mod state;

// Re-exports
pub use action::{ActionResult, ApplyResult};
pub use error::{CloudError, Result};
pub use provider::{AuthStatus, CloudProvider};
pub use state::{
    GlobalState, ProviderState, ResourceState, ResourceStatus, StateLock, StateManager,
    resource_key,
};

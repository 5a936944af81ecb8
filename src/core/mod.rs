// Public modules
pub mod credentials;
pub mod defaults;
pub mod deploy;
pub mod error;
pub mod harness;
pub mod keychain;
pub mod paths;
pub mod pg;
pub mod registry;
pub mod report;
pub mod runner;
pub mod session;
pub mod target;
pub mod tty;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use registry::RegistryState;
pub use report::{RunReport, TargetReport, TestFailure, TestOutcome};
pub use runner::{RecipeOptions, RecipeRunner, TargetFilter};
pub use session::{Connection, Connector, LifecycleSession, SessionPlan, SessionState};
pub use target::{TargetConfig, TargetDescriptor};

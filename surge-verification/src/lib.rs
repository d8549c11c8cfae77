//! Verification runs driven by `testr` or `stestr`
//!
//! [`TestrContextPlugin`] builds the runner command line for a run and
//! publishes it into the run context; [`TestrLauncher`] initialises the
//! test repository, lists tests and spawns the runner.

pub mod context;
pub mod error;
pub mod launcher;
pub mod manager;
pub mod run_args;
pub mod skip;

pub use context::{build_command, register_testr_context, TestrContext, TestrContextPlugin, TESTR_CONTEXT, TESTR_ORDER};
pub use error::{VerificationError, VerificationResult};
pub use launcher::{is_test_name, TestrLauncher};
pub use manager::VerifierManager;
pub use run_args::RunArgs;
pub use skip::{expand_skip_list, SkipList};

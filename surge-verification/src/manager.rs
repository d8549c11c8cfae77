//! Seam between the testr context and the verifier driving it

use async_trait::async_trait;

use crate::error::VerificationResult;
use crate::run_args::RunArgs;

/// What the testr context needs from the verifier it runs for
#[async_trait]
pub trait VerifierManager: Send + Sync {
    /// `true` for `testr`, `false` for `stestr`
    fn uses_testr(&self) -> bool;

    /// Adjust the run arguments before the command is built
    fn prepare_run_args(&self, run_args: RunArgs) -> RunArgs {
        run_args
    }

    /// Ids of all tests matching `pattern`; an empty pattern lists everything
    async fn list_tests(&self, pattern: &str) -> VerificationResult<Vec<String>>;
}

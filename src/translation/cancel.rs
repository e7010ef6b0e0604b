/*!
 * Cooperative cancellation signal.
 *
 * A one-shot broadcast flag carrying the reason of the first writer. It is
 * passed explicitly from the pipeline down to the client's retry loop; once
 * raised it is never lowered and later `cancel` calls are no-ops.
 */

use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// Origin of a cancellation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// The user asked to stop
    User,
    /// The server answered with a hard-stop status
    HardStop(String),
    /// The monthly character quota is used up
    QuotaReached { used: u64, limit: u64 },
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::User => write!(f, "Cancelled by user"),
            CancelReason::HardStop(message) => write!(f, "{}", message),
            CancelReason::QuotaReached { used, limit } => {
                write!(f, "Monthly character limit reached ({} of {} characters used)", used, limit)
            }
        }
    }
}

/// Shared, clonable cancellation signal
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns true only for the call that actually won.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        let won = self.reason.set(reason).is_ok();
        self.token.cancel();
        won
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Reason recorded by the first writer
    pub fn reason(&self) -> Option<&CancelReason> {
        self.reason.get()
    }

    /// Resolves once the signal is raised
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

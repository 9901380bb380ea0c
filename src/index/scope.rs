use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::IndexError;

/// Deadline and cancellation shared by every sub-query of one request.
#[derive(Debug, Clone)]
pub struct RequestScope {
    token: CancellationToken,
    deadline: Instant,
    budget: Duration,
}

impl RequestScope {
    pub fn new(budget: Duration) -> Self {
        Self::with_token(CancellationToken::new(), budget)
    }

    /// Bind the scope to an externally owned token, e.g. one cancelled when
    /// the client disconnects.
    pub fn with_token(token: CancellationToken, budget: Duration) -> Self {
        Self {
            token,
            deadline: Instant::now() + budget,
            budget,
        }
    }

    /// A scope that is cancelled with its parent and never outlives its
    /// parent's deadline.
    pub fn child(&self, budget: Duration) -> Self {
        let deadline = (Instant::now() + budget).min(self.deadline);
        Self {
            token: self.token.child_token(),
            deadline,
            budget,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `fut` until it finishes, the deadline passes or the token is
    /// cancelled. In the latter two cases `fut` is dropped, which cancels
    /// every sub-query it was still awaiting.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, IndexError>
    where
        F: Future<Output = Result<T, IndexError>>,
    {
        if self.token.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                warn!("request cancelled; dropping in-flight queries");
                Err(IndexError::Cancelled)
            }
            res = tokio::time::timeout_at(self.deadline, fut) => match res {
                Ok(inner) => inner,
                Err(_) => {
                    warn!(budget = ?self.budget, "request deadline exceeded; dropping in-flight queries");
                    Err(IndexError::DeadlineExceeded(self.budget))
                }
            },
        }
    }
}

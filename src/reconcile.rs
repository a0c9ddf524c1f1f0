//! Reconciliation barrier.
//!
//! The storefront's rendered state lags its writes by an unspecified amount,
//! so after mutating, the client view is forced back to the authoritative
//! source (for a page, a full reload), re-read, and compared against the
//! intended target. A disagreement is an error, never a warning.

use std::fmt::Debug;
use std::future::Future;

use tracing::debug;

use crate::{HarnessError, Result};

/// Refresh, re-read, and compare against `expected`.
///
/// Returns the observed value when it equals `expected`; otherwise the error
/// built by `mismatch(expected, observed)`.
pub async fn reconcile<T, R, RF, Q, QF, M>(
    expected: &T,
    refresh: R,
    read: Q,
    mismatch: M,
) -> Result<T>
where
    T: PartialEq + Debug,
    R: FnOnce() -> RF,
    RF: Future<Output = Result<()>>,
    Q: FnOnce() -> QF,
    QF: Future<Output = Result<T>>,
    M: FnOnce(&T, T) -> HarnessError,
{
    refresh().await?;
    let observed = read().await?;
    debug!(?expected, ?observed, "reconciled against refreshed state");
    if &observed == expected {
        Ok(observed)
    } else {
        Err(mismatch(expected, observed))
    }
}

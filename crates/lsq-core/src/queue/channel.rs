//! Outcome Channel: single-assignment result slot.
//!
//! Design intent:
//! - `OnceLock::set` is the only write primitive, so the first writer wins and
//!   every later attempt is a silent no-op.
//! - Readers park on a `Notify` and re-check the slot, no lock is held across
//!   an await.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use tokio::sync::Notify;

use crate::domain::{Outcome, OutcomeKind};

#[derive(Debug, Default)]
struct Slot {
    value: OnceLock<Outcome>,
    notify: Notify,
}

impl Slot {
    async fn wait(&self) -> Outcome {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // 先に waiter として登録してから slot を見る（取りこぼし防止）
            notified.as_mut().enable();

            if let Some(outcome) = self.value.get() {
                return outcome.clone();
            }
            notified.await;
        }
    }
}

/// Writer side, held by the dispatch unit and its cancellation watcher.
#[derive(Debug, Clone)]
pub struct OutcomeChannel {
    slot: Arc<Slot>,
}

/// Reader side, handed to whoever awaits the request.
///
/// Cloning gives another reader of the same slot.
#[derive(Debug, Clone)]
pub struct OutcomeFuture {
    slot: Arc<Slot>,
}

/// Create a connected writer/reader pair.
pub fn outcome_channel() -> (OutcomeChannel, OutcomeFuture) {
    let slot = Arc::new(Slot::default());
    (
        OutcomeChannel {
            slot: Arc::clone(&slot),
        },
        OutcomeFuture { slot },
    )
}

impl OutcomeChannel {
    /// Try to move the slot from pending to `outcome`.
    ///
    /// Returns `true` if this call set the value, `false` if another writer got
    /// there first (in which case `outcome` is discarded).
    pub fn resolve(&self, outcome: Outcome) -> bool {
        let won = self.slot.value.set(outcome).is_ok();
        if won {
            self.slot.notify.notify_waiters();
        }
        won
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.value.get().is_some()
    }

    /// Wait for the terminal value, whoever set it.
    pub async fn observe(&self) -> Outcome {
        self.slot.wait().await
    }

    pub fn future(&self) -> OutcomeFuture {
        OutcomeFuture {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl OutcomeFuture {
    pub async fn wait(&self) -> Outcome {
        self.slot.wait().await
    }

    pub fn try_get(&self) -> Option<Outcome> {
        self.slot.value.get().cloned()
    }

    pub fn kind(&self) -> Option<OutcomeKind> {
        self.slot.value.get().map(Outcome::kind)
    }
}

impl IntoFuture for OutcomeFuture {
    type Output = Outcome;
    type IntoFuture = Pin<Box<dyn Future<Output = Outcome> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.slot.wait().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CancelReason, DispatchError, Response};
    use std::time::Duration;

    #[tokio::test]
    async fn first_writer_wins() {
        let (tx, rx) = outcome_channel();

        assert!(tx.resolve(Outcome::Completed(Response::NoValue)));
        assert!(!tx.resolve(Outcome::Canceled(CancelReason::RequestCancelled)));
        assert!(!tx.resolve(Outcome::Failed(DispatchError::Abandoned {
            method: "m".into()
        })));

        assert_eq!(rx.await, Outcome::Completed(Response::NoValue));
    }

    #[tokio::test]
    async fn reader_wakes_when_resolved_later() {
        let (tx, rx) = outcome_channel();

        let reader = tokio::spawn(rx.clone().into_future());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_get().is_none());

        tx.resolve(Outcome::Canceled(CancelReason::ContentModified));
        let outcome = reader.await.unwrap();
        assert_eq!(outcome, Outcome::Canceled(CancelReason::ContentModified));
        assert_eq!(rx.kind(), Some(OutcomeKind::Canceled));
    }

    #[tokio::test]
    async fn concurrent_writers_agree_on_one_value() {
        let (tx, rx) = outcome_channel();

        let mut writers = Vec::new();
        for i in 0..16 {
            let tx = tx.clone();
            writers.push(tokio::spawn(async move {
                let outcome = if i % 2 == 0 {
                    Outcome::Completed(Response::Value(serde_json::json!(i)))
                } else {
                    Outcome::Canceled(CancelReason::RequestCancelled)
                };
                tx.resolve(outcome)
            }));
        }

        let mut wins = 0;
        for w in writers {
            if w.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);

        let first = rx.wait().await;
        let second = rx.wait().await;
        assert_eq!(first, second);
        assert_eq!(rx.try_get(), Some(first));
    }
}

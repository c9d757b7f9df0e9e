// src/selection.rs
//! Transient "selected item" highlight shared by the map and list consumers.
//!
//! Two states: `Idle` and `Selected { id, epoch }`. Every selection arms a
//! fresh expiry timer and aborts the previous one. Expiries carry the epoch
//! they were armed for, so one that slipped through before the abort landed
//! is still a no-op.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

/// Highlight lifetime, measured from the moment of selection.
pub const SELECTION_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Selected { id: String, epoch: u64 },
}

/// Posted by an expiry timer when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionExpired {
    pub epoch: u64,
}

#[derive(Debug)]
pub struct SelectionCoordinator {
    state: SelectionState,
    next_epoch: u64,
    timer: Option<JoinHandle<()>>,
    timeout: Duration,
    expiry_tx: mpsc::UnboundedSender<SelectionExpired>,
}

impl SelectionCoordinator {
    /// Returns the coordinator and the receiver its timers post expiries to.
    /// The owner feeds everything received there back into [`Self::expire`].
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SelectionExpired>) {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            state: SelectionState::Idle,
            next_epoch: 1,
            timer: None,
            timeout: SELECTION_TIMEOUT,
            expiry_tx,
        };
        (coordinator, expiry_rx)
    }

    /// Enter `Selected(id)` and arm a new timer. Must run inside a tokio runtime.
    pub fn select(&mut self, id: String) -> u64 {
        self.cancel_timer();

        let epoch = self.next_epoch;
        self.next_epoch += 1;

        let tx = self.expiry_tx.clone();
        let timeout = self.timeout;
        self.timer = Some(tokio::spawn(async move {
            time::sleep(timeout).await;
            // receiver gone means the owner shut down
            let _ = tx.send(SelectionExpired { epoch });
        }));

        debug!(target: "selection", %id, epoch, "selected");
        self.state = SelectionState::Selected { id, epoch };
        epoch
    }

    /// Returns true if this expiry cleared the active selection.
    pub fn expire(&mut self, ev: SelectionExpired) -> bool {
        match &self.state {
            SelectionState::Selected { epoch, .. } if *epoch == ev.epoch => {
                debug!(target: "selection", epoch = ev.epoch, "selection expired");
                self.timer = None;
                self.state = SelectionState::Idle;
                true
            }
            _ => {
                debug!(target: "selection", epoch = ev.epoch, "stale expiry ignored");
                false
            }
        }
    }

    pub fn selected(&self) -> Option<&str> {
        match &self.state {
            SelectionState::Selected { id, .. } => Some(id.as_str()),
            SelectionState::Idle => None,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

impl Drop for SelectionCoordinator {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expires_after_timeout() {
        let (mut sel, mut rx) = SelectionCoordinator::new();
        let epoch = sel.select("A".into());
        assert_eq!(sel.selected(), Some("A"));

        time::sleep(Duration::from_millis(2999)).await;
        assert!(rx.try_recv().is_err());

        let ev = rx.recv().await.expect("timer fired");
        assert_eq!(ev.epoch, epoch);
        assert!(sel.expire(ev));
        assert_eq!(sel.state(), &SelectionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn superseding_selection_aborts_previous_timer() {
        let (mut sel, mut rx) = SelectionCoordinator::new();
        sel.select("A".into());
        time::sleep(Duration::from_millis(1000)).await;
        sel.select("B".into());

        // A's deadline (t=3000) passes without an expiry being posted
        time::sleep(Duration::from_millis(2500)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(sel.selected(), Some("B"));

        time::sleep(Duration::from_millis(600)).await;
        let ev = rx.recv().await.expect("B's timer fired");
        assert!(sel.expire(ev));
        assert_eq!(sel.selected(), None);
    }

    #[tokio::test]
    async fn stale_or_idle_expiries_are_noops() {
        let (mut sel, _rx) = SelectionCoordinator::new();
        assert!(!sel.expire(SelectionExpired { epoch: 1 }));
        assert_eq!(sel.state(), &SelectionState::Idle);

        let first = sel.select("A".into());
        let second = sel.select("B".into());
        assert!(second > first);
        assert!(!sel.expire(SelectionExpired { epoch: first }));
        assert_eq!(sel.selected(), Some("B"));
    }
}

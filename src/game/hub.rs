//! game::hub
//!
//! Per-branch fan-out of new commits to live observers.
//!
//! # Model
//!
//! Each `(branch, observer)` pair owns one bounded channel. Publishing sends
//! the commit to every channel registered for that branch. A full channel
//! either stalls the publisher or skips that observer, depending on the
//! configured [`Backpressure`]. Publishing never fails the mutation that
//! triggered it.
//!
//! Registration is explicit: [`Hub::unsubscribe`] removes a pair and is a
//! no-op for unknown pairs. A pair whose receiver has been dropped can be
//! registered again without unsubscribing first.
//!
//! The registry sits behind its own short-lived mutex, never held across an
//! await. Each registration carries a cancellation token, so unsubscribing
//! also aborts a publish that is blocked on that observer's full channel.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::commit::Commit;
use super::errors::GameError;
use crate::core::config::Backpressure;
use crate::core::types::{BranchName, ObserverId};

/// A live registration handed to an observer.
#[derive(Debug)]
pub struct Subscription {
    branch: BranchName,
    observer: ObserverId,
    receiver: mpsc::Receiver<Commit>,
}

impl Subscription {
    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    pub fn observer(&self) -> &ObserverId {
        &self.observer
    }

    /// Wait for the next commit. `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<Commit> {
        self.receiver.recv().await
    }

    /// Take the next commit if one is already queued.
    pub fn try_recv(&mut self) -> Option<Commit> {
        self.receiver.try_recv().ok()
    }

    pub fn into_receiver(self) -> mpsc::Receiver<Commit> {
        self.receiver
    }
}

/// Delivery counts for one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    /// Skipped because the channel was full (drop policy only).
    pub dropped: usize,
    /// Skipped because the receiver is gone.
    pub closed: usize,
    /// Skipped because the observer unsubscribed mid-publish.
    pub cancelled: usize,
}

#[derive(Debug, Clone)]
struct Registration {
    sender: mpsc::Sender<Commit>,
    cancel: CancellationToken,
}

type Registry = HashMap<BranchName, HashMap<ObserverId, Registration>>;

enum Delivery {
    Sent,
    Full,
    Closed,
    Cancelled,
}

/// Registry of observer channels, keyed by branch then observer.
#[derive(Debug)]
pub struct Hub {
    capacity: usize,
    backpressure: Backpressure,
    observers: Mutex<Registry>,
}

impl Hub {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize, backpressure: Backpressure) -> Self {
        Self {
            capacity: capacity.max(1),
            backpressure,
            observers: Mutex::new(HashMap::new()),
        }
    }

    // no update panics halfway, so a poisoned map is still whole
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `observer` on `branch`.
    ///
    /// # Errors
    ///
    /// [`GameError::ObserverExists`] if the pair is registered and its
    /// receiver is still alive.
    pub fn subscribe(
        &self,
        branch: &BranchName,
        observer: &ObserverId,
    ) -> Result<Subscription, GameError> {
        let mut registry = self.registry();
        let channels = registry.entry(branch.clone()).or_default();
        if let Some(existing) = channels.get(observer) {
            if !existing.sender.is_closed() {
                return Err(GameError::ObserverExists {
                    branch: branch.to_string(),
                    observer: observer.to_string(),
                });
            }
            debug!(%branch, %observer, "replacing closed observer channel");
            existing.cancel.cancel();
        }

        let (sender, receiver) = mpsc::channel(self.capacity);
        channels.insert(
            observer.clone(),
            Registration {
                sender,
                cancel: CancellationToken::new(),
            },
        );
        debug!(%branch, %observer, "observer subscribed");

        Ok(Subscription {
            branch: branch.clone(),
            observer: observer.clone(),
            receiver,
        })
    }

    /// Remove a registration. Returns whether one existed.
    ///
    /// A publish currently waiting on this observer's channel gives up on it.
    pub fn unsubscribe(&self, branch: &BranchName, observer: &ObserverId) -> bool {
        let mut registry = self.registry();
        let Some(channels) = registry.get_mut(branch) else {
            return false;
        };
        let removed = channels.remove(observer);
        if channels.is_empty() {
            registry.remove(branch);
        }
        drop(registry);

        match removed {
            Some(registration) => {
                registration.cancel.cancel();
                debug!(%branch, %observer, "observer unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Number of observers registered on `branch`.
    pub fn observer_count(&self, branch: &BranchName) -> usize {
        self.registry().get(branch).map_or(0, HashMap::len)
    }

    /// Send `commit` to every observer of `branch`.
    ///
    /// Works on a snapshot of the registrations, so the registry is free
    /// while a send waits for capacity.
    pub async fn publish(&self, branch: &BranchName, commit: &Commit) -> PublishReport {
        let targets: Vec<(ObserverId, Registration)> = {
            let registry = self.registry();
            match registry.get(branch) {
                Some(channels) => channels
                    .iter()
                    .map(|(observer, reg)| (observer.clone(), reg.clone()))
                    .collect(),
                None => return PublishReport::default(),
            }
        };

        let mut report = PublishReport::default();
        for (observer, reg) in targets {
            match self.deliver(&reg, commit).await {
                Delivery::Sent => report.delivered += 1,
                Delivery::Full => {
                    warn!(%branch, %observer, commit = %commit.id.short(7), "observer channel full, dropping notification");
                    report.dropped += 1;
                }
                Delivery::Closed => {
                    debug!(%branch, %observer, "observer receiver is gone, skipping");
                    report.closed += 1;
                }
                Delivery::Cancelled => {
                    debug!(%branch, %observer, "observer unsubscribed during publish");
                    report.cancelled += 1;
                }
            }
        }
        report
    }

    async fn deliver(&self, reg: &Registration, commit: &Commit) -> Delivery {
        if reg.cancel.is_cancelled() {
            return Delivery::Cancelled;
        }
        match self.backpressure {
            Backpressure::Block => tokio::select! {
                biased;
                _ = reg.cancel.cancelled() => Delivery::Cancelled,
                sent = reg.sender.send(commit.clone()) => match sent {
                    Ok(()) => Delivery::Sent,
                    Err(_) => Delivery::Closed,
                },
            },
            Backpressure::Drop => match reg.sender.try_send(commit.clone()) {
                Ok(()) => Delivery::Sent,
                Err(TrySendError::Full(_)) => Delivery::Full,
                Err(TrySendError::Closed(_)) => Delivery::Closed,
            },
        }
    }
}

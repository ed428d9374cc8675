use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use super::{Advice, AdviceRequest, AdvisoryClient, advise_or_placeholder};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1_500);

#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome {
    Delivered(Advice),
    /// A newer submission arrived before this one could be stored.
    Superseded,
}

/// Holds the most recent advice and debounces bursts of submissions.
///
/// Every submission takes a ticket. After the debounce it only fires if its ticket is still the
/// newest, and its answer is only stored if no newer ticket was issued while it was in flight.
pub struct AdviceSlot {
    debounce: Duration,
    generation: AtomicU64,
    latest: RwLock<Option<Advice>>,
}

impl AdviceSlot {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            generation: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    pub async fn submit(&self, client: &dyn AdvisoryClient, request: &AdviceRequest) -> SlotOutcome {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.debounce).await;
        if !self.is_current(ticket) {
            debug!(ticket, "advice request superseded during debounce");
            return SlotOutcome::Superseded;
        }

        let advice = advise_or_placeholder(client, request).await;

        let mut latest = self.latest.write().await;
        if !self.is_current(ticket) {
            debug!(ticket, "discarding advice from superseded request");
            return SlotOutcome::Superseded;
        }
        *latest = Some(advice.clone());
        SlotOutcome::Delivered(advice)
    }

    pub async fn latest(&self) -> Option<Advice> {
        self.latest.read().await.clone()
    }
}

impl Default for AdviceSlot {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Single-flight gate for every network operation in the pipeline.
///
/// At most one token is alive at a time. `acquire` cancels whatever was
/// outstanding before handing out a fresh token — last caller wins, there is
/// no queue. Adapters must observe the token at every await point so a
/// superseded call resolves with `Cancelled` within one read boundary.
#[derive(Debug, Default)]
pub struct Coordinator {
    slot: Mutex<Slot>,
}

#[derive(Debug, Default)]
struct Slot {
    seq: u64,
    live: Option<(u64, CancellationToken)>,
}

/// Handle for one in-flight operation. Carries the token the adapter must
/// honor plus the sequence id `release` uses to avoid clearing a successor's
/// token.
#[derive(Debug)]
pub struct Flight {
    token: CancellationToken,
    id: u64,
}

impl Flight {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a fresh token, cancelling the previous one first. Infallible.
    pub fn acquire(&self) -> Flight {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, old)) = slot.live.take() {
            tracing::debug!("superseding in-flight operation");
            old.cancel();
        }
        slot.seq += 1;
        let token = CancellationToken::new();
        slot.live = Some((slot.seq, token.clone()));
        Flight {
            token,
            id: slot.seq,
        }
    }

    /// Clear the held token on completion. A no-op when a newer `acquire`
    /// already replaced this flight's token.
    pub fn release(&self, flight: &Flight) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.live.as_ref().is_some_and(|(id, _)| *id == flight.id) {
            slot.live = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_cancels_previous_token() {
        let coordinator = Coordinator::new();
        let first = coordinator.acquire();
        assert!(!first.token().is_cancelled());

        let second = coordinator.acquire();
        assert!(first.token().is_cancelled());
        assert!(!second.token().is_cancelled());
    }

    #[test]
    fn release_clears_own_flight_only() {
        let coordinator = Coordinator::new();
        let first = coordinator.acquire();
        let second = coordinator.acquire();

        // Releasing the superseded flight must not touch the live token.
        coordinator.release(&first);
        assert!(!second.token().is_cancelled());
        let third = coordinator.acquire();
        assert!(second.token().is_cancelled());

        coordinator.release(&third);
        let fourth = coordinator.acquire();
        assert!(!fourth.token().is_cancelled());
    }
}

//! Round-robin turn order for flipping tiles.

use std::time::Duration;

use snatch_protocol::PlayerId;
use snatch_timer::Deadline;

/// Tracks whose turn it is to flip.
///
/// The index is always read modulo the seat count, so seats can come and
/// go without clamping it. Inactive seats are skipped on read.
#[derive(Debug, Clone)]
pub struct TurnTracker {
    index: usize,
    expiry: Deadline,
    timeout: Duration,
}

impl TurnTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            index: 0,
            expiry: Deadline::new(),
            timeout,
        }
    }

    /// Seat position of the current player: the first active seat at or
    /// after the index.
    fn position(
        &self,
        order: &[PlayerId],
        is_active: impl Fn(PlayerId) -> bool,
    ) -> Option<usize> {
        let len = order.len();
        (0..len)
            .map(|offset| (self.index + offset) % len)
            .find(|&seat| is_active(order[seat]))
    }

    /// Whose turn it is, `None` when nobody is active.
    pub fn current(
        &self,
        order: &[PlayerId],
        is_active: impl Fn(PlayerId) -> bool,
    ) -> Option<PlayerId> {
        self.position(order, is_active).map(|seat| order[seat])
    }

    /// Moves to the next active player after the current one and returns
    /// them. With no active players the index is left alone.
    pub fn advance(
        &mut self,
        order: &[PlayerId],
        is_active: impl Fn(PlayerId) -> bool,
    ) -> Option<PlayerId> {
        let current = self.position(order, &is_active)?;
        let len = order.len();
        let next = (1..=len)
            .map(|offset| (current + offset) % len)
            .find(|&seat| is_active(order[seat]))?;
        self.index = next;
        Some(order[next])
    }

    /// Hands the turn to `player` directly. No-op if they have no seat.
    pub fn set_to(&mut self, order: &[PlayerId], player: PlayerId) -> bool {
        match order.iter().position(|&p| p == player) {
            Some(seat) => {
                self.index = seat;
                true
            }
            None => false,
        }
    }

    /// Starts (or restarts) the turn clock.
    pub fn arm(&mut self) {
        self.expiry.arm(self.timeout);
    }

    pub fn disarm(&mut self) {
        self.expiry.disarm();
    }

    pub fn deadline(&self) -> &Deadline {
        &self.expiry
    }
}

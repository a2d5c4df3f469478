//! The claim lock ("pause"): a single-holder gate over word claims.
//!
//! A player takes the lock, then claims or steals, then releases it. If
//! they never release it, it expires on its own.

use std::time::Duration;

use snatch_protocol::PlayerId;
use snatch_timer::Deadline;

#[derive(Debug, Clone)]
pub struct ClaimLock {
    holder: Option<PlayerId>,
    expiry: Deadline,
    timeout: Duration,
}

impl ClaimLock {
    pub fn new(timeout: Duration) -> Self {
        Self {
            holder: None,
            expiry: Deadline::new(),
            timeout,
        }
    }

    /// Takes the lock if nobody holds it. A second acquire by the holder
    /// is rejected too, and does not extend the expiry.
    pub fn acquire(&mut self, player: PlayerId) -> bool {
        if self.holder.is_some() {
            return false;
        }
        self.holder = Some(player);
        self.expiry.arm(self.timeout);
        true
    }

    /// Releases the lock if `player` holds it.
    pub fn release(&mut self, player: PlayerId) -> bool {
        if self.holder != Some(player) {
            return false;
        }
        self.clear();
        true
    }

    /// Called when the expiry deadline fires. Returns the evicted holder.
    pub fn expire(&mut self) -> Option<PlayerId> {
        let holder = self.holder.take();
        self.expiry.disarm();
        holder
    }

    /// Drops the holder, if any, and cancels the expiry.
    pub fn clear(&mut self) {
        self.holder = None;
        self.expiry.disarm();
    }

    pub fn holder(&self) -> Option<PlayerId> {
        self.holder
    }

    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    pub fn is_held_by(&self, player: PlayerId) -> bool {
        self.holder == Some(player)
    }

    pub fn deadline(&self) -> &Deadline {
        &self.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock() -> ClaimLock {
        ClaimLock::new(Duration::from_secs(30))
    }

    #[test]
    fn test_acquire_arms_expiry() {
        let mut lock = lock();
        assert!(lock.acquire(PlayerId(1)));
        assert!(lock.is_held_by(PlayerId(1)));
        assert!(lock.deadline().is_armed());
    }

    #[test]
    fn test_acquire_when_held_is_rejected() {
        let mut lock = lock();
        lock.acquire(PlayerId(1));
        assert!(!lock.acquire(PlayerId(2)));
        assert!(!lock.acquire(PlayerId(1)));
        assert_eq!(lock.holder(), Some(PlayerId(1)));
    }

    #[test]
    fn test_release_by_non_holder_is_rejected() {
        let mut lock = lock();
        lock.acquire(PlayerId(1));
        assert!(!lock.release(PlayerId(2)));
        assert!(lock.is_held());
    }

    #[test]
    fn test_release_disarms_expiry() {
        let mut lock = lock();
        lock.acquire(PlayerId(1));
        assert!(lock.release(PlayerId(1)));
        assert!(!lock.is_held());
        assert!(!lock.deadline().is_armed());
    }

    #[test]
    fn test_expire_evicts_holder() {
        let mut lock = lock();
        lock.acquire(PlayerId(1));
        assert_eq!(lock.expire(), Some(PlayerId(1)));
        assert!(lock.acquire(PlayerId(2)));
    }
}

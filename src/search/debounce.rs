use std::time::Duration;

use tokio::time::Instant;

/// Timer-less debounce state. A value is released once `period` passed without a newer one, and
/// only if it differs from the value released before it.
#[derive(Debug)]
pub struct Debouncer<T> {
    period: Duration,
    pending: Option<(T, Instant)>,
    last_released: Option<T>,
}

impl<T: PartialEq + Clone> Debouncer<T> {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            pending: None,
            last_released: None,
        }
    }

    /// Replaces the pending value and restarts the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.period));
    }

    /// Moment the pending value is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Takes the pending value if it's due. Consecutive duplicates are swallowed.
    pub fn release(&mut self, now: Instant) -> Option<T> {
        match self.pending.take() {
            Some((value, deadline)) if deadline <= now => {
                if self.last_released.as_ref() == Some(&value) {
                    return None;
                }
                self.last_released = Some(value.clone());
                Some(value)
            }
            other => {
                self.pending = other;
                None
            }
        }
    }
}

use crate::scheduler::{CallbackHost, CallbackId};
use std::time::{Duration, Instant};

/// Cooperative callback host polled from the event loop.
///
/// Timeouts fire once their deadline passes. Frame callbacks fire on the
/// next frame boundary, paced at `fps`.
pub(crate) struct FrameClock {
    next_id: u64,
    timeout: Option<(CallbackId, Instant)>,
    frame: Option<CallbackId>,
    frame_dt: Duration,
    last_frame: Instant,
}

impl FrameClock {
    pub(crate) fn new(fps: u32, now: Instant) -> Self {
        Self {
            next_id: 0,
            timeout: None,
            frame: None,
            frame_dt: Duration::from_micros(1_000_000 / u64::from(fps.clamp(10, 240))),
            last_frame: now,
        }
    }

    fn alloc(&mut self) -> CallbackId {
        self.next_id += 1;
        CallbackId(self.next_id)
    }

    fn next_frame_at(&self) -> Instant {
        self.last_frame + self.frame_dt
    }

    /// Takes the callback that is due at `now`, if any.
    pub(crate) fn poll(&mut self, now: Instant) -> Option<CallbackId> {
        if let Some((id, due)) = self.timeout {
            if now >= due {
                self.timeout = None;
                return Some(id);
            }
        }
        if let Some(id) = self.frame {
            if now >= self.next_frame_at() {
                self.frame = None;
                self.last_frame = now;
                return Some(id);
            }
        }
        None
    }

    /// Earliest instant something could fire.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        let t = self.timeout.map(|(_, due)| due);
        let f = self.frame.map(|_| self.next_frame_at());
        match (t, f) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_idle(&self) -> bool {
        self.timeout.is_none() && self.frame.is_none()
    }
}

impl CallbackHost for FrameClock {
    fn set_timeout(&mut self, delay: Duration) -> CallbackId {
        let id = self.alloc();
        self.timeout = Some((id, Instant::now() + delay));
        id
    }

    fn clear_timeout(&mut self, id: CallbackId) {
        if matches!(self.timeout, Some((t, _)) if t == id) {
            self.timeout = None;
        }
    }

    fn request_frame(&mut self) -> CallbackId {
        let id = self.alloc();
        self.frame = Some(id);
        id
    }

    fn cancel_frame(&mut self, id: CallbackId) {
        if self.frame == Some(id) {
            self.frame = None;
        }
    }
}

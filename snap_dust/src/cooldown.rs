//! Re-trigger lockout after a detected snap.

/// Timed latch measured in frames.
///
/// `arm(now)` locks the gate until `now + delay`; the gate reopens on the
/// first frame at or past that point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CooldownGate {
    delay_frames: u64,
    until_frame:  Option<u64>,
}

impl CooldownGate {
    pub fn new(delay_frames: u64) -> Self {
        CooldownGate { delay_frames, until_frame: None }
    }

    pub fn delay_frames(&self) -> u64 { self.delay_frames }

    pub fn until_frame(&self) -> Option<u64> { self.until_frame }

    pub fn is_active(&self, now: u64) -> bool {
        matches!(self.until_frame, Some(until) if now < until)
    }

    pub fn arm(&mut self, now: u64) {
        self.until_frame = Some(now.saturating_add(self.delay_frames));
    }

    /// Frames left before the gate reopens.
    pub fn remaining(&self, now: u64) -> u64 {
        self.until_frame.map_or(0, |until| until.saturating_sub(now))
    }

    pub fn clear(&mut self) {
        self.until_frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_gate_is_open() {
        let gate = CooldownGate::new(30);
        assert!(!gate.is_active(0));
        assert_eq!(gate.remaining(0), 0);
    }

    #[test]
    fn armed_gate_locks_for_delay() {
        let mut gate = CooldownGate::new(30);
        gate.arm(100);
        assert!(gate.is_active(100));
        assert!(gate.is_active(129));
        assert_eq!(gate.remaining(120), 10);
        assert!(!gate.is_active(130));
    }

    #[test]
    fn rearming_extends_lock() {
        let mut gate = CooldownGate::new(10);
        gate.arm(0);
        gate.arm(5);
        assert!(gate.is_active(12));
        assert!(!gate.is_active(15));
    }

    #[test]
    fn clear_reopens() {
        let mut gate = CooldownGate::new(10);
        gate.arm(0);
        gate.clear();
        assert!(!gate.is_active(1));
    }
}

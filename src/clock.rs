/// Replay position shared by the TLB and its replacement policy.
///
/// `tick` is the index of the reference currently being replayed.
#[derive(Debug, Default)]
pub struct Clock {
    pub tick: u64,
}

impl Clock {
    pub fn new() -> Self {
        Clock { tick: 0 }
    }

    /// Tick as a slice index. Ticks beyond `usize` saturate, which reads as
    /// past the end of any reference string.
    pub fn index(&self) -> usize {
        usize::try_from(self.tick).unwrap_or(usize::MAX)
    }
}

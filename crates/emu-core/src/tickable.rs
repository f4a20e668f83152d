//! Trait for components that advance one clock cycle at a time.

/// A component driven by the machine clock.
///
/// Each call advances exactly one cycle. Components that need the bus
/// (the CPU, the video chip) take it explicitly instead.
pub trait Tickable {
    fn tick(&mut self);

    /// Advance `count` cycles. Must be identical to calling `tick()`
    /// `count` times.
    fn tick_n(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }
}

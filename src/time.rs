/// Simulation frame counter.
///
/// Time in the simulation advances only through `Simulation::tick`, one
/// frame per call. A frame carries no wall-clock meaning of its own; the
/// caller supplies the real-time delta alongside each tick.

/// The number of a simulation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame(u64);

impl Frame {
    /// The first frame of every simulation.
    pub const ZERO: Frame = Frame(0);

    /// Create a frame from a raw value.
    #[inline]
    pub fn new(frame: u64) -> Self {
        Frame(frame)
    }

    /// Return the raw frame number.
    #[inline]
    pub fn number(self) -> u64 {
        self.0
    }

    /// The frame following this one.
    /// Returns `None` on overflow (should never happen in practice).
    #[inline]
    pub fn next(self) -> Option<Frame> {
        self.0.checked_add(1).map(Frame)
    }

    /// Number of frames elapsed since `earlier`.
    /// Returns `None` if `earlier` is after `self`.
    #[inline]
    pub fn since(self, earlier: Frame) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert_eq!(Frame::ZERO.number(), 0);
    }

    #[test]
    fn test_next() {
        assert_eq!(Frame::new(4).next(), Some(Frame::new(5)));
        assert!(Frame::new(u64::MAX).next().is_none());
    }

    #[test]
    fn test_since() {
        assert_eq!(Frame::new(30).since(Frame::new(10)), Some(20));
        assert_eq!(Frame::new(10).since(Frame::new(30)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Frame::new(42)), "F42");
    }
}

use crate::game::Direction;

/// One-slot direction buffer shared by the key handler and the tick.
///
/// The key side only writes `pending`; the tick side is the only writer of
/// `committed`. Between two ticks the latest accepted request wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadingSlot {
    committed: Option<Direction>,
    pending: Option<Direction>,
}

impl HeadingSlot {
    pub fn new(initial: Option<Direction>) -> Self {
        Self {
            committed: initial,
            pending: None,
        }
    }

    /// Heading used by the last tick, `None` before the first move
    pub fn committed(&self) -> Option<Direction> {
        self.committed
    }

    pub fn pending(&self) -> Option<Direction> {
        self.pending
    }

    /// Offer a direction for the next tick.
    ///
    /// A reversal of the committed heading is dropped and leaves any earlier
    /// pending request in place. Returns whether the request was kept.
    pub fn request(&mut self, direction: Direction) -> bool {
        if self
            .committed
            .is_some_and(|committed| committed.is_opposite(direction))
        {
            return false;
        }

        self.pending = Some(direction);
        true
    }

    /// Consume the pending request, if any, and return the heading to move in
    pub fn commit(&mut self) -> Option<Direction> {
        if let Some(next) = self.pending.take() {
            self.committed = Some(next);
        }
        self.committed
    }

    pub fn reset(&mut self, initial: Option<Direction>) {
        self.committed = initial;
        self.pending = None;
    }
}

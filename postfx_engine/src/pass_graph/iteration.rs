/// Iteration policies for the passes of a group
///
/// A policy is a (direction, range) pair. The plan lists the visited indices
/// in traversal order; neighbours are always the array-adjacent indices
/// clamped into `[0, len - 1]`, whatever the direction.

/// Traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Which indices are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Range {
    /// Every index
    #[default]
    All,
    /// Every index but 0
    SkipFirst,
    /// Every index but the last
    SkipLast,
}

/// (direction, range) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IterationPolicy {
    pub direction: Direction,
    pub range: Range,
}

impl IterationPolicy {
    pub fn new(direction: Direction, range: Range) -> Self {
        Self { direction, range }
    }
}

/// Visited indices of an N-pass group, in traversal order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationPlan {
    order: Vec<usize>,
    len: usize,
}

impl IterationPlan {
    pub fn new(policy: IterationPolicy, len: usize) -> Self {
        let (first, end) = match policy.range {
            Range::All => (0, len),
            Range::SkipFirst => (1.min(len), len),
            Range::SkipLast => (0, len.saturating_sub(1)),
        };

        let mut order: Vec<usize> = (first..end).collect();
        if policy.direction == Direction::Backward {
            order.reverse();
        }

        Self { order, len }
    }

    /// Visited indices in traversal order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Index whose target becomes the group output
    ///
    /// Highest visited index going forward, lowest going backward; `None`
    /// when nothing is visited.
    pub fn terminal(&self) -> Option<usize> {
        self.order.last().copied()
    }

    /// Clamped array neighbours (prev, next) of `index`
    pub fn neighbours(&self, index: usize) -> (usize, usize) {
        neighbours(index, self.len)
    }
}

/// Clamped array neighbours (prev, next) of `index` in a `len`-element array
pub fn neighbours(index: usize, len: usize) -> (usize, usize) {
    let last = len.saturating_sub(1);
    let index = index.min(last);
    (index.saturating_sub(1), (index + 1).min(last))
}

#[cfg(test)]
#[path = "iteration_tests.rs"]
mod tests;

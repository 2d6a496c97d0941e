use crate::Show;

/// The two raw sensor bits an environment reports after every action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SensorReading {
    /// The action moved the environment into a state different from the one it was in.
    pub is_new_state: bool,
    /// The action reached the goal.
    pub is_goal: bool,
}

impl SensorReading {
    /// Creates a reading from the raw bits.
    pub fn new(is_new_state: bool, is_goal: bool) -> Self {
        Self {
            is_new_state,
            is_goal,
        }
    }

    /// Folds the two bits into a [`SensorEncoding`].
    pub fn encode(self) -> SensorEncoding {
        SensorEncoding::from(self)
    }
}

/// Three-way classification of a [`SensorReading`]. `Goal` dominates `TransitionOnly`, which in turn
/// dominates `NoTransition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SensorEncoding {
    /// Neither bit was set.
    #[default]
    NoTransition,
    /// The state changed but the goal was not reached.
    TransitionOnly,
    /// The goal was reached.
    Goal,
}

impl SensorEncoding {
    /// Returns true for [`SensorEncoding::Goal`].
    pub fn is_goal(self) -> bool {
        matches!(self, SensorEncoding::Goal)
    }
}

impl From<SensorReading> for SensorEncoding {
    fn from(reading: SensorReading) -> Self {
        if reading.is_goal {
            SensorEncoding::Goal
        } else if reading.is_new_state {
            SensorEncoding::TransitionOnly
        } else {
            SensorEncoding::NoTransition
        }
    }
}

impl Show for SensorEncoding {
    fn show(&self) -> String {
        match self {
            SensorEncoding::NoTransition => "0",
            SensorEncoding::TransitionOnly => "1",
            SensorEncoding::Goal => "G",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{SensorEncoding, SensorReading};

    #[test]
    fn goal_dominates() {
        assert_eq!(
            SensorReading::new(true, true).encode(),
            SensorEncoding::Goal
        );
        assert_eq!(
            SensorReading::new(false, true).encode(),
            SensorEncoding::Goal
        );
        assert_eq!(
            SensorReading::new(true, false).encode(),
            SensorEncoding::TransitionOnly
        );
        assert_eq!(
            SensorReading::default().encode(),
            SensorEncoding::NoTransition
        );
    }
}

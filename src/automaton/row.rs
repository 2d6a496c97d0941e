use super::{StateId, GOAL_STATE};

/// The content of a single slot of a [`TransitionRow`], `None` stands for a transition that is not known yet.
pub type Slot = Option<StateId>;

/// A row of the [`HypothesisAutomaton`](super::HypothesisAutomaton), holding one slot per alphabet symbol.
/// Rows are never removed from the table so that state ids stay stable. Instead they are marked as deleted,
/// either because they were merged into another row or because they were discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransitionRow {
    /// A row that takes part in searching, comparing and merging.
    Active(Vec<Slot>),
    /// A row that was removed from the automaton. If it was merged, `merged_into` points to the row that
    /// absorbed it.
    Deleted {
        /// The row that absorbed this one, if any.
        merged_into: Option<StateId>,
    },
}

impl TransitionRow {
    /// Creates a row where every transition is unknown.
    pub fn unknown(symbols: usize) -> Self {
        Self::Active(vec![None; symbols])
    }

    /// Creates the row of the goal state, every symbol leads back to the goal.
    pub fn all_goal(symbols: usize) -> Self {
        Self::Active(vec![Some(GOAL_STATE); symbols])
    }

    /// Returns true if the row has been deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(self, TransitionRow::Deleted { .. })
    }

    /// Gives access to the slots of an active row.
    pub fn slots(&self) -> Option<&[Slot]> {
        match self {
            TransitionRow::Active(slots) => Some(slots),
            TransitionRow::Deleted { .. } => None,
        }
    }

    pub(crate) fn slots_mut(&mut self) -> Option<&mut Vec<Slot>> {
        match self {
            TransitionRow::Active(slots) => Some(slots),
            TransitionRow::Deleted { .. } => None,
        }
    }

    /// The known target on `symbol`. Returns `None` for unknown transitions and for deleted rows.
    pub fn get(&self, symbol: usize) -> Slot {
        self.slots().and_then(|slots| slots.get(symbol).copied().flatten())
    }

    /// Returns true if every slot points to the goal. Such a row stands in for the goal itself.
    pub fn is_all_goal(&self) -> bool {
        self.slots()
            .is_some_and(|slots| slots.iter().all(|s| *s == Some(GOAL_STATE)))
    }

    /// Returns true if the row is active and has at least one unknown transition.
    pub fn has_unknown(&self) -> bool {
        self.slots().is_some_and(|slots| slots.contains(&None))
    }

    /// Iterates over the positions of unknown transitions, nothing for a deleted row.
    pub fn unknown_symbols(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots()
            .into_iter()
            .flat_map(|slots| slots.iter().enumerate())
            .filter_map(|(i, s)| s.is_none().then_some(i))
    }

    /// The lowest symbol that leads to `target`.
    pub fn symbol_to(&self, target: StateId) -> Option<usize> {
        self.slots()?.iter().position(|s| *s == Some(target))
    }

    /// Checks whether two rows could describe the same state. They are compatible if neither is deleted,
    /// neither is an all-goal row and every pair of slots agrees or has at least one unknown side. If
    /// `require_shared_known` is set, additionally one slot has to be known and equal in both rows.
    pub fn is_compatible(&self, other: &TransitionRow, require_shared_known: bool) -> bool {
        let (Some(left), Some(right)) = (self.slots(), other.slots()) else {
            return false;
        };
        if self.is_all_goal() || other.is_all_goal() {
            return false;
        }

        let mut shared_known = !require_shared_known;
        for (l, r) in left.iter().zip(right) {
            match (l, r) {
                (Some(l), Some(r)) if l != r => return false,
                (Some(_), Some(_)) => shared_known = true,
                _ => {}
            }
        }
        shared_known
    }
}

#[cfg(test)]
mod tests {
    use super::TransitionRow;

    fn row(slots: &[Option<usize>]) -> TransitionRow {
        TransitionRow::Active(slots.to_vec())
    }

    #[test]
    fn deleted_and_goal_rows_are_incompatible() {
        let goal = TransitionRow::all_goal(2);
        let fresh = TransitionRow::unknown(2);
        let deleted = TransitionRow::Deleted { merged_into: None };
        assert!(!goal.is_compatible(&fresh, false));
        assert!(!deleted.is_compatible(&fresh, false));
        assert!(fresh.is_compatible(&fresh, false));
    }

    #[test]
    fn shared_known_slot_is_required_on_demand() {
        let left = row(&[Some(2), None]);
        let right = row(&[None, Some(3)]);
        assert!(left.is_compatible(&right, false));
        assert!(!left.is_compatible(&right, true));

        let right = row(&[Some(2), Some(3)]);
        assert!(left.is_compatible(&right, true));

        let right = row(&[Some(4), Some(3)]);
        assert!(!left.is_compatible(&right, false));
    }

    #[test]
    fn unknown_slots() {
        let r = row(&[None, Some(1), None]);
        assert!(r.has_unknown());
        assert_eq!(r.unknown_symbols().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(r.symbol_to(1), Some(1));
        assert_eq!(r.get(0), None);
        assert_eq!(
            TransitionRow::Deleted { merged_into: Some(1) }
                .unknown_symbols()
                .count(),
            0
        );
    }
}

use itertools::Itertools;
use owo_colors::OwoColorize;
use tracing::{debug, trace};

use crate::{alphabet::CharAlphabet, sensor::SensorEncoding, Show};

mod row;
pub use row::{Slot, TransitionRow};

/// Identifies a row of the [`HypothesisAutomaton`]. Ids are handed out in increasing order and never reused.
pub type StateId = usize;

/// The terminal goal state. It is never merged and never deleted.
pub const GOAL_STATE: StateId = 0;
/// The state the agent believes to be in right after reaching the goal.
pub const INIT_STATE: StateId = 1;

/// Outcome of folding one observed transition into the automaton, see
/// [`HypothesisAutomaton::record_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    /// The state the transition leads to according to the automaton.
    pub target: StateId,
    /// Whether `target` was allocated for this transition.
    pub created: bool,
}

impl Recorded {
    /// The state the agent believes to be in after the transition. Reaching the goal teleports the agent
    /// back to [`INIT_STATE`].
    pub fn belief(&self) -> StateId {
        if self.target == GOAL_STATE {
            INIT_STATE
        } else {
            self.target
        }
    }
}

/// The agent's partial model of the environment, a transition table indexed by [`StateId`] with one slot
/// per alphabet symbol. Rows 0 ([`GOAL_STATE`]) and 1 ([`INIT_STATE`]) exist from the start. New rows are
/// allocated whenever an unknown transition is taken, rows disappear only by being marked deleted, so the
/// table behaves like an arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HypothesisAutomaton {
    alphabet: CharAlphabet,
    rows: Vec<TransitionRow>,
}

impl HypothesisAutomaton {
    /// Creates the automaton that only knows the goal and the initial state.
    pub fn new(alphabet: CharAlphabet) -> Self {
        let symbols = alphabet.size();
        Self {
            alphabet,
            rows: vec![
                TransitionRow::all_goal(symbols),
                TransitionRow::unknown(symbols),
            ],
        }
    }

    /// Builds an automaton from explicit slots, one vector per state. The first row has to be the goal row.
    pub fn from_rows<I>(alphabet: CharAlphabet, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Slot>>,
    {
        let rows = rows.into_iter().map(TransitionRow::Active).collect_vec();
        assert!(rows.len() >= 2, "goal and initial row must exist");
        assert!(
            rows.iter()
                .all(|r| r.slots().is_some_and(|s| s.len() == alphabet.size())),
            "every row needs one slot per symbol"
        );
        assert!(rows[GOAL_STATE].is_all_goal(), "row 0 must be the goal row");
        Self { alphabet, rows }
    }

    /// The alphabet whose symbols index the slots.
    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    /// Number of rows ever allocated, deleted ones included.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// All rows, indexed by [`StateId`].
    pub fn rows(&self) -> &[TransitionRow] {
        &self.rows
    }

    /// The row of `state`, if it was ever allocated.
    pub fn row(&self, state: StateId) -> Option<&TransitionRow> {
        self.rows.get(state)
    }

    /// Returns true if `state` exists and is not deleted.
    pub fn is_active(&self, state: StateId) -> bool {
        self.row(state).is_some_and(|r| !r.is_deleted())
    }

    /// Iterates over the ids of all rows that are not deleted, in ascending order.
    pub fn active_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(id, row)| (!row.is_deleted()).then_some(id))
    }

    /// The known target of `state` on `symbol`.
    pub fn target(&self, state: StateId, symbol: usize) -> Option<StateId> {
        self.row(state)?.get(symbol)
    }

    /// Follows merge redirections starting at `state` until an active row is found. Returns `None` if
    /// `state` does not exist or its row was discarded rather than merged.
    pub fn representative(&self, mut state: StateId) -> Option<StateId> {
        loop {
            match self.row(state)? {
                TransitionRow::Active(_) => return Some(state),
                TransitionRow::Deleted { merged_into } => state = (*merged_into)?,
            }
        }
    }

    fn add_state(&mut self) -> StateId {
        self.rows.push(TransitionRow::unknown(self.alphabet.size()));
        self.rows.len() - 1
    }

    /// Folds the transition from `from` on `symbol` with the observed `sensor` into the table. Reaching the
    /// goal sets the slot to [`GOAL_STATE`]. Otherwise a known slot is followed, and an unknown one is filled
    /// with a freshly allocated state. A slot that claims to lead to the goal although the goal was not sensed
    /// is treated as unknown.
    ///
    /// Returns `None` if `from` is not an active row.
    pub fn record_transition(
        &mut self,
        from: StateId,
        symbol: usize,
        sensor: SensorEncoding,
    ) -> Option<Recorded> {
        let known = *self.rows.get(from)?.slots()?.get(symbol)?;
        let recorded = match known {
            _ if sensor.is_goal() => Recorded {
                target: GOAL_STATE,
                created: false,
            },
            Some(target) if target != GOAL_STATE => Recorded {
                target,
                created: false,
            },
            _ => Recorded {
                target: self.add_state(),
                created: true,
            },
        };
        if let Some(slots) = self.rows[from].slots_mut() {
            slots[symbol] = Some(recorded.target);
        }
        if recorded.created {
            trace!("created state {} via {from} -{symbol}->", recorded.target);
        }
        Some(recorded)
    }

    /// Checks whether the rows of `x` and `y` are compatible, see [`TransitionRow::is_compatible`]. Rows
    /// that do not exist are never compatible.
    pub fn is_row_compatible(&self, x: StateId, y: StateId, require_shared_known: bool) -> bool {
        match (self.row(x), self.row(y)) {
            (Some(left), Some(right)) => left.is_compatible(right, require_shared_known),
            _ => false,
        }
    }

    /// Merges `absorb` into `keep`. Transitions only known for `absorb` are copied over, then every reference
    /// to `absorb` is redirected to `keep` and the row of `absorb` is marked deleted.
    ///
    /// Nothing happens (and `false` is returned) if either row is deleted or missing, if both are the same, or
    /// if one of them is the goal state or an all-goal row. In particular merging an already merged pair a
    /// second time is a no-op.
    pub fn merge_states(&mut self, keep: StateId, absorb: StateId) -> bool {
        if keep == absorb || keep == GOAL_STATE || absorb == GOAL_STATE {
            return false;
        }
        let (Some(keep_row), Some(absorb_row)) = (self.row(keep), self.row(absorb)) else {
            return false;
        };
        if keep_row.is_all_goal() || absorb_row.is_all_goal() {
            return false;
        }
        let Some(absorbed) = absorb_row.slots().map(|s| s.to_vec()) else {
            return false;
        };
        let Some(kept) = self.rows[keep].slots_mut() else {
            return false;
        };

        for (k, a) in kept.iter_mut().zip(absorbed) {
            if k.is_none() {
                *k = a;
            }
        }
        self.redirect(absorb, Some(keep));
        self.rows[absorb] = TransitionRow::Deleted {
            merged_into: Some(keep),
        };
        debug!("state {absorb} has been merged into state {keep}");
        true
    }

    /// Marks `state` as deleted without a row that absorbs it and forgets every transition that led to it.
    /// The goal and initial rows are never discarded.
    pub fn discard(&mut self, state: StateId) -> bool {
        if state == GOAL_STATE || state == INIT_STATE || !self.is_active(state) {
            return false;
        }
        self.redirect(state, None);
        self.rows[state] = TransitionRow::Deleted { merged_into: None };
        debug!("discarded state {state}");
        true
    }

    fn redirect(&mut self, from: StateId, to: Slot) {
        for slots in self.rows.iter_mut().filter_map(TransitionRow::slots_mut) {
            for slot in slots.iter_mut().filter(|s| **s == Some(from)) {
                *slot = to;
            }
        }
    }

    /// Repeatedly sweeps over all pairs of rows and merges those that are compatible with a shared known
    /// transition, until a sweep finds nothing to merge. Returns the number of merges performed.
    pub fn saturate(&mut self) -> usize {
        let mut merges = 0;
        loop {
            let mut merged = false;
            for i in 0..self.size() {
                for j in (i + 1)..self.size() {
                    if self.is_row_compatible(i, j, true) && self.merge_states(i, j) {
                        merged = true;
                        merges += 1;
                    }
                }
            }
            if !merged {
                return merges;
            }
        }
    }

    /// Returns true if no active row has an unknown transition.
    pub fn mapping_complete(&self) -> bool {
        !self.rows.iter().any(TransitionRow::has_unknown)
    }

    /// The lowest active state that still has an unknown transition.
    pub fn first_state_with_unknown(&self) -> Option<StateId> {
        self.rows.iter().position(TransitionRow::has_unknown)
    }

    /// Positions of the symbols with unknown transitions from `state`.
    pub fn unknown_symbols(&self, state: StateId) -> Vec<usize> {
        self.row(state)
            .map(|r| r.unknown_symbols().collect())
            .unwrap_or_default()
    }

    /// Renders the table with `belief` highlighted, deleted rows are left out.
    pub fn show_with_belief(&self, belief: Option<StateId>) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string()).chain(self.alphabet.universe().map(|s| s.show())),
        );
        for (id, row) in self.rows.iter().enumerate() {
            let Some(slots) = row.slots() else {
                continue;
            };
            let label = if Some(id) == belief {
                format!("*{id}").bold().to_string()
            } else {
                id.to_string()
            };
            builder.push_record(std::iter::once(label).chain(slots.iter().map(|s| s.show())));
        }
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

impl Show for HypothesisAutomaton {
    fn show(&self) -> String {
        self.show_with_belief(None)
    }
}

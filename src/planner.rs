use std::collections::VecDeque;

use itertools::Itertools;
use thiserror::Error;
use tracing::trace;

use crate::{
    automaton::{HypothesisAutomaton, StateId, GOAL_STATE, INIT_STATE},
    memory::Episode,
    sensor::SensorEncoding,
    Show,
};

/// Reasons for which [`plan_path`] does not produce a [`Plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The table contains no sequence of known transitions from `from` to `to`.
    #[error("no path from state {from} to state {to}")]
    NotFound {
        /// Where the plan should have started.
        from: StateId,
        /// Where the plan should have ended.
        to: StateId,
    },
    /// The plan would consist of fewer than two expected episodes, i.e. it contains no action.
    #[error("plan with {steps} expected episodes is too short")]
    Invalid {
        /// Number of expected episodes.
        steps: usize,
    },
}

/// The outcome of the final step of a [`Plan`] disagrees with what the plan expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "plan expected {} in state {}, but sensed {} in state {actual_state}",
    .expected.sensor.show(),
    .expected.state,
    .actual_sensor.show()
)]
pub struct PlanDivergence {
    /// The terminal episode of the plan.
    pub expected: Episode,
    /// What was sensed after the last action.
    pub actual_sensor: SensorEncoding,
    /// The believed state after the last action.
    pub actual_state: StateId,
}

/// A committed sequence of expected episodes from a start state to a target state, together with a cursor
/// that counts how many of its actions have been executed.
///
/// The `i`-th episode holds the state the agent expects to be in before the `i`-th action, the sensor it expects
/// on arriving there and the command it will issue. The terminal episode has no command; its sensor is
/// [`SensorEncoding::Goal`] for plans that lead to the goal, and its state is where the agent will believe to be
/// at the end, which is [`INIT_STATE`] after reaching the goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<Episode>,
    target: StateId,
    cursor: usize,
}

impl Plan {
    /// Number of actions in the plan. The terminal episode does not count.
    pub fn len(&self) -> usize {
        self.steps.len() - 1
    }

    /// Valid plans contain at least one action, this exists for symmetry with [`Self::len`].
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The expected episodes, terminal episode included.
    pub fn steps(&self) -> &[Episode] {
        &self.steps
    }

    /// The state the plan was computed for.
    pub fn target(&self) -> StateId {
        self.target
    }

    /// Returns true if the plan leads to the goal.
    pub fn leads_to_goal(&self) -> bool {
        self.target == GOAL_STATE
    }

    /// Number of actions executed so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The command to issue next, `None` once every action was executed.
    pub fn next_symbol(&self) -> Option<char> {
        self.steps.get(self.cursor).and_then(|step| step.command)
    }

    /// Moves the cursor past the action that was just executed.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    /// Returns true if all actions were executed.
    pub fn is_at_terminal(&self) -> bool {
        self.cursor == self.len()
    }

    /// The terminal expected episode.
    pub fn terminal(&self) -> &Episode {
        &self.steps[self.len()]
    }

    /// The states the plan passes through, from the start up to the terminal episode.
    pub fn states(&self) -> impl ExactSizeIterator<Item = StateId> + '_ {
        self.steps.iter().map(|step| step.state)
    }

    /// Compares the outcome of the final action with the terminal expectation. Plans that lead to the goal
    /// only check whether the goal was sensed, all other plans check the believed state.
    pub fn check_terminal(
        &self,
        actual_sensor: SensorEncoding,
        actual_state: StateId,
    ) -> Result<(), PlanDivergence> {
        let expected = *self.terminal();
        let diverged = if expected.sensor.is_goal() {
            !actual_sensor.is_goal()
        } else {
            actual_state != expected.state
        };
        if diverged {
            Err(PlanDivergence {
                expected,
                actual_sensor,
                actual_state,
            })
        } else {
            Ok(())
        }
    }
}

impl Show for Plan {
    fn show(&self) -> String {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                if i == self.cursor {
                    format!("[{}]", step.show())
                } else {
                    step.show()
                }
            })
            .join(" ")
    }
}

/// Computes a shortest plan from `start` to `target` with a backward breadth-first search over the known
/// transitions of `automaton`.
///
/// The search labels every state with a symbol string leading from it to `target`, starting with the empty
/// string at `target`. For a dequeued state `s`, every non-deleted row `r` other than `s` that has no string
/// yet and a transition into `s` gets the string of `s` prefixed by the lowest such symbol. Rows are visited in
/// ascending order and the search stops as soon as `start` is labelled. The goal row is never used as a
/// predecessor.
///
/// The resulting string is then simulated forward to obtain the expected episodes, reaching the goal puts the
/// agent back into [`INIT_STATE`]. Asking for a plan from a state to itself yields [`PlanError::Invalid`].
pub fn plan_path(
    automaton: &HypothesisAutomaton,
    start: StateId,
    target: StateId,
) -> Result<Plan, PlanError> {
    let not_found = PlanError::NotFound {
        from: start,
        to: target,
    };
    if !automaton.is_active(start) || !automaton.is_active(target) {
        return Err(not_found);
    }

    let mut strings: Vec<Option<Vec<usize>>> = vec![None; automaton.size()];
    strings[target] = Some(vec![]);
    let mut queue = VecDeque::from([target]);

    'search: while let Some(state) = queue.pop_front() {
        let Some(suffix) = strings[state].clone() else {
            continue;
        };
        for pred in INIT_STATE..automaton.size() {
            if pred == state || strings[pred].is_some() {
                continue;
            }
            let Some(symbol) = automaton.row(pred).and_then(|row| row.symbol_to(state)) else {
                continue;
            };
            strings[pred] = Some(std::iter::once(symbol).chain(suffix.iter().copied()).collect());
            if pred == start {
                break 'search;
            }
            queue.push_back(pred);
        }
    }

    let symbols = strings[start].take().ok_or(not_found)?;
    if symbols.is_empty() {
        return Err(PlanError::Invalid { steps: 1 });
    }

    let mut steps = Vec::with_capacity(symbols.len() + 1);
    let mut state = start;
    let mut arrival = SensorEncoding::NoTransition;
    for symbol in symbols {
        let (Some(command), Some(next)) = (
            automaton.alphabet().nth(symbol),
            automaton.target(state, symbol),
        ) else {
            return Err(not_found);
        };
        steps.push(Episode {
            command: Some(command),
            sensor: arrival,
            state,
        });
        arrival = if next == GOAL_STATE {
            SensorEncoding::Goal
        } else {
            SensorEncoding::TransitionOnly
        };
        state = if next == GOAL_STATE { INIT_STATE } else { next };
    }
    steps.push(Episode::pending(arrival, state));

    if steps.len() < 2 {
        return Err(PlanError::Invalid { steps: steps.len() });
    }
    let plan = Plan {
        steps,
        target,
        cursor: 0,
    };
    trace!("planned {start} -> {target}: {}", plan.show());
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{alphabet::CharAlphabet, automaton::Slot};

    fn table(rows: Vec<Vec<Slot>>) -> HypothesisAutomaton {
        HypothesisAutomaton::from_rows(CharAlphabet::of_size(2), rows)
    }

    /// A chain `1 -a-> 2 -a-> 3 -b-> goal` with a shortcut `1 -b-> 3` and a state 4 nobody reaches.
    fn chain() -> HypothesisAutomaton {
        table(vec![
            vec![Some(0), Some(0)],
            vec![Some(2), Some(3)],
            vec![Some(3), None],
            vec![Some(3), Some(0)],
            vec![Some(1), None],
        ])
    }

    #[test]
    fn shortest_plan_to_goal() {
        let plan = plan_path(&chain(), INIT_STATE, GOAL_STATE).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps().len(), 3);
        assert_eq!(plan.next_symbol(), Some('b'));
        assert_eq!(plan.states().collect::<Vec<_>>(), vec![1, 3, 1]);
        assert!(plan.terminal().is_goal());
        assert!(plan.leads_to_goal());
    }

    #[test]
    fn shortest_plan_between_states() {
        let plan = plan_path(&chain(), 2, INIT_STATE);
        assert_eq!(plan, Err(PlanError::NotFound { from: 2, to: 1 }));

        let plan = plan_path(&chain(), 4, 3).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps().iter().filter_map(|s| s.command).collect::<String>(), "ab");
        assert_eq!(plan.terminal().state, 3);
        assert_eq!(plan.terminal().sensor, SensorEncoding::TransitionOnly);
    }

    #[test]
    fn intermediate_steps_expect_transitions() {
        // 1 and 3 loop on b and a respectively
        let aut = table(vec![
            vec![Some(0), Some(0)],
            vec![Some(2), Some(1)],
            vec![Some(3), Some(0)],
            vec![Some(3), Some(3)],
        ]);
        let plan = plan_path(&aut, 1, GOAL_STATE).unwrap();
        let sensors: Vec<_> = plan.steps().iter().map(|s| s.sensor).collect();
        assert_eq!(
            sensors,
            vec![
                SensorEncoding::NoTransition,
                SensorEncoding::TransitionOnly,
                SensorEncoding::Goal
            ]
        );
        assert_eq!(plan.states().collect::<Vec<_>>(), vec![1, 2, 1]);

        let plan = plan_path(&chain(), 4, 3).unwrap();
        assert!(plan.steps()[1..]
            .iter()
            .all(|step| step.sensor == SensorEncoding::TransitionOnly));
    }

    #[test]
    fn lowest_symbol_breaks_ties() {
        let aut = table(vec![
            vec![Some(0), Some(0)],
            vec![Some(2), Some(2)],
            vec![None, None],
        ]);
        let plan = plan_path(&aut, 1, 2).unwrap();
        assert_eq!(plan.next_symbol(), Some('a'));
    }

    #[test]
    fn disconnected_and_trivial_requests() {
        let aut = chain();
        assert_eq!(
            plan_path(&aut, 3, 4),
            Err(PlanError::NotFound { from: 3, to: 4 })
        );
        assert_eq!(plan_path(&aut, 2, 2), Err(PlanError::Invalid { steps: 1 }));

        let mut aut = aut;
        aut.discard(3);
        assert!(plan_path(&aut, 1, 3).is_err());
        assert!(plan_path(&aut, 1, GOAL_STATE).is_err());
    }

    #[test]
    fn terminal_check() {
        let mut plan = plan_path(&chain(), INIT_STATE, GOAL_STATE).unwrap();
        plan.advance();
        assert!(!plan.is_at_terminal());
        plan.advance();
        assert!(plan.is_at_terminal());
        assert_eq!(plan.next_symbol(), None);
        assert!(plan.check_terminal(SensorEncoding::Goal, INIT_STATE).is_ok());
        let divergence = plan
            .check_terminal(SensorEncoding::TransitionOnly, 2)
            .unwrap_err();
        assert_eq!(divergence.actual_state, 2);

        let plan = plan_path(&chain(), 4, 3).unwrap();
        assert!(plan.check_terminal(SensorEncoding::NoTransition, 3).is_ok());
        assert!(plan.check_terminal(SensorEncoding::TransitionOnly, 2).is_err());
    }
}

use bit_set::BitSet;
use tracing::debug;

use crate::{
    automaton::{HypothesisAutomaton, StateId, GOAL_STATE, INIT_STATE},
    memory::EpisodicMemory,
    planner::{plan_path, Plan, PlanDivergence, PlanError},
    sensor::SensorEncoding,
    Set, Show,
};

/// An unordered pair of states, used as key in the [`EquivalenceLedger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatePair(StateId, StateId);

impl StatePair {
    /// Creates the pair, the order of the arguments does not matter.
    pub fn new(x: StateId, y: StateId) -> Self {
        Self(x.min(y), x.max(y))
    }
}

impl Show for StatePair {
    fn show(&self) -> String {
        format!("{{{}, {}}}", self.0, self.1)
    }
}

/// The conjecture that the state the agent believed to be in at some earlier point of its history and the state
/// it believes to be in now denote the same hidden state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hypothesis {
    /// The believed state at the matched earlier episode. Plans that test the hypothesis start here.
    pub earlier: StateId,
    /// The believed state when the hypothesis was made.
    pub current: StateId,
}

impl Hypothesis {
    /// The unordered pair of states.
    pub fn pair(&self) -> StatePair {
        StatePair::new(self.earlier, self.current)
    }

    /// Returns the pair in the order in which it is merged, i.e. `(keep, absorb)`. The initial state is always
    /// kept.
    pub fn canonical(&self) -> (StateId, StateId) {
        if self.current == INIT_STATE {
            (self.current, self.earlier)
        } else {
            (self.earlier, self.current)
        }
    }
}

impl Show for Hypothesis {
    fn show(&self) -> String {
        format!("{} == {}", self.earlier, self.current)
    }
}

/// The outcome of a finished plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The plan tested a hypothesis and reached the goal as predicted. `merges` counts every merge that was
    /// performed, the one of the hypothesis included.
    Accepted {
        /// The hypothesis that was confirmed.
        hypothesis: Hypothesis,
        /// Number of merges.
        merges: usize,
    },
    /// The outcome of the last step did not match the plan's expectation.
    Rejected(PlanDivergence),
    /// A plan that did not test a hypothesis ended as expected.
    Completed,
}

/// Remembers which pairs of states were confirmed equivalent or refuted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquivalenceLedger {
    equivalent: Set<StatePair>,
    non_equivalent: Set<StatePair>,
}

impl EquivalenceLedger {
    /// Records `pair` as confirmed equivalent.
    pub fn record_equivalent(&mut self, pair: StatePair) {
        self.equivalent.insert(pair);
    }

    /// Records `pair` as refuted.
    pub fn record_non_equivalent(&mut self, pair: StatePair) {
        self.non_equivalent.insert(pair);
    }

    /// Returns true if `pair` was confirmed.
    pub fn is_equivalent(&self, pair: StatePair) -> bool {
        self.equivalent.contains(&pair)
    }

    /// Returns true if `pair` was refuted.
    pub fn is_non_equivalent(&self, pair: StatePair) -> bool {
        self.non_equivalent.contains(&pair)
    }

    /// Number of confirmed and refuted pairs.
    pub fn counts(&self) -> (usize, usize) {
        (self.equivalent.len(), self.non_equivalent.len())
    }
}

/// Where the hypothesis protocol currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Neither a hypothesis nor a plan is active, the agent explores.
    NoHypothesis,
    /// A hypothesis was made but no plan to test it exists yet.
    Proposed,
    /// A plan that tests the hypothesis is executing.
    Testing,
    /// A plan without a hypothesis is executing, it leads to some state with unknown transitions.
    Navigating,
}

/// The mutable state of one exploration run: what the agent believes, the plan it follows, the hypothesis that
/// plan tests, everything it has learned about pairs of states and the states that were created while the
/// current plan was executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorationContext {
    /// The state the agent believes to be in.
    pub belief: StateId,
    plan: Option<Plan>,
    hypothesis: Option<Hypothesis>,
    ledger: EquivalenceLedger,
    added_in_plan: BitSet,
}

impl Default for ExplorationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplorationContext {
    /// Creates a context in which the agent believes to be in [`INIT_STATE`].
    pub fn new() -> Self {
        Self {
            belief: INIT_STATE,
            plan: None,
            hypothesis: None,
            ledger: EquivalenceLedger::default(),
            added_in_plan: BitSet::new(),
        }
    }

    /// The active plan.
    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// The hypothesis under test.
    pub fn hypothesis(&self) -> Option<&Hypothesis> {
        self.hypothesis.as_ref()
    }

    /// The pairs that were resolved so far.
    pub fn ledger(&self) -> &EquivalenceLedger {
        &self.ledger
    }

    /// Returns true if a plan is executing.
    pub fn has_plan(&self) -> bool {
        self.plan.is_some()
    }

    /// Where the protocol currently stands.
    pub fn phase(&self) -> Phase {
        match (&self.hypothesis, &self.plan) {
            (None, None) => Phase::NoHypothesis,
            (Some(_), None) => Phase::Proposed,
            (Some(_), Some(_)) => Phase::Testing,
            (None, Some(_)) => Phase::Navigating,
        }
    }

    /// The command the active plan issues next.
    pub fn next_plan_symbol(&self) -> Option<char> {
        self.plan.as_ref().and_then(Plan::next_symbol)
    }

    /// States created since the active plan started.
    pub fn added_in_plan(&self) -> impl Iterator<Item = StateId> + '_ {
        self.added_in_plan.iter()
    }

    /// Notes that `state` was allocated by a transition taken during the active plan.
    pub fn record_created(&mut self, state: StateId) {
        if self.plan.is_some() {
            self.added_in_plan.insert(state);
        }
    }

    /// Follows a plan that does not test a hypothesis.
    pub fn navigate(&mut self, plan: Plan) {
        debug_assert!(self.plan.is_none(), "a plan is already executing");
        self.hypothesis = None;
        self.plan = Some(plan);
    }

    /// Tries to conjecture that the current belief equals the state the agent was in at the earlier episode
    /// whose history matches the tail of `memory` the longest. Nothing is proposed while a plan or hypothesis
    /// is active, if the last action reached the goal, if the two states coincide or one of them is the goal,
    /// if their rows are incompatible or if the pair was refuted before.
    pub fn propose(
        &mut self,
        memory: &EpisodicMemory,
        automaton: &HypothesisAutomaton,
    ) -> Option<Hypothesis> {
        if self.hypothesis.is_some() || self.plan.is_some() || memory.last().is_goal() {
            return None;
        }
        let index = memory.max_matched_string_index()?;
        if index + 1 >= memory.len() {
            return None;
        }
        let earlier = automaton.representative(memory.get(index)?.state)?;
        let current = self.belief;
        let hypothesis = Hypothesis { earlier, current };

        if earlier == current
            || earlier == GOAL_STATE
            || current == GOAL_STATE
            || !automaton.is_row_compatible(current, earlier, false)
            || self.ledger.is_non_equivalent(hypothesis.pair())
        {
            return None;
        }
        debug!("proposing {} (matched episode {index})", hypothesis.show());
        self.hypothesis = Some(hypothesis);
        Some(hypothesis)
    }

    /// Plans from the earlier state of the proposed hypothesis to the goal and starts executing that plan. If no
    /// plan exists, the hypothesis is dropped.
    pub fn begin_test(&mut self, automaton: &HypothesisAutomaton) -> Result<(), PlanError> {
        let Some(hypothesis) = self.hypothesis else {
            return Err(PlanError::Invalid { steps: 0 });
        };
        match plan_path(automaton, hypothesis.earlier, GOAL_STATE) {
            Ok(plan) => {
                debug!("testing {} with plan {}", hypothesis.show(), plan.show());
                self.added_in_plan.clear();
                self.plan = Some(plan);
                Ok(())
            }
            Err(err) => {
                debug!("dropping {}: {err}", hypothesis.show());
                self.hypothesis = None;
                Err(err)
            }
        }
    }

    /// Evaluates the action that was just executed as part of the active plan. The action has to be folded
    /// into `automaton` and `memory` already, and the belief has to be updated. Returns `None` while the plan
    /// has actions left.
    pub fn after_plan_step(
        &mut self,
        sensor: SensorEncoding,
        automaton: &mut HypothesisAutomaton,
        memory: &mut EpisodicMemory,
    ) -> Option<Verdict> {
        let plan = self.plan.as_mut()?;
        plan.advance();
        if !plan.is_at_terminal() {
            return None;
        }
        let outcome = plan.check_terminal(sensor, self.belief);
        let leads_to_goal = plan.leads_to_goal();

        Some(match (outcome, self.hypothesis) {
            (Err(divergence), _) => {
                debug!("plan diverged: {divergence}");
                self.reject();
                Verdict::Rejected(divergence)
            }
            (Ok(()), Some(hypothesis)) if leads_to_goal => {
                let merges = self.accept(hypothesis, automaton, memory);
                Verdict::Accepted { hypothesis, merges }
            }
            (Ok(()), _) => {
                self.finish();
                Verdict::Completed
            }
        })
    }

    /// Confirms `hypothesis`: the states created during the plan are discarded, the plan's states are written
    /// into the tail of memory and the pair is merged, followed by merging every other pair of rows that became
    /// compatible. Returns the number of merges.
    fn accept(
        &mut self,
        hypothesis: Hypothesis,
        automaton: &mut HypothesisAutomaton,
        memory: &mut EpisodicMemory,
    ) -> usize {
        for scratch in self.added_in_plan.iter() {
            automaton.discard(scratch);
        }
        if let Some(plan) = &self.plan {
            memory.relabel_tail(plan.states());
        }

        self.ledger.record_equivalent(hypothesis.pair());
        let (keep, absorb) = hypothesis.canonical();
        let merged = usize::from(automaton.merge_states(keep, absorb));
        let merges = merged + automaton.saturate();
        self.belief = automaton.representative(self.belief).unwrap_or(INIT_STATE);
        debug!("accepted {}, {merges} merges", hypothesis.show());
        self.finish();
        merges
    }

    /// Abandons the active plan. A hypothesis it was testing is recorded as refuted.
    pub fn reject(&mut self) {
        if let Some(hypothesis) = self.hypothesis {
            debug!("rejected {}", hypothesis.show());
            self.ledger.record_non_equivalent(hypothesis.pair());
        }
        self.finish();
    }

    fn finish(&mut self) {
        self.hypothesis = None;
        self.plan = None;
        self.added_in_plan.clear();
    }
}

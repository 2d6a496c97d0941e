use tracing::{debug, error, info, trace, warn};

use super::Agent;
use crate::{
    automaton::{StateId, INIT_STATE},
    environment::Environment,
    error::AgentError,
    hypothesis::{Phase, Verdict},
    planner::plan_path,
    Show,
};

impl<E: Environment> Agent<E> {
    /// Explores until every transition of every state in the hypothesis automaton is known. Fails only if the
    /// growth ceiling is reached.
    pub fn map_state_machine(&mut self) -> Result<(), AgentError> {
        while !self.automaton.mapping_complete() {
            let symbol = self.select_next_command();
            self.make_move(symbol)?;
            trace!("transition table\n{}", self.show());
        }
        info!(
            "mapping complete after {} episodes with {} states",
            self.memory.len(),
            self.automaton.active_states().count()
        );
        Ok(())
    }

    /// Decides what to do next:
    /// 1. act randomly as long as the goal was never reached,
    /// 2. follow the active plan,
    /// 3. take an unknown transition of the believed state, chosen uniformly,
    /// 4. otherwise delete states that cannot be reached and navigate to the lowest state with an unknown
    ///    transition, or act randomly if no such plan exists.
    pub fn select_next_command(&mut self) -> char {
        if self.best.is_none() {
            return self.random_action();
        }
        if let Some(symbol) = self.context.next_plan_symbol() {
            return symbol;
        }

        let unknown = self.automaton.unknown_symbols(self.context.belief);
        if !unknown.is_empty() {
            let pos = unknown[self.rng.usize(..unknown.len())];
            return self.alphabet[pos];
        }

        self.prune_unreachable();
        if let Some(target) = self.automaton.first_state_with_unknown() {
            match plan_path(&self.automaton, self.context.belief, target) {
                Ok(plan) => {
                    if let Some(symbol) = plan.next_symbol() {
                        debug!("navigating to state {target} with plan {}", plan.show());
                        self.context.navigate(plan);
                        return symbol;
                    }
                }
                Err(err) => debug!("cannot navigate to state {target}: {err}"),
            }
        }
        warn!("nothing to explore from state {}, acting randomly", self.context.belief);
        self.random_action()
    }

    /// Deletes every state other than the goal, the initial state and the believed state that cannot be reached
    /// from the initial state. Returns how many states were deleted.
    pub fn prune_unreachable(&mut self) -> usize {
        let mut pruned = 0;
        for state in (INIT_STATE + 1)..self.automaton.size() {
            if state == self.context.belief || !self.automaton.is_active(state) {
                continue;
            }
            if plan_path(&self.automaton, INIT_STATE, state).is_err() && self.automaton.discard(state) {
                pruned += 1;
            }
        }
        if pruned > 0 {
            debug!("pruned {pruned} unreachable states");
        }
        self.stats.pruned += pruned;
        pruned
    }

    /// Executes `symbol` and learns from the outcome. The transition is folded into the hypothesis automaton,
    /// then either the active plan is evaluated, or, after a plain move that did not reach the goal, a new
    /// equivalence hypothesis is proposed and a plan to test it is started.
    pub fn make_move(&mut self, symbol: char) -> Result<(), AgentError> {
        let pos = self
            .alphabet
            .position(symbol)
            .ok_or(AgentError::UnknownSymbol(symbol))?;
        self.ensure_below_ceiling()?;

        let from = self.context.belief;
        self.candidate.push(symbol);
        self.memory.issue(symbol);
        let sensor = self.env.tick(symbol).encode();
        trace!("issued {symbol} in state {from} and sensed {}", sensor.show());

        if sensor.is_goal() {
            if self.best.as_ref().map_or(true, |best| self.candidate.len() < best.len()) {
                info!("found path {} to the goal", self.candidate);
                self.best = Some(self.candidate.clone());
            }
            self.candidate.clear();
        }

        let Some(recorded) = self.automaton.record_transition(from, pos, sensor) else {
            self.inconsistent_belief(from);
            let state = if sensor.is_goal() { INIT_STATE } else { from };
            self.memory.observe(sensor, state);
            return Ok(());
        };
        if recorded.created {
            self.context.record_created(recorded.target);
        }
        self.context.belief = recorded.belief();
        self.memory.observe(sensor, self.context.belief);

        if self.context.has_plan() {
            let testing = self.context.phase() == Phase::Testing;
            match self
                .context
                .after_plan_step(sensor, &mut self.automaton, &mut self.memory)
            {
                Some(Verdict::Accepted { merges, .. }) => {
                    self.stats.accepted += 1;
                    self.stats.merges += merges;
                }
                Some(Verdict::Rejected(_)) if testing => self.stats.rejected += 1,
                _ => {}
            }
        } else if !sensor.is_goal() && self.context.propose(&self.memory, &self.automaton).is_some() {
            if let Err(err) = self.context.begin_test(&self.automaton) {
                trace!("hypothesis cannot be tested: {err}");
            }
        }
        Ok(())
    }

    fn inconsistent_belief(&self, state: StateId) {
        let err = AgentError::InconsistentBelief(state);
        error!("{err}, ignoring the outcome of the last action");
        debug_assert!(self.automaton.is_active(state), "{err}");
    }
}

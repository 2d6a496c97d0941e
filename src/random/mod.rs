use tracing::debug;

use crate::{
    alphabet::CharAlphabet,
    environment::{HiddenMachine, HIDDEN_GOAL, HIDDEN_INIT},
    Show,
};

/// Generates a random [`HiddenMachine`] with `size` states (the goal included) over an alphabet of `symbols`
/// symbols. The algorithm is as follows:
/// 1. For each state `q >= 1`, a randomly drawn symbol leads back to `q - 1`, so the goal is reachable from
///    everywhere.
/// 2. If `q + 1` exists, a different randomly drawn symbol leads forward to it, so every state is reachable
///    from the initial state.
/// 3. All remaining transitions go to a uniformly drawn state.
///
/// Panics if `size < 2`, if `symbols == 0`, or if there are states beyond the initial one but fewer than two
/// symbols.
pub fn generate_random_machine(size: usize, symbols: usize, rng: &mut fastrand::Rng) -> HiddenMachine {
    assert!(size >= 2, "a machine needs a goal and an initial state");
    assert!(symbols >= 1, "a machine needs at least one symbol");
    assert!(
        size == 2 || symbols >= 2,
        "cannot connect {size} states with {symbols} symbols"
    );
    let alphabet = CharAlphabet::of_size(symbols);
    let mut builder = HiddenMachine::builder(alphabet.clone());

    for q in HIDDEN_INIT..size {
        let back = rng.usize(..symbols);
        let forward = (q + 1 < size).then(|| {
            let offset = rng.usize(1..symbols);
            (back + offset) % symbols
        });
        for (pos, symbol) in alphabet.universe().enumerate() {
            let target = if pos == back {
                q - 1
            } else if Some(pos) == forward {
                q + 1
            } else {
                rng.usize(HIDDEN_GOAL..size)
            };
            builder = builder.with_transition(q, symbol, target);
        }
    }

    let machine = builder.into_machine();
    debug!("generated random machine\n{}", machine.show());
    machine
}

#[cfg(test)]
mod tests {
    use super::generate_random_machine;
    use crate::environment::{Environment, HIDDEN_GOAL};

    #[test]
    fn random_machines_are_connected() {
        let mut rng = fastrand::Rng::with_seed(17);
        for _ in 0..20 {
            let machine = generate_random_machine(5, 3, &mut rng);
            assert_eq!(machine.size(), 5);
            assert_eq!(machine.alphabet().size(), 3);
            assert!(machine.shortest_distance_to_goal().is_some());
            let mut reach = vec![1];
            let mut seen = [false; 5];
            while let Some(p) = reach.pop() {
                if seen[p] || p == HIDDEN_GOAL {
                    continue;
                }
                seen[p] = true;
                reach.extend(
                    machine
                        .alphabet()
                        .universe()
                        .filter_map(|c| machine.successor(p, c)),
                );
            }
            assert!(seen[1..].iter().all(|s| *s), "state unreachable from init");
        }
    }

    #[test]
    fn same_seed_same_machine() {
        let left = generate_random_machine(4, 2, &mut fastrand::Rng::with_seed(3));
        let right = generate_random_machine(4, 2, &mut fastrand::Rng::with_seed(3));
        assert_eq!(left, right);
    }
}

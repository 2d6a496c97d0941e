use itertools::Itertools;

use crate::Show;

/// Represents an alphabet where a symbol is just a single `char`. The identity of a symbol is its position in
/// the alphabet, so transition rows are indexed by [`CharAlphabet::position`].
///
/// # Example
/// Assume we have a [`CharAlphabet`] over the symbols 'a' and 'b'. Then 'a' occupies slot 0 of every row
/// of the hypothesis automaton and 'b' occupies slot 1.
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct CharAlphabet(pub(crate) Vec<char>);

impl CharAlphabet {
    /// Creates a new [`CharAlphabet`] alphabet of the given size. The symbols are just the first `size` letters
    /// of the alphabet, i.e. 'a' to 'z'.
    pub fn of_size(size: usize) -> Self {
        assert!(size <= 26, "Alphabet is too large");
        Self((0..size).map(|i| (b'a' + i as u8) as char).collect())
    }

    /// Creates a new [`CharAlphabet`] from the given symbols, keeping their order.
    pub fn new(symbols: Vec<char>) -> Self {
        debug_assert!(
            symbols.iter().all_unique(),
            "symbols of an alphabet must be distinct"
        );
        Self(symbols)
    }

    /// Returns the number of symbols.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the alphabet has no symbols.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the symbols in order.
    pub fn universe(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }

    /// Checks whether `symbol` belongs to the alphabet.
    pub fn contains(&self, symbol: char) -> bool {
        self.0.contains(&symbol)
    }

    /// Gives the position of `symbol`, if it is part of the alphabet.
    pub fn position(&self, symbol: char) -> Option<usize> {
        self.0.iter().position(|c| *c == symbol)
    }

    /// Gives the symbol at position `pos`, if it exists.
    pub fn nth(&self, pos: usize) -> Option<char> {
        self.0.get(pos).copied()
    }
}

impl std::ops::Index<usize> for CharAlphabet {
    type Output = char;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<char>> for CharAlphabet {
    fn from(value: Vec<char>) -> Self {
        Self::new(value)
    }
}

impl FromIterator<char> for CharAlphabet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self(iter.into_iter().unique().sorted().collect())
    }
}

impl Show for CharAlphabet {
    fn show(&self) -> String {
        format!("{{{}}}", self.0.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::CharAlphabet;

    #[test]
    fn positional_identity() {
        let alphabet = CharAlphabet::of_size(3);
        assert_eq!(alphabet.size(), 3);
        assert_eq!(alphabet.position('c'), Some(2));
        assert_eq!(alphabet.position('z'), None);
        assert_eq!(alphabet.nth(1), Some('b'));
        assert_eq!(alphabet[0], 'a');
    }

    #[test]
    fn collecting_sorts_and_deduplicates() {
        let alphabet: CharAlphabet = "cabca".chars().collect();
        assert_eq!(alphabet.universe().collect::<String>(), "abc");
    }
}

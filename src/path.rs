use itertools::Itertools;

use crate::Show;

/// An ordered sequence of symbols, for example a passphrase that leads from the initial state to the goal.
/// Cloning a path gives an independent copy which can be trimmed without affecting the original.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(Vec<char>);

impl Path {
    /// Creates a path from the given symbols.
    pub fn new(symbols: Vec<char>) -> Self {
        Self(symbols)
    }

    /// Returns the number of symbols.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the path has no symbols.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the symbol at `index`.
    pub fn get(&self, index: usize) -> Option<char> {
        self.0.get(index).copied()
    }

    /// Removes and returns the symbol at `index`. Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> char {
        self.0.remove(index)
    }

    /// Inserts `symbol` at `index`, shifting everything after it.
    pub fn insert(&mut self, index: usize, symbol: char) {
        self.0.insert(index, symbol)
    }

    /// Appends `symbol`.
    pub fn push(&mut self, symbol: char) {
        self.0.push(symbol)
    }

    /// Removes all symbols.
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Iterates over the symbols.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }

    /// The symbols as a slice.
    pub fn symbols(&self) -> &[char] {
        &self.0
    }
}

impl From<Vec<char>> for Path {
    fn from(value: Vec<char>) -> Self {
        Self(value)
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        value.chars().collect()
    }
}

impl FromIterator<char> for Path {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(""))
    }
}

impl Show for Path {
    fn show(&self) -> String {
        self.0.show()
    }
}

#[cfg(test)]
mod tests {
    use super::Path;

    #[test]
    fn trim_and_restore() {
        let original = Path::from("abc");
        let mut trimmed = original.clone();
        let removed = trimmed.remove(1);
        assert_eq!(trimmed.to_string(), "ac");
        assert_eq!(original.len(), 3);
        trimmed.insert(1, removed);
        assert_eq!(trimmed, original);
    }
}

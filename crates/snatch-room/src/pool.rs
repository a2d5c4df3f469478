//! The letter pool: hidden tiles waiting to be flipped and the visible
//! tiles in the center of the table.

use rand::seq::SliceRandom;

/// Tile counts per letter (the standard 144-tile set).
pub const LETTER_DISTRIBUTION: [(char, usize); 26] = [
    ('A', 13),
    ('B', 3),
    ('C', 3),
    ('D', 6),
    ('E', 18),
    ('F', 3),
    ('G', 4),
    ('H', 3),
    ('I', 12),
    ('J', 2),
    ('K', 2),
    ('L', 5),
    ('M', 3),
    ('N', 8),
    ('O', 11),
    ('P', 3),
    ('Q', 2),
    ('R', 9),
    ('S', 6),
    ('T', 9),
    ('U', 6),
    ('V', 3),
    ('W', 3),
    ('X', 2),
    ('Y', 3),
    ('Z', 2),
];

/// One room's tiles.
///
/// Tiles only ever move between `unflipped`, `flipped` and players'
/// words; nothing here creates or destroys one outside of
/// [`LetterPool::shuffled`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterPool {
    /// Hidden tiles in shuffle order. Drawn from the end.
    unflipped: Vec<char>,
    /// Visible tiles. Order only matters for index-based removal.
    flipped: Vec<char>,
}

impl LetterPool {
    /// A fresh pool with every tile of [`LETTER_DISTRIBUTION`] hidden and
    /// uniformly shuffled.
    pub fn shuffled() -> Self {
        let mut unflipped: Vec<char> = LETTER_DISTRIBUTION
            .iter()
            .flat_map(|&(letter, count)| std::iter::repeat_n(letter, count))
            .collect();
        unflipped.shuffle(&mut rand::rng());
        Self {
            unflipped,
            flipped: Vec::new(),
        }
    }

    /// A pool with fixed contents. `unflipped` is drawn from the end.
    pub fn from_tiles(unflipped: Vec<char>, flipped: Vec<char>) -> Self {
        Self { unflipped, flipped }
    }

    /// Removes the next hidden tile, `None` when none remain.
    pub fn draw(&mut self) -> Option<char> {
        self.unflipped.pop()
    }

    /// Places a tile in the center.
    pub fn reveal(&mut self, letter: char) {
        self.flipped.push(letter);
    }

    /// Draws the next hidden tile and reveals it.
    pub fn flip(&mut self) -> Option<char> {
        let letter = self.draw()?;
        self.reveal(letter);
        Some(letter)
    }

    /// Removes the tiles at `indices` from the center. Indices refer to
    /// positions before any removal; out-of-range ones are ignored.
    pub fn take_indices(&mut self, indices: &[usize]) {
        let mut position = 0;
        self.flipped.retain(|_| {
            let keep = !indices.contains(&position);
            position += 1;
            keep
        });
    }

    /// Puts letters back in the center (not the hidden stack).
    pub fn return_letters(&mut self, letters: impl IntoIterator<Item = char>) {
        self.flipped.extend(letters);
    }

    /// Finds center positions spelling `word`, each position used at most
    /// once. Comparison is case-insensitive.
    ///
    /// ```
    /// use snatch_room::LetterPool;
    ///
    /// let pool = LetterPool::from_tiles(vec![], vec!['D', 'A', 'X', 'D']);
    /// assert_eq!(pool.match_against_center("add"), Some(vec![1, 0, 3]));
    /// assert_eq!(pool.match_against_center("dad"), Some(vec![0, 1, 3]));
    /// assert_eq!(pool.match_against_center("adds"), None);
    /// ```
    pub fn match_against_center(&self, word: &str) -> Option<Vec<usize>> {
        let mut used = vec![false; self.flipped.len()];
        let mut indices = Vec::with_capacity(word.len());
        for letter in word.chars().map(|c| c.to_ascii_uppercase()) {
            let position = self
                .flipped
                .iter()
                .enumerate()
                .position(|(i, &tile)| !used[i] && tile == letter)?;
            used[position] = true;
            indices.push(position);
        }
        Some(indices)
    }

    /// Number of hidden tiles left.
    pub fn unflipped_len(&self) -> usize {
        self.unflipped.len()
    }

    /// The center tiles.
    pub fn flipped(&self) -> &[char] {
        &self.flipped
    }

    /// Hidden plus visible tiles. Tiles in players' words are not counted.
    pub fn total_tiles(&self) -> usize {
        self.unflipped.len() + self.flipped.len()
    }
}

impl Default for LetterPool {
    fn default() -> Self {
        Self::shuffled()
    }
}

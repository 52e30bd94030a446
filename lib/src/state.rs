use crate::data::{PositionSet, ALPHABET, ALPHABET_SIZE};

/// The solver's working hypothesis about the secret.
///
/// Owns the tentative candidate string, the confirmed/unconfirmed partition,
/// each letter's unplaced-occurrence count, and each letter's
/// candidate-position set. All mutation goes through [`confirm`],
/// [`eliminate`], and [`assign_all`], so the bookkeeping rules hold at one
/// site: confirming a position removes it from every other letter's candidate
/// set and decrements the confirmed letter's remaining count, keeping
/// `sum(remaining)` equal to the number of open positions.
///
/// Letters are addressed by their canonical alphabet index throughout.
///
/// [`confirm`]: SolverState::confirm
/// [`eliminate`]: SolverState::eliminate
/// [`assign_all`]: SolverState::assign_all
pub struct SolverState {
    /// Tentative letter per position; holds the final letter once confirmed.
    candidate: Vec<usize>,
    confirmed: Vec<bool>,
    remaining: [usize; ALPHABET_SIZE],
    masks: [PositionSet; ALPHABET_SIZE],
}

impl SolverState {
    /// Creates the initial state for a secret of the given length and measured
    /// per-letter counts.
    ///
    /// Every position starts unconfirmed holding the first alphabet letter,
    /// and every letter may still occupy any position.
    pub fn new(length: usize, counts: [usize; ALPHABET_SIZE]) -> SolverState {
        SolverState {
            candidate: vec![0; length],
            confirmed: vec![false; length],
            remaining: counts,
            masks: [PositionSet::full(length); ALPHABET_SIZE],
        }
    }

    /// The secret length this state was sized to.
    pub fn len(&self) -> usize {
        self.candidate.len()
    }

    /// Returns whether the letter at the given position has been proven.
    pub fn is_confirmed(&self, position: usize) -> bool {
        self.confirmed[position]
    }

    /// The current letter at the given position: tentative while open, final
    /// once confirmed.
    pub fn tentative(&self, position: usize) -> usize {
        self.candidate[position]
    }

    /// Overwrites the tentative letter at an open position.
    pub fn set_tentative(&mut self, position: usize, letter: usize) {
        debug_assert!(!self.confirmed[position]);
        self.candidate[position] = letter;
    }

    /// The number of occurrences of the letter not yet tied to a confirmed
    /// position.
    pub fn remaining(&self, letter: usize) -> usize {
        self.remaining[letter]
    }

    /// All remaining counts, indexed by alphabet index.
    pub fn remaining_counts(&self) -> [usize; ALPHABET_SIZE] {
        self.remaining
    }

    /// The positions where the letter could still occur.
    pub fn mask(&self, letter: usize) -> PositionSet {
        self.masks[letter]
    }

    /// The set of positions not yet confirmed.
    pub fn open_positions(&self) -> PositionSet {
        let mut open = PositionSet::empty();
        for (position, confirmed) in self.confirmed.iter().enumerate() {
            if !confirmed {
                open.insert(position);
            }
        }
        open
    }

    /// The number of positions not yet confirmed.
    pub fn num_open(&self) -> usize {
        self.confirmed.iter().filter(|confirmed| !**confirmed).count()
    }

    /// Returns whether every position has been confirmed.
    pub fn all_confirmed(&self) -> bool {
        self.confirmed.iter().all(|confirmed| *confirmed)
    }

    /// Renders the current candidate as a string.
    pub fn candidate_string(&self) -> String {
        self.candidate.iter().map(|&letter| ALPHABET[letter]).collect()
    }

    /// Renders the candidate with a single position substituted.
    pub fn candidate_with(&self, position: usize, letter: usize) -> String {
        self.candidate
            .iter()
            .enumerate()
            .map(|(index, &current)| {
                if index == position {
                    ALPHABET[letter]
                } else {
                    ALPHABET[current]
                }
            })
            .collect()
    }

    /// Marks the position as proven to hold the letter.
    ///
    /// Decrements the letter's remaining count and removes the position from
    /// every other letter's candidate set.
    pub fn confirm(&mut self, position: usize, letter: usize) {
        debug_assert!(!self.confirmed[position]);
        debug_assert!(self.remaining[letter] > 0);
        self.candidate[position] = letter;
        self.confirmed[position] = true;
        self.remaining[letter] = self.remaining[letter].saturating_sub(1);
        for other in 0..ALPHABET_SIZE {
            if other != letter {
                self.masks[other].remove(position);
            }
        }
    }

    /// Records that the letter cannot occur at the position.
    pub fn eliminate(&mut self, letter: usize, position: usize) {
        self.masks[letter].remove(position);
    }

    /// Confirms every position in the set as the letter.
    pub fn assign_all(&mut self, set: PositionSet, letter: usize) {
        for position in set.positions() {
            self.confirm(position, letter);
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn open_count(state: &SolverState) -> usize {
        state.num_open()
    }

    fn remaining_total(state: &SolverState) -> usize {
        state.remaining_counts().iter().sum()
    }

    #[test]
    fn new_state_is_fully_open() {
        let state = SolverState::new(6, [1, 1, 1, 1, 1, 1]);

        assert_eq!(state.len(), 6);
        assert_eq!(open_count(&state), 6);
        assert_eq!(remaining_total(&state), 6);
        assert!(!state.all_confirmed());
        assert_eq!(state.candidate_string(), "BBBBBB");
        for letter in 0..ALPHABET_SIZE {
            assert_eq!(state.mask(letter).len(), 6);
        }
    }

    #[test]
    fn confirm_updates_remaining_and_masks() {
        let mut state = SolverState::new(4, [2, 2, 0, 0, 0, 0]);

        state.confirm(1, 1);

        assert!(state.is_confirmed(1));
        assert_eq!(state.tentative(1), 1);
        assert_eq!(state.remaining(1), 1);
        assert_eq!(state.remaining(0), 2);
        // Every other letter lost position 1 as a candidate.
        assert!(!state.mask(0).contains(1));
        assert!(state.mask(1).contains(1));
        assert_eq!(remaining_total(&state), open_count(&state));
    }

    #[test]
    fn eliminate_only_touches_one_letter() {
        let mut state = SolverState::new(3, [2, 1, 0, 0, 0, 0]);

        state.eliminate(0, 2);

        assert!(!state.mask(0).contains(2));
        assert!(state.mask(1).contains(2));
        assert_eq!(state.remaining(0), 2);
    }

    #[test]
    fn assign_all_confirms_whole_set() {
        let mut state = SolverState::new(5, [3, 2, 0, 0, 0, 0]);
        let mut group = PositionSet::empty();
        group.insert(0);
        group.insert(2);
        group.insert(4);

        state.assign_all(group, 0);

        assert_eq!(state.remaining(0), 0);
        assert_eq!(open_count(&state), 2);
        assert_eq!(remaining_total(&state), 2);
        assert_eq!(state.candidate_string(), "BBBBB");
        assert!(state.is_confirmed(0));
        assert!(!state.is_confirmed(1));
    }

    #[test]
    fn candidate_with_substitutes_one_position() {
        let mut state = SolverState::new(3, [1, 1, 1, 0, 0, 0]);
        state.set_tentative(0, 0);
        state.set_tentative(1, 1);
        state.set_tentative(2, 2);

        assert_eq!(state.candidate_string(), "BAC");
        assert_eq!(state.candidate_with(1, 5), "BUC");
        // The state itself is untouched.
        assert_eq!(state.candidate_string(), "BAC");
    }
}

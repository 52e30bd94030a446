use crate::data::*;
use crate::oracle::{Oracle, SecretOracle};
use crate::results::*;
use crate::state::SolverState;
use rayon::prelude::*;

/// How many times an already-established length may be re-detected after the
/// oracle unexpectedly rejects a probe's length. Further conflicts are fatal.
const MAX_LENGTH_RECHECKS: u32 = 1;

/// Internal control flow for a run in progress.
///
/// `Solved` means a probe matched the secret exactly somewhere mid-run; it
/// unwinds normally to the entry point instead of tearing anything down.
enum Halt {
    Solved(String),
    Failed(SolveError),
}

impl From<SolveError> for Halt {
    fn from(error: SolveError) -> Halt {
        Halt::Failed(error)
    }
}

/// Recovers the secret held by the given oracle.
///
/// ```
/// use rs_code_breaker::{solve, SecretOracle};
///
/// let report = solve(SecretOracle::new("BACXIU")).unwrap();
/// assert_eq!(report.secret, "BACXIU");
/// ```
pub fn solve<O: Oracle>(oracle: O) -> Result<SolveReport, SolveError> {
    solve_with_observer(oracle, &mut NullObserver)
}

/// Recovers the secret held by the given oracle, reporting progress to the
/// observer.
pub fn solve_with_observer<O: Oracle>(
    oracle: O,
    observer: &mut dyn SolveObserver,
) -> Result<SolveReport, SolveError> {
    let mut solver = Solver {
        oracle,
        observer,
        num_queries: 0,
        length: 0,
        length_rechecks: 0,
    };
    match solver.run() {
        Ok(secret) | Err(Halt::Solved(secret)) => Ok(SolveReport {
            secret,
            num_queries: solver.num_queries,
        }),
        Err(Halt::Failed(error)) => Err(error),
    }
}

/// Solves every secret in the list, each against its own in-memory oracle.
///
/// The games share nothing, so they run in parallel.
///
/// # Panics
///
/// Panics if any secret is not a valid secret.
pub fn solve_all(secrets: &[String]) -> Result<Vec<SolveReport>, SolveError> {
    secrets
        .par_iter()
        .map(|secret| solve(SecretOracle::new(secret)))
        .collect()
}

struct Solver<'a, O: Oracle> {
    oracle: O,
    observer: &'a mut dyn SolveObserver,
    num_queries: u32,
    length: usize,
    length_rechecks: u32,
}

impl<'a, O: Oracle> Solver<'a, O> {
    fn run(&mut self) -> Result<String, Halt> {
        let mut counts = [0; ALPHABET_SIZE];
        self.detect_length(&mut counts)?;
        self.measure_counts(&mut counts)?;

        if let Some(letter) = single_letter(&counts) {
            // Only one letter occurs, so the secret is already determined.
            return Ok(repeat_letter(letter, self.length));
        }

        let mut state = SolverState::new(self.length, counts);
        let mut baseline = self.initial_candidate(&mut state, &counts)?;

        if let Some(filler) = absent_letter(&counts) {
            self.locate_groups(&mut state, filler)?;
            if !state.all_confirmed() {
                // Bulk assignment invalidated the incremental baseline.
                baseline = self.probe(&state.candidate_string())?;
            }
        }

        if !state.all_confirmed() {
            self.refine(&mut state, baseline)?;
        }

        Ok(state.candidate_string())
    }

    /// Sends one probe to the oracle, counting it and reporting it to the
    /// observer.
    fn query(&mut self, probe: &str) -> MatchResult {
        let result = self.oracle.evaluate(probe);
        self.num_queries += 1;
        self.observer.on_event(SolveEvent::QueryIssued {
            number: self.num_queries,
            probe,
            result,
        });
        result
    }

    /// Issues a probe of the established length and returns its match count.
    ///
    /// A full match ends the run through [`Halt::Solved`]; sentinels divert
    /// into re-detection or a fatal error.
    fn probe(&mut self, probe: &str) -> Result<usize, Halt> {
        match self.query(probe) {
            MatchResult::Matches(count) if count == self.length => {
                Err(Halt::Solved(probe.to_string()))
            }
            MatchResult::Matches(count) => Ok(count),
            MatchResult::WrongLength => self.recheck_length(probe),
            MatchResult::InvalidCharacter => Err(Halt::from(SolveError::InvalidProbe {
                probe: probe.to_string(),
            })),
        }
    }

    /// Probes lengths 1 up to the maximum with the first alphabet letter.
    ///
    /// The first accepted probe fixes the secret length, and its match count
    /// is that letter's occurrence count for free.
    fn detect_length(&mut self, counts: &mut [usize; ALPHABET_SIZE]) -> Result<(), Halt> {
        for length in 1..=MAX_SECRET_LENGTH {
            let probe = repeat_letter(0, length);
            match self.query(&probe) {
                MatchResult::WrongLength => continue,
                MatchResult::Matches(count) => {
                    self.length = length;
                    counts[0] = count;
                    self.observer.on_event(SolveEvent::LengthFound { length });
                    self.observer.on_event(SolveEvent::LetterMeasured {
                        letter: ALPHABET[0],
                        count,
                    });
                    if count == length {
                        return Err(Halt::Solved(probe));
                    }
                    return Ok(());
                }
                MatchResult::InvalidCharacter => {
                    return Err(Halt::from(SolveError::InvalidProbe { probe }));
                }
            }
        }
        Err(Halt::from(SolveError::LengthNotFound))
    }

    /// Handles a length rejection after the length was established: re-runs
    /// the length scan once and retries the probe, failing if the conflict
    /// persists.
    fn recheck_length(&mut self, probe: &str) -> Result<usize, Halt> {
        if self.length_rechecks >= MAX_LENGTH_RECHECKS {
            return Err(Halt::from(SolveError::LengthConflict {
                length: self.length,
            }));
        }
        self.length_rechecks += 1;

        let mut redetected = None;
        for length in 1..=MAX_SECRET_LENGTH {
            let scan = repeat_letter(0, length);
            match self.query(&scan) {
                MatchResult::WrongLength => continue,
                MatchResult::Matches(count) => {
                    if count == length {
                        return Err(Halt::Solved(scan));
                    }
                    redetected = Some(length);
                    break;
                }
                MatchResult::InvalidCharacter => {
                    return Err(Halt::from(SolveError::InvalidProbe { probe: scan }));
                }
            }
        }
        if redetected != Some(self.length) {
            return Err(Halt::from(SolveError::LengthConflict {
                length: self.length,
            }));
        }

        match self.query(probe) {
            MatchResult::Matches(count) if count == self.length => {
                Err(Halt::Solved(probe.to_string()))
            }
            MatchResult::Matches(count) => Ok(count),
            _ => Err(Halt::from(SolveError::LengthConflict {
                length: self.length,
            })),
        }
    }

    /// Measures each remaining letter's occurrence count with one
    /// all-same-letter probe, then validates that the counts account for every
    /// position.
    fn measure_counts(&mut self, counts: &mut [usize; ALPHABET_SIZE]) -> Result<(), Halt> {
        for letter in 1..ALPHABET_SIZE {
            let count = self.probe(&repeat_letter(letter, self.length))?;
            counts[letter] = count;
            self.observer.on_event(SolveEvent::LetterMeasured {
                letter: ALPHABET[letter],
                count,
            });
        }

        let total: usize = counts.iter().sum();
        if total != self.length {
            return Err(Halt::from(SolveError::CountMismatch {
                expected: self.length,
                actual: total,
            }));
        }
        Ok(())
    }

    /// Seeds the candidate with letters laid out in descending-frequency
    /// blocks from position 0 and measures its match count as the first
    /// baseline.
    fn initial_candidate(
        &mut self,
        state: &mut SolverState,
        counts: &[usize; ALPHABET_SIZE],
    ) -> Result<usize, Halt> {
        let mut position = 0;
        for &letter in indices_by_count_desc(counts).iter() {
            for _ in 0..counts[letter] {
                state.set_tentative(position, letter);
                position += 1;
            }
        }
        self.probe(&state.candidate_string())
    }

    /// Localizes every letter's occurrences by binary-splitting its candidate
    /// positions, padding probes with a letter known to be absent from the
    /// secret.
    fn locate_groups(&mut self, state: &mut SolverState, filler: usize) -> Result<(), Halt> {
        loop {
            // Most occurrences first; canonical order on ties.
            let letter = indices_by_count_desc(&state.remaining_counts())[0];
            let count = state.remaining(letter);
            if count == 0 {
                return Ok(());
            }
            let mask = state.mask(letter).intersect(&state.open_positions());
            self.locate_letter(state, letter, mask, count, filler)?;
        }
    }

    /// Pins down exactly where the letter occurs within the masked positions,
    /// given that it occurs `count` times among them.
    fn locate_letter(
        &mut self,
        state: &mut SolverState,
        letter: usize,
        mask: PositionSet,
        count: usize,
        filler: usize,
    ) -> Result<(), Halt> {
        if count == 0 {
            // The letter occurs nowhere in this subset.
            for position in mask.positions() {
                state.eliminate(letter, position);
                self.observer.on_event(SolveEvent::LetterEliminated {
                    letter: ALPHABET[letter],
                    position,
                });
            }
            return Ok(());
        }
        if mask.len() < count {
            return Err(Halt::from(SolveError::CountMismatch {
                expected: count,
                actual: mask.len(),
            }));
        }
        if mask.len() == count {
            // Every masked position must be this letter.
            state.assign_all(mask, letter);
            self.observer.on_event(SolveEvent::GroupAssigned {
                letter: ALPHABET[letter],
                positions: mask,
            });
            return Ok(());
        }

        let (lower, upper) = mask.split();
        if lower.is_empty() || upper.is_empty() {
            // The split cannot shrink the set; resolve the positions one at a
            // time instead.
            return self.locate_by_single_probes(state, letter, mask, count, filler);
        }

        let lower_count = self.count_in_subset(state, letter, lower, filler)?;
        let upper_count = self.count_in_subset(state, letter, upper, filler)?;
        if lower_count + upper_count != count {
            return Err(Halt::from(SolveError::CountMismatch {
                expected: count,
                actual: lower_count + upper_count,
            }));
        }

        self.locate_letter(state, letter, lower, lower_count, filler)?;
        self.locate_letter(state, letter, upper, upper_count, filler)
    }

    /// Degenerate-split fallback: probes each masked position individually,
    /// confirming on a hit and eliminating on a miss.
    fn locate_by_single_probes(
        &mut self,
        state: &mut SolverState,
        letter: usize,
        mask: PositionSet,
        count: usize,
        filler: usize,
    ) -> Result<(), Halt> {
        let mut found = 0;
        for position in mask.positions() {
            if found == count {
                // The letter's occurrences are all accounted for.
                state.eliminate(letter, position);
                self.observer.on_event(SolveEvent::LetterEliminated {
                    letter: ALPHABET[letter],
                    position,
                });
                continue;
            }
            match self.count_in_subset(state, letter, PositionSet::single(position), filler)? {
                0 => {
                    state.eliminate(letter, position);
                    self.observer.on_event(SolveEvent::LetterEliminated {
                        letter: ALPHABET[letter],
                        position,
                    });
                }
                1 => {
                    state.confirm(position, letter);
                    self.observer.on_event(SolveEvent::PositionConfirmed {
                        position,
                        letter: ALPHABET[letter],
                    });
                    found += 1;
                }
                hits => {
                    return Err(Halt::from(SolveError::CountMismatch {
                        expected: 1,
                        actual: hits,
                    }));
                }
            }
        }
        if found != count {
            return Err(Halt::from(SolveError::CountMismatch {
                expected: count,
                actual: found,
            }));
        }
        Ok(())
    }

    /// Counts the letter's occurrences inside the subset with one probe: the
    /// letter at the subset's positions, the absent filler at every other open
    /// position, and confirmed letters held in place. Confirmed positions all
    /// match and the filler never does, so the subset's contribution falls out
    /// of the match count.
    fn count_in_subset(
        &mut self,
        state: &SolverState,
        letter: usize,
        subset: PositionSet,
        filler: usize,
    ) -> Result<usize, Halt> {
        let mut probe = String::with_capacity(self.length);
        let mut confirmed_matches = 0;
        for position in 0..self.length {
            if state.is_confirmed(position) {
                probe.push(ALPHABET[state.tentative(position)]);
                confirmed_matches += 1;
            } else if subset.contains(position) {
                probe.push(ALPHABET[letter]);
            } else {
                probe.push(ALPHABET[filler]);
            }
        }

        let matches = self.probe(&probe)?;
        if matches < confirmed_matches || matches - confirmed_matches > subset.len() {
            return Err(Halt::from(SolveError::CountMismatch {
                expected: confirmed_matches,
                actual: matches,
            }));
        }
        Ok(matches - confirmed_matches)
    }

    /// Resolves the remaining open positions one at a time by measuring the
    /// match-count delta of single-letter substitutions against the rolling
    /// baseline.
    fn refine(&mut self, state: &mut SolverState, mut baseline: usize) -> Result<(), Halt> {
        while !state.all_confirmed() {
            if let Some(letter) = forced_fill_letter(state) {
                let open = state.open_positions();
                state.assign_all(open, letter);
                self.observer.on_event(SolveEvent::ForcedFill {
                    letter: ALPHABET[letter],
                    num_positions: open.len(),
                });
                // The fill closed every open position, so this refresh probe
                // is the full secret and ends the run through the early exit.
                let matches = self.probe(&state.candidate_string())?;
                return Err(Halt::from(SolveError::CountMismatch {
                    expected: self.length,
                    actual: matches,
                }));
            }

            let mut progressed = false;
            for position in 0..state.len() {
                if state.is_confirmed(position) {
                    continue;
                }
                for letter in candidate_letters(state, position) {
                    let probe = state.candidate_with(position, letter);
                    let matches = self.probe(&probe)?;
                    let delta = matches as isize - baseline as isize;
                    if delta == 1 {
                        // The substituted letter is the one that belongs here.
                        state.confirm(position, letter);
                        self.observer.on_event(SolveEvent::PositionConfirmed {
                            position,
                            letter: ALPHABET[letter],
                        });
                        baseline = matches;
                        progressed = true;
                        break;
                    } else if delta == -1 {
                        // The substitution broke a match, so the tentative
                        // letter was already correct.
                        let original = state.tentative(position);
                        state.confirm(position, original);
                        self.observer.on_event(SolveEvent::PositionConfirmed {
                            position,
                            letter: ALPHABET[original],
                        });
                        progressed = true;
                        break;
                    } else if delta == 0 {
                        state.eliminate(letter, position);
                        self.observer.on_event(SolveEvent::LetterEliminated {
                            letter: ALPHABET[letter],
                            position,
                        });
                    } else {
                        return Err(Halt::from(SolveError::UnexpectedDelta { position, delta }));
                    }
                }
                if progressed {
                    // Remaining counts changed; re-run the forced-fill check
                    // and rebuild the letter priority.
                    break;
                }
            }

            if !progressed {
                return Err(Halt::from(SolveError::RefinementStall {
                    open_positions: state.num_open(),
                }));
            }
        }
        Ok(())
    }
}

/// The letters worth trying at an open position: still unplaced, still a
/// candidate there, and different from the tentative letter. Ordered by
/// descending remaining count, canonical order on ties.
fn candidate_letters(state: &SolverState, position: usize) -> Vec<usize> {
    indices_by_count_desc(&state.remaining_counts())
        .iter()
        .copied()
        .filter(|&letter| {
            state.remaining(letter) > 0
                && state.mask(letter).contains(position)
                && letter != state.tentative(position)
        })
        .collect()
}

/// Returns the letter that must occupy every open position, if there is one.
fn forced_fill_letter(state: &SolverState) -> Option<usize> {
    let open = state.num_open();
    if open == 0 {
        return None;
    }
    (0..ALPHABET_SIZE).find(|&letter| state.remaining(letter) == open)
}

/// Returns the only letter with a nonzero count, if exactly one has any.
fn single_letter(counts: &[usize; ALPHABET_SIZE]) -> Option<usize> {
    let mut nonzero = counts.iter().enumerate().filter(|(_, &count)| count > 0);
    match (nonzero.next(), nonzero.next()) {
        (Some((letter, _)), None) => Some(letter),
        _ => None,
    }
}

/// Returns the first letter with a zero count, if any letter is absent from
/// the secret.
fn absent_letter(counts: &[usize; ALPHABET_SIZE]) -> Option<usize> {
    counts.iter().position(|&count| count == 0)
}

fn repeat_letter(letter: usize, length: usize) -> String {
    std::iter::repeat(ALPHABET[letter]).take(length).collect()
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn solves_a_mixed_secret() {
        let mut oracle = SecretOracle::new("BBAABB");
        let report = solve(&mut oracle).unwrap();

        assert_eq!(report.secret, "BBAABB");
        assert_eq!(report.num_queries, oracle.num_queries());
    }

    #[test]
    fn single_letter_picks_the_only_nonzero_count() {
        assert_eq!(single_letter(&[0, 0, 0, 0, 0, 3]), Some(5));
        assert_eq!(single_letter(&[1, 0, 0, 0, 0, 3]), None);
        assert_eq!(single_letter(&[0; ALPHABET_SIZE]), None);
    }

    #[test]
    fn absent_letter_prefers_canonical_order() {
        assert_eq!(absent_letter(&[2, 0, 0, 1, 1, 1]), Some(1));
        assert_eq!(absent_letter(&[1, 1, 1, 1, 1, 1]), None);
    }

    #[test]
    fn forced_fill_requires_exact_cover() {
        let state = SolverState::new(3, [2, 1, 0, 0, 0, 0]);
        // Two letters still unplaced; neither covers all three positions.
        assert_eq!(forced_fill_letter(&state), None);

        let mut state = SolverState::new(3, [2, 1, 0, 0, 0, 0]);
        state.confirm(0, 1);
        assert_eq!(forced_fill_letter(&state), Some(0));
    }

    /// Rejects every probe's length.
    struct NoLengthOracle;

    impl Oracle for NoLengthOracle {
        fn evaluate(&mut self, _guess: &str) -> MatchResult {
            MatchResult::WrongLength
        }
    }

    #[test]
    fn reports_length_not_found() {
        assert_matches::assert_matches!(
            solve(NoLengthOracle),
            Err(SolveError::LengthNotFound)
        );
    }

    /// Accepts length 3 but claims no letter ever matches.
    struct ZeroCountOracle;

    impl Oracle for ZeroCountOracle {
        fn evaluate(&mut self, guess: &str) -> MatchResult {
            if guess.len() != 3 {
                return MatchResult::WrongLength;
            }
            MatchResult::Matches(0)
        }
    }

    #[test]
    fn reports_count_mismatch_when_counts_do_not_cover_the_length() {
        assert_matches::assert_matches!(
            solve(ZeroCountOracle),
            Err(SolveError::CountMismatch {
                expected: 3,
                actual: 0
            })
        );
    }

    /// Accepts one length-5 detection probe, then rejects every length.
    struct FickleOracle {
        accepted: bool,
    }

    impl Oracle for FickleOracle {
        fn evaluate(&mut self, guess: &str) -> MatchResult {
            if guess.len() == 5 && !self.accepted {
                self.accepted = true;
                return MatchResult::Matches(1);
            }
            MatchResult::WrongLength
        }
    }

    #[test]
    fn reports_length_conflict_when_redetection_disagrees() {
        assert_matches::assert_matches!(
            solve(FickleOracle { accepted: false }),
            Err(SolveError::LengthConflict { length: 5 })
        );
    }

    /// Relays to a real oracle but rejects the length of exactly one probe.
    struct GlitchOracle {
        inner: SecretOracle,
        glitch_at: u32,
        queries: u32,
    }

    impl Oracle for GlitchOracle {
        fn evaluate(&mut self, guess: &str) -> MatchResult {
            self.queries += 1;
            if self.queries == self.glitch_at {
                return MatchResult::WrongLength;
            }
            self.inner.evaluate(guess)
        }
    }

    #[test]
    fn recovers_from_a_single_length_glitch() {
        // The glitch lands on the first frequency probe after detection.
        let oracle = GlitchOracle {
            inner: SecretOracle::new("BBAABB"),
            glitch_at: 8,
            queries: 0,
        };
        let report = solve(oracle).unwrap();

        assert_eq!(report.secret, "BBAABB");
    }

    /// Relays to a real oracle, then inflates match counts late in the run.
    struct LyingOracle {
        inner: SecretOracle,
        lie_after: u32,
    }

    impl Oracle for LyingOracle {
        fn evaluate(&mut self, guess: &str) -> MatchResult {
            let result = self.inner.evaluate(guess);
            if self.inner.num_queries() > self.lie_after {
                if let MatchResult::Matches(count) = result {
                    return MatchResult::Matches(count + 2);
                }
            }
            result
        }
    }

    #[test]
    fn reports_unexpected_delta_when_a_substitution_moves_the_count_by_two() {
        // Honest through detection (6), frequencies (5), and the baseline
        // probe (1); the first refinement probe then comes back inflated.
        let oracle = LyingOracle {
            inner: SecretOracle::new("UIXCAB"),
            lie_after: 12,
        };

        assert_matches::assert_matches!(
            solve(oracle),
            Err(SolveError::UnexpectedDelta { delta: 2, .. })
        );
    }

    /// Claims one occurrence of every letter but scores every mixed probe
    /// zero, so no substitution can ever make progress.
    struct StallOracle;

    impl Oracle for StallOracle {
        fn evaluate(&mut self, guess: &str) -> MatchResult {
            if guess.len() != 6 {
                return MatchResult::WrongLength;
            }
            let first = guess.chars().next().unwrap();
            if guess.chars().all(|letter| letter == first) {
                return MatchResult::Matches(1);
            }
            MatchResult::Matches(0)
        }
    }

    #[test]
    fn reports_refinement_stall_when_no_substitution_helps() {
        assert_matches::assert_matches!(
            solve(StallOracle),
            Err(SolveError::RefinementStall { open_positions: 6 })
        );
    }
}

#[cfg(all(feature = "unstable", test))]
mod benches {

    extern crate test;

    use super::*;
    use test::Bencher;

    #[bench]
    fn bench_solve_reference_secret(b: &mut Bencher) {
        b.iter(|| solve(SecretOracle::new("BACXIUBACXIUBA")));
    }

    #[bench]
    fn bench_solve_two_letter_secret(b: &mut Bencher) {
        b.iter(|| solve(SecretOracle::new("BBAABBAABBAABBAABB")));
    }
}

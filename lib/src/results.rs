use crate::data::PositionSet;
use std::error::Error;
use std::fmt;

/// The oracle's verdict on a single guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// The number of positions where the guess and the secret agree exactly.
    Matches(usize),
    /// The guess's length differs from the secret's length.
    WrongLength,
    /// The guess contains a character outside the alphabet.
    InvalidCharacter,
}

/// Indicates that an error occurred while trying to recover the secret.
///
/// Every variant is fatal: each one means either the oracle broke its
/// contract mid-run or the solver's own bookkeeping went inconsistent, and
/// continuing from such a state could produce a wrong answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// No length up to the maximum was accepted by the oracle.
    LengthNotFound,
    /// The oracle rejected a probe's length after the length had already been
    /// established, and re-detection could not resolve the conflict.
    LengthConflict { length: usize },
    /// The oracle rejected a probe's characters even though probes are built
    /// only from the alphabet.
    InvalidProbe { probe: String },
    /// Measured letter counts did not sum to the expected total.
    CountMismatch { expected: usize, actual: usize },
    /// A single-position substitution moved the match count by more than one.
    UnexpectedDelta { position: usize, delta: isize },
    /// A full refinement pass over the open positions confirmed nothing.
    RefinementStall { open_positions: usize },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::LengthNotFound => {
                write!(f, "no secret length up to the maximum was accepted")
            }
            SolveError::LengthConflict { length } => write!(
                f,
                "the oracle rejected the established secret length {}",
                length
            ),
            SolveError::InvalidProbe { probe } => {
                write!(f, "the oracle rejected the probe {:?} as invalid", probe)
            }
            SolveError::CountMismatch { expected, actual } => write!(
                f,
                "letter counts summed to {} where {} was expected",
                actual, expected
            ),
            SolveError::UnexpectedDelta { position, delta } => write!(
                f,
                "substituting position {} moved the match count by {}",
                position, delta
            ),
            SolveError::RefinementStall { open_positions } => write!(
                f,
                "refinement made no progress with {} position(s) still open",
                open_positions
            ),
        }
    }
}

impl Error for SolveError {}

/// The outcome of a successful solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveReport {
    /// The recovered secret.
    pub secret: String,
    /// The total number of oracle queries issued.
    pub num_queries: u32,
}

/// A structured progress event emitted while solving.
///
/// Events describe what the solver has learned, not how it is printed; install
/// a [`SolveObserver`] to turn them into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveEvent<'a> {
    /// A probe was sent to the oracle.
    QueryIssued {
        number: u32,
        probe: &'a str,
        result: MatchResult,
    },
    /// The secret's length was established.
    LengthFound { length: usize },
    /// A letter's total occurrence count was measured.
    LetterMeasured { letter: char, count: usize },
    /// A position was proven to hold the given letter.
    PositionConfirmed { position: usize, letter: char },
    /// A letter was proven absent from the given position.
    LetterEliminated { letter: char, position: usize },
    /// Every open position was filled with the only letter that could still
    /// account for them.
    ForcedFill { letter: char, num_positions: usize },
    /// Group locating proved the letter occupies exactly this set of
    /// positions.
    GroupAssigned {
        letter: char,
        positions: PositionSet,
    },
}

/// Receives [`SolveEvent`]s as the solver makes progress.
///
/// The solver itself performs no I/O; callers that want a trace of the run
/// provide an observer and render the events however they like.
pub trait SolveObserver {
    fn on_event(&mut self, event: SolveEvent);
}

/// An observer that discards every event.
pub struct NullObserver;

impl SolveObserver for NullObserver {
    fn on_event(&mut self, _event: SolveEvent) {}
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn solve_error_messages_name_the_violation() {
        let error = SolveError::CountMismatch {
            expected: 14,
            actual: 13,
        };
        assert_eq!(
            error.to_string(),
            "letter counts summed to 13 where 14 was expected"
        );

        let error = SolveError::UnexpectedDelta {
            position: 3,
            delta: -2,
        };
        assert!(error.to_string().contains("position 3"));
        assert!(error.to_string().contains("-2"));
    }
}

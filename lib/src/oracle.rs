use crate::data::{alphabet_index, is_valid_secret, ALPHABET, ALPHABET_SIZE, MAX_SECRET_LENGTH};
use crate::results::MatchResult;
use rand::Rng;

/// The feedback endpoint the solver queries.
///
/// An oracle holds a secret and exposes exactly one operation: score a guess.
/// Everything the solver learns, it learns through [`evaluate`].
///
/// [`evaluate`]: Oracle::evaluate
pub trait Oracle {
    /// Scores the given guess against the secret.
    ///
    /// Checks run in order: every character must be in the alphabet, then the
    /// length must match the secret's, and only then is the exact-position
    /// match count computed. A count equal to the guess's length means the
    /// guess *is* the secret; detecting that is the caller's job.
    fn evaluate(&mut self, guess: &str) -> MatchResult;
}

impl<O: Oracle + ?Sized> Oracle for &mut O {
    fn evaluate(&mut self, guess: &str) -> MatchResult {
        (**self).evaluate(guess)
    }
}

/// An in-memory oracle holding a known secret.
///
/// This is the reference implementation used by tests, benchmarks, and the
/// `single` command; the solver only ever sees the [`Oracle`] trait.
pub struct SecretOracle {
    secret: String,
    num_queries: u32,
}

impl SecretOracle {
    /// Creates an oracle for the given secret.
    ///
    /// # Panics
    ///
    /// Panics if the secret is empty, longer than [`MAX_SECRET_LENGTH`], or
    /// contains a character outside the alphabet. Callers accepting untrusted
    /// input should check with [`is_valid_secret`] first.
    pub fn new(secret: &str) -> SecretOracle {
        if !is_valid_secret(secret) {
            panic!(
                "Secret ({}) must be 1 to {} characters from the alphabet {:?}",
                secret, MAX_SECRET_LENGTH, ALPHABET
            );
        }
        SecretOracle {
            secret: secret.to_string(),
            num_queries: 0,
        }
    }

    /// Creates an oracle holding a uniformly random secret of the given
    /// length.
    pub fn with_random_secret(length: usize) -> SecretOracle {
        SecretOracle::new(&random_secret(length))
    }

    /// The stored secret, for harnesses that need to check the answer.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The number of times this oracle has been queried.
    pub fn num_queries(&self) -> u32 {
        self.num_queries
    }
}

impl Oracle for SecretOracle {
    fn evaluate(&mut self, guess: &str) -> MatchResult {
        self.num_queries += 1;
        if guess
            .chars()
            .any(|letter| alphabet_index(letter).is_none())
        {
            return MatchResult::InvalidCharacter;
        }
        if guess.len() != self.secret.len() {
            return MatchResult::WrongLength;
        }
        let matched = guess
            .chars()
            .zip(self.secret.chars())
            .filter(|(guessed, actual)| guessed == actual)
            .count();
        MatchResult::Matches(matched)
    }
}

/// Returns a uniformly random secret of the given length.
///
/// # Panics
///
/// Panics if the length is zero or exceeds [`MAX_SECRET_LENGTH`].
pub fn random_secret(length: usize) -> String {
    assert!(
        length >= 1 && length <= MAX_SECRET_LENGTH,
        "Secret length ({}) must be between 1 and {}",
        length,
        MAX_SECRET_LENGTH
    );
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET_SIZE)])
        .collect()
}

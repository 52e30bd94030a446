#![cfg_attr(feature = "unstable", feature(test))]

//! Recovers a hidden code over a fixed six-letter alphabet by adaptively
//! querying an oracle that only reports how many positions of a guess match
//! the secret exactly.
//!
//! The solver discovers the secret's length, measures each letter's occurrence
//! count, localizes letter groups with binary splits when an absent letter is
//! available as neutral padding, and resolves the rest one position at a time
//! from match-count deltas, spending as few oracle queries as it can.
//!
//! ```
//! use rs_code_breaker::{solve, SecretOracle};
//!
//! let mut oracle = SecretOracle::new("BACXIUBACXIUBA");
//! let report = solve(&mut oracle).unwrap();
//!
//! assert_eq!(report.secret, "BACXIUBACXIUBA");
//! assert_eq!(report.num_queries, oracle.num_queries());
//! ```

mod data;
mod oracle;
mod results;
mod solver;
mod state;

pub use data::alphabet_index;
pub use data::is_valid_secret;
pub use data::PositionSet;
pub use data::ALPHABET;
pub use data::ALPHABET_SIZE;
pub use data::MAX_SECRET_LENGTH;
pub use oracle::random_secret;
pub use oracle::Oracle;
pub use oracle::SecretOracle;
pub use results::*;
pub use solver::solve;
pub use solver::solve_all;
pub use solver::solve_with_observer;
pub use state::SolverState;

use clap::{Parser, Subcommand};
use rs_code_breaker::*;
use std::collections::HashMap;
use std::io;
use std::io::Write;
use std::time::Instant;

/// Simple program that recovers hidden codes from a match-count oracle and
/// reports how many queries each recovery took.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recover one given secret with an in-memory oracle.
    Single {
        /// The secret to recover, using only the letters B, A, C, X, I, U.
        secret: String,
        /// Print every probe and deduction as it happens.
        #[clap(short, long)]
        verbose: bool,
    },
    /// Recover batches of random secrets of every supported length and report
    /// the query-count distribution.
    Benchmark {
        /// Number of random secrets per length.
        #[clap(short, long, default_value_t = 100)]
        games: usize,
    },
    /// You hold the secret; answer each probe with its match count.
    Interactive,
}

fn main() {
    let start_time = Instant::now();
    let args = Args::parse();

    let result = match args.command {
        Command::Single { secret, verbose } => run_single(&secret, verbose),
        Command::Benchmark { games } => run_benchmark(games),
        Command::Interactive => run_interactive(),
    };
    if let Err(message) = result {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }

    println!(
        "Command executed in {:.3}s.",
        start_time.elapsed().as_secs_f64()
    );
}

fn run_single(secret: &str, verbose: bool) -> Result<(), String> {
    if !is_valid_secret(secret) {
        return Err(format!(
            "the secret must be 1 to {} letters from {:?}",
            MAX_SECRET_LENGTH, ALPHABET
        ));
    }

    let mut oracle = SecretOracle::new(secret);
    let report = if verbose {
        solve_with_observer(&mut oracle, &mut ConsoleObserver)
    } else {
        solve(&mut oracle)
    }
    .map_err(|error| error.to_string())?;

    println!("Secret found : {}", report.secret);
    println!("Total queries: {}", report.num_queries);
    Ok(())
}

fn run_benchmark(games: usize) -> Result<(), String> {
    let mut num_queries_per_game: Vec<u32> = Vec::new();
    for length in 1..=MAX_SECRET_LENGTH {
        let secrets: Vec<String> = (0..games).map(|_| random_secret(length)).collect();
        let reports = solve_all(&secrets).map_err(|error| error.to_string())?;
        for (secret, report) in secrets.iter().zip(reports.iter()) {
            assert_eq!(*secret, report.secret);
            num_queries_per_game.push(report.num_queries);
        }
    }
    println!("Solved {} secrets. Results:", num_queries_per_game.len());

    let mut num_games_per_query_count: HashMap<u32, u32> = HashMap::new();
    for num_queries in num_queries_per_game.iter() {
        *(num_games_per_query_count.entry(*num_queries).or_insert(0)) += 1;
    }

    println!("|Num queries|Num games|");
    println!("|-----------|---------|");
    let mut query_counts = num_games_per_query_count
        .keys()
        .map(|key| *key)
        .collect::<Vec<u32>>();
    query_counts.sort_unstable();
    for query_count in query_counts.iter() {
        println!(
            "|{}|{}|",
            query_count,
            num_games_per_query_count.get(query_count).unwrap()
        );
    }

    let average: f64 = num_queries_per_game.iter().sum::<u32>() as f64
        / num_queries_per_game.len() as f64;
    let std_dev: f64 = (num_queries_per_game
        .iter()
        .map(|num_queries| (*num_queries as f64 - average).powi(2))
        .sum::<f64>()
        / num_queries_per_game.len() as f64)
        .sqrt();

    println!(
        "\n**Average number of queries:** {:.2} +/- {:.2}",
        average, std_dev
    );
    Ok(())
}

fn run_interactive() -> Result<(), String> {
    println!(
        "Think of a code of 1 to {} letters from {:?}. Press enter once you've chosen.",
        MAX_SECRET_LENGTH, ALPHABET
    );
    {
        let mut buffer = String::new();
        io::stdin()
            .read_line(&mut buffer)
            .map_err(|error| error.to_string())?;
    }

    println!(
        "I will now probe for your code.\n\n\
         For each probe, answer with:\n\n\
           * the number of positions where the probe matches your code exactly\n\
           * -2 if the probe's length differs from your code's length\n\
           * -1 if the probe is somehow invalid\n"
    );

    let report = solve(&mut StdinOracle).map_err(|error| error.to_string())?;
    println!(
        "Your code is {}. It took me {} queries.",
        report.secret, report.num_queries
    );
    Ok(())
}

/// Prints every solver event, tracing the solver's reasoning step by step.
struct ConsoleObserver;

impl SolveObserver for ConsoleObserver {
    fn on_event(&mut self, event: SolveEvent) {
        match event {
            SolveEvent::QueryIssued {
                number,
                probe,
                result,
            } => println!("query #{}: \"{}\" -> {:?}", number, probe, result),
            SolveEvent::LengthFound { length } => println!("length = {}", length),
            SolveEvent::LetterMeasured { letter, count } => {
                println!("count['{}'] = {}", letter, count)
            }
            SolveEvent::PositionConfirmed { position, letter } => {
                println!("confirmed pos {} = '{}'", position, letter)
            }
            SolveEvent::LetterEliminated { letter, position } => {
                println!("eliminated '{}' at pos {}", letter, position)
            }
            SolveEvent::ForcedFill {
                letter,
                num_positions,
            } => println!(
                "forced fill: {} open position(s) must be '{}'",
                num_positions, letter
            ),
            SolveEvent::GroupAssigned { letter, positions } => {
                println!("group: '{}' occupies {:?}", letter, positions)
            }
        }
    }
}

/// Relays probes to a human who holds the secret.
///
/// Unparseable answers are asked again; end-of-input aborts the run.
struct StdinOracle;

impl Oracle for StdinOracle {
    fn evaluate(&mut self, guess: &str) -> MatchResult {
        println!("My probe: {}", guess);
        loop {
            print!("matches? ");
            let _ = io::stdout().flush();

            let mut buffer = String::new();
            match io::stdin().read_line(&mut buffer) {
                Ok(0) | Err(_) => return MatchResult::InvalidCharacter,
                Ok(_) => {}
            }
            match buffer.trim().parse::<i64>() {
                Ok(-2) => return MatchResult::WrongLength,
                Ok(-1) => return MatchResult::InvalidCharacter,
                Ok(count) if count >= 0 && count as usize <= guess.len() => {
                    return MatchResult::Matches(count as usize)
                }
                _ => println!(
                    "Enter a number between 0 and {}, or -1/-2. Try again.",
                    guess.len()
                ),
            }
        }
    }
}

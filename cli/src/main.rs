//! # Tile Merge CLI
//!
//! Command-line interface for playing interactively or running headless
//! simulations with configurable policies.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tilemerge_core::{Direction, Session, SessionConfig, SessionError, Status};

const CONTROLS: &str = "Controls: WASD or Arrow Keys | U undo | R restart | K keep playing | Q quit";

#[derive(Parser, Debug)]
#[command(name = "tilemerge")]
#[command(author, version, about = "Play the tile merge puzzle in the terminal or run simulations")]
struct Args {
    /// Run in interactive mode (default if no other mode specified)
    #[arg(short, long)]
    interactive: bool,

    /// Number of episodes to run in headless mode
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Maximum steps per episode (0 = unlimited)
    #[arg(short, long, default_value = "10000")]
    max_steps: u32,

    /// Policy for headless mode
    #[arg(short, long, value_enum, default_value = "random")]
    policy: Policy,

    /// Show board after each move in headless mode
    #[arg(long)]
    verbose: bool,

    /// TOML file with session settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Share string to start from (falls back to a new game if invalid)
    #[arg(long)]
    state: Option<String>,

    /// Print the share string after every turn
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Random legal moves
    Random,
    /// Cycle through moves: Left, Down, Right, Up
    Cycle,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SessionConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    debug!("using {config:?}");

    if let Some(episodes) = args.episodes {
        run_headless(&args, &config, episodes)
    } else {
        run_interactive(&args, config)
    }
}

/// Run interactive mode where user plays with keyboard.
fn run_interactive(args: &Args, config: SessionConfig) -> Result<()> {
    let _raw = RawMode::enable();

    let mut session = Session::new(config, args.seed);
    if let Some(state) = &args.state {
        if !session.load_or_new_game(state) {
            info!("started a new game instead of {state:?}");
        }
    }
    let mut stdin = io::stdin();
    let mut buffer = [0u8; 3];

    redraw(&session, args.debug, None)?;

    loop {
        let bytes_read = stdin.read(&mut buffer).context("reading keyboard input")?;
        if bytes_read == 0 {
            continue;
        }

        match parse_input(&buffer[..bytes_read]) {
            InputAction::Move(direction) => match session.play(direction) {
                Ok((outcome, Some(_))) => {
                    let note = (outcome.score_gain > 0).then(|| format!("+{} points!", outcome.score_gain));
                    redraw(&session, args.debug, note.as_deref())?;
                }
                Ok((_, None)) => redraw(&session, args.debug, Some("Nothing moved"))?,
                Err(SessionError::GameOver | SessionError::AwaitingContinue) => {}
                Err(err) => return Err(err).context("playing move"),
            },
            InputAction::Undo => {
                let note = match session.undo() {
                    Ok(()) => "Undone",
                    Err(_) => "Nothing to undo",
                };
                redraw(&session, args.debug, Some(note))?;
            }
            InputAction::KeepPlaying => {
                if session.continue_playing() {
                    redraw(&session, args.debug, Some("Keep going!"))?;
                }
            }
            InputAction::Restart => {
                session.new_game();
                redraw(&session, args.debug, None)?;
            }
            InputAction::Quit => {
                println!("\nGoodbye!");
                return Ok(());
            }
            InputAction::None => {}
        }
    }
}

fn redraw(session: &Session, show_state: bool, note: Option<&str>) -> Result<()> {
    println!("\x1b[2J\x1b[H"); // Clear screen
    println!("=== 2048 ===");
    println!("{CONTROLS}\n");
    print!("{}", session.engine());
    println!("Best: {}", session.best_score());

    if let Some(note) = note {
        println!("  {note}");
    }
    if show_state {
        println!("  state: {}", session.encode_state()?);
    }

    match session.status() {
        Status::Lost => {
            println!("\n  *** GAME OVER ***");
            println!("  Final Score: {}", session.score());
            println!("  Max Tile: {}", session.engine().max_tile());
            println!("\n  Press U to undo, R to restart or Q to quit");
        }
        Status::Won => {
            println!("\n  *** YOU WIN! ***");
            println!("\n  Press K to keep playing, R to restart or Q to quit");
        }
        Status::Playing => {}
    }
    io::stdout().flush()?;
    Ok(())
}

/// Run headless simulation mode.
fn run_headless(args: &Args, config: &SessionConfig, episodes: u32) -> Result<()> {
    anyhow::ensure!(episodes > 0, "--episodes must be at least 1");

    let mut total_score: u64 = 0;
    let mut max_tile_overall: u32 = 0;
    let mut scores: Vec<u32> = Vec::with_capacity(episodes as usize);
    let mut tile_counts: BTreeMap<u32, u32> = BTreeMap::new();

    // Use a separate RNG for move selection
    let mut policy_rng = SmallRng::seed_from_u64(args.seed.wrapping_add(1000));

    for episode in 0..episodes {
        let episode_seed = args.seed.wrapping_add(episode as u64);
        let mut session = Session::new(config.clone(), episode_seed);
        let mut steps = 0;
        let mut move_cycle = 0;

        while args.max_steps == 0 || steps < args.max_steps {
            match session.status() {
                Status::Lost => break,
                Status::Won => {
                    session.continue_playing();
                }
                Status::Playing => {}
            }

            let direction = match args.policy {
                Policy::Random => select_random_move(&session, &mut policy_rng),
                Policy::Cycle => select_cycle_move(&session, &mut move_cycle),
            };
            let Some(direction) = direction else {
                break; // No legal moves
            };

            session.play(direction).context("simulated move")?;
            steps += 1;

            if args.verbose {
                println!("Episode {} Step {}: {}", episode + 1, steps, direction);
                print!("{}", session.engine());
            }
        }

        let score = session.score();
        let max_tile = session.engine().max_tile();

        scores.push(score);
        *tile_counts.entry(max_tile).or_insert(0) += 1;
        total_score += score as u64;
        max_tile_overall = max_tile_overall.max(max_tile);

        if args.verbose {
            println!(
                "Episode {}: Score={}, MaxTile={}, Steps={}",
                episode + 1,
                score,
                max_tile,
                steps
            );
        }
    }

    // Compute statistics
    let avg_score = total_score as f64 / episodes as f64;
    scores.sort_unstable();
    let mid = scores.len() / 2;
    let median_score = if scores.len() % 2 == 0 {
        (scores[mid - 1] as f64 + scores[mid] as f64) / 2.0
    } else {
        scores[mid] as f64
    };

    // Output results in parseable format
    println!("=== Simulation Results ===");
    println!("episodes={}", episodes);
    println!("policy={:?}", args.policy);
    println!("seed={}", args.seed);
    println!("max_steps={}", args.max_steps);
    println!("avg_score={:.2}", avg_score);
    println!("median_score={:.2}", median_score);
    println!("min_score={}", scores.first().unwrap_or(&0));
    println!("max_score={}", scores.last().unwrap_or(&0));
    println!("max_tile_overall={}", max_tile_overall);

    let distribution: Vec<String> = tile_counts
        .iter()
        .map(|(tile, count)| format!("{}:{}", tile, count))
        .collect();
    println!("tile_distribution={}", distribution.join(","));
    Ok(())
}

/// Select a random legal move.
fn select_random_move(session: &Session, rng: &mut SmallRng) -> Option<Direction> {
    let legal = session.engine().legal_directions();
    let candidates: Vec<Direction> = Direction::all()
        .into_iter()
        .filter(|d| legal[d.index()])
        .collect();
    candidates.choose(rng).copied()
}

/// Select moves in a cycle: Left, Down, Right, Up.
fn select_cycle_move(session: &Session, cycle: &mut usize) -> Option<Direction> {
    let order = [Direction::Left, Direction::Down, Direction::Right, Direction::Up];
    let legal = session.engine().legal_directions();

    // Try moves in cycle order, starting from current position
    for _ in 0..order.len() {
        let direction = order[*cycle % order.len()];
        *cycle += 1;
        if legal[direction.index()] {
            return Some(direction);
        }
    }

    None
}

#[derive(Debug, PartialEq, Eq)]
enum InputAction {
    Move(Direction),
    Undo,
    KeepPlaying,
    Restart,
    Quit,
    None,
}

fn parse_input(bytes: &[u8]) -> InputAction {
    match bytes {
        // Arrow keys (escape sequences)
        [27, 91, 65] => InputAction::Move(Direction::Up),
        [27, 91, 66] => InputAction::Move(Direction::Down),
        [27, 91, 67] => InputAction::Move(Direction::Right),
        [27, 91, 68] => InputAction::Move(Direction::Left),

        // WASD keys
        [b'w'] | [b'W'] => InputAction::Move(Direction::Up),
        [b's'] | [b'S'] => InputAction::Move(Direction::Down),
        [b'a'] | [b'A'] => InputAction::Move(Direction::Left),
        [b'd'] | [b'D'] => InputAction::Move(Direction::Right),

        // Control keys
        [b'u'] | [b'U'] | [b'z'] | [b'Z'] => InputAction::Undo,
        [b'k'] | [b'K'] => InputAction::KeepPlaying,
        [b'q'] | [b'Q'] | [3] | [27] => InputAction::Quit, // q, Q, Ctrl+C, Esc
        [b'r'] | [b'R'] => InputAction::Restart,

        _ => InputAction::None,
    }
}

/// Puts the terminal in single-key mode until dropped.
struct RawMode;

impl RawMode {
    fn enable() -> Self {
        enable_raw_mode();
        RawMode
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        disable_raw_mode();
    }
}

// Platform-specific terminal raw mode handling
#[cfg(unix)]
fn enable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag &= !(libc::ICANON | libc::ECHO);
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(unix)]
fn disable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag |= libc::ICANON | libc::ECHO;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(not(unix))]
fn enable_raw_mode() {
    // Without raw mode every key needs Enter.
}

#[cfg(not(unix))]
fn disable_raw_mode() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arrows_and_wasd() {
        assert_eq!(parse_input(&[27, 91, 65]), InputAction::Move(Direction::Up));
        assert_eq!(parse_input(&[27, 91, 68]), InputAction::Move(Direction::Left));
        assert_eq!(parse_input(b"d"), InputAction::Move(Direction::Right));
        assert_eq!(parse_input(b"S"), InputAction::Move(Direction::Down));
    }

    #[test]
    fn test_parse_control_keys() {
        assert_eq!(parse_input(b"u"), InputAction::Undo);
        assert_eq!(parse_input(b"Z"), InputAction::Undo);
        assert_eq!(parse_input(b"k"), InputAction::KeepPlaying);
        assert_eq!(parse_input(b"r"), InputAction::Restart);
        assert_eq!(parse_input(&[27]), InputAction::Quit);
        assert_eq!(parse_input(b"x"), InputAction::None);
    }

    #[test]
    fn test_cycle_policy_skips_illegal_moves() {
        let mut session = Session::new(SessionConfig::default(), 0);
        session
            .load("0-1000000000000000")
            .expect("valid share string");
        // A lone tile in the top-left corner cannot move left or up.
        let mut cycle = 0;
        assert_eq!(select_cycle_move(&session, &mut cycle), Some(Direction::Down));
        assert_eq!(select_cycle_move(&session, &mut cycle), Some(Direction::Right));
        assert_eq!(select_cycle_move(&session, &mut cycle), Some(Direction::Down));
    }

    #[test]
    fn test_random_policy_only_picks_legal_moves() {
        let mut session = Session::new(SessionConfig::default(), 0);
        session.load("0-1000000000000000").unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..20 {
            let direction = select_random_move(&session, &mut rng).unwrap();
            assert!(matches!(direction, Direction::Down | Direction::Right));
        }
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["tilemerge", "--episodes", "3", "--policy", "cycle", "--debug"]);
        assert_eq!(args.episodes, Some(3));
        assert!(matches!(args.policy, Policy::Cycle));
        assert!(args.debug);
        assert_eq!(args.seed, 42);
    }
}

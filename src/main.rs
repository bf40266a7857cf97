use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use log::info;
use std::path::{Path, PathBuf};
use std::time::Instant;

use npuzzle_solver::board::{MAX_SIZE, MIN_SIZE};
use npuzzle_solver::{
    Board, DetailedSolution, DisjointPatterns, Solution, SolveError, Solver, SolverConfig,
};

#[derive(Parser, Debug)]
#[command(name = "npuzzle", author, version, about = "Optimal N-puzzle solver")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Solve a board and print the moves
    Solve {
        /// Board as JSON rows, e.g. '[[1,2,3],[4,5,0],[7,8,6]]'
        #[arg(long, conflicts_with = "random")]
        board: Option<String>,
        /// Solve a random solvable board of this size
        #[arg(long)]
        random: Option<usize>,
        /// With --random, walk this many slides from the goal instead of shuffling
        #[arg(long, requires = "random")]
        scramble: Option<usize>,
        /// Print every step with per-tile statistics
        #[arg(long)]
        detailed: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Search time limit in seconds
        #[arg(long)]
        time_limit: Option<u64>,
        /// JSON solver config
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Build the 4x4 pattern databases
    BuildPdb {
        /// Output directory (defaults to the configured pattern database directory)
        #[arg(long)]
        out: Option<PathBuf>,
        /// JSON solver config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Cmd::Solve {
            board,
            random,
            scramble,
            detailed,
            json,
            time_limit,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(secs) = time_limit {
                config.time_limit_secs = secs;
            }
            let board = read_board(board.as_deref(), random, scramble)?;
            cmd_solve(&config, &board, detailed, json)
        }
        Cmd::BuildPdb { out, config } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = out {
                config.pattern_databases.directory = dir;
            }
            cmd_build_pdb(&config)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SolverConfig> {
    match path {
        Some(path) => Ok(SolverConfig::load(path)?),
        None => Ok(SolverConfig::default()),
    }
}

fn read_board(
    board: Option<&str>,
    random: Option<usize>,
    scramble: Option<usize>,
) -> anyhow::Result<Board> {
    if let Some(text) = board {
        let rows: Vec<Vec<i64>> =
            serde_json::from_str(text).context("board must be a JSON array of rows")?;
        return Ok(Board::from_rows(&rows)?);
    }

    let Some(size) = random else {
        bail!("either --board or --random is required");
    };
    if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
        bail!("random board size must be between {} and {}", MIN_SIZE, MAX_SIZE);
    }

    let mut rng = rand::thread_rng();
    Ok(match scramble {
        Some(moves) => Board::scrambled(size, moves, &mut rng),
        None => Board::shuffled(size, &mut rng),
    })
}

fn cmd_solve(
    config: &SolverConfig,
    board: &Board,
    detailed: bool,
    json: bool,
) -> anyhow::Result<()> {
    let solver = Solver::new(config);
    info!(
        "Received solve request for {}x{} board {:?}",
        board.size(),
        board.size(),
        board
    );

    if !json {
        println!("{}\n{}", "Initial board:".bold(), board);
    }

    if detailed {
        let solution = solver.solve_detailed(board).map_err(describe_failure)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&solution)?);
        } else {
            print_detailed(&solution);
        }
    } else {
        let solution = solver.solve(board).map_err(describe_failure)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&solution)?);
        } else {
            print_path(&solution);
        }
    }
    Ok(())
}

fn describe_failure(err: SolveError) -> anyhow::Error {
    let hint = match &err {
        SolveError::Invalid(_) => "check the board shape and values",
        SolveError::Unsolvable => "the board is in the wrong parity class",
        SolveError::Timeout { .. } => "the board is too complex for the time limit",
        SolveError::SearchExhausted { .. } => "this is a solver bug",
    };
    anyhow::Error::new(err).context(format!("no solution found: {}", hint))
}

fn print_summary(moves: usize, nodes: u64, millis: u128) {
    println!(
        "{} {} moves, {} nodes explored, {}ms",
        "Optimal solution:".green().bold(),
        moves,
        nodes,
        millis
    );
}

fn print_path(solution: &Solution) {
    print_summary(
        solution.moves,
        solution.nodes_explored,
        solution.elapsed.as_millis(),
    );
    for (i, board) in solution.path.iter().enumerate().skip(1) {
        println!("{}\n{}", format!("Step {}", i).cyan(), board);
    }
}

fn print_detailed(solution: &DetailedSolution) {
    print_summary(
        solution.total_steps,
        solution.nodes_explored,
        solution.elapsed.as_millis(),
    );
    for step in solution.steps.iter().skip(1) {
        println!(
            "{} {} {}\n{}",
            format!("Step {}:", step.step_number).cyan(),
            step.action,
            format!("(h = {}, explored {})", step.heuristic_value, step.nodes_explored_at_step)
                .dark_grey(),
            step.board
        );
    }

    println!("{}", "Moves per tile:".bold());
    for (tile, count) in &solution.tile_move_counts {
        let cells: Vec<String> = solution.tile_paths[tile]
            .iter()
            .map(|pos| format!("({},{})", pos.row, pos.col))
            .collect();
        println!("  {:>3}: {:>3}  {}", tile, count, cells.join(" "));
    }
}

fn cmd_build_pdb(config: &SolverConfig) -> anyhow::Result<()> {
    let pdb = &config.pattern_databases;
    std::fs::create_dir_all(&pdb.directory)
        .with_context(|| format!("failed to create {}", pdb.directory.display()))?;

    let start = Instant::now();
    info!("Building pattern databases into {}", pdb.directory.display());
    let patterns = DisjointPatterns::build_default()?;
    patterns.save(pdb)?;

    println!(
        "{} {} and {} in {:.1}s",
        "Wrote".green().bold(),
        pdb.lower_path().display(),
        pdb.upper_path().display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

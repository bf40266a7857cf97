use npuzzle_solver::{
    is_solvable, manhattan_distance, pattern_db, Board, DisjointPatterns, HeuristicKind,
    HeuristicProvider, PatternDatabase, PatternDbConfig, SolveError, Solver, StepAction,
};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn rows(grid: &[&[i64]]) -> Vec<Vec<i64>> {
    grid.iter().map(|row| row.to_vec()).collect()
}

fn manhattan_solver() -> Solver {
    Solver::with_heuristic(HeuristicProvider::manhattan(), Duration::from_secs(60))
}

#[test_log::test]
fn solved_board_explores_one_node() {
    let solution = manhattan_solver()
        .solve_rows(&rows(&[&[1, 2, 3], &[4, 5, 6], &[7, 8, 0]]))
        .unwrap();
    assert_eq!(solution.moves, 0);
    assert_eq!(solution.nodes_explored, 1);
    assert_eq!(solution.path.len(), 1);
}

#[test_log::test]
fn single_slide_reaches_goal() {
    let solution = manhattan_solver()
        .solve_rows(&rows(&[&[1, 2, 3], &[4, 5, 0], &[7, 8, 6]]))
        .unwrap();
    assert_eq!(solution.moves, 1);
    assert_eq!(solution.path[1], Board::goal(3));
}

#[test_log::test]
fn swapped_tiles_are_unsolvable() {
    let grid = rows(&[&[1, 2, 3], &[4, 5, 6], &[8, 7, 0]]);
    assert!(!is_solvable(&Board::from_rows(&grid).unwrap()));
    assert_eq!(
        manhattan_solver().solve_rows(&grid),
        Err(SolveError::Unsolvable)
    );
}

#[test_log::test]
fn malformed_input_is_a_validation_failure() {
    let solver = manhattan_solver();
    for grid in [
        rows(&[&[0]]),
        rows(&[&[1, 2, 3], &[4, 5, 6]]),
        rows(&[&[1, 2], &[3, 9]]),
        rows(&[&[1, 2], &[2, 0]]),
        rows(&[&[1, 2], &[3, 4]]),
    ] {
        assert!(matches!(
            solver.solve_rows(&grid),
            Err(SolveError::Invalid(_))
        ));
    }
}

#[test_log::test]
fn zero_deadline_is_a_timeout_not_an_empty_success() {
    let solver = Solver::with_heuristic(HeuristicProvider::manhattan(), Duration::ZERO);
    let board = Board::from_rows(&rows(&[&[4, 1, 3], &[7, 2, 5], &[0, 8, 6]])).unwrap();
    assert!(matches!(
        solver.solve(&board),
        Err(SolveError::Timeout { .. })
    ));
    assert!(matches!(
        solver.solve_detailed(&board),
        Err(SolveError::Timeout { .. })
    ));
}

#[test_log::test]
fn detailed_and_plain_solutions_agree() {
    let mut rng = StdRng::seed_from_u64(314);
    let solver = manhattan_solver();
    for _ in 0..5 {
        let board = Board::shuffled(3, &mut rng);
        let plain = solver.solve(&board).unwrap();
        let detail = solver.solve_detailed(&board).unwrap();

        assert_eq!(plain.moves, detail.total_steps);
        let boards: Vec<Board> = detail.steps.iter().map(|s| s.board.clone()).collect();
        assert_eq!(boards, plain.path);
        assert_eq!(detail.steps[0].action, StepAction::Initial);

        let total_tile_moves: u32 = detail.tile_move_counts.values().sum();
        assert_eq!(total_tile_moves as usize, detail.total_steps);
        for step in &detail.steps {
            assert_eq!(step.heuristic_value, manhattan_distance(&step.board));
        }
    }
}

#[test_log::test]
fn pattern_databases_guide_4x4_search() {
    let patterns = Arc::new(
        DisjointPatterns::new(
            PatternDatabase::build(&[9, 13, 14]).unwrap(),
            PatternDatabase::build(&[11, 12, 15]).unwrap(),
        )
        .unwrap(),
    );
    let with_patterns = Solver::with_heuristic(
        HeuristicProvider::with_patterns(patterns.clone()),
        Duration::from_secs(60),
    );
    assert_eq!(
        with_patterns.heuristic().kind(4),
        HeuristicKind::PatternDatabases
    );
    let with_manhattan =
        Solver::with_heuristic(HeuristicProvider::manhattan(), Duration::from_secs(60));

    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..3 {
        let board = Board::scrambled(4, 16, &mut rng);
        let expected = with_manhattan.solve(&board).unwrap();
        let solution = with_patterns.solve(&board).unwrap();

        assert_eq!(solution.moves, expected.moves);
        assert!(patterns.estimate(&board) as usize <= solution.moves);
        assert!(solution.path.last().unwrap().is_goal());
    }
}

#[test_log::test]
fn missing_databases_leave_solver_usable() {
    let config = PatternDbConfig {
        enabled: true,
        directory: PathBuf::from("/nonexistent/npuzzle"),
    };
    let status = pattern_db::PatternDbStatus::load(&config);
    assert!(status.databases().is_none());

    let provider = HeuristicProvider::from_status(&status);
    let solver = Solver::with_heuristic(provider, Duration::from_secs(60));
    let mut rng = StdRng::seed_from_u64(12);
    let board = Board::scrambled(4, 12, &mut rng);
    assert!(solver.solve(&board).unwrap().moves <= 12);
}

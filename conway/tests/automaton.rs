use std::collections::HashSet;

use conway::patterns::{BLINKER, BLOCK, GLIDER, PATTERNS, Pattern};
use conway::{Automaton, Grid};

fn automaton_with(grid: Grid) -> Automaton {
    let (rows, columns) = grid.dimensions();
    let mut automaton = Automaton::new(rows, columns);
    automaton.set_grid(grid).unwrap();
    automaton
}

fn live(automaton: &Automaton) -> HashSet<(usize, usize)> {
    automaton.current_grid().live_cells().collect()
}

/// Sum of live (row, col) coordinates; the centroid times the population.
fn coordinate_sum(automaton: &Automaton) -> (usize, usize) {
    automaton
        .current_grid()
        .live_cells()
        .fold((0, 0), |(rs, cs), (r, c)| (rs + r, cs + c))
}

#[test]
fn block_is_a_still_life() {
    let mut automaton = automaton_with(BLOCK.stamp(6, 6, 2, 2));
    let start = automaton.current_grid();
    automaton.step();
    assert_eq!(*automaton.current_grid(), *start);
    automaton.step();
    assert_eq!(*automaton.current_grid(), *start);
}

#[test]
fn blinker_has_period_two() {
    let mut automaton = automaton_with(BLINKER.stamp(5, 5, 2, 1));
    let start = live(&automaton);
    automaton.step();
    assert_eq!(live(&automaton), HashSet::from([(1, 2), (2, 2), (3, 2)]));
    automaton.step();
    assert_eq!(live(&automaton), start);
}

#[test]
fn glider_keeps_five_cells_and_drifts_diagonally() {
    let mut automaton = automaton_with(GLIDER.stamp(20, 20, 2, 2));
    let (rows0, cols0) = coordinate_sum(&automaton);

    for generation in 1..=12 {
        automaton.step();
        assert_eq!(automaton.count_living(), 5, "generation {generation}");
        if generation % 4 == 0 {
            let shift = generation / 4;
            assert_eq!(coordinate_sum(&automaton), (rows0 + 5 * shift, cols0 + 5 * shift));
        }
    }
}

#[test]
fn single_cell_board_is_dead_after_one_step() {
    let mut automaton = Automaton::new(1, 1);
    automaton.randomize(100);
    assert_eq!(automaton.count_living(), 1);
    automaton.step();
    assert_eq!(automaton.count_living(), 0);
}

#[test]
fn edges_do_not_wrap() {
    // a blinker lying on the top edge loses the cells that would need row -1
    let mut automaton = automaton_with(BLINKER.stamp(5, 5, 0, 1));
    automaton.step();
    assert_eq!(live(&automaton), HashSet::from([(0, 2), (1, 2)]));
}

#[test]
fn stamping_clips_at_the_border() {
    let grid = BLOCK.stamp(4, 4, 3, 3);
    assert_eq!(grid.count_living(), 1);
    assert!(grid.is_alive(3, 3));
}

#[test]
fn patterns_are_found_by_name() {
    assert_eq!(Pattern::by_name("glider").map(|p| p.cells.len()), Some(5));
    assert!(Pattern::by_name("spaceship").is_none());
    assert!(PATTERNS.iter().all(|p| !p.cells.is_empty()));
}

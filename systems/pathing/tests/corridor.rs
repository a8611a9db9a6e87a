use candy_quest_core::{CellCoord, FogGrade, Grid, TileKind};
use candy_quest_system_pathing::{
    check_move, find_path, is_within_path_distance, points_within_path_distance, MoveRejection,
};

/// 7×7 walls with a single L-shaped corridor from (3,3) east to (6,3) then
/// south to (6,6).
fn l_corridor() -> Grid<TileKind> {
    let mut grid = Grid::filled(7, 7, TileKind::Wall);
    for column in 3..=6 {
        let _ = grid.set(CellCoord::new(column, 3), TileKind::Corridor);
    }
    for row in 3..=6 {
        let _ = grid.set(CellCoord::new(6, row), TileKind::Corridor);
    }
    grid
}

#[test]
fn l_corridor_path_has_seven_cells() {
    let grid = l_corridor();
    let path = find_path(&grid, CellCoord::new(3, 3), CellCoord::new(6, 6)).expect("connected");

    assert_eq!(path.len(), 7);
    assert!(path.contains(&CellCoord::new(6, 3)));
}

#[test]
fn l_corridor_budget_boundaries() {
    let grid = l_corridor();
    let start = CellCoord::new(3, 3);
    let goal = CellCoord::new(6, 6);

    assert!(!is_within_path_distance(&grid, start, goal, 5));
    assert!(is_within_path_distance(&grid, start, goal, 6));
    assert!(is_within_path_distance(&grid, start, goal, 7));
}

#[test]
fn l_corridor_reachable_set_follows_the_corridor() {
    let grid = l_corridor();
    let reachable = points_within_path_distance(&grid, CellCoord::new(3, 3), 4);

    assert_eq!(reachable.len(), 5);
    assert!(reachable.contains(&CellCoord::new(6, 4)));
    assert!(!reachable.contains(&CellCoord::new(4, 4)));
}

#[test]
fn open_five_by_five_move_respects_budget() {
    let tiles = Grid::filled(5, 5, TileKind::Room);
    let fog = Grid::filled(5, 5, FogGrade::Dimmest);
    let from = CellCoord::new(0, 0);

    assert_eq!(check_move(&tiles, &fog, from, CellCoord::new(2, 2), 4), Ok(()));
    assert_eq!(
        check_move(&tiles, &fog, from, CellCoord::new(4, 4), 4),
        Err(MoveRejection::OutOfReach)
    );
}

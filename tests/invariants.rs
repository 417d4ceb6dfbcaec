//! Cross-module invariants: zone reachability equivalence, pool balance,
//! occupancy exclusivity, optimised-path monotonicity, and heuristic
//! admissibility, each exercised against a real grid/zone/pool rather than
//! asserted in isolation.

mod support;

use pathcore::astar::{heuristic, NodeRef, COST_DIAGONAL, COST_ORTHOGONAL};
use pathcore::ids::{EntityId, LayerId};
use pathcore::occupancy::{self, StampRadius};
use pathcore::path::is_line_passable;
use pathcore::zone::Mobility;
use support::{flat_world, ground_params, FlatTerrain, NoEntities};

#[test]
fn zone_reachability_is_symmetric_and_matches_search_outcome() {
    let (mut grid, zones, mut pool) = flat_world(40, 40);
    let entities = NoEntities;
    let terrain = FlatTerrain;
    let params = ground_params(&entities, &terrain, EntityId(1));

    let a = NodeRef::new(LayerId::Ground, 2, 2);
    let b = NodeRef::new(LayerId::Ground, 37, 37);

    let a_to_b = zones.reachable(&grid, a.layer, (a.x, a.y), b.layer, (b.x, b.y), Mobility::ground(), false);
    let b_to_a = zones.reachable(&grid, b.layer, (b.x, b.y), a.layer, (a.x, a.y), Mobility::ground(), false);
    assert_eq!(a_to_b, b_to_a, "zone reachability must not depend on query direction");
    assert!(a_to_b, "open ground is one zone, so the pair should be reachable");

    let found = pathcore::search::find_path(&mut grid, &zones, &mut pool, a, b, &params).is_some();
    assert_eq!(found, a_to_b, "A* success must agree with the zone pre-filter on unobstructed ground");
}

#[test]
fn pool_balance_holds_after_successful_and_failed_requests() {
    let (mut grid, zones, mut pool) = flat_world(30, 30);
    let entities = NoEntities;
    let terrain = FlatTerrain;
    let params = ground_params(&entities, &terrain, EntityId(1));

    let baseline = pool.in_use();

    let start = NodeRef::new(LayerId::Ground, 0, 0);
    let goal = NodeRef::new(LayerId::Ground, 29, 29);
    let _ = pathcore::search::find_path(&mut grid, &zones, &mut pool, start, goal, &params);
    assert_eq!(pool.in_use(), baseline, "search scratch state must be fully released after a served request");

    // A request that can't possibly succeed (goal off the zone-reachable
    // set) still must not leak pool slots.
    let unreachable = NodeRef::new(LayerId::Ground, 1000, 1000);
    let _ = pathcore::search::find_path(&mut grid, &zones, &mut pool, start, unreachable, &params);
    assert_eq!(pool.in_use(), baseline, "a failed/rejected request must leave the pool exactly as it found it");
}

#[test]
fn occupancy_claims_are_exclusive_per_entity_at_the_stamped_radius() {
    let (mut grid, _zones, mut pool) = flat_world(20, 20);
    let e = EntityId(7);

    occupancy::update_pos(&mut grid, &mut pool, LayerId::Ground, e, None, (10, 10), StampRadius::Cross);
    occupancy::update_goal(&mut grid, &mut pool, LayerId::Ground, e, None, Some((15, 15)), StampRadius::Cross);

    let pos_cells = [(10, 10), (11, 10), (9, 10), (10, 11), (10, 9)];
    let goal_cells = [(15, 15), (16, 15), (14, 15), (15, 16), (15, 14)];

    for &(x, y) in &pos_cells {
        let state = occupancy::state_at(&grid, &pool, LayerId::Ground, x, y);
        assert!(matches!(state, occupancy::OccupancyState::PresentMoving), "pos-stamped cell {x},{y} should carry exactly this entity's moving claim");
    }
    for &(x, y) in &goal_cells {
        let state = occupancy::state_at(&grid, &pool, LayerId::Ground, x, y);
        assert!(matches!(state, occupancy::OccupancyState::Goal), "goal-stamped cell {x},{y} should carry exactly this entity's goal claim");
    }

    // Moving the position claim elsewhere releases every cell in the old
    // cross footprint, leaving no residual claim behind.
    occupancy::update_pos(&mut grid, &mut pool, LayerId::Ground, e, Some((10, 10)), (3, 3), StampRadius::Cross);
    for &(x, y) in &pos_cells {
        assert_eq!(occupancy::state_at(&grid, &pool, LayerId::Ground, x, y), occupancy::OccupancyState::None);
    }
}

#[test]
fn optimised_chain_anchors_all_have_a_passable_line_to_their_shortcut() {
    let (mut grid, zones, mut pool) = flat_world(60, 60);
    let entities = NoEntities;
    let terrain = FlatTerrain;
    let params = ground_params(&entities, &terrain, EntityId(1));

    let start = NodeRef::new(LayerId::Ground, 3, 40);
    let goal = NodeRef::new(LayerId::Ground, 55, 5);
    let path = pathcore::search::find_path(&mut grid, &zones, &mut pool, start, goal, &params).expect("path expected on open ground");

    assert!(path.is_optimized);
    for node in &path.nodes {
        let target = &path.nodes[node.next_optimized];
        assert!(is_line_passable(&grid, node, target), "anchor at ({},{}) has no passable line to its optimised shortcut", node.x, node.y);
    }
}

#[test]
fn heuristic_never_overestimates_the_actual_raw_chain_cost() {
    let (mut grid, zones, mut pool) = flat_world(50, 50);
    let entities = NoEntities;
    let terrain = FlatTerrain;
    let params = ground_params(&entities, &terrain, EntityId(1));

    let start = NodeRef::new(LayerId::Ground, 2, 2);
    let goal = NodeRef::new(LayerId::Ground, 47, 20);

    let pathcore::astar::SearchOutcome::Found(chain) = pathcore::astar::search(&mut grid, &zones, &mut pool, start, goal, &params) else {
        panic!("expected a found path on open ground");
    };

    let mut actual_cost: u32 = 0;
    for pair in chain.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (dx, dy) = ((b.x as i32 - a.x as i32).abs(), (b.y as i32 - a.y as i32).abs());
        actual_cost += if dx == 1 && dy == 1 { COST_DIAGONAL } else { COST_ORTHOGONAL };
    }

    let estimate = heuristic(goal.x as i32 - start.x as i32, goal.y as i32 - start.y as i32);
    assert!(estimate <= actual_cost, "heuristic {estimate} overestimates the actual step cost {actual_cost}");
}

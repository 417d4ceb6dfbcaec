//! End-to-end: a Chinook-style evacuation scatters four riders to pairwise
//! distinct cells, each within `100 * bounding_radius` of the container.
//! Each placed rider is stamped into occupancy before the next one scatters
//! (as a real evacuation would between exits), so the spiral search itself
//! steers later riders away from already-claimed cells.

mod support;

use pathcore::astar::NodeRef;
use pathcore::contain::scatter_to_nearby_position;
use pathcore::fixed_math::FixedNum;
use pathcore::ids::{EntityId, LayerId};
use pathcore::occupancy::{self, StampRadius};
use pathcore::zone::Mobility;
use support::flat_world;

#[test]
fn four_riders_scatter_to_distinct_nearby_cells() {
    let (mut grid, zones, mut pool) = flat_world(80, 80);
    let container = NodeRef::new(LayerId::Ground, 40, 40);
    let container_world = grid.cell_center(container.layer, container.x, container.y).unwrap();
    let bounding_radius = FixedNum::from_num(1);
    let max_allowed_distance = bounding_radius * FixedNum::from_num(100);

    let riders = [EntityId(1), EntityId(2), EntityId(3), EntityId(4)];
    let mut placements = Vec::new();

    for &rider in &riders {
        let cell = scatter_to_nearby_position(&grid, &zones, &pool, container, Mobility::ground(), 20).expect("a free cell should exist near the container");
        let world = grid.cell_center(cell.layer, cell.x, cell.y).unwrap();
        occupancy::update_pos(&mut grid, &mut pool, cell.layer, rider, None, (cell.x, cell.y), StampRadius::Single);
        occupancy::update_goal(&mut grid, &mut pool, cell.layer, rider, None, Some((cell.x, cell.y)), StampRadius::Single);
        placements.push((rider, world));
    }

    assert_eq!(placements.len(), riders.len());
    for i in 0..placements.len() {
        for j in (i + 1)..placements.len() {
            assert_ne!(placements[i].1, placements[j].1, "riders {i} and {j} landed on the same spot");
        }
        let distance = (placements[i].1 - container_world).length();
        assert!(distance <= max_allowed_distance, "rider {i} landed too far from the container");
    }
}

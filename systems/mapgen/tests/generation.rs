use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use candy_quest_core::TileKind;
use candy_quest_system_mapgen::{is_connected, GeneratedMap, MapGenerator, MapgenConfig};

fn fingerprint(map: &GeneratedMap) -> u64 {
    let mut hasher = DefaultHasher::new();
    map.tiles.to_rows().hash(&mut hasher);
    map.regions.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn same_seed_replays_the_same_map() {
    let generator = MapGenerator::new(MapgenConfig {
        record_snapshots: true,
        ..MapgenConfig::default()
    });
    let first = generator.generate(0xfeed);
    let second = generator.generate(0xfeed);

    assert_eq!(first, second, "generation diverged between runs");
    assert_eq!(fingerprint(&first), fingerprint(&second));

    let other = generator.generate(0xbeef);
    assert_ne!(fingerprint(&first), fingerprint(&other));
}

#[test]
fn every_seed_and_size_stays_in_bounds_and_connected() {
    for seed in 0..24_u64 {
        for (region_min, region_max) in [(1, 3), (3, 5), (5, 9), (3, 15)] {
            let config = MapgenConfig {
                columns: 21 + (seed as u32 % 3) * 4,
                rows: 15 + (seed as u32 % 2) * 6,
                region_count: 8,
                region_min,
                region_max,
                record_snapshots: true,
                ..MapgenConfig::default()
            };
            let generator = MapGenerator::new(config.clone());
            let map = generator.generate(seed);
            let (columns, rows) = map.tiles.dimensions();

            assert_eq!((columns, rows), (config.columns, config.rows));
            for snapshot in &map.snapshots {
                assert_eq!(snapshot.dimensions(), (columns, rows));
            }
            for region in &map.regions {
                let bounds = region.bounds;
                let far_column = bounds.origin().column() + bounds.size().width();
                let far_row = bounds.origin().row() + bounds.size().height();
                assert!(far_column < columns, "seed {seed}: region leaves the grid");
                assert!(far_row < rows, "seed {seed}: region leaves the grid");
            }
            for (cell, tile) in map.tiles.cells() {
                let on_border = cell.column() == 0
                    || cell.row() == 0
                    || cell.column() == columns - 1
                    || cell.row() == rows - 1;
                if on_border {
                    assert_eq!(*tile, TileKind::Wall, "seed {seed}: border carved at {cell:?}");
                }
            }
            assert!(is_connected(&map.tiles), "seed {seed}: map is split");
        }
    }
}

#[test]
fn crowded_maps_produce_fewer_regions_than_requested() {
    let map = MapGenerator::new(MapgenConfig {
        columns: 15,
        rows: 15,
        region_count: 40,
        region_min: 5,
        region_max: 5,
        ..MapgenConfig::default()
    })
    .generate(11);

    assert!(!map.regions.is_empty());
    assert!(map.regions.len() < 40);
    assert!(is_connected(&map.tiles));
}

#[test]
fn default_maps_use_every_tile_kind() {
    let map = MapGenerator::default().generate(5);
    let has = |kind: TileKind| map.tiles.cells().any(|(_, tile)| *tile == kind);

    assert!(has(TileKind::Room));
    assert!(has(TileKind::Corridor));
    assert!(has(TileKind::Wall));
    assert!(has(TileKind::Doorway));
}

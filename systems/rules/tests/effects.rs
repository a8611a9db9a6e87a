use candy_quest_core::{
    CellCoord, CharacterId, Command, ConditionDescriptor, Grid, ItemId, StatKind, Stats, TileKind,
    TriggerDescriptor, UserId,
};
use candy_quest_system_rules::{conditions_pass, resolve_triggers};
use candy_quest_world::{self as world, query, MapModel, World};

fn seeded_world() -> World {
    let tiles = Grid::filled(4, 4, TileKind::Room);
    let mut world = World::new(MapModel::new(tiles, Vec::new()));
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::AddCharacter {
            user: UserId::new("ann"),
            name: "Ann".to_owned(),
            cell: CellCoord::new(1, 1),
            stats: Stats::default(),
            inventory: vec![ItemId::new("lantern")],
        },
        &mut events,
    );
    world
}

#[test]
fn authored_descriptors_apply_through_the_world() {
    let conditions: Vec<ConditionDescriptor> = serde_json::from_str(
        r#"[
            {"logic": "numeric", "target": "health", "comparison": "GREATER_THAN", "value": 2},
            {"logic": "item", "item": "lantern"}
        ]"#,
    )
    .expect("valid conditions");
    let triggers: Vec<TriggerDescriptor> = serde_json::from_str(
        r#"[
            {"logic": "stat", "op": "GIVE", "target": "candies", "value": 4},
            {"logic": "stat", "op": "SUBTRACT", "target": "sanity", "value": 1},
            {"logic": "item", "op": "TAKE", "item": "lantern"},
            {"logic": "position", "delta": {"columns": 2, "rows": -1}},
            {"logic": "summon_bats"}
        ]"#,
    )
    .expect("valid triggers");

    let mut world = seeded_world();
    let ann = CharacterId::new(0);
    let snapshot = query::character(&world, ann).expect("joined");
    let context = query::rule_context(&world, ann);
    assert!(conditions_pass(&conditions, &snapshot, &context));

    let commands = resolve_triggers(&triggers, &snapshot, &context);
    assert_eq!(commands.len(), 4);

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    let after = query::character(&world, ann).expect("joined");
    assert_eq!(after.stats.get(StatKind::Candies), 4);
    assert_eq!(after.stats.get(StatKind::Sanity), 4);
    assert!(after.inventory.is_empty());
    assert_eq!(after.cell, CellCoord::new(3, 0));

    let context = query::rule_context(&world, ann);
    assert!(!conditions_pass(&conditions, &after, &context));
}

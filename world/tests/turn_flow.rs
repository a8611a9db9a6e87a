use candy_quest_core::{
    CellCoord, CharacterId, Command, EncounterId, Event, Grid, PlayMode, SiteRef, StatKind, Stats,
    TileKind, UserId,
};
use candy_quest_world::{self as world, query, MapModel, World};

fn corridor_world() -> World {
    let mut tiles = Grid::filled(5, 3, TileKind::Wall);
    for column in 0..5 {
        let _ = tiles.set(CellCoord::new(column, 1), TileKind::Corridor);
    }
    World::new(MapModel::new(tiles, Vec::new()))
}

fn run(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut log = Vec::new();
    for command in commands {
        world::apply(world, command, &mut log);
    }
    log
}

fn join(user: &str, column: u32) -> Command {
    Command::AddCharacter {
        user: UserId::new(user),
        name: format!("{user} the ghost"),
        cell: CellCoord::new(column, 1),
        stats: Stats::default(),
        inventory: Vec::new(),
    }
}

#[test]
fn three_characters_rotate_through_two_rounds() {
    let mut world = corridor_world();
    let _ = run(
        &mut world,
        vec![join("ann", 0), join("ben", 1), join("cat", 2), Command::BeginSession],
    );

    let mut order = Vec::new();
    for _ in 0..6 {
        order.push((query::current_character(&world), query::round(&world)));
        let _ = run(&mut world, vec![Command::EndTurn]);
    }

    let expected: Vec<_> = [(0, 1), (1, 1), (2, 1), (0, 2), (1, 2), (2, 2)]
        .into_iter()
        .map(|(id, round)| (Some(CharacterId::new(id)), round))
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn incapacitated_characters_are_skipped() {
    let mut world = corridor_world();
    let _ = run(
        &mut world,
        vec![join("ann", 0), join("ben", 1), join("cat", 2), Command::BeginSession],
    );

    let events = run(
        &mut world,
        vec![
            Command::AdjustStat {
                character: CharacterId::new(1),
                stat: StatKind::Health,
                delta: -5,
            },
            Command::EndTurn,
        ],
    );

    assert!(events.contains(&Event::CharacterIncapacitated {
        character: CharacterId::new(1)
    }));
    assert_eq!(query::current_character(&world), Some(CharacterId::new(2)));
    let ben = query::character(&world, CharacterId::new(1)).expect("joined");
    assert!(!ben.active);
    assert!(!ben.can_take_turn);
}

#[test]
fn visits_are_recorded_in_arrival_order() {
    let mut world = corridor_world();
    let _ = run(
        &mut world,
        vec![
            join("ann", 0),
            join("ben", 4),
            Command::PlaceEncounter {
                cell: CellCoord::new(2, 1),
                encounter: EncounterId::new("owl"),
                conditions: Vec::new(),
                triggers: Vec::new(),
            },
        ],
    );
    let site = query::site_at(&world, CellCoord::new(2, 1))
        .expect("site placed")
        .site;
    assert!(matches!(site, SiteRef::Encounter(_)));

    let _ = run(
        &mut world,
        vec![
            Command::MoveCharacter {
                character: CharacterId::new(1),
                to: CellCoord::new(2, 1),
            },
            Command::RecordVisit {
                site,
                character: CharacterId::new(1),
            },
            Command::MoveCharacter {
                character: CharacterId::new(0),
                to: CellCoord::new(2, 1),
            },
            Command::RecordVisit {
                site,
                character: CharacterId::new(0),
            },
        ],
    );

    let snapshot = query::export(&world, 1, PlayMode::Playable);
    assert_eq!(
        snapshot.encounters[0].visitors,
        vec![CharacterId::new(1), CharacterId::new(0)]
    );
    assert!(snapshot.characters.iter().all(|c| c.has_moved));
}

#[test]
fn begin_session_without_characters_ends_immediately() {
    let mut world = corridor_world();
    let events = run(&mut world, vec![Command::BeginSession, Command::BeginSession]);
    assert_eq!(events, vec![Event::SessionEnded]);
    assert_eq!(query::turn(&world).current, None);
}

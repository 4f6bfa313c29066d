//! End-to-end scenarios driving the world and the game through their public API.

use bevy_ecs::prelude::*;
use moonbase_sim::mission::campaign::campaign;
use moonbase_sim::registry;
use moonbase_sim::*;

const ICE_POS: (f32, f32) = (1500.0, -1200.0);
const DT: f32 = 1.0 / 60.0;

fn quiet_config(dir: &tempfile::TempDir) -> GameConfig {
    GameConfig {
        mission_file: dir.path().join(".mission"),
        ..GameConfig::without_asteroids()
    }
}

fn teleport(world: &mut SpaceWorld, entity: Entity, x: f32, y: f32) {
    let ecs = world.ecs_mut();
    *ecs.get_mut::<Position>(entity).unwrap() = Position::new(x, y);
    *ecs.get_mut::<Velocity>(entity).unwrap() = Velocity::default();
}

fn count(events: &[WorldEvent], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind() == kind).count()
}

fn spawn_at(world: &mut SpaceWorld, class: ObjectClass, x: f32, y: f32) -> Entity {
    world
        .spawn_class(class, &SpawnParams::at(Position::new(x, y)))
        .unwrap()
}

#[test]
fn ice_harvest_scenario() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut w = SpaceWorld::new(GameConfig::without_asteroids());
    w.setup();
    let player = w.player().unwrap();
    assert_eq!(w.player_position(), Some(Position::new(0.0, 180.0)));

    let rock = spawn_at(&mut w, ObjectClass::IceAsteroid, ICE_POS.0, ICE_POS.1);
    w.set_target_region(Position::new(ICE_POS.0, ICE_POS.1), 400.0);

    w.update(DT);
    assert_eq!(count(&w.drain_events(), EventKind::RegionEntered), 0);

    teleport(&mut w, player, ICE_POS.0, ICE_POS.1 - 300.0);
    let mut events = Vec::new();
    for _ in 0..10 {
        w.update(DT);
        events.extend(w.drain_events());
    }
    assert_eq!(count(&events, EventKind::RegionEntered), 1);

    registry::bullet(
        &mut w,
        player,
        Position::new(ICE_POS.0, ICE_POS.1 - 20.0),
        Velocity::default(),
    );
    w.update(DT);

    let events = w.drain_events();
    assert_eq!(count(&events, EventKind::ObjectShot), 1);
    assert_eq!(w.count_class(ObjectClass::Ice), 1);
    let radius = w.ecs().get::<Collider>(rock).unwrap().radius;
    let expected = (32.0f32 * 32.0 - 81.0).sqrt();
    assert!((radius - expected).abs() < 1e-3, "radius {radius}");
}

#[test]
fn region_fires_again_after_leaving() {
    let mut w = SpaceWorld::new(GameConfig::without_asteroids());
    w.setup();
    let player = w.player().unwrap();
    w.set_target_region(Position::new(2000.0, 2000.0), 100.0);

    let mut entered = 0;
    for (x, y) in [(2000.0, 2000.0), (2010.0, 2000.0), (3000.0, 3000.0), (2000.0, 2050.0)] {
        teleport(&mut w, player, x, y);
        w.update(DT);
        entered += count(&w.drain_events(), EventKind::RegionEntered);
    }
    assert_eq!(entered, 2);
    assert!(w.target_region().is_some());
}

#[test]
fn delivery_respects_destination() {
    let mut w = SpaceWorld::new(GameConfig::without_asteroids());
    w.setup();
    let player = w.player().unwrap();
    teleport(&mut w, player, 700.0, 4400.0);
    w.update(DT);

    let station = spawn_at(&mut w, ObjectClass::CommsStation, 700.0, 4600.0);
    w.set_id(station, "comm-station-4");

    let to_moonbase = w
        .spawn_class(
            ObjectClass::Battery,
            &SpawnParams::at(Position::new(680.0, 4600.0)).with_destination(Some("moonbase".into())),
        )
        .unwrap();
    let to_station = w
        .spawn_class(
            ObjectClass::MedicalCrate,
            &SpawnParams::at(Position::new(720.0, 4600.0))
                .with_destination(Some("comm-station-4".into())),
        )
        .unwrap();
    let money = w.money();
    w.update(DT);

    assert!(w.is_alive(to_moonbase));
    assert!(!w.is_alive(to_station));
    assert_eq!(w.money(), money + 30);
    let events = w.drain_events();
    assert_eq!(count(&events, EventKind::ItemCollected), 1);
}

#[test]
fn killing_twice_is_harmless() {
    let mut w = SpaceWorld::new(GameConfig::without_asteroids());
    w.setup();
    let before = w.index().len();
    let ice = spawn_at(&mut w, ObjectClass::Ice, 800.0, 800.0);
    w.set_id(ice, "ice");

    assert!(w.kill(ice));
    assert!(!w.kill(ice));
    assert_eq!(w.index().len(), before);
    assert!(w.get_by_id("ice").is_none());
    w.update(DT);
}

#[test]
fn index_tracks_live_collidables() {
    let mut config = GameConfig::without_asteroids();
    config.asteroid_count = 60;
    let mut w = SpaceWorld::new(config);
    w.setup();

    let mut spawned = Vec::new();
    for i in 0..20 {
        let x = 1000.0 + i as f32 * 50.0;
        let e = w
            .spawn_class(
                ObjectClass::Asteroid,
                &SpawnParams::at(Position::new(x, -900.0)).with_velocity(Velocity::new(-40.0, 25.0)),
            )
            .unwrap();
        spawned.push(e);
    }
    for e in spawned.iter().step_by(2) {
        w.kill(*e);
    }

    for _ in 0..240 {
        w.update(DT);
        w.drain_events();
    }

    let mut bounded = w.ecs_mut().query::<&FatBounds>();
    let registered = bounded.iter(w.ecs()).count();
    assert_eq!(w.index().len(), registered);

    let mut bodies = w.ecs_mut().query::<(&Position, &Collider, &FatBounds)>();
    let margin = w.config().fat_margin;
    for (pos, collider, bounds) in bodies.iter(w.ecs()) {
        let r = collider.radius;
        assert!(bounds.rect.is_well_formed());
        assert!(!bounds.is_stale(*pos, r, margin));
        assert!(bounds.rect.contains_point(pos.x - r, pos.y - r));
        assert!(bounds.rect.contains_point(pos.x + r, pos.y + r));
    }
}

#[test]
fn ice_mission_through_the_game() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = Mission::new("Harvesting Ice");
    m.spawn(SpawnStep::at(ObjectClass::IceAsteroid, ICE_POS.0, ICE_POS.1).signpost("Ice"))
        .player_must_enter_region(Region::new(ICE_POS.0, ICE_POS.1, 400.0))
        .say("Press Z to shoot the asteroid.", 0.0)
        .player_must_collect(ObjectClass::Ice, 1)
        .say("{control}: Delicious, and ice cold too!", 3.0);

    let mut game = Game::with_missions(quiet_config(&dir), vec![m]);
    game.start();
    game.update(DT);
    assert!(matches!(
        game.current_mission().unwrap().state(),
        MissionState::Waiting(mission::Condition::EnterRegion)
    ));

    let player = game.world().player().unwrap();
    teleport(game.world_mut(), player, ICE_POS.0, ICE_POS.1 - 300.0);
    game.update(DT);
    assert!(matches!(
        game.current_mission().unwrap().state(),
        MissionState::Waiting(mission::Condition::Collect { .. })
    ));

    // Drop a block of ice straight into the moonbase
    teleport(game.world_mut(), player, 0.0, 180.0);
    game.update(DT);
    let base = game.world().get_by_id("moonbase").unwrap();
    let at = game.world().position_of(base).unwrap();
    let money = game.world().money();
    spawn_at(game.world_mut(), ObjectClass::Ice, at.x, at.y);
    game.update(DT);
    assert_eq!(game.world().money(), money + 10);

    for _ in 0..(4.0 / DT) as usize {
        game.update(DT);
    }
    let mission = game.current_mission().unwrap();
    assert_eq!(mission.state(), &MissionState::Finished);
    assert_eq!(game.world().money(), money + 10 + 100);
}

fn object_layout(game: &mut Game) -> Vec<(ObjectClass, i32, i32)> {
    let mut layout: Vec<_> = game
        .snapshot()
        .objects
        .iter()
        .map(|o| (o.class, o.x.round() as i32, o.y.round() as i32))
        .collect();
    layout.sort_by_key(|(class, x, y)| (format!("{:?}", class), *x, *y));
    layout
}

#[test]
fn skipping_missions_is_deterministic() {
    let mut layouts = Vec::new();
    for _ in 0..2 {
        let dir = tempfile::tempdir().unwrap();
        let config = quiet_config(&dir);
        let seed = config.seed;
        let mut game = Game::with_missions(config, campaign(seed));
        game.start();
        for _ in 0..5 {
            game.next_mission();
        }
        assert_eq!(game.mission_number(), 6);
        assert_eq!(game.current_mission().unwrap().name(), "Update ship");
        assert_eq!(game.world_mut().count_class(ObjectClass::CommsStation), 1);
        assert_eq!(game.world_mut().count_class(ObjectClass::IceAsteroid), 1);
        assert_eq!(game.world_mut().count_class(ObjectClass::CheeseAsteroid), 1);
        layouts.push(object_layout(&mut game));
    }
    assert_eq!(layouts[0], layouts[1]);
}

#[test]
fn restarting_does_not_pile_up_asteroids() {
    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(&dir);
    let seed = config.seed;
    let mut game = Game::with_missions(config, campaign(seed));
    game.set_mission(2);
    game.start();
    for _ in 0..300 {
        game.update(DT);
    }
    assert_eq!(game.current_mission().unwrap().name(), "Harvesting Ice");
    assert_eq!(game.world_mut().count_class(ObjectClass::IceAsteroid), 1);

    for _ in 0..3 {
        game.restart_mission().unwrap();
        for _ in 0..300 {
            game.update(DT);
        }
    }
    assert_eq!(game.world_mut().count_class(ObjectClass::IceAsteroid), 1);
    assert_eq!(game.current_mission().unwrap().persistent_items().len(), 1);
}

#[test]
fn snapshot_serializes() {
    let dir = tempfile::tempdir().unwrap();
    let mut game = Game::new(quiet_config(&dir));
    game.start();
    game.update(DT);

    let json = game.snapshot().to_json().unwrap();
    let back = WorldSnapshot::from_json(&json).unwrap();
    assert_eq!(back.tick, 1);
    assert!(back
        .objects
        .iter()
        .any(|o| o.stable_id.as_deref() == Some("moonbase")));
    assert_eq!(back.messages.len(), 1);
}

//! Headless demonstration of the Moonbase Apollo simulation.
//!
//! Plays the opening of the campaign with scripted input and prints what
//! happens. Run with: cargo run --example basic_demo
//! (set `RUST_LOG=info` to see the engine's own log lines).

use moonbase_sim::{Game, GameConfig, Key};

const DT: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();
    println!("=== Moonbase Apollo - Simulation Demo ===\n");

    let dir = std::env::temp_dir().join("moonbase-demo");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("cannot create {}: {}", dir.display(), e);
    }
    let config = GameConfig {
        asteroid_count: 150,
        cheats: true,
        mission_file: dir.join(".mission"),
        ..GameConfig::default()
    };
    let mut game = Game::new(config);
    game.start();
    print_status(&mut game);

    // Wait for the diagnostics briefing, then turn and thrust for a while
    run(&mut game, 8.0);
    print_status(&mut game);

    game.key_down(Key::Left);
    run(&mut game, 0.5);
    game.key_up(Key::Left);
    game.key_down(Key::Up);
    run(&mut game, 2.0);
    game.key_up(Key::Up);
    game.key_down(Key::Z);
    game.key_up(Key::Z);
    run(&mut game, 1.0);
    print_status(&mut game);

    // Skip ahead through a few missions with the debug key
    for _ in 0..3 {
        game.on_key_press(Key::F3);
        run(&mut game, 2.0);
        print_status(&mut game);
    }

    println!("\n=== Final State (JSON) ===\n");
    let snapshot = game.snapshot();
    match serde_json::to_string_pretty(&snapshot.messages) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("snapshot failed: {}", e),
    }
    match snapshot.to_json() {
        Ok(json) => println!("\nfull snapshot: {} objects, {} bytes", snapshot.objects.len(), json.len()),
        Err(e) => eprintln!("snapshot failed: {}", e),
    }
}

fn run(game: &mut Game, seconds: f32) {
    let frames = (seconds / DT).round() as usize;
    for _ in 0..frames {
        game.step(DT);
    }
}

fn print_status(game: &mut Game) {
    let snapshot = game.snapshot();
    let mission = game
        .current_mission()
        .map(|m| format!("{} ({:?})", m.name(), m.state()))
        .unwrap_or_else(|| "none".to_string());
    println!(
        "--- Tick {} (t={:.1}s) mission {}: {} ---",
        snapshot.tick,
        snapshot.time,
        game.mission_number(),
        mission
    );
    println!(
        "  money={} objects={} camera=({:.0}, {:.0})",
        snapshot.money,
        snapshot.objects.len(),
        snapshot.camera.x,
        snapshot.camera.y
    );
    for message in &snapshot.messages {
        println!("  [{:?}] {}", message.colour, message.text);
    }
}

//! The built-in campaign.
//!
//! Fourteen missions, from ship diagnostics to an astronaut rescue. Random
//! placements come from the seeded generator passed in, so the same seed
//! always builds the same campaign.

use super::{Mission, Region, SpawnStep};
use crate::components::rotate;
use crate::hud::Colour;
use crate::registry::ObjectClass;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const ICE_POS: (f32, f32) = (1500.0, -1200.0);
const CHEESE_POS: (f32, f32) = (-1000.0, 800.0);
const STATION_POS: (f32, f32) = (700.0, 4600.0);
const SPACEDOCK_POS: (f32, f32) = (-3000.0, 1600.0);
const TARGET_POS: (f32, f32) = (3000.0, -3000.0);
const DROID_POS: (f32, f32) = (-2630.0, 3000.0);
const SOLAR_FARM_POS: (f32, f32) = (-2000.0, -1300.0);
const CREDITS_NEEDED: u32 = 100;

fn region(pos: (f32, f32), radius: f32) -> Region {
    Region::new(pos.0, pos.1, radius)
}

/// Sample from a normal distribution (Box-Muller).
fn normal(rng: &mut StdRng, mean: f32, sd: f32) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen();
    mean + sd * (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

/// `num` positions scattered around the moon, at least 600 units out.
pub fn random_positions(rng: &mut StdRng, num: usize) -> Vec<(f32, f32)> {
    let mut out = Vec::with_capacity(num);
    while out.len() < num {
        let dist = normal(rng, 1000.0, 400.0);
        if dist < 600.0 {
            continue;
        }
        let angle = rng.gen_range(0.0..360.0);
        out.push(rotate(dist, 0.0, angle));
    }
    out
}

fn comm_station() -> SpawnStep {
    SpawnStep::at(ObjectClass::CommsStation, STATION_POS.0, STATION_POS.1)
        .id("comm-station-4")
        .named("Comm Station 4")
        .signpost_name()
}

/// Build the campaign.
pub fn campaign(seed: u64) -> Vec<Mission> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut missions = Vec::new();

    let mut m = Mission::new("Diagnostics");
    m.say("{control}: Stand by {name}, we're going to run some diagnostics.", 5.0)
        .say("{control}: Let's take you out for a spin. Head towards this marker.", 0.0)
        .goal("Move to the marker")
        .say_colour("Hold LEFT/RIGHT to rotate. Hold UP to thrust.", Colour::White, 0.0)
        .spawn(
            SpawnStep::at(ObjectClass::Marker, -300.0, 200.0)
                .signpost("Waypoint")
                .transient(),
        )
        .player_must_collect(ObjectClass::Marker, 1)
        .say("{control}: And now this one.", 3.0)
        .spawn(
            SpawnStep::at(ObjectClass::Marker, 300.0, -200.0)
                .signpost("Waypoint")
                .transient(),
        )
        .player_must_collect(ObjectClass::Marker, 1)
        .say("{control}: {name}, your systems are looking good. You are mission ready!", 3.0);
    missions.push(m);

    let mut m = Mission::new("Harvesting Ice");
    m.say("{control}: We are all very thirsty down here. Can you find us a source of water?", 1.0)
        .say_colour("You can harvest water from asteroids made of ice.", Colour::White, 2.0)
        .goal("Collect some ice")
        .spawn(SpawnStep::at(ObjectClass::IceAsteroid, ICE_POS.0, ICE_POS.1).signpost("Ice"))
        .player_must_enter_region(region(ICE_POS, 400.0))
        .say_colour("Press Z to shoot the asteroid.", Colour::White, 0.0)
        .say_if_object_shot(
            ObjectClass::IceAsteroid,
            "Move your ship over an ice cube to grab it with your tractor beam.",
            Colour::White,
        )
        .say_if_object_shot(
            ObjectClass::Asteroid,
            "Be careful! Shooting rocks will blast out dangerous rock fragments.",
            Colour::White,
        )
        .say_if_object_tractored(
            ObjectClass::Ice,
            "Great! Now take this back to the moon base.",
            Colour::White,
        )
        .say_if_region_entered(
            region((0.0, 0.0), 400.0),
            "Dropping off cargo is best done very slowly and carefully. Press Z to release.",
            Colour::White,
        )
        .player_must_collect(ObjectClass::Ice, 1)
        .say("{control}: Delicious, and ice cold too!", 3.0);
    missions.push(m);

    let mut m = Mission::new("Collect some cheese!");
    m.spawn(SpawnStep::at(ObjectClass::CheeseAsteroid, CHEESE_POS.0, CHEESE_POS.1).signpost("Anomaly"))
        .say("{control}: {name}, our scans are picking up an anomalistic scent.", 1.0)
        .say("{control}: Please can you investigate and bring us back a sample?", 2.0)
        .goal("Investigate Strange Whiff")
        .player_must_enter_region(region(CHEESE_POS, 300.0))
        .say("{control}: Cheese! Well I never!", 3.0)
        .say("{control}: We need enough for lunch.", 0.0)
        .goal("Collect 2 cheeses")
        .player_must_collect(ObjectClass::Cheese, 2);
    missions.push(m);

    let mut m = Mission::new("Transport the astronaut");
    m.say("{control}: Return to base, {name}, for your next mission.", 0.0)
        .player_must_enter_region(region((0.0, 0.0), 500.0))
        .spawn(
            SpawnStep::above_moonbase(ObjectClass::Astronaut)
                .id("astronaut")
                .signpost_name()
                .transient()
                .destination("comm-station-4"),
        )
        .say("{control}: This is {astronaut.name}.", 2.0)
        .spawn(comm_station())
        .say("{control}: {name}, please take {astronaut.name} to Comm Station 4.", 3.0)
        .goal("Transport {astronaut.name} to Comm Station 4")
        .say_if_object_tractored(
            ObjectClass::Astronaut,
            "{astronaut.name}: Fly safely, please?",
            Colour::Cyan,
        )
        .fail_if_object_destroyed("astronaut")
        .player_must_collect(ObjectClass::Astronaut, 1)
        .say("{astronaut.name}: Thanks. I'm just going to go be sick now.", 3.0);
    missions.push(m);

    let mut m = Mission::new("Defend the station");
    m.spawn(comm_station())
        .spawn(
            SpawnStep::at(
                ObjectClass::DangerousAsteroid,
                STATION_POS.0 + 1000.0,
                STATION_POS.1,
            )
            .signpost("Asteroid")
            .velocity(-20.0, 0.0)
            .id("asteroid"),
        )
        .say("{control}: Emergency, {name}! An asteroid is heading for Comm Station 4", 1.0)
        .goal("Destroy the asteroid")
        .fail_if_object_destroyed("comm-station-4")
        .player_must_destroy("asteroid")
        .say("{control}: Thanks. Comm Station 4 is safe now.", 3.0);
    missions.push(m);

    let mut m = Mission::new("Update ship");
    m.say("{control}: Good news, {name}!", 0.0)
        .spawn(SpawnStep::at(ObjectClass::SpaceDock, SPACEDOCK_POS.0, SPACEDOCK_POS.1))
        .fail_if_object_destroyed("lugger")
        .spawn(
            SpawnStep::at(ObjectClass::Lugger, SPACEDOCK_POS.0 + 30.0, SPACEDOCK_POS.1 - 35.0)
                .signpost("Lugger 1")
                .rotation(180.0)
                .transient()
                .id("lugger"),
        )
        .say("{control}: A ship upgrade just arrived at space dock.", 1.0)
        .say("{control}: Go get it then!", 2.0)
        .goal("Collect new ship")
        .say_if_region_entered(
            region(SPACEDOCK_POS, 300.0),
            "Manoeuvre {name} to dock with Lugger 1.",
            Colour::White,
        )
        .player_must_collect(ObjectClass::Lugger, 1)
        .say("{control}: {lugger.name}, your callsign is now {name}.", 10.0);
    missions.push(m);

    let mut m = Mission::new("Collect metal");
    m.say("{control}: {name}, our fabrication facility is just about ready.", 0.0)
        .say("{control}: We want you to supply us with metal.", 1.0)
        .goal("Collect 4 metal");
    for (x, y) in random_positions(&mut rng, 3) {
        m.spawn(SpawnStep::at(ObjectClass::MetalAsteroid, x, y).signpost("Metal"));
    }
    m.player_must_collect(ObjectClass::Metal, 4)
        .say("{control}: Thank you, {name}, we're firing up the furnaces.", 3.0);
    missions.push(m);

    let mut m = Mission::new("Retrieve supply drop");
    m.say("{control}: {name}, we are expecting a resupply of frozen food from Earth.", 1.5)
        .say("{control}: We need you to collect it and guide it through the asteroid belt.", 3.0)
        .spawn(
            SpawnStep::at(ObjectClass::FrozenFood, -4500.0, 300.0)
                .velocity(30.0, 0.0)
                .signpost("Frozen Food Supplies")
                .id("food"),
        )
        .fail_if_object_destroyed("food")
        .player_must_collect(ObjectClass::FrozenFood, 1)
        .say("{control}: Delicious! They gave us a flake too!", 3.0);
    missions.push(m);

    let mut m = Mission::new("Launch Satellite");
    m.fail_if_object_destroyed("satellite")
        .say("{control}: The metal you provided us has helped us build a satellite uplink.", 1.0)
        .spawn(
            SpawnStep::above_moonbase(ObjectClass::Satellite)
                .signpost_name()
                .id("satellite")
                .destination("nowhere"),
        )
        .say("{control}: Please can you get it into place for us?", 2.0)
        .goal("Pick up the satellite")
        .player_must_tractor("satellite")
        .say("{control}: We have picked out a spot where we would like you to set it up.", 1.0)
        .spawn(
            SpawnStep::at(ObjectClass::FixedMarker, TARGET_POS.0, TARGET_POS.1)
                .signpost("Target Site")
                .transient()
                .id("marker"),
        )
        .player_must_enter_region(region(TARGET_POS, 300.0))
        .say("{control}: Anywhere here looks fine.", 0.0)
        .player_must_release_in_region("satellite", region(TARGET_POS, 600.0))
        .say("{control}: Excellent, {satellite.name} is coming online. Readings look good.", 3.0);
    missions.push(m);

    let mut m = Mission::new("Destroy droid");
    m.say("{control}: {name}, our mining droid CP-9 has stopped responding.", 1.0)
        .say("{control}: It is armed and dangerous! ", 3.0)
        .spawn(
            SpawnStep::at(ObjectClass::Droid, DROID_POS.0, DROID_POS.1)
                .signpost("DROID CP-9")
                .id("droid"),
        )
        .goal("Destroy a malfunctioning droid")
        .player_must_enter_region(region(DROID_POS, 200.0))
        .say_colour("DROID CP-9: Enemy Approaching. ATTACK MODE ENABLED!", Colour::Red, 1.0)
        .say("{control}: Looks like CP-9 is malfunctioning. Destroy it!", 2.0)
        .player_must_destroy("droid")
        .say("{control}: Thanks, we will ask all our droids to be retested", 3.0);
    missions.push(m);

    let mut m = Mission::new("Restock water");
    m.say("{control}: Emergency {name}, our water reclamator has sprung a leak!", 1.0)
        .say("{control}: We need you to restock our water tanks before our plants die!", 2.0);
    for (x, y) in random_positions(&mut rng, 4) {
        m.spawn(SpawnStep::at(ObjectClass::IceAsteroid, x, y).signpost("Ice"));
    }
    m.goal("Collect 6 Ice in 5 minutes")
        .with_time_limit(300, |m| {
            m.player_must_collect(ObjectClass::Ice, 6);
        })
        .say("{control}: Thanks, {name}. We think we have the leak under control now.", 3.0);
    missions.push(m);

    let battery_pos = (SOLAR_FARM_POS.0, SOLAR_FARM_POS.1 + 65.0);
    let mut m = Mission::new("Collect battery from Solar Farm");
    m.say("{control}: {name}, the base is running out of power.", 1.0)
        .say("{control}: Can you bring a battery pack from the Solar Farm?", 2.0)
        .spawn(SpawnStep::at(ObjectClass::SolarFarm, SOLAR_FARM_POS.0, SOLAR_FARM_POS.1).signpost("Solar Farm"))
        .goal("Collect battery pack")
        .player_must_enter_region(region(SOLAR_FARM_POS, 200.0))
        .say("Solar Farm: Ahoy, {name}!", 0.0)
        .say("Solar Farm: One battery pack, full of juice!", 1.0)
        .spawn(
            SpawnStep::at(ObjectClass::Battery, battery_pos.0, battery_pos.1)
                .destination("moonbase")
                .transient(),
        )
        .say_if_object_tractored(
            ObjectClass::Battery,
            "Return battery pack to {control}",
            Colour::Green,
        )
        .player_must_collect(ObjectClass::Battery, 1)
        .say("{control}: Thanks, we could have all died without power!", 3.0);
    missions.push(m);

    let mut m = Mission::new("Earn credits");
    m.say("{control}: {name}, we need to collect resources quickly.", 0.0)
        .say(
            &format!("{{control}}: Collect {} credits as soon as possible", CREDITS_NEEDED),
            1.0,
        );
    let asteroid_types = [
        (ObjectClass::IceAsteroid, "Ice"),
        (ObjectClass::CheeseAsteroid, "Cheese"),
        (ObjectClass::MetalAsteroid, "Metal"),
    ];
    for (x, y) in random_positions(&mut rng, 4) {
        if let Some((class, sign)) = asteroid_types.choose(&mut rng) {
            m.spawn(SpawnStep::at(*class, x, y).signpost(sign));
        }
    }
    m.goal(&format!("Earn {} credits", CREDITS_NEEDED))
        .player_must_earn(CREDITS_NEEDED)
        .say("{control}: Thanks, {name}. We think we have enough resources stocked now.", 3.0);
    missions.push(m);

    let mut m = Mission::new("Rescue an astronaut");
    m.spawn(
        SpawnStep::at(
            ObjectClass::Astronaut,
            STATION_POS.0 + 500.0,
            STATION_POS.1 + 500.0,
        )
        .velocity(30.0, 30.0)
        .destination("comm-station-4")
        .signpost_name()
        .id("astronaut"),
    )
    .spawn(comm_station())
    .say("Comm Station 4: We have an emergency situation here, {name}.", 1.0)
    .fail_if_object_destroyed("astronaut")
    .say("Comm Station 4: {astronaut.name} got hit by an exhaust jet while on a space walk.", 1.0)
    .say("Comm Station 4: We need you to stage a rescue mission, FAST!", 0.0)
    .goal("Rescue {astronaut.name}")
    .with_time_limit(100, |m| {
        m.player_must_tractor("astronaut");
    })
    .show_signpost("comm-station-4")
    .say("Comm Station 4: We have a sick bay here. Hurry!", 0.0)
    .goal("Return {astronaut.name} to Comm Station 4")
    .with_time_limit(100, |m| {
        m.player_must_collect(ObjectClass::Astronaut, 1);
    })
    .say("Comm Station 4: Stand by, {name}.", 10.0)
    .say("Comm Station 4: {astronaut.name} isn't breathing...", 0.5)
    .say("Comm Station 4: We need you to fetch adrenaline from {control}, stat!", 3.0)
    .spawn(
        SpawnStep::above_moonbase(ObjectClass::MedicalCrate)
            .destination("comm-station-4")
            .signpost("Medical crate")
            .id("medicrate"),
    )
    .fail_if_object_destroyed("medicrate")
    .goal("Fetch medical supplies")
    .with_time_limit(180, |m| {
        m.player_must_collect(ObjectClass::MedicalCrate, 1);
    })
    .say("Comm Station 4: Thanks, {name}.", 1.0)
    .say("Comm Station 4: Administering adrenaline.", 10.0)
    .say("{astronaut.name}: *gasps*", 1.0)
    .say("{astronaut.name}: What happened? How did I get here?", 3.0);
    missions.push(m);

    missions
}

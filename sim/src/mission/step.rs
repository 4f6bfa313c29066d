//! Mission step descriptors.
//!
//! A mission is an ordered list of [`Step`]s. Steps are plain data, so the
//! same mission can be authored with the builder in Rust or loaded from JSON:
//!
//! ```json
//! { "step": "say", "message": "{control}: Stand by {name}.", "delay": 5 }
//! { "step": "spawn", "class": "IceAsteroid", "at": { "at": [1500, -1200] }, "signpost": "Ice" }
//! { "step": "player_must_collect", "class": "Ice", "number": 2 }
//! ```

use crate::components::Position;
use crate::hud::Colour;
use crate::registry::ObjectClass;
use serde::{Deserialize, Serialize};

fn default_say_delay() -> f32 {
    3.0
}

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

/// Circular area in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    pub fn center(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.distance2_to(&self.center()) < self.radius * self.radius
    }
}

/// Where a spawned object appears.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    At(f32, f32),
    /// 220 units above the moonbase, wherever the moon has turned it to.
    AboveMoonbase,
}

/// Signpost request: `true` uses the object's own name, a string is the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Signpost {
    UseName(bool),
    Text(String),
}

/// Parameters of a spawn step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnStep {
    pub class: ObjectClass,
    pub at: Placement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<(f32, f32)>,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signpost: Option<Signpost>,
    /// Persistent items survive a mission restart.
    #[serde(default = "default_true")]
    pub persistent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default)]
    pub delay: f32,
}

impl SpawnStep {
    pub fn at(class: ObjectClass, x: f32, y: f32) -> Self {
        Self::new(class, Placement::At(x, y))
    }

    pub fn above_moonbase(class: ObjectClass) -> Self {
        Self::new(class, Placement::AboveMoonbase)
    }

    fn new(class: ObjectClass, at: Placement) -> Self {
        Self {
            class,
            at,
            velocity: None,
            rotation: 0.0,
            id: None,
            name: None,
            signpost: None,
            persistent: true,
            destination: None,
            delay: 0.0,
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn signpost(mut self, text: &str) -> Self {
        self.signpost = Some(Signpost::Text(text.to_string()));
        self
    }

    /// Signpost showing the object's own name.
    pub fn signpost_name(mut self) -> Self {
        self.signpost = Some(Signpost::UseName(true));
        self
    }

    pub fn transient(mut self) -> Self {
        self.persistent = false;
        self
    }

    pub fn velocity(mut self, vx: f32, vy: f32) -> Self {
        self.velocity = Some((vx, vy));
        self
    }

    pub fn rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn destination(mut self, destination: &str) -> Self {
        self.destination = Some(destination.to_string());
        self
    }

    pub fn delay(mut self, seconds: f32) -> Self {
        self.delay = seconds;
        self
    }
}

/// One deferred unit of mission behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Post a message, then wait `delay` seconds.
    Say {
        message: String,
        #[serde(default)]
        colour: Colour,
        #[serde(default = "default_say_delay")]
        delay: f32,
    },
    /// Announce a new objective.
    Goal { title: String },
    Spawn(SpawnStep),
    /// Re-show a signpost for an object spawned by an earlier mission.
    ShowSignpost {
        id: String,
        #[serde(default)]
        text: Option<String>,
    },
    PlayerMustCollect {
        class: ObjectClass,
        #[serde(default = "default_one")]
        number: u32,
    },
    PlayerMustTractor { id: String },
    PlayerMustRelease {
        id: String,
        #[serde(default)]
        region: Option<Region>,
    },
    PlayerMustEnterRegion { region: Region },
    PlayerMustDestroy { id: String },
    PlayerMustEarn { credits: u32 },
    SayIfObjectShot {
        class: ObjectClass,
        message: String,
        #[serde(default)]
        colour: Colour,
    },
    SayIfObjectTractored {
        class: ObjectClass,
        message: String,
        #[serde(default)]
        colour: Colour,
    },
    SayIfRegionEntered {
        region: Region,
        message: String,
        #[serde(default)]
        colour: Colour,
    },
    FailIfObjectDestroyed { id: String },
    SetTimeLimit { seconds: u32 },
    ClearTimeLimit,
}

impl Step {
    /// Whether the step suspends the script until a condition is met.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Step::PlayerMustCollect { .. }
                | Step::PlayerMustTractor { .. }
                | Step::PlayerMustRelease { .. }
                | Step::PlayerMustEnterRegion { .. }
                | Step::PlayerMustDestroy { .. }
                | Step::PlayerMustEarn { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_say_defaults() {
        let step: Step = serde_json::from_str(r#"{ "step": "say", "message": "hi" }"#).unwrap();
        assert_eq!(
            step,
            Step::Say { message: "hi".into(), colour: Colour::Cyan, delay: 3.0 }
        );
    }

    #[test]
    fn test_parse_spawn() {
        let json = r#"{
            "step": "spawn",
            "class": "Astronaut",
            "at": "above_moonbase",
            "id": "astronaut",
            "signpost": true,
            "persistent": false,
            "destination": "comm-station-4"
        }"#;
        let step: Step = serde_json::from_str(json).unwrap();
        let expected = SpawnStep::above_moonbase(ObjectClass::Astronaut)
            .id("astronaut")
            .signpost_name()
            .transient()
            .destination("comm-station-4");
        assert_eq!(step, Step::Spawn(expected));
    }

    #[test]
    fn test_parse_rejects_unknown_class() {
        let json = r#"{ "step": "player_must_collect", "class": "Unobtainium" }"#;
        assert!(serde_json::from_str::<Step>(json).is_err());
    }

    #[test]
    fn test_region_contains() {
        let region = Region::new(1500.0, -1200.0, 400.0);
        assert!(region.contains(Position::new(1200.0, -1200.0)));
        assert!(!region.contains(Position::new(1000.0, -1200.0)));
    }
}

//! Ship models the player can fly.

use crate::hud::Colour;
use serde::Serialize;

/// Handling characteristics of a ship model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShipModel {
    pub name: &'static str,
    /// Turn rate in degrees/second.
    pub rotation: f32,
    /// Thrust in units/second².
    pub acceleration: f32,
    pub max_speed: f32,
    pub radius: f32,
    pub mass: f32,
    pub colour: Colour,
}

pub const CUTTER: ShipModel = ShipModel {
    name: "Cutter",
    rotation: 100.0,
    acceleration: 350.0,
    max_speed: 150.0,
    radius: 8.0,
    mass: 1.0,
    colour: Colour::Green,
};

pub const LUGGER: ShipModel = ShipModel {
    name: "Lugger",
    rotation: 200.0,
    acceleration: 420.0,
    max_speed: 150.0,
    radius: 14.0,
    mass: 2.0,
    colour: Colour::Red,
};

pub const CLIPPER: ShipModel = ShipModel {
    name: "Clipper",
    rotation: 150.0,
    acceleration: 550.0,
    max_speed: 350.0,
    radius: 14.0,
    mass: 1.5,
    colour: Colour::Yellow,
};

pub const SHIPS: [ShipModel; 3] = [CUTTER, LUGGER, CLIPPER];

/// Look up a model by case-insensitive name.
pub fn by_name(name: &str) -> Option<ShipModel> {
    SHIPS.iter().copied().find(|s| s.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("lugger"), Some(LUGGER));
        assert_eq!(by_name("CLIPPER"), Some(CLIPPER));
        assert_eq!(by_name("dinghy"), None);
    }
}

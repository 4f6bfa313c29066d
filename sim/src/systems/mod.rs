//! ECS systems for the Moonbase Apollo simulation.
//!
//! Systems contain the per-tick logic that operates on components. They never
//! spawn or despawn; deaths go on the [`KillQueue`], new objects on the
//! [`SpawnQueue`] and contacts into the `ContactBuffer`, all of which the
//! `SpaceWorld` applies after the schedule has run.
//!
//! ## System Order
//!
//! The schedule is a single chain:
//!
//! 1. `player_motion_system` - thrust, rotation, tractor beam impulses
//! 2. `drift_system` - velocity and spin for active bodies
//! 3. `mounted_system` - the moonbase follows the turning moon
//! 4. `follower_system` - labels and signposts track their target
//! 5. `lifetime_system` - bullets and explosions expire
//! 6. `droid_system` - droids aim and fire
//! 7. `fat_bounds_system` - re-register bodies that left their fat rect
//! 8. `collision_gather_system` - broad and narrow phase for active probes

pub mod bounds;
pub mod droid;
pub mod effects;
pub mod movement;

pub use bounds::*;
pub use droid::*;
pub use effects::*;
pub use movement::*;

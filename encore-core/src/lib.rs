//! Building blocks of the encore playback session engine: media items, the play queue,
//! vote counting, cooldowns, and the traits of the collaborators a session talks to.

mod config;
mod cooldown;
mod engine;
mod media;
mod queue;
mod resolver;
mod roster;
mod surface;
mod util;
mod votes;

pub use config::*;
pub use cooldown::*;
pub use engine::*;
pub use media::*;
pub use queue::*;
pub use resolver::*;
pub use roster::*;
pub use surface::*;
pub use util::*;
pub use votes::*;

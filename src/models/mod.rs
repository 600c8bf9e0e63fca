//! Core data models.

mod analysis;
mod dataset;
mod ids;
mod insight;
mod matches;
mod mistake;
mod player;

pub use analysis::*;
pub use dataset::*;
pub use ids::*;
pub use insight::*;
pub use matches::*;
pub use mistake::*;
pub use player::*;

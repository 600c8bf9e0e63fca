pub mod analysis;
pub mod players;

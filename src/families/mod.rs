//! The structure families. Each module is a closed set of piece kinds plus a
//! `build` entry point that grows one structure graph from a seed location.

pub mod buried_treasure;
pub mod mineshaft;
pub mod ruined_portal;
pub mod stronghold;

mod setups;
mod settlement_world;
mod steps;

pub use settlement_world::{SettlementSystem, SettlementWorld};

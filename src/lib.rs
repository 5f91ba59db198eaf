pub mod card;
pub mod condition;
pub mod game;
pub mod rng;
pub mod simulation;

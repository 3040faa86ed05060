// Animated star field and a steering ship swarm, drawn through a small
// canvas abstraction. The window host lives in main.rs.

pub mod engine;

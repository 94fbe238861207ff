//! Mindloop - utility-driven autonomous agent behavior engine

pub mod actions;
pub mod agent;
pub mod core;
pub mod decision;
pub mod fsm;
pub mod influence;
pub mod nav;
pub mod needs;
pub mod perception;
pub mod scheduler;
pub mod social;
pub mod spatial;
pub mod world;

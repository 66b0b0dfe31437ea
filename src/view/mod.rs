//! View-state synchronization engine.
//!
//! `model` holds the state and message types, `update` the pure transitions,
//! `derive` the plot-ready projection, `loader` the dataset fetch, and
//! `runtime` executes commands against real threads and the session log.

pub mod catalog;
pub mod derive;
pub mod loader;
pub mod model;
pub mod runtime;
pub mod update;

#[cfg(test)]
mod test_properties;

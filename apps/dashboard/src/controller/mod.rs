//! Controller layer: UI events, the dashboard store, and command orchestration.

pub mod events;
pub mod orchestration;
pub mod store;

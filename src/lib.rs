// tyr-service: authorization core for the task/project tracker.
// Entities, role tables and the access resolver live here; HTTP routing,
// identity mechanics and persistence are supplied by the hosting service.

pub mod models;
pub mod utils;

#[cfg(test)]
mod tests;

// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "google/mod.rs"]
pub mod google;

// In-memory fakes of the Drive and Sheets ports, used by the unit tests.
#[cfg(test)]
#[path = "memory/mod.rs"]
pub mod memory;

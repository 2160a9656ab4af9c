// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "filing/mod.rs"]
pub mod filing;

//! Developer tooling: read-only inspection of a running world.
//!
//! # Invariants
//! - Tools never mutate the world they inspect.

mod inspector;

pub use inspector::{NodeInfo, WorldInspector, WorldSummary};

pub fn crate_info() -> &'static str {
    "stagecraft-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}

//! Built-in case suites runnable from the CLI.

pub mod matchmaking;

use crate::scenario::Scenario;

/// A named suite that registers its cases on a scenario.
pub struct Suite {
    pub name: &'static str,
    pub description: &'static str,
    pub register: fn(&mut Scenario),
}

/// Every built-in suite.
pub fn builtin() -> &'static [Suite] {
    &[Suite {
        name: matchmaking::NAME,
        description: matchmaking::DESCRIPTION,
        register: matchmaking::register_cases,
    }]
}

pub fn find(name: &str) -> Option<&'static Suite> {
    builtin().iter().find(|s| s.name == name)
}

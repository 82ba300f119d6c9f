pub mod agent;
pub mod builtin;
pub mod startup;
pub mod tooling;

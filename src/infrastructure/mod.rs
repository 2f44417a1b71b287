pub mod classifier;
pub mod observability;
pub mod persistence;

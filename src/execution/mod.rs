pub mod budget;
pub mod planner;
pub mod store;
pub mod types;

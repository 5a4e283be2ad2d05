pub mod calculator;
pub mod cost;
pub mod opportunity;

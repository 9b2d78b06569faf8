//! BWS Turn - unit-by-unit faction turn order for tactical games

pub mod core;
pub mod turn_order;

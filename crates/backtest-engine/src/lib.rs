pub mod engine;
pub mod export;
pub mod models;
pub mod performance;


pub use engine::BacktestEngine;
pub use models::*;
pub use performance::PerformanceCalculator;

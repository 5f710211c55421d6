pub mod cup_with_handle;
pub mod double_bottom;
pub mod high_tight_flag;
pub mod scanner;
pub mod stage_analysis;
pub mod trend_template;
pub mod vcp;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cup_with_handle::CupWithHandleDetector;
pub use double_bottom::DoubleBottomDetector;
pub use high_tight_flag::HighTightFlagDetector;
pub use scanner::{setups_to_signals, PatternScanner, DEFAULT_MIN_CONFIDENCE};
pub use stage_analysis::WeinsteinStageAnalyzer;
pub use trend_template::TrendTemplateDetector;
pub use vcp::VcpDetector;

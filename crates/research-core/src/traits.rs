use crate::{PatternResult, PricePanel, ResearchError};

/// Trait for chart pattern detectors.
///
/// Implementations are pure: the same panel always yields the same result,
/// short panels yield `Ok(None)`, and internal failures surface as `Err`
/// for the scanner to log and swallow.
pub trait PatternDetector: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(
        &self,
        symbol: &str,
        panel: &PricePanel,
    ) -> Result<Option<PatternResult>, ResearchError>;
}

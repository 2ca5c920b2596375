use crate::core::catalog::Rank;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// File name of the run settings written next to the predicted models.
pub const SETTINGS_FILE_NAME: &str = "settings.txt";

static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rank_(\d+).*pLDDT:(\d+\.\d+) pTMscore:(\d+\.\d+)").expect("static pattern is valid")
});

/// Model-level scores reported for one rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankScores {
    pub confidence: f64,
    pub ptm_score: f64,
}

/// Extracts per-rank confidence and pTM scores from settings text.
///
/// Lines that do not carry both scores are skipped; a later line for the same
/// rank overrides an earlier one.
pub fn parse_settings(text: &str) -> BTreeMap<Rank, RankScores> {
    SCORE_LINE
        .captures_iter(text)
        .filter_map(|caps| {
            let rank = caps[1].parse().ok()?;
            let confidence = caps[2].parse().ok()?;
            let ptm_score = caps[3].parse().ok()?;
            Some((
                rank,
                RankScores {
                    confidence,
                    ptm_score,
                },
            ))
        })
        .collect()
}

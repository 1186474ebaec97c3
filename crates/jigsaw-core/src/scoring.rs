//! Score calculation and victory summaries

use crate::difficulty::TierConfig;
use serde::Serialize;
use std::fmt;

/// Seconds spent on a game: budget minus remaining when timed, else elapsed
pub fn time_taken(time_budget_secs: u32, remaining_secs: u32, elapsed_secs: u32) -> u32 {
    if time_budget_secs > 0 {
        time_budget_secs.saturating_sub(remaining_secs)
    } else {
        elapsed_secs
    }
}

/// `max(0, round(base − moves × penalty − time_taken))`
pub fn score(tier: &TierConfig, moves: u32, time_taken_secs: u32) -> u32 {
    let raw = tier.base_score - moves as f64 * tier.move_penalty - time_taken_secs as f64;
    raw.max(0.0).round() as u32
}

/// Status tier derived from a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreStatus {
    /// score > 70
    Great,
    /// 40 < score ≤ 70
    SoSo,
    /// score ≤ 40
    Failed,
}

impl ScoreStatus {
    pub fn from_score(score: u32) -> Self {
        if score > 70 {
            Self::Great
        } else if score > 40 {
            Self::SoSo
        } else {
            Self::Failed
        }
    }

    /// Label shown next to a score and stored with leaderboard records
    pub fn label(&self) -> &'static str {
        match self {
            Self::Great => "🌟👏 Great Job!",
            Self::SoSo => "😐🤔 So-so",
            Self::Failed => "😵❌ Failed!",
        }
    }
}

impl fmt::Display for ScoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Summary of a solved puzzle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Victory {
    pub grid_size: usize,
    pub moves: u32,
    pub time_taken_secs: u32,
    pub score: u32,
    pub status: ScoreStatus,
}

impl Victory {
    pub fn new(tier: &TierConfig, grid_size: usize, moves: u32, time_taken_secs: u32) -> Self {
        let score = score(tier, moves, time_taken_secs);
        Self {
            grid_size,
            moves,
            time_taken_secs,
            score,
            status: ScoreStatus::from_score(score),
        }
    }

    pub fn time_string(&self) -> String {
        format_time(self.time_taken_secs)
    }
}

/// Format seconds as zero-padded MM:SS (minutes are not capped at 59)
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIER: TierConfig = TierConfig::new(120, 100.0, 1.0);

    #[test]
    fn test_perfect_game_scores_base() {
        assert_eq!(score(&TIER, 0, 0), 100);
    }

    #[test]
    fn test_score_floors_at_zero() {
        assert_eq!(score(&TIER, 10_000, 0), 0);
        assert_eq!(score(&TIER, 0, 1_000_000), 0);
    }

    #[test]
    fn test_score_monotonic() {
        let tier = TierConfig::new(300, 100.0, 0.8);
        let mut last = u32::MAX;
        for moves in 0..200 {
            let s = score(&tier, moves, 10);
            assert!(s <= last);
            last = s;
        }
        let mut last = u32::MAX;
        for secs in 0..200 {
            let s = score(&tier, 5, secs);
            assert!(s <= last);
            last = s;
        }
    }

    #[test]
    fn test_fractional_penalty_rounds() {
        let tier = TierConfig::new(300, 100.0, 0.8);
        // 100 - 3 * 0.8 - 10 = 87.6
        assert_eq!(score(&tier, 3, 10), 88);
    }

    #[test]
    fn test_time_taken_modes() {
        assert_eq!(time_taken(120, 100, 20), 20);
        assert_eq!(time_taken(0, 0, 75), 75);
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(ScoreStatus::from_score(71), ScoreStatus::Great);
        assert_eq!(ScoreStatus::from_score(70), ScoreStatus::SoSo);
        assert_eq!(ScoreStatus::from_score(41), ScoreStatus::SoSo);
        assert_eq!(ScoreStatus::from_score(40), ScoreStatus::Failed);
        assert_eq!(ScoreStatus::from_score(0), ScoreStatus::Failed);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(1200), "20:00");
        assert_eq!(format_time(4503), "75:03");
    }
}

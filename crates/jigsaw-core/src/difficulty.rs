//! Per-grid-size time budgets and scoring parameters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Smallest board that can be shuffled into an unsolved state
pub const MIN_GRID_SIZE: usize = 2;
/// Largest board a session will build
pub const MAX_GRID_SIZE: usize = 32;

/// Whether a board of `grid_size × grid_size` may be played
pub fn is_valid_grid_size(grid_size: usize) -> bool {
    (MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&grid_size)
}

/// Time budget and scoring parameters for one grid size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Countdown allowance in seconds; 0 means untimed (counts up)
    pub time_budget_secs: u32,
    /// Score for a zero-move, zero-time solve
    pub base_score: f64,
    /// Points lost per move
    pub move_penalty: f64,
}

impl TierConfig {
    pub const fn new(time_budget_secs: u32, base_score: f64, move_penalty: f64) -> Self {
        Self {
            time_budget_secs,
            base_score,
            move_penalty,
        }
    }

    /// Configuration used for grid sizes missing from the table
    pub const fn untimed() -> Self {
        Self::new(0, 100.0, 1.0)
    }

    pub fn is_timed(&self) -> bool {
        self.time_budget_secs > 0
    }
}

/// Errors loading a difficulty table
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The table file could not be read
    Io(String),
    /// The table is not valid JSON of the expected shape
    Parse(String),
    /// A grid size outside `MIN_GRID_SIZE..=MAX_GRID_SIZE`
    InvalidGridSize(usize),
    /// A negative or non-finite scoring parameter
    InvalidTier(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Failed to read difficulty table: {}", e),
            Self::Parse(e) => write!(f, "Invalid difficulty table: {}", e),
            Self::InvalidGridSize(n) => {
                write!(
                    f,
                    "Grid size {} is outside {}..={}",
                    n, MIN_GRID_SIZE, MAX_GRID_SIZE
                )
            }
            Self::InvalidTier(n) => write!(f, "Scoring parameters for {}x{} are invalid", n, n),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Grid size → tier lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyTable {
    tiers: BTreeMap<usize, TierConfig>,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl DifficultyTable {
    /// 4×4 to 12×12 with two to twenty minutes on the clock
    pub fn standard() -> Self {
        Self::from_entries([
            (4, TierConfig::new(120, 100.0, 1.0)),
            (6, TierConfig::new(300, 100.0, 0.8)),
            (8, TierConfig::new(600, 100.0, 0.6)),
            (12, TierConfig::new(1200, 100.0, 0.4)),
        ])
    }

    /// The earlier 3×3 to 10×10 lineup
    pub fn classic() -> Self {
        Self::from_entries([
            (3, TierConfig::new(60, 100.0, 1.0)),
            (4, TierConfig::new(120, 100.0, 0.9)),
            (6, TierConfig::new(300, 100.0, 0.7)),
            (10, TierConfig::new(900, 100.0, 0.5)),
        ])
    }

    fn from_entries<const N: usize>(entries: [(usize, TierConfig); N]) -> Self {
        Self {
            tiers: entries.into_iter().collect(),
        }
    }

    /// Parse and validate a JSON object keyed by grid size
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let table: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (&grid_size, tier) in &self.tiers {
            if !is_valid_grid_size(grid_size) {
                return Err(ConfigError::InvalidGridSize(grid_size));
            }
            let valid = |v: f64| v.is_finite() && v >= 0.0;
            if !valid(tier.base_score) || !valid(tier.move_penalty) {
                return Err(ConfigError::InvalidTier(grid_size));
            }
        }
        Ok(())
    }

    /// Tier for a grid size; sizes not in the table are untimed
    pub fn tier(&self, grid_size: usize) -> TierConfig {
        self.tiers
            .get(&grid_size)
            .copied()
            .unwrap_or_else(TierConfig::untimed)
    }

    pub fn contains(&self, grid_size: usize) -> bool {
        self.tiers.contains_key(&grid_size)
    }

    /// Configured grid sizes, smallest first
    pub fn grid_sizes(&self) -> Vec<usize> {
        self.tiers.keys().copied().collect()
    }

    pub fn insert(&mut self, grid_size: usize, tier: TierConfig) -> Result<(), ConfigError> {
        if !is_valid_grid_size(grid_size) {
            return Err(ConfigError::InvalidGridSize(grid_size));
        }
        self.tiers.insert(grid_size, tier);
        Ok(())
    }
}

/// Short difficulty label, e.g. `4x4`
pub fn difficulty_label(grid_size: usize) -> String {
    format!("{}x{}", grid_size, grid_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let table = DifficultyTable::standard();
        assert_eq!(table.grid_sizes(), vec![4, 6, 8, 12]);
        assert_eq!(table.tier(8).time_budget_secs, 600);
        assert_eq!(table.tier(12).move_penalty, 0.4);
    }

    #[test]
    fn test_unknown_size_is_untimed() {
        let table = DifficultyTable::standard();
        let tier = table.tier(5);
        assert!(!tier.is_timed());
        assert_eq!(tier, TierConfig::untimed());
    }

    #[test]
    fn test_json_round_trip_keys() {
        let json = r#"{"3": {"time_budget_secs": 0, "base_score": 50, "move_penalty": 0.5}}"#;
        let table = DifficultyTable::from_json(json).unwrap();
        assert!(table.contains(3));
        assert_eq!(table.tier(3).base_score, 50.0);
    }

    #[test]
    fn test_json_rejects_tiny_boards() {
        let json = r#"{"1": {"time_budget_secs": 10, "base_score": 100, "move_penalty": 1}}"#;
        assert_eq!(
            DifficultyTable::from_json(json),
            Err(ConfigError::InvalidGridSize(1))
        );
        assert!(matches!(
            DifficultyTable::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_rejects_huge_boards() {
        let json = r#"{"65536": {"time_budget_secs": 0, "base_score": 100, "move_penalty": 1}}"#;
        assert_eq!(
            DifficultyTable::from_json(json),
            Err(ConfigError::InvalidGridSize(65536))
        );
        let mut table = DifficultyTable::standard();
        assert!(table.insert(MAX_GRID_SIZE, TierConfig::untimed()).is_ok());
        assert_eq!(
            table.insert(MAX_GRID_SIZE + 1, TierConfig::untimed()),
            Err(ConfigError::InvalidGridSize(MAX_GRID_SIZE + 1))
        );
    }

    #[test]
    fn test_label() {
        assert_eq!(difficulty_label(6), "6x6");
    }
}

// Individual pick representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fantasy football roster positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    #[serde(rename = "D/ST")]
    DST,
}

impl Position {
    /// Every position in canonical display order.
    pub const ALL: [Position; 6] = [
        Position::QB,
        Position::RB,
        Position::WR,
        Position::TE,
        Position::K,
        Position::DST,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Case-insensitive. Defenses are accepted as "D/ST", "DST" or "DEF".
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::QB),
            "RB" => Some(Position::RB),
            "WR" => Some(Position::WR),
            "TE" => Some(Position::TE),
            "K" => Some(Position::K),
            "D/ST" | "DST" | "DEF" => Some(Position::DST),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::DST => "D/ST",
        }
    }

    /// Deterministic ordering index for display.
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::QB => 0,
            Position::RB => 1,
            Position::WR => 2,
            Position::TE => 3,
            Position::K => 4,
            Position::DST => 5,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Normalize a pro-team code: 2-4 ASCII letters, uppercased.
pub fn normalize_nfl_team(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if (2..=4).contains(&trimmed.len()) && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(trimmed.to_ascii_uppercase())
    } else {
        None
    }
}

/// How a pick entered the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Recorded by a pick command after player-name validation.
    Typed,
    /// Parsed out of a pasted draft board.
    Imported,
    /// Recorded with validation bypassed.
    Forced,
}

/// A pick that has been parsed or validated but not yet numbered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickDraft {
    pub player: String,
    pub position: Position,
    pub nfl_team: Option<String>,
    /// Fantasy team that made the pick (>= 1).
    pub draft_team: u32,
    /// Absolute pick number claimed by the source text, if it had one.
    /// Informational only; the ledger numbers picks sequentially.
    #[serde(default)]
    pub source_pick: Option<u32>,
    pub provenance: Provenance,
}

/// A single recorded draft pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    /// Name of the drafted player, as recorded.
    pub player: String,
    pub position: Position,
    /// Pro-team code (e.g. "ATL"), when known.
    pub nfl_team: Option<String>,
    /// Fantasy team that made the pick.
    pub draft_team: u32,
    /// Sequential pick number (1-indexed), the ledger's ordering key.
    pub overall_pick: u32,
    pub provenance: Provenance,
    pub timestamp: DateTime<Utc>,
}

impl Pick {
    /// Number a draft into a ledger pick.
    pub fn from_draft(draft: PickDraft, overall_pick: u32) -> Self {
        Pick {
            player: draft.player,
            position: draft.position,
            nfl_team: draft.nfl_team,
            draft_team: draft.draft_team,
            overall_pick,
            provenance: draft.provenance,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_pos_standard_positions() {
        assert_eq!(Position::from_str_pos("QB"), Some(Position::QB));
        assert_eq!(Position::from_str_pos("RB"), Some(Position::RB));
        assert_eq!(Position::from_str_pos("WR"), Some(Position::WR));
        assert_eq!(Position::from_str_pos("TE"), Some(Position::TE));
        assert_eq!(Position::from_str_pos("K"), Some(Position::K));
    }

    #[test]
    fn from_str_pos_defense_spellings() {
        assert_eq!(Position::from_str_pos("D/ST"), Some(Position::DST));
        assert_eq!(Position::from_str_pos("DST"), Some(Position::DST));
        assert_eq!(Position::from_str_pos("def"), Some(Position::DST));
    }

    #[test]
    fn from_str_pos_case_insensitive() {
        assert_eq!(Position::from_str_pos("rb"), Some(Position::RB));
        assert_eq!(Position::from_str_pos(" Wr "), Some(Position::WR));
        assert_eq!(Position::from_str_pos("d/st"), Some(Position::DST));
    }

    #[test]
    fn from_str_pos_invalid() {
        assert_eq!(Position::from_str_pos(""), None);
        assert_eq!(Position::from_str_pos("FLEX"), None);
        assert_eq!(Position::from_str_pos("SP"), None);
    }

    #[test]
    fn display_str_roundtrip() {
        for pos in Position::ALL {
            assert_eq!(Position::from_str_pos(pos.display_str()), Some(pos));
        }
    }

    #[test]
    fn sort_order_matches_all() {
        let orders: Vec<u8> = Position::ALL.iter().map(|p| p.sort_order()).collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn defense_serializes_with_slash() {
        let json = serde_json::to_string(&Position::DST).unwrap();
        assert_eq!(json, "\"D/ST\"");
    }

    #[test]
    fn nfl_team_normalization() {
        assert_eq!(normalize_nfl_team("Atl"), Some("ATL".to_string()));
        assert_eq!(normalize_nfl_team(" kc "), Some("KC".to_string()));
        assert_eq!(normalize_nfl_team("J"), None);
        assert_eq!(normalize_nfl_team("CHIEF"), None);
        assert_eq!(normalize_nfl_team("N1"), None);
    }

    #[test]
    fn from_draft_keeps_fields() {
        let draft = PickDraft {
            player: "Bijan Robinson".into(),
            position: Position::RB,
            nfl_team: Some("ATL".into()),
            draft_team: 1,
            source_pick: Some(1),
            provenance: Provenance::Imported,
        };
        let pick = Pick::from_draft(draft, 3);
        assert_eq!(pick.overall_pick, 3);
        assert_eq!(pick.player, "Bijan Robinson");
        assert_eq!(pick.draft_team, 1);
        assert_eq!(pick.provenance, Provenance::Imported);
    }
}

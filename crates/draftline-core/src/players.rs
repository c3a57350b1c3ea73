// Player-name validation against a static roster dataset.
//
// The transport validates typed pick commands through the `PlayerValidator`
// seam. The bundled `StaticPlayerPool` is a compact roster of fantasy-relevant
// players; a fuller one can be loaded from CSV (`name,position,team`).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::draft::pick::{normalize_nfl_team, Position};

/// Canonical details for a recognized player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub name: String,
    pub position: Position,
    pub nfl_team: Option<String>,
}

/// Outcome of validating a typed player name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid(PlayerInfo),
    /// Several players match the input equally well.
    Ambiguous { candidates: Vec<String> },
    /// Nothing matches; `suggestions` holds near misses, possibly empty.
    Unknown { suggestions: Vec<String> },
}

/// External player-name lookup.
pub trait PlayerValidator: Send + Sync {
    fn validate(&self, name: &str) -> Validation;
}

/// Maximum near-miss names offered back to the user.
pub const MAX_SUGGESTIONS: usize = 3;

const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v"];

/// Normalize a player name for comparison.
///
/// Lowercases, drops punctuation ("Ja'Marr" -> "jamarr", "D/ST" -> "dst"),
/// collapses whitespace and strips generational suffixes.
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|w| NAME_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

// ---------------------------------------------------------------------------
// Bundled roster
// ---------------------------------------------------------------------------

const BUILTIN_PLAYERS: &[(&str, Position, &str)] = &[
    // QB
    ("Josh Allen", Position::QB, "BUF"),
    ("Lamar Jackson", Position::QB, "BAL"),
    ("Jalen Hurts", Position::QB, "PHI"),
    ("Joe Burrow", Position::QB, "CIN"),
    ("Jayden Daniels", Position::QB, "WAS"),
    ("Patrick Mahomes", Position::QB, "KC"),
    ("Baker Mayfield", Position::QB, "TB"),
    ("Bo Nix", Position::QB, "DEN"),
    ("Kyler Murray", Position::QB, "ARI"),
    ("Brock Purdy", Position::QB, "SF"),
    ("Justin Herbert", Position::QB, "LAC"),
    ("Jared Goff", Position::QB, "DET"),
    ("Dak Prescott", Position::QB, "DAL"),
    ("Caleb Williams", Position::QB, "CHI"),
    ("C.J. Stroud", Position::QB, "HOU"),
    // RB
    ("Bijan Robinson", Position::RB, "ATL"),
    ("Jahmyr Gibbs", Position::RB, "DET"),
    ("Saquon Barkley", Position::RB, "PHI"),
    ("Christian McCaffrey", Position::RB, "SF"),
    ("Derrick Henry", Position::RB, "BAL"),
    ("Ashton Jeanty", Position::RB, "LV"),
    ("De'Von Achane", Position::RB, "MIA"),
    ("Jonathan Taylor", Position::RB, "IND"),
    ("Josh Jacobs", Position::RB, "GB"),
    ("Bucky Irving", Position::RB, "TB"),
    ("Kyren Williams", Position::RB, "LAR"),
    ("Chase Brown", Position::RB, "CIN"),
    ("James Cook", Position::RB, "BUF"),
    ("Breece Hall", Position::RB, "NYJ"),
    ("Omarion Hampton", Position::RB, "LAC"),
    ("Alvin Kamara", Position::RB, "NO"),
    ("Kenneth Walker III", Position::RB, "SEA"),
    ("Chuba Hubbard", Position::RB, "CAR"),
    ("James Conner", Position::RB, "ARI"),
    ("D'Andre Swift", Position::RB, "CHI"),
    ("Tony Pollard", Position::RB, "TEN"),
    ("David Montgomery", Position::RB, "DET"),
    ("Aaron Jones", Position::RB, "MIN"),
    ("Isiah Pacheco", Position::RB, "KC"),
    ("TreVeyon Henderson", Position::RB, "NE"),
    ("RJ Harvey", Position::RB, "DEN"),
    // WR
    ("Ja'Marr Chase", Position::WR, "CIN"),
    ("Justin Jefferson", Position::WR, "MIN"),
    ("CeeDee Lamb", Position::WR, "DAL"),
    ("Puka Nacua", Position::WR, "LAR"),
    ("Malik Nabers", Position::WR, "NYG"),
    ("Amon-Ra St. Brown", Position::WR, "DET"),
    ("Nico Collins", Position::WR, "HOU"),
    ("Brian Thomas Jr.", Position::WR, "JAX"),
    ("A.J. Brown", Position::WR, "PHI"),
    ("Drake London", Position::WR, "ATL"),
    ("Ladd McConkey", Position::WR, "LAC"),
    ("Jaxon Smith-Njigba", Position::WR, "SEA"),
    ("Tee Higgins", Position::WR, "CIN"),
    ("Tyreek Hill", Position::WR, "MIA"),
    ("Mike Evans", Position::WR, "TB"),
    ("Garrett Wilson", Position::WR, "NYJ"),
    ("Marvin Harrison Jr.", Position::WR, "ARI"),
    ("Davante Adams", Position::WR, "LAR"),
    ("Terry McLaurin", Position::WR, "WAS"),
    ("DK Metcalf", Position::WR, "PIT"),
    ("Xavier Worthy", Position::WR, "KC"),
    ("DJ Moore", Position::WR, "CHI"),
    ("Zay Flowers", Position::WR, "BAL"),
    ("Courtland Sutton", Position::WR, "DEN"),
    ("Jameson Williams", Position::WR, "DET"),
    ("George Pickens", Position::WR, "DAL"),
    ("Rashee Rice", Position::WR, "KC"),
    ("Tetairoa McMillan", Position::WR, "CAR"),
    ("DeVonta Smith", Position::WR, "PHI"),
    ("Jaylen Waddle", Position::WR, "MIA"),
    // TE
    ("Brock Bowers", Position::TE, "LV"),
    ("Trey McBride", Position::TE, "ARI"),
    ("George Kittle", Position::TE, "SF"),
    ("Sam LaPorta", Position::TE, "DET"),
    ("T.J. Hockenson", Position::TE, "MIN"),
    ("Travis Kelce", Position::TE, "KC"),
    ("Mark Andrews", Position::TE, "BAL"),
    ("David Njoku", Position::TE, "CLE"),
    ("Tucker Kraft", Position::TE, "GB"),
    ("Evan Engram", Position::TE, "DEN"),
    ("Dalton Kincaid", Position::TE, "BUF"),
    ("Tyler Warren", Position::TE, "IND"),
    // K
    ("Brandon Aubrey", Position::K, "DAL"),
    ("Jake Bates", Position::K, "DET"),
    ("Cameron Dicker", Position::K, "LAC"),
    ("Ka'imi Fairbairn", Position::K, "HOU"),
    ("Chris Boswell", Position::K, "PIT"),
    ("Harrison Butker", Position::K, "KC"),
    ("Tyler Bass", Position::K, "BUF"),
    ("Wil Lutz", Position::K, "DEN"),
    // D/ST
    ("Eagles D/ST", Position::DST, "PHI"),
    ("Broncos D/ST", Position::DST, "DEN"),
    ("Steelers D/ST", Position::DST, "PIT"),
    ("Ravens D/ST", Position::DST, "BAL"),
    ("Texans D/ST", Position::DST, "HOU"),
    ("Vikings D/ST", Position::DST, "MIN"),
    ("Bills D/ST", Position::DST, "BUF"),
    ("Chiefs D/ST", Position::DST, "KC"),
    ("Lions D/ST", Position::DST, "DET"),
];

// ---------------------------------------------------------------------------
// StaticPlayerPool
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to open player file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to read player CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("player CSV contained no usable rows")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct PlayerRow {
    name: String,
    position: String,
    #[serde(default)]
    team: Option<String>,
}

/// In-memory roster keyed by normalized name.
#[derive(Debug, Clone)]
pub struct StaticPlayerPool {
    players: Vec<PlayerInfo>,
    by_name: HashMap<String, usize>,
}

impl Default for StaticPlayerPool {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StaticPlayerPool {
    /// The bundled roster.
    pub fn builtin() -> Self {
        Self::from_players(BUILTIN_PLAYERS.iter().map(|(name, pos, team)| PlayerInfo {
            name: name.to_string(),
            position: *pos,
            nfl_team: Some(team.to_string()),
        }))
    }

    pub fn from_players(players: impl IntoIterator<Item = PlayerInfo>) -> Self {
        let mut pool = StaticPlayerPool {
            players: Vec::new(),
            by_name: HashMap::new(),
        };
        for player in players {
            let key = normalize_name(&player.name);
            if pool.by_name.contains_key(&key) {
                warn!("Duplicate player '{}' ignored", player.name);
                continue;
            }
            pool.by_name.insert(key, pool.players.len());
            pool.players.push(player);
        }
        pool
    }

    /// Load a roster CSV with `name,position,team` headers.
    ///
    /// Rows with an unrecognized position are skipped with a warning.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, PoolError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut players = Vec::new();
        for row in rdr.deserialize::<PlayerRow>() {
            let row = row?;
            let Some(position) = Position::from_str_pos(&row.position) else {
                warn!("Skipping '{}': unknown position '{}'", row.name, row.position);
                continue;
            };
            players.push(PlayerInfo {
                name: row.name,
                position,
                nfl_team: row.team.as_deref().and_then(normalize_nfl_team),
            });
        }
        if players.is_empty() {
            return Err(PoolError::Empty);
        }
        Ok(Self::from_players(players))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, PoolError> {
        let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let pool = Self::from_csv_reader(file)?;
        info!("Loaded {} players from {}", pool.len(), path.display());
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Exact lookup by normalized name.
    pub fn get(&self, name: &str) -> Option<&PlayerInfo> {
        self.by_name
            .get(&normalize_name(name))
            .map(|&idx| &self.players[idx])
    }

    /// Players whose name contains every word of the input as a word prefix.
    fn partial_matches(&self, key: &str) -> Vec<&PlayerInfo> {
        let wanted: Vec<&str> = key.split_whitespace().collect();
        if wanted.is_empty() {
            return Vec::new();
        }
        self.players
            .iter()
            .filter(|p| {
                let norm = normalize_name(&p.name);
                let words: Vec<&str> = norm.split_whitespace().collect();
                wanted
                    .iter()
                    .all(|w| words.iter().any(|candidate| candidate.starts_with(w)))
            })
            .collect()
    }

    /// Near misses sharing the input's last word, or its first three letters.
    fn near_misses(&self, key: &str) -> Vec<String> {
        let Some(last) = key.split_whitespace().last() else {
            return Vec::new();
        };
        let stem: String = last.chars().take(3).collect();
        self.players
            .iter()
            .filter(|p| {
                normalize_name(&p.name)
                    .split_whitespace()
                    .any(|w| w == last || w.starts_with(&stem))
            })
            .take(MAX_SUGGESTIONS)
            .map(|p| p.name.clone())
            .collect()
    }
}

impl PlayerValidator for StaticPlayerPool {
    fn validate(&self, name: &str) -> Validation {
        if let Some(info) = self.get(name) {
            return Validation::Valid(info.clone());
        }

        let key = normalize_name(name);
        let partial = self.partial_matches(&key);
        match partial.as_slice() {
            [only] => Validation::Valid((*only).clone()),
            [] => Validation::Unknown {
                suggestions: self.near_misses(&key),
            },
            many => Validation::Ambiguous {
                candidates: many
                    .iter()
                    .take(MAX_SUGGESTIONS)
                    .map(|p| p.name.clone())
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_suffixes() {
        assert_eq!(normalize_name("Ja'Marr Chase"), "jamarr chase");
        assert_eq!(normalize_name("Brian Thomas Jr."), "brian thomas");
        assert_eq!(normalize_name("Kenneth  Walker III"), "kenneth walker");
        assert_eq!(normalize_name("Eagles D/ST"), "eagles dst");
        assert_eq!(normalize_name("A.J. Brown"), "aj brown");
    }

    #[test]
    fn exact_match_is_case_and_punctuation_insensitive() {
        let pool = StaticPlayerPool::builtin();
        match pool.validate("jamarr chase") {
            Validation::Valid(info) => {
                assert_eq!(info.name, "Ja'Marr Chase");
                assert_eq!(info.position, Position::WR);
                assert_eq!(info.nfl_team.as_deref(), Some("CIN"));
            }
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn unique_partial_match_is_accepted() {
        let pool = StaticPlayerPool::builtin();
        match pool.validate("Bijan") {
            Validation::Valid(info) => assert_eq!(info.name, "Bijan Robinson"),
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn shared_surname_is_ambiguous() {
        let pool = StaticPlayerPool::builtin();
        match pool.validate("Williams") {
            Validation::Ambiguous { candidates } => {
                assert!(candidates.len() >= 2);
                assert!(candidates.len() <= MAX_SUGGESTIONS);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn unknown_name_offers_near_misses() {
        let pool = StaticPlayerPool::builtin();
        match pool.validate("Puca Nacuaa") {
            Validation::Unknown { suggestions } => {
                assert!(suggestions.contains(&"Puka Nacua".to_string()));
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn csv_pool_loads_and_skips_bad_positions() {
        let data = "name,position,team\nTest Runner,RB,atl\nMystery Man,LB,NYG\nTest Kicker,K,\n";
        let pool = StaticPlayerPool::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(pool.len(), 2);
        let runner = pool.get("test runner").unwrap();
        assert_eq!(runner.nfl_team.as_deref(), Some("ATL"));
        assert_eq!(pool.get("Test Kicker").unwrap().nfl_team, None);
    }

    #[test]
    fn csv_pool_with_no_rows_is_an_error() {
        let data = "name,position,team\nMystery Man,LB,NYG\n";
        assert!(matches!(
            StaticPlayerPool::from_csv_reader(data.as_bytes()),
            Err(PoolError::Empty)
        ));
    }
}

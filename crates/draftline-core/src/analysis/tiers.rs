// Curated player tiers.
//
// Tiers are a coarse, name-based heuristic: tier 1 is elite, tier 2 is a
// solid starter, and anyone not listed is tier 3 (replacement level).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::players::{normalize_name, PoolError};

pub const ELITE_TIER: u8 = 1;
pub const STARTER_TIER: u8 = 2;
pub const REPLACEMENT_TIER: u8 = 3;

const TIER_ONE: &[&str] = &[
    // QB
    "Josh Allen",
    "Lamar Jackson",
    "Jalen Hurts",
    "Joe Burrow",
    "Jayden Daniels",
    // RB
    "Bijan Robinson",
    "Jahmyr Gibbs",
    "Saquon Barkley",
    "Christian McCaffrey",
    "Derrick Henry",
    "Ashton Jeanty",
    "De'Von Achane",
    // WR
    "Ja'Marr Chase",
    "Justin Jefferson",
    "CeeDee Lamb",
    "Puka Nacua",
    "Malik Nabers",
    "Amon-Ra St. Brown",
    "Nico Collins",
    "Brian Thomas Jr.",
    // TE
    "Brock Bowers",
    "Trey McBride",
    "George Kittle",
    // K
    "Brandon Aubrey",
    // D/ST
    "Eagles D/ST",
    "Broncos D/ST",
];

const TIER_TWO: &[&str] = &[
    "Patrick Mahomes",
    "Baker Mayfield",
    "Bo Nix",
    "Kyler Murray",
    "Brock Purdy",
    "Justin Herbert",
    "Jared Goff",
    "Dak Prescott",
    "Jonathan Taylor",
    "Josh Jacobs",
    "Bucky Irving",
    "Kyren Williams",
    "Chase Brown",
    "James Cook",
    "Breece Hall",
    "Omarion Hampton",
    "Alvin Kamara",
    "Kenneth Walker III",
    "A.J. Brown",
    "Drake London",
    "Ladd McConkey",
    "Jaxon Smith-Njigba",
    "Tee Higgins",
    "Tyreek Hill",
    "Mike Evans",
    "Garrett Wilson",
    "Marvin Harrison Jr.",
    "Davante Adams",
    "Terry McLaurin",
    "Sam LaPorta",
    "T.J. Hockenson",
    "Travis Kelce",
    "Mark Andrews",
    "David Njoku",
    "Tucker Kraft",
    "Jake Bates",
    "Cameron Dicker",
    "Ka'imi Fairbairn",
    "Chris Boswell",
    "Steelers D/ST",
    "Ravens D/ST",
    "Texans D/ST",
    "Vikings D/ST",
];

/// Rough fantasy value for a tier, on a 0-100 scale.
pub fn estimated_value(tier: u8) -> f64 {
    match tier {
        ELITE_TIER => 90.0,
        STARTER_TIER => 65.0,
        _ => 35.0,
    }
}

#[derive(Debug, Deserialize)]
struct TierRow {
    name: String,
    tier: u8,
}

/// Name -> tier lookup. Unlisted players are tier 3.
#[derive(Debug, Clone)]
pub struct TierList {
    tiers: HashMap<String, u8>,
}

impl Default for TierList {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TierList {
    /// The bundled curated lists.
    pub fn builtin() -> Self {
        let tiers = TIER_ONE
            .iter()
            .map(|n| (normalize_name(n), ELITE_TIER))
            .chain(TIER_TWO.iter().map(|n| (normalize_name(n), STARTER_TIER)))
            .collect();
        TierList { tiers }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, u8)>) -> Self {
        TierList {
            tiers: entries
                .into_iter()
                .map(|(name, tier)| (normalize_name(&name), tier.clamp(ELITE_TIER, REPLACEMENT_TIER)))
                .collect(),
        }
    }

    /// Load `name,tier` rows, replacing the bundled lists entirely.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, PoolError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut entries = Vec::new();
        for row in rdr.deserialize::<TierRow>() {
            let row = row?;
            if !(ELITE_TIER..=REPLACEMENT_TIER).contains(&row.tier) {
                warn!("Tier {} for '{}' out of range, clamping", row.tier, row.name);
            }
            entries.push((row.name, row.tier));
        }
        if entries.is_empty() {
            return Err(PoolError::Empty);
        }
        Ok(Self::from_entries(entries))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, PoolError> {
        let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let list = Self::from_csv_reader(file)?;
        info!("Loaded {} tiered players from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn tier_of(&self, player: &str) -> u8 {
        self.tiers
            .get(&normalize_name(player))
            .copied()
            .unwrap_or(REPLACEMENT_TIER)
    }
}

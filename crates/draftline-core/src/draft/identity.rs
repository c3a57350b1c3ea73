// Team identity resolution: free-text team names -> stable integer ids.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use super::ledger::MAX_TEAMS;

/// Team names with a fixed id regardless of when they first appear.
pub const DEFAULT_KNOWN_ALIASES: &[(&str, u32)] = &[("Baron's Best Team", 7)];

static RE_TEAM_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^team\s*#?\s*(\d+)$").expect("team number regex"));

/// Normalize a team name for alias lookup.
///
/// Trims, folds curly apostrophes, collapses internal whitespace and
/// lowercases, so "Baron’s  Best team" and "baron's best team" collide.
pub fn normalize_team_name(name: &str) -> String {
    name.replace(['\u{2019}', '\u{2018}'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Extract N from an explicit "Team N" name, for N in `1..=MAX_TEAMS`.
pub fn pinned_team_number(name: &str) -> Option<u32> {
    written_team_number(name).filter(|n| (1..=MAX_TEAMS).contains(n))
}

fn written_team_number(name: &str) -> Option<u32> {
    let caps = RE_TEAM_NUMBER.captures(name.trim())?;
    caps[1].parse::<u32>().ok()
}

/// Maps team names to ids, memoizing every assignment.
///
/// Once a name has an id it keeps it until `clear_learned` (a ledger reset).
/// Ids for unseen names are handed out in order of first appearance, so the
/// same board imported in a different order can label teams differently.
#[derive(Debug, Clone)]
pub struct TeamResolver {
    known: HashMap<String, u32>,
    learned: HashMap<String, u32>,
    /// Display spelling of each learned alias, in first-seen order.
    seen_order: Vec<(String, u32)>,
}

impl Default for TeamResolver {
    fn default() -> Self {
        Self::new(DEFAULT_KNOWN_ALIASES.iter().map(|(n, id)| (n.to_string(), *id)))
    }
}

impl TeamResolver {
    /// Build a resolver from a known-alias table.
    pub fn new(known: impl IntoIterator<Item = (String, u32)>) -> Self {
        let known = known
            .into_iter()
            .filter(|(_, id)| *id >= 1)
            .map(|(name, id)| (normalize_team_name(&name), id))
            .collect();
        TeamResolver {
            known,
            learned: HashMap::new(),
            seen_order: Vec::new(),
        }
    }

    /// Resolve a team name to its id, assigning a new one if needed.
    ///
    /// Order: known alias, explicit "Team N", previously seen alias, then the
    /// lowest id not already claimed by any of those.
    pub fn resolve(&mut self, name: &str) -> u32 {
        let key = normalize_team_name(name);

        if let Some(&id) = self.known.get(&key) {
            return id;
        }

        if let Some(n) = pinned_team_number(&key) {
            if !self.learned.contains_key(&key) {
                self.remember(name, key, n);
            }
            return n;
        }

        if let Some(&id) = self.learned.get(&key) {
            return id;
        }

        if let Some(n) = written_team_number(&key) {
            warn!(
                team = n,
                max = MAX_TEAMS,
                "team number out of range; treating it as a plain name"
            );
        }

        let id = self.next_unused_id();
        info!("Assigned team id {} to '{}'", id, name.trim());
        self.remember(name, key, id);
        id
    }

    /// Look up a team name without assigning anything.
    pub fn lookup(&self, name: &str) -> Option<u32> {
        let key = normalize_team_name(name);
        self.known
            .get(&key)
            .copied()
            .or_else(|| pinned_team_number(&key))
            .or_else(|| self.learned.get(&key).copied())
    }

    /// Known aliases (normalized spelling), ordered by id.
    pub fn known_aliases(&self) -> Vec<(&str, u32)> {
        let mut known: Vec<(&str, u32)> = self.known.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        known.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
        known
    }

    /// Learned aliases in the order they were first seen.
    pub fn learned_aliases(&self) -> &[(String, u32)] {
        &self.seen_order
    }

    /// The display name for an id, if one was learned from free text.
    ///
    /// "Team N" spellings are skipped since they say nothing useful.
    pub fn display_name(&self, id: u32) -> Option<&str> {
        self.seen_order
            .iter()
            .find(|(name, n)| *n == id && written_team_number(name).is_none())
            .map(|(name, _)| name.as_str())
    }

    /// Forget everything learned from parsing; known aliases stay.
    pub fn clear_learned(&mut self) {
        self.learned.clear();
        self.seen_order.clear();
    }

    fn remember(&mut self, shown: &str, key: String, id: u32) {
        let shown = shown.trim();
        debug!(team = shown, id, "team alias recorded");
        self.learned.insert(key, id);
        self.seen_order.push((shown.to_string(), id));
    }

    fn next_unused_id(&self) -> u32 {
        let used: BTreeSet<u32> = self
            .known
            .values()
            .chain(self.learned.values())
            .copied()
            .collect();
        (1..).find(|id| !used.contains(id)).unwrap_or(1)
    }
}

// Draft ledger: the ordered pick history plus the draft cursor.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{info, warn};

use super::identity::TeamResolver;
use super::pick::{Pick, PickDraft};
use crate::error::RangeError;

/// League size used until configured otherwise.
pub const DEFAULT_LEAGUE_SIZE: u32 = 8;
/// Team a fresh ledger treats as "mine".
pub const DEFAULT_USER_TEAM: u32 = 1;
/// Highest team number accepted by commands.
pub const MAX_TEAMS: u32 = 12;
/// Smallest meaningful league.
pub const MIN_LEAGUE_SIZE: u32 = 2;

/// Position of a pick within a snake/linear draft board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundSlot {
    pub round: u32,
    pub slot: u32,
}

/// Convert an absolute pick number to its round and slot.
///
/// `round = ceil(pick / size)`, `slot = ((pick - 1) mod size) + 1`.
/// Both inputs are clamped to their minimums (pick 1, size 1).
pub fn round_and_slot(overall_pick: u32, league_size: u32) -> RoundSlot {
    let pick = overall_pick.max(1);
    let size = league_size.max(1);
    RoundSlot {
        round: pick.div_ceil(size),
        slot: (pick - 1) % size + 1,
    }
}

/// Inverse of [`round_and_slot`]. `None` when the pick number would not fit.
pub fn overall_from_round_slot(round: u32, slot: u32, league_size: u32) -> Option<u32> {
    (round.max(1) - 1).checked_mul(league_size)?.checked_add(slot)
}

/// The authoritative, append-only pick history for one draft.
///
/// Pick numbers are always `1..=len` in ledger order. Nothing is mutated or
/// removed except by [`DraftLedger::reset`].
#[derive(Debug, Clone)]
pub struct DraftLedger {
    picks: Vec<Pick>,
    next_pick: u32,
    user_team: u32,
    league_size: u32,
    resolver: TeamResolver,
}

impl Default for DraftLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftLedger {
    /// An empty ledger with default league size, user team and aliases.
    pub fn new() -> Self {
        DraftLedger {
            picks: Vec::new(),
            next_pick: 1,
            user_team: DEFAULT_USER_TEAM,
            league_size: DEFAULT_LEAGUE_SIZE,
            resolver: TeamResolver::default(),
        }
    }

    /// An empty ledger with explicit settings.
    pub fn with_config(
        league_size: u32,
        user_team: u32,
        resolver: TeamResolver,
    ) -> Result<Self, RangeError> {
        let mut ledger = DraftLedger {
            resolver,
            ..Self::new()
        };
        ledger.set_league_size(league_size)?;
        ledger.set_user_team(user_team)?;
        Ok(ledger)
    }

    // -- accessors --

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// Number the next appended pick will get.
    pub fn next_pick(&self) -> u32 {
        self.next_pick
    }

    pub fn user_team(&self) -> u32 {
        self.user_team
    }

    pub fn league_size(&self) -> u32 {
        self.league_size
    }

    pub fn resolver(&self) -> &TeamResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut TeamResolver {
        &mut self.resolver
    }

    /// Whether a pick belongs to the configured user team.
    ///
    /// Computed at read time, so changing the user team relabels history.
    pub fn is_user_pick(&self, pick: &Pick) -> bool {
        pick.draft_team == self.user_team
    }

    /// Round and slot of the pick that is on the clock.
    pub fn current_round_and_slot(&self) -> RoundSlot {
        round_and_slot(self.next_pick, self.league_size)
    }

    /// All picks made by one team, in draft order.
    pub fn picks_for_team(&self, team: u32) -> Vec<&Pick> {
        self.picks.iter().filter(|p| p.draft_team == team).collect()
    }

    /// The last `n` picks, oldest first.
    pub fn recent(&self, n: usize) -> &[Pick] {
        let start = self.picks.len().saturating_sub(n);
        &self.picks[start..]
    }

    /// Every team that has drafted, plus the user's team, ascending.
    pub fn team_ids(&self) -> Vec<u32> {
        let mut ids: BTreeSet<u32> = self.picks.iter().map(|p| p.draft_team).collect();
        ids.insert(self.user_team);
        ids.into_iter().collect()
    }

    // -- mutation --

    /// Append one pick, numbering it with the cursor.
    pub fn append_pick(&mut self, draft: PickDraft) -> Pick {
        let overall = self.next_pick;
        if let Some(claimed) = draft.source_pick {
            if claimed != overall {
                warn!(
                    player = %draft.player,
                    claimed,
                    assigned = overall,
                    "source pick number differs from ledger position"
                );
            }
        }

        let pick = Pick::from_draft(draft, overall);
        info!(
            "Pick {} recorded: {} ({}) -> team {}",
            overall, pick.player, pick.position, pick.draft_team
        );
        self.picks.push(pick.clone());
        self.next_pick += 1;
        pick
    }

    /// Append several picks; input order becomes ledger order.
    pub fn append_batch(&mut self, drafts: Vec<PickDraft>) -> Vec<Pick> {
        drafts.into_iter().map(|d| self.append_pick(d)).collect()
    }

    /// Change which team is "mine". Existing picks are not rewritten.
    pub fn set_user_team(&mut self, team: u32) -> Result<(), RangeError> {
        self.user_team = RangeError::check("team number", team, 1, MAX_TEAMS)?;
        info!("User team set to {}", team);
        Ok(())
    }

    pub fn set_league_size(&mut self, size: u32) -> Result<(), RangeError> {
        self.league_size = RangeError::check("league size", size, MIN_LEAGUE_SIZE, MAX_TEAMS)?;
        info!("League size set to {}", size);
        Ok(())
    }

    /// Clear picks, cursor and learned team aliases.
    ///
    /// League size, user team and known aliases are preserved.
    pub fn reset(&mut self) {
        info!("Ledger reset ({} picks discarded)", self.picks.len());
        self.picks.clear();
        self.next_pick = 1;
        self.resolver.clear_learned();
    }

    /// [`reset`](Self::reset) plus default league size and user team.
    pub fn reset_all(&mut self) {
        self.reset();
        self.league_size = DEFAULT_LEAGUE_SIZE;
        self.user_team = DEFAULT_USER_TEAM;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::pick::{Position, Provenance};

    fn draft(player: &str, team: u32) -> PickDraft {
        PickDraft {
            player: player.to_string(),
            position: Position::WR,
            nfl_team: None,
            draft_team: team,
            source_pick: None,
            provenance: Provenance::Typed,
        }
    }

    fn assert_sequential(ledger: &DraftLedger) {
        let numbers: Vec<u32> = ledger.picks().iter().map(|p| p.overall_pick).collect();
        let expected: Vec<u32> = (1..=ledger.len() as u32).collect();
        assert_eq!(numbers, expected);
        assert_eq!(ledger.next_pick(), ledger.len() as u32 + 1);
    }

    #[test]
    fn new_ledger_defaults() {
        let ledger = DraftLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.next_pick(), 1);
        assert_eq!(ledger.league_size(), 8);
        assert_eq!(ledger.user_team(), 1);
    }

    #[test]
    fn append_assigns_sequential_numbers() {
        let mut ledger = DraftLedger::new();
        let a = ledger.append_pick(draft("A", 1));
        let b = ledger.append_pick(draft("B", 2));
        assert_eq!(a.overall_pick, 1);
        assert_eq!(b.overall_pick, 2);
        assert_sequential(&ledger);
    }

    #[test]
    fn batch_order_defines_ledger_order() {
        let mut ledger = DraftLedger::new();
        ledger.append_pick(draft("First", 3));
        let batch = ledger.append_batch(vec![draft("X", 1), draft("Y", 2), draft("Z", 1)]);
        assert_eq!(
            batch.iter().map(|p| p.overall_pick).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
        assert_eq!(ledger.picks()[3].player, "Z");
        assert_sequential(&ledger);
    }

    #[test]
    fn source_pick_never_overrides_numbering() {
        let mut ledger = DraftLedger::new();
        let mut d = draft("Claimed Fifth", 1);
        d.source_pick = Some(5);
        assert_eq!(ledger.append_pick(d).overall_pick, 1);
    }

    #[test]
    fn set_user_team_validates_range() {
        let mut ledger = DraftLedger::new();
        assert!(ledger.set_user_team(12).is_ok());
        assert_eq!(ledger.user_team(), 12);
        let err = ledger.set_user_team(0).unwrap_err();
        assert_eq!(err.value, 0);
        assert!(ledger.set_user_team(13).is_err());
        assert_eq!(ledger.user_team(), 12);
    }

    #[test]
    fn is_user_pick_follows_current_user_team() {
        let mut ledger = DraftLedger::new();
        let pick = ledger.append_pick(draft("Mine Later", 2));
        assert!(!ledger.is_user_pick(&pick));
        ledger.set_user_team(2).unwrap();
        assert!(ledger.is_user_pick(&pick));
    }

    #[test]
    fn league_size_bounds() {
        let mut ledger = DraftLedger::new();
        assert!(ledger.set_league_size(1).is_err());
        assert!(ledger.set_league_size(10).is_ok());
        assert_eq!(ledger.league_size(), 10);
    }

    #[test]
    fn reset_preserves_settings() {
        let mut ledger = DraftLedger::new();
        ledger.set_user_team(3).unwrap();
        ledger.set_league_size(10).unwrap();
        ledger.resolver_mut().resolve("Gridiron Goblins");
        ledger.append_pick(draft("A", 1));
        ledger.reset();
        assert!(ledger.is_empty());
        assert_eq!(ledger.next_pick(), 1);
        assert_eq!(ledger.user_team(), 3);
        assert_eq!(ledger.league_size(), 10);
        assert_eq!(ledger.resolver().lookup("Gridiron Goblins"), None);

        ledger.reset_all();
        assert_eq!(ledger.user_team(), DEFAULT_USER_TEAM);
        assert_eq!(ledger.league_size(), DEFAULT_LEAGUE_SIZE);
    }

    #[test]
    fn round_and_slot_examples() {
        assert_eq!(round_and_slot(1, 8), RoundSlot { round: 1, slot: 1 });
        assert_eq!(round_and_slot(8, 8), RoundSlot { round: 1, slot: 8 });
        assert_eq!(round_and_slot(9, 8), RoundSlot { round: 2, slot: 1 });
        assert_eq!(round_and_slot(75, 8), RoundSlot { round: 10, slot: 3 });
    }

    #[test]
    fn round_and_slot_roundtrip() {
        for size in 2..=14u32 {
            for pick in 1..=300u32 {
                let rs = round_and_slot(pick, size);
                assert!(rs.slot >= 1 && rs.slot <= size);
                assert_eq!(overall_from_round_slot(rs.round, rs.slot, size), Some(pick));
            }
        }
    }

    #[test]
    fn overall_from_round_slot_rejects_overflow() {
        assert_eq!(overall_from_round_slot(999_999_999, 1, 8), None);
        assert_eq!(overall_from_round_slot(1, u32::MAX, 8), Some(u32::MAX));
        assert_eq!(overall_from_round_slot(2, u32::MAX, 8), None);
    }

    #[test]
    fn team_ids_include_user_team() {
        let mut ledger = DraftLedger::new();
        ledger.set_user_team(5).unwrap();
        ledger.append_pick(draft("A", 2));
        ledger.append_pick(draft("B", 7));
        ledger.append_pick(draft("C", 2));
        assert_eq!(ledger.team_ids(), vec![2, 5, 7]);
        assert_eq!(ledger.picks_for_team(2).len(), 2);
    }

    #[test]
    fn recent_returns_tail() {
        let mut ledger = DraftLedger::new();
        for i in 0..5 {
            ledger.append_pick(draft(&format!("P{i}"), 1));
        }
        let tail = ledger.recent(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].player, "P3");
        assert_eq!(ledger.recent(50).len(), 5);
    }
}

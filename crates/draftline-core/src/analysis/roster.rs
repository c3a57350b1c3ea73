// Positional needs and strengths for one fantasy team.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::tiers::{estimated_value, TierList, ELITE_TIER, STARTER_TIER};
use crate::draft::pick::{Pick, Position};
use crate::players::normalize_name;

// ---------------------------------------------------------------------------
// Roster targets
// ---------------------------------------------------------------------------

/// Starter and bench targets for one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionTarget {
    pub min_starters: usize,
    pub ideal_starters: usize,
    pub bench: usize,
    /// Multiplier applied to need priority.
    pub importance: f64,
}

impl PositionTarget {
    pub fn for_position(pos: Position) -> Self {
        let (min_starters, ideal_starters, bench, importance) = match pos {
            Position::QB => (1, 1, 1, 1.2),
            Position::RB => (2, 2, 2, 1.1),
            Position::WR => (2, 3, 2, 1.1),
            Position::TE => (1, 1, 1, 0.9),
            Position::K => (1, 1, 0, 0.5),
            Position::DST => (1, 1, 0, 0.5),
        };
        PositionTarget {
            min_starters,
            ideal_starters,
            bench,
            importance,
        }
    }
}

pub const MAX_NEED_PRIORITY: f64 = 100.0;
/// Cap for needs whose starter minimum is met, keeping them below any
/// position with an empty starter slot.
const FILLED_NEED_CEILING: f64 = MAX_NEED_PRIORITY - 1.0;
const BASE_PRIORITY: f64 = 50.0;
const STARTER_WEIGHT: f64 = 40.0;
const UPGRADE_WEIGHT: f64 = 25.0;
const DEPTH_WEIGHT: f64 = 15.0;

// ---------------------------------------------------------------------------
// Analysis types
// ---------------------------------------------------------------------------

/// A drafted player with heuristic value attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedPlayer {
    pub name: String,
    pub position: Position,
    pub nfl_team: Option<String>,
    pub tier: u8,
    pub estimated_value: f64,
    pub overall_pick: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedKind {
    Starter,
    Upgrade,
    Depth,
}

/// One reason a position is short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NeedFactor {
    pub kind: NeedKind,
    pub magnitude: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strength {
    pub position: Position,
    pub reason: String,
    pub surplus: Vec<RatedPlayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weakness {
    pub position: Position,
    pub factors: Vec<NeedFactor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Need {
    pub position: Position,
    /// 0-100, higher is more urgent.
    pub priority: f64,
    pub factors: Vec<NeedFactor>,
}

impl Need {
    pub fn has(&self, kind: NeedKind) -> bool {
        self.factors.iter().any(|f| f.kind == kind)
    }
}

/// A team's positional profile, derived from a ledger snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAnalysis {
    pub team: u32,
    pub by_position: BTreeMap<Position, Vec<RatedPlayer>>,
    pub levels: BTreeMap<Position, StrengthLevel>,
    pub strengths: Vec<Strength>,
    pub weaknesses: Vec<Weakness>,
    /// Sorted by priority, most urgent first.
    pub needs: Vec<Need>,
    /// Surplus players across strong positions, most valuable first.
    pub tradeable: Vec<RatedPlayer>,
}

impl TeamAnalysis {
    pub fn need_for(&self, pos: Position) -> Option<&Need> {
        self.needs.iter().find(|n| n.position == pos)
    }

    pub fn strength_for(&self, pos: Position) -> Option<&Strength> {
        self.strengths.iter().find(|s| s.position == pos)
    }

    pub fn level(&self, pos: Position) -> StrengthLevel {
        self.levels.get(&pos).copied().unwrap_or(StrengthLevel::Low)
    }

    pub fn player_count(&self) -> usize {
        self.by_position.values().map(Vec::len).sum()
    }

    /// Find a rostered player by name, ignoring case and punctuation.
    pub fn find_player(&self, name: &str) -> Option<&RatedPlayer> {
        let wanted = normalize_name(name);
        self.by_position
            .values()
            .flatten()
            .find(|p| normalize_name(&p.name) == wanted)
    }

    /// Players beyond the ideal starters at positions that are not short.
    ///
    /// A superset of `tradeable`: depth a team can spare without opening a
    /// hole, most valuable first.
    pub fn spare_players(&self) -> Vec<&RatedPlayer> {
        let mut spare: Vec<&RatedPlayer> = self
            .by_position
            .iter()
            .filter(|(pos, _)| self.level(**pos) != StrengthLevel::Low)
            .flat_map(|(pos, bucket)| {
                let ideal = PositionTarget::for_position(*pos).ideal_starters;
                bucket.iter().skip(ideal)
            })
            .collect();
        spare.sort_by(|a, b| {
            b.estimated_value
                .total_cmp(&a.estimated_value)
                .then(a.overall_pick.cmp(&b.overall_pick))
        });
        spare
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Priority for a set of need factors at a position, capped at 100.
///
/// Only an unfilled starter slot can reach the cap; anything else tops out
/// one point lower, so emptying a position always raises its priority.
pub fn need_priority(pos: Position, factors: &[NeedFactor]) -> f64 {
    let raw = factors.iter().fold(BASE_PRIORITY, |acc, f| {
        acc + match f.kind {
            NeedKind::Starter => STARTER_WEIGHT,
            NeedKind::Upgrade => UPGRADE_WEIGHT,
            NeedKind::Depth => DEPTH_WEIGHT,
        }
    });
    let ceiling = if factors.iter().any(|f| f.kind == NeedKind::Starter) {
        MAX_NEED_PRIORITY
    } else {
        FILLED_NEED_CEILING
    };
    (raw * PositionTarget::for_position(pos).importance).min(ceiling)
}

/// Build the positional profile for `team` from its picks.
///
/// Never fails; an empty roster reports every position as a need.
pub fn analyze_team<'a>(
    team: u32,
    picks: impl IntoIterator<Item = &'a Pick>,
    tiers: &TierList,
) -> TeamAnalysis {
    let mut by_position: BTreeMap<Position, Vec<RatedPlayer>> =
        Position::ALL.iter().map(|p| (*p, Vec::new())).collect();

    for pick in picks {
        let tier = tiers.tier_of(&pick.player);
        by_position.entry(pick.position).or_default().push(RatedPlayer {
            name: pick.player.clone(),
            position: pick.position,
            nfl_team: pick.nfl_team.clone(),
            tier,
            estimated_value: estimated_value(tier),
            overall_pick: pick.overall_pick,
        });
    }
    for bucket in by_position.values_mut() {
        bucket.sort_by(|a, b| {
            b.estimated_value
                .total_cmp(&a.estimated_value)
                .then(a.overall_pick.cmp(&b.overall_pick))
        });
    }

    let mut levels = BTreeMap::new();
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut needs = Vec::new();

    for pos in Position::ALL {
        let bucket = &by_position[&pos];
        let target = PositionTarget::for_position(pos);
        let factors = need_factors(bucket, &target);

        if !factors.is_empty() {
            levels.insert(pos, StrengthLevel::Low);
            needs.push(Need {
                position: pos,
                priority: need_priority(pos, &factors),
                factors: factors.clone(),
            });
            weaknesses.push(Weakness {
                position: pos,
                factors,
            });
            continue;
        }

        let elite = bucket.iter().filter(|p| p.tier == ELITE_TIER).count();
        if elite >= 2 && bucket.len() > target.ideal_starters + target.bench {
            levels.insert(pos, StrengthLevel::High);
            let surplus: Vec<RatedPlayer> = bucket[target.ideal_starters + 1..].to_vec();
            if !surplus.is_empty() {
                strengths.push(Strength {
                    position: pos,
                    reason: format!(
                        "{} elite {} with {} rostered (target {} + {} bench)",
                        elite,
                        pos,
                        bucket.len(),
                        target.ideal_starters,
                        target.bench
                    ),
                    surplus,
                });
            }
        } else {
            levels.insert(pos, StrengthLevel::Medium);
        }
    }

    needs.sort_by(|a, b| {
        b.priority
            .total_cmp(&a.priority)
            .then(a.position.sort_order().cmp(&b.position.sort_order()))
    });

    let mut tradeable: Vec<RatedPlayer> = strengths
        .iter()
        .flat_map(|s| s.surplus.iter().cloned())
        .collect();
    tradeable.sort_by(|a, b| {
        b.estimated_value
            .total_cmp(&a.estimated_value)
            .then(a.overall_pick.cmp(&b.overall_pick))
    });

    TeamAnalysis {
        team,
        by_position,
        levels,
        strengths,
        weaknesses,
        needs,
        tradeable,
    }
}

fn need_factors(bucket: &[RatedPlayer], target: &PositionTarget) -> Vec<NeedFactor> {
    let size = bucket.len();
    let mut factors = Vec::new();

    if size < target.min_starters {
        factors.push(NeedFactor {
            kind: NeedKind::Starter,
            magnitude: target.min_starters - size,
        });
    }
    if !bucket.iter().any(|p| p.tier <= STARTER_TIER) {
        factors.push(NeedFactor {
            kind: NeedKind::Upgrade,
            magnitude: target.ideal_starters,
        });
    }
    if target.bench > 0 && size <= target.ideal_starters {
        factors.push(NeedFactor {
            kind: NeedKind::Depth,
            magnitude: (target.ideal_starters + target.bench - size).max(1),
        });
    }
    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::pick::Provenance;
    use chrono::Utc;

    fn pick(n: u32, player: &str, position: Position) -> Pick {
        Pick {
            player: player.to_string(),
            position,
            nfl_team: None,
            draft_team: 1,
            overall_pick: n,
            provenance: Provenance::Typed,
            timestamp: Utc::now(),
        }
    }

    fn analyze(picks: &[Pick]) -> TeamAnalysis {
        analyze_team(1, picks.iter(), &TierList::builtin())
    }

    #[test]
    fn empty_roster_needs_everything() {
        let a = analyze(&[]);
        assert_eq!(a.needs.len(), 6);
        assert!(Position::ALL.iter().all(|p| a.level(*p) == StrengthLevel::Low));
        assert!(a.strengths.is_empty());
        assert!(a.tradeable.is_empty());
        // QB saturates the cap, kickers stay well below it.
        assert_eq!(a.need_for(Position::QB).unwrap().priority, 100.0);
        assert!((a.need_for(Position::K).unwrap().priority - 57.5).abs() < 1e-9);
    }

    #[test]
    fn needs_sorted_descending() {
        let a = analyze(&[pick(1, "Josh Allen", Position::QB)]);
        let priorities: Vec<f64> = a.needs.iter().map(|n| n.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn need_priority_falls_once_minimum_is_met() {
        let empty = analyze(&[]);
        let one_te = analyze(&[pick(1, "Backup Tight End", Position::TE)]);
        let p0 = empty.need_for(Position::TE).unwrap().priority;
        let p1 = one_te.need_for(Position::TE).unwrap().priority;
        assert!(p0 > p1, "{p0} should exceed {p1}");

        let two_rb = analyze(&[
            pick(1, "Depth Back One", Position::RB),
            pick(2, "Depth Back Two", Position::RB),
        ]);
        let r0 = empty.need_for(Position::K).unwrap().priority;
        let one_k = analyze(&[pick(1, "Unknown Kicker", Position::K)]);
        assert!(r0 > one_k.need_for(Position::K).unwrap().priority);
        assert!(two_rb.need_for(Position::RB).unwrap().priority < 100.0);
    }

    #[test]
    fn empty_position_outranks_one_at_starter_minimum() {
        let empty = analyze(&[]);
        for pos in Position::ALL {
            let min = PositionTarget::for_position(pos).min_starters;
            let picks: Vec<Pick> = (1..=min)
                .map(|i| pick(i as u32, &format!("Fringe {} {}", pos, i), pos))
                .collect();
            let at_min = analyze(&picks);
            let p0 = empty.need_for(pos).map_or(0.0, |n| n.priority);
            let p_min = at_min.need_for(pos).map_or(0.0, |n| n.priority);
            assert!(p0 > p_min, "{pos}: empty {p0} should exceed {p_min}");
        }
    }

    #[test]
    fn filled_quarterback_stays_below_cap() {
        let a = analyze(&[pick(1, "Fringe Passer", Position::QB)]);
        let need = a.need_for(Position::QB).unwrap();
        assert!(need.has(NeedKind::Upgrade));
        assert_eq!(need.priority, MAX_NEED_PRIORITY - 1.0);
    }

    #[test]
    fn starter_without_bench_is_depth_need() {
        let a = analyze(&[pick(1, "Josh Allen", Position::QB)]);
        let need = a.need_for(Position::QB).unwrap();
        assert!(need.has(NeedKind::Depth));
        assert!(!need.has(NeedKind::Upgrade));
        assert!(!need.has(NeedKind::Starter));
        assert!((need.priority - 78.0).abs() < 1e-9);
    }

    #[test]
    fn kicker_without_bench_target_is_medium() {
        let a = analyze(&[pick(1, "Brandon Aubrey", Position::K)]);
        assert_eq!(a.level(Position::K), StrengthLevel::Medium);
        assert!(a.need_for(Position::K).is_none());
    }

    #[test]
    fn stacked_running_backs_produce_surplus() {
        let a = analyze(&[
            pick(1, "Bijan Robinson", Position::RB),
            pick(9, "Jahmyr Gibbs", Position::RB),
            pick(17, "Saquon Barkley", Position::RB),
            pick(25, "Josh Jacobs", Position::RB),
            pick(33, "Backup Back", Position::RB),
        ]);
        assert_eq!(a.level(Position::RB), StrengthLevel::High);
        let strength = a.strength_for(Position::RB).unwrap();
        let names: Vec<&str> = strength.surplus.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Josh Jacobs", "Backup Back"]);
        assert_eq!(a.tradeable.len(), 2);
        assert_eq!(a.tradeable[0].name, "Josh Jacobs");
    }

    #[test]
    fn one_elite_player_is_not_a_strength() {
        let a = analyze(&[
            pick(1, "Bijan Robinson", Position::RB),
            pick(9, "Josh Jacobs", Position::RB),
            pick(17, "Kyren Williams", Position::RB),
            pick(25, "Chase Brown", Position::RB),
            pick(33, "James Cook", Position::RB),
        ]);
        assert_eq!(a.level(Position::RB), StrengthLevel::Medium);
        assert!(a.strengths.is_empty());
    }

    #[test]
    fn buckets_ordered_by_value_then_pick() {
        let a = analyze(&[
            pick(3, "Late Receiver", Position::WR),
            pick(5, "Ja'Marr Chase", Position::WR),
            pick(1, "Early Receiver", Position::WR),
        ]);
        let wr: Vec<&str> = a.by_position[&Position::WR]
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(wr, vec!["Ja'Marr Chase", "Early Receiver", "Late Receiver"]);
        assert_eq!(a.player_count(), 3);
        assert!(a.find_player("ja'marr chase").is_some());
        assert!(a.find_player("JaMarr Chase").is_some());
    }

    #[test]
    fn spare_players_skip_short_positions() {
        let a = analyze(&[
            pick(1, "Josh Allen", Position::QB),
            pick(2, "Patrick Mahomes", Position::QB),
            pick(3, "Jalen Hurts", Position::QB),
            pick(4, "Backup Tight End", Position::TE),
            pick(5, "Another Tight End", Position::TE),
        ]);
        // TE has two bodies but no tier 1-2 player, so it is still short.
        assert_eq!(a.level(Position::TE), StrengthLevel::Low);
        let spare: Vec<&str> = a.spare_players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(spare, vec!["Jalen Hurts", "Patrick Mahomes"]);
    }
}

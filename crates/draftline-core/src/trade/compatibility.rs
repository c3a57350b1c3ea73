// Pairwise trade compatibility between two team analyses.
//
// The score is directional: what I receive counts fully, what I give only
// counts at GIVE_WEIGHT, so compatibility(A, B) and compatibility(B, A)
// generally differ.

use serde::Serialize;

use crate::analysis::roster::{RatedPlayer, TeamAnalysis};
use crate::draft::pick::Position;

/// Partners must score strictly above this to make the shortlist.
pub const VIABILITY_THRESHOLD: f64 = 30.0;

const RECEIVE_BONUS: f64 = 20.0;
const GIVE_BONUS: f64 = 15.0;
const GIVE_WEIGHT: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    /// I need the position, the partner has surplus there.
    NeedForStrength,
    /// I have surplus at the position, the partner needs it.
    StrengthForNeed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub kind: OpportunityKind,
    pub position: Position,
    pub value: f64,
    /// Priority of the need being filled.
    pub priority: f64,
    /// Surplus players on the side that has them.
    pub players: Vec<RatedPlayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeCompatibility {
    pub score: f64,
    /// Sorted by value, best first.
    pub opportunities: Vec<Opportunity>,
    pub mutual_benefit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerMatch {
    pub partner: u32,
    pub compatibility: TradeCompatibility,
}

/// Score how well `partner` complements `mine`, from my side.
pub fn compatibility(mine: &TeamAnalysis, partner: &TeamAnalysis) -> TradeCompatibility {
    let mut score = 0.0;
    let mut opportunities = Vec::new();

    for need in &mine.needs {
        for strength in partner.strengths.iter().filter(|s| s.position == need.position) {
            opportunities.push(Opportunity {
                kind: OpportunityKind::NeedForStrength,
                position: need.position,
                value: need.priority + RECEIVE_BONUS,
                priority: need.priority,
                players: strength.surplus.clone(),
            });
            score += need.priority;
        }
    }

    for strength in &mine.strengths {
        for need in partner.needs.iter().filter(|n| n.position == strength.position) {
            opportunities.push(Opportunity {
                kind: OpportunityKind::StrengthForNeed,
                position: strength.position,
                value: need.priority + GIVE_BONUS,
                priority: need.priority,
                players: strength.surplus.clone(),
            });
            score += need.priority * GIVE_WEIGHT;
        }
    }

    opportunities.sort_by(|a, b| b.value.total_cmp(&a.value));
    let mutual_benefit = opportunities.len() >= 2;

    TradeCompatibility {
        score,
        opportunities,
        mutual_benefit,
    }
}

/// Every partner scoring above `threshold`, best first.
pub fn find_trade_partners(
    mine: &TeamAnalysis,
    others: &[TeamAnalysis],
    threshold: f64,
) -> Vec<PartnerMatch> {
    let mut matches: Vec<PartnerMatch> = others
        .iter()
        .filter(|other| other.team != mine.team)
        .map(|other| PartnerMatch {
            partner: other.team,
            compatibility: compatibility(mine, other),
        })
        .filter(|m| m.compatibility.score > threshold)
        .collect();
    matches.sort_by(|a, b| {
        b.compatibility
            .score
            .total_cmp(&a.compatibility.score)
            .then(a.partner.cmp(&b.partner))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::roster::analyze_team;
    use crate::analysis::tiers::TierList;
    use crate::draft::pick::{Pick, Provenance};
    use chrono::Utc;

    fn roster(team: u32, players: &[(&str, Position)]) -> TeamAnalysis {
        let picks: Vec<Pick> = players
            .iter()
            .enumerate()
            .map(|(i, (name, pos))| Pick {
                player: name.to_string(),
                position: *pos,
                nfl_team: None,
                draft_team: team,
                overall_pick: i as u32 + 1,
                provenance: Provenance::Imported,
                timestamp: Utc::now(),
            })
            .collect();
        analyze_team(team, picks.iter(), &TierList::builtin())
    }

    fn rb_hoarder(team: u32) -> TeamAnalysis {
        roster(
            team,
            &[
                ("Bijan Robinson", Position::RB),
                ("Jahmyr Gibbs", Position::RB),
                ("Saquon Barkley", Position::RB),
                ("Josh Jacobs", Position::RB),
                ("Backup Back", Position::RB),
            ],
        )
    }

    #[test]
    fn receiving_surplus_scores_full_priority() {
        let mine = roster(1, &[]);
        let partner = rb_hoarder(2);
        let c = compatibility(&mine, &partner);

        let rb_need = mine.need_for(Position::RB).unwrap().priority;
        let rb_ops: Vec<&Opportunity> = c
            .opportunities
            .iter()
            .filter(|o| o.kind == OpportunityKind::NeedForStrength)
            .collect();
        assert_eq!(rb_ops.len(), 1);
        assert_eq!(rb_ops[0].position, Position::RB);
        assert!((rb_ops[0].value - (rb_need + 20.0)).abs() < 1e-9);
        assert_eq!(rb_ops[0].players.len(), 2);
        assert!((c.score - rb_need).abs() < 1e-9);
        assert!(!c.mutual_benefit);
    }

    #[test]
    fn scores_are_asymmetric() {
        let needy = roster(1, &[]);
        let hoarder = rb_hoarder(2);
        let forward = compatibility(&needy, &hoarder);
        let backward = compatibility(&hoarder, &needy);

        let rb_need = needy.need_for(Position::RB).unwrap().priority;
        assert!((forward.score - rb_need).abs() < 1e-9);
        assert!((backward.score - rb_need * 0.8).abs() < 1e-9);
        assert_ne!(forward.score, backward.score);
        assert_eq!(
            backward.opportunities[0].kind,
            OpportunityKind::StrengthForNeed
        );
        assert!((backward.opportunities[0].value - (rb_need + 15.0)).abs() < 1e-9);
    }

    #[test]
    fn no_strengths_no_opportunities() {
        let a = roster(1, &[]);
        let b = roster(2, &[("Josh Allen", Position::QB)]);
        let c = compatibility(&a, &b);
        assert_eq!(c.score, 0.0);
        assert!(c.opportunities.is_empty());
    }

    #[test]
    fn partner_search_applies_threshold_and_order() {
        let mine = roster(1, &[]);
        let others = vec![
            roster(1, &[]),
            roster(2, &[("Josh Allen", Position::QB)]),
            rb_hoarder(3),
        ];
        let matches = find_trade_partners(&mine, &others, VIABILITY_THRESHOLD);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].partner, 3);

        let none = find_trade_partners(&mine, &others, 1000.0);
        assert!(none.is_empty());
    }
}

// Trade suggestion ranking.
//
// Candidates come from two places: heuristic pairings built from the
// compatibility shortlist, and whatever the narrative advisor returned.
// Advisor output is parsed defensively; anything unusable is dropped and
// the heuristic candidates stand on their own.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::analysis::roster::{RatedPlayer, TeamAnalysis};
use crate::draft::identity::pinned_team_number;
use crate::draft::pick::Position;
use crate::players::normalize_name;
use crate::trade::advisor::AdvisorError;
use crate::trade::compatibility::PartnerMatch;

/// Suggestions kept after ranking.
pub const TOP_SUGGESTIONS: usize = 5;
/// Fairness assumed when a candidate does not carry one.
pub const DEFAULT_FAIRNESS: f64 = 5.0;
pub const MAX_FAIRNESS: f64 = 10.0;

const NEED_WEIGHT: f64 = 0.1;
const UNEVEN_PENALTY: f64 = 1.0;

// ---------------------------------------------------------------------------
// Candidate and suggestion types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlayer {
    pub name: String,
    pub position: Option<Position>,
}

impl TradePlayer {
    fn from_rated(p: &RatedPlayer) -> Self {
        TradePlayer {
            name: p.name.clone(),
            position: Some(p.position),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Heuristic,
    Advisor,
}

/// An unranked trade idea.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeCandidate {
    pub give: Vec<TradePlayer>,
    pub receive: Vec<TradePlayer>,
    pub partner_team: u32,
    /// 0-10; `None` means [`DEFAULT_FAIRNESS`].
    pub fairness: Option<f64>,
    pub reasoning: String,
    pub source: SuggestionSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSuggestion {
    pub give: Vec<TradePlayer>,
    pub receive: Vec<TradePlayer>,
    pub partner_team: u32,
    pub fairness: f64,
    pub reasoning: String,
    pub rank_score: f64,
    pub source: SuggestionSource,
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Rank score of one candidate from my point of view.
pub fn score_candidate(candidate: &TradeCandidate, mine: &TeamAnalysis) -> f64 {
    let fairness = candidate
        .fairness
        .unwrap_or(DEFAULT_FAIRNESS)
        .clamp(0.0, MAX_FAIRNESS);
    let need_bonus: f64 = candidate
        .receive
        .iter()
        .filter_map(|p| p.position)
        .filter_map(|pos| mine.need_for(pos))
        .map(|need| need.priority * NEED_WEIGHT)
        .sum();
    let penalty = if candidate.give.len() > candidate.receive.len() {
        UNEVEN_PENALTY
    } else {
        0.0
    };
    fairness + need_bonus - penalty
}

/// Score, deduplicate and keep the best [`TOP_SUGGESTIONS`].
pub fn rank_trade_suggestions(
    candidates: Vec<TradeCandidate>,
    mine: &TeamAnalysis,
) -> Vec<TradeSuggestion> {
    let mut scored: Vec<TradeSuggestion> = candidates
        .into_iter()
        .map(|c| {
            let rank_score = score_candidate(&c, mine);
            TradeSuggestion {
                fairness: c.fairness.unwrap_or(DEFAULT_FAIRNESS).clamp(0.0, MAX_FAIRNESS),
                give: c.give,
                receive: c.receive,
                partner_team: c.partner_team,
                reasoning: c.reasoning,
                rank_score,
                source: c.source,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.rank_score
            .total_cmp(&a.rank_score)
            .then(a.partner_team.cmp(&b.partner_team))
    });

    let mut seen = HashSet::new();
    scored.retain(|s| seen.insert(trade_key(s.partner_team, &s.give, &s.receive)));
    scored.truncate(TOP_SUGGESTIONS);
    scored
}

fn trade_key(partner: u32, give: &[TradePlayer], receive: &[TradePlayer]) -> (u32, Vec<String>, Vec<String>) {
    let names = |players: &[TradePlayer]| {
        let mut v: Vec<String> = players.iter().map(|p| normalize_name(&p.name)).collect();
        v.sort();
        v
    };
    (partner, names(give), names(receive))
}

// ---------------------------------------------------------------------------
// Heuristic candidates
// ---------------------------------------------------------------------------

/// One 1-for-1 idea per shortlisted partner.
///
/// Receive the partner's best spare player at my most urgent need they can
/// fill; give my best spare player at a position they need, or failing that
/// my best spare player overall. Partners with nothing to pair are skipped.
pub fn heuristic_candidates(
    mine: &TeamAnalysis,
    partners: &[TeamAnalysis],
    matches: &[PartnerMatch],
) -> Vec<TradeCandidate> {
    let my_spare = mine.spare_players();

    matches
        .iter()
        .filter_map(|m| {
            let partner = partners.iter().find(|p| p.team == m.partner)?;
            let their_spare = partner.spare_players();

            let (need, receive) = mine.needs.iter().find_map(|need| {
                their_spare
                    .iter()
                    .find(|p| p.position == need.position)
                    .map(|p| (need, *p))
            })?;

            let give = partner
                .needs
                .iter()
                .find_map(|n| my_spare.iter().find(|p| p.position == n.position))
                .or_else(|| {
                    my_spare
                        .iter()
                        .find(|p| mine.need_for(p.position).is_none())
                })?;

            Some(TradeCandidate {
                give: vec![TradePlayer::from_rated(give)],
                receive: vec![TradePlayer::from_rated(receive)],
                partner_team: partner.team,
                fairness: None,
                reasoning: format!(
                    "Team {} can spare {} at {}; you need {} (priority {:.0}) and can move {}.",
                    partner.team,
                    receive.name,
                    receive.position,
                    need.position,
                    need.priority,
                    give.name
                ),
                source: SuggestionSource::Heuristic,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Advisor reply parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPlayer {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        position: Option<String>,
    },
}

impl RawPlayer {
    fn into_parts(self) -> (String, Option<String>) {
        match self {
            RawPlayer::Name(name) => (name, None),
            RawPlayer::Full { name, position } => (name, position),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTeam {
    Number(u32),
    Text(String),
}

impl RawTeam {
    fn number(&self) -> Option<u32> {
        match self {
            RawTeam::Number(n) => Some(*n),
            RawTeam::Text(s) => s.trim().parse().ok().or_else(|| pinned_team_number(s)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    #[serde(default)]
    give: Vec<RawPlayer>,
    #[serde(default)]
    receive: Vec<RawPlayer>,
    #[serde(default, alias = "partner", alias = "partnerTeam", alias = "team")]
    partner_team: Option<RawTeam>,
    #[serde(default)]
    fairness: Option<f64>,
    #[serde(default, alias = "reason", alias = "rationale")]
    reasoning: String,
}

/// Pull trade candidates out of an advisor reply.
///
/// Accepts a bare JSON array, an object holding a `trades` (or
/// `suggestions`) array, a single trade object, and any of those wrapped in
/// a code fence or surrounded by prose. Candidates naming unknown partners
/// or players not on the relevant roster are dropped.
pub fn parse_advisor_reply(
    reply: &str,
    mine: &TeamAnalysis,
    partners: &[TeamAnalysis],
) -> Result<Vec<TradeCandidate>, AdvisorError> {
    let value = extract_json(reply)
        .ok_or_else(|| AdvisorError::Unparsable("no JSON found in reply".into()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map
            .remove("trades")
            .or_else(|| map.remove("suggestions"))
        {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(AdvisorError::Unparsable(
                    "`trades` is not an array".into(),
                ))
            }
            None => vec![Value::Object(map)],
        },
        _ => return Err(AdvisorError::Unparsable("reply is not a trade list".into())),
    };

    let total = items.len();
    let candidates: Vec<TradeCandidate> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawCandidate>(item) {
            Ok(raw) => resolve_candidate(raw, mine, partners),
            Err(e) => {
                debug!("Skipping malformed trade idea: {}", e);
                None
            }
        })
        .collect();

    if total > 0 && candidates.is_empty() {
        return Err(AdvisorError::Unparsable(format!(
            "none of {} trade ideas matched the rosters",
            total
        )));
    }
    Ok(candidates)
}

fn resolve_candidate(
    raw: RawCandidate,
    mine: &TeamAnalysis,
    partners: &[TeamAnalysis],
) -> Option<TradeCandidate> {
    let partner_team = match raw.partner_team.as_ref().and_then(RawTeam::number) {
        Some(n) => n,
        None if partners.len() == 1 => partners[0].team,
        None => {
            debug!("Trade idea without a partner team");
            return None;
        }
    };
    let partner = partners.iter().find(|p| p.team == partner_team)?;
    if partner.team == mine.team {
        return None;
    }

    let give = resolve_players(raw.give, mine)?;
    let receive = resolve_players(raw.receive, partner)?;
    if give.is_empty() || receive.is_empty() {
        return None;
    }

    Some(TradeCandidate {
        give,
        receive,
        partner_team,
        fairness: raw.fairness.map(|f| f.clamp(0.0, MAX_FAIRNESS)),
        reasoning: raw.reasoning.trim().to_string(),
        source: SuggestionSource::Advisor,
    })
}

/// Every player must be on `roster`; positions come from the roster.
fn resolve_players(raw: Vec<RawPlayer>, roster: &TeamAnalysis) -> Option<Vec<TradePlayer>> {
    raw.into_iter()
        .map(|p| {
            let (name, position) = p.into_parts();
            match roster.find_player(&name) {
                Some(found) => Some(TradePlayer::from_rated(found)),
                None => {
                    debug!(
                        player = %name,
                        claimed_position = ?position,
                        team = roster.team,
                        "advisor named a player not on the roster"
                    );
                    None
                }
            }
        })
        .collect()
}

fn extract_json(reply: &str) -> Option<Value> {
    let trimmed = reply.trim();
    let fenced = fenced_block(trimmed);
    let object = slice_between(trimmed, '{', '}');
    let array = slice_between(trimmed, '[', ']');

    [Some(trimmed), fenced, array, object]
        .into_iter()
        .flatten()
        .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let rest = &text[start + 3..];
    let body_start = rest.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &rest[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn slice_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Merge heuristic candidates with the advisor's, then rank.
///
/// Never fails: an advisor error or unusable reply is logged and the
/// heuristic candidates are ranked alone.
pub fn finish_suggestions(
    mine: &TeamAnalysis,
    partners: &[TeamAnalysis],
    matches: &[PartnerMatch],
    advice: Result<String, AdvisorError>,
) -> Vec<TradeSuggestion> {
    let mut candidates = heuristic_candidates(mine, partners, matches);

    match advice.and_then(|reply| parse_advisor_reply(&reply, mine, partners)) {
        Ok(advised) => {
            debug!("Advisor supplied {} trade ideas", advised.len());
            candidates.extend(advised);
        }
        Err(e) => warn!("Falling back to heuristic trades: {}", e),
    }

    rank_trade_suggestions(candidates, mine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::roster::analyze_team;
    use crate::analysis::tiers::TierList;
    use crate::draft::pick::{Pick, Provenance};
    use crate::trade::compatibility::{find_trade_partners, VIABILITY_THRESHOLD};
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
                overall_pick: team * 100 + i as u32,
                provenance: Provenance::Imported,
                timestamp: Utc::now(),
            })
            .collect();
        analyze_team(team, picks.iter(), &TierList::builtin())
    }

    /// Stacked at QB, nothing at RB.
    fn qb_heavy() -> TeamAnalysis {
        roster(
            1,
            &[
                ("Josh Allen", Position::QB),
                ("Jalen Hurts", Position::QB),
                ("Patrick Mahomes", Position::QB),
                ("Brock Purdy", Position::QB),
            ],
        )
    }

    /// Stacked at RB, nothing at QB.
    fn rb_heavy() -> TeamAnalysis {
        roster(
            2,
            &[
                ("Bijan Robinson", Position::RB),
                ("Jahmyr Gibbs", Position::RB),
                ("Saquon Barkley", Position::RB),
                ("Josh Jacobs", Position::RB),
                ("Kyren Williams", Position::RB),
            ],
        )
    }

    fn players(list: &[(&str, Position)]) -> Vec<TradePlayer> {
        list.iter()
            .map(|(n, p)| TradePlayer {
                name: n.to_string(),
                position: Some(*p),
            })
            .collect()
    }

    fn candidate(
        give: &[(&str, Position)],
        receive: &[(&str, Position)],
        fairness: Option<f64>,
    ) -> TradeCandidate {
        TradeCandidate {
            give: players(give),
            receive: players(receive),
            partner_team: 2,
            fairness,
            reasoning: String::new(),
            source: SuggestionSource::Advisor,
        }
    }

    #[test]
    fn score_adds_need_bonus_and_uneven_penalty() {
        let mine = qb_heavy();
        let rb_priority = mine.need_for(Position::RB).unwrap().priority;

        let even = candidate(&[("Patrick Mahomes", Position::QB)], &[("Josh Jacobs", Position::RB)], Some(6.0));
        assert!((score_candidate(&even, &mine) - (6.0 + 0.1 * rb_priority)).abs() < 1e-9);

        let uneven = candidate(
            &[("Patrick Mahomes", Position::QB), ("Brock Purdy", Position::QB)],
            &[("Josh Jacobs", Position::RB)],
            None,
        );
        assert!((score_candidate(&uneven, &mine) - (5.0 + 0.1 * rb_priority - 1.0)).abs() < 1e-9);

        // Receiving at a position I do not need earns no bonus.
        let no_need = candidate(&[("Brock Purdy", Position::QB)], &[("Jalen Hurts", Position::QB)], None);
        assert_eq!(score_candidate(&no_need, &mine), 5.0);
    }

    #[test]
    fn ranking_keeps_top_five_and_dedups() {
        let mine = qb_heavy();
        let mut candidates = Vec::new();
        for f in 0..8 {
            let giver = format!("Giver {f}");
            candidates.push(candidate(
                &[(giver.as_str(), Position::QB)],
                &[("Josh Jacobs", Position::RB)],
                Some(f as f64),
            ));
        }
        candidates.push(candidate(&[("Giver 7", Position::QB)], &[("josh jacobs", Position::RB)], Some(1.0)));

        let ranked = rank_trade_suggestions(candidates, &mine);
        assert_eq!(ranked.len(), TOP_SUGGESTIONS);
        assert_eq!(ranked[0].give[0].name, "Giver 7");
        assert_eq!(ranked[0].fairness, 7.0);
        assert!(ranked.windows(2).all(|w| w[0].rank_score >= w[1].rank_score));
        assert_eq!(ranked.iter().filter(|s| s.give[0].name == "Giver 7").count(), 1);
    }

    #[test]
    fn heuristics_pair_surplus_with_need() {
        let mine = qb_heavy();
        let partner = rb_heavy();
        let partners = vec![partner];
        let matches = find_trade_partners(&mine, &partners, VIABILITY_THRESHOLD);
        assert_eq!(matches.len(), 1);

        let ideas = heuristic_candidates(&mine, &partners, &matches);
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].partner_team, 2);
        assert_eq!(ideas[0].receive[0].name, "Saquon Barkley");
        assert_eq!(ideas[0].give[0].name, "Jalen Hurts");
        assert_eq!(ideas[0].source, SuggestionSource::Heuristic);
    }

    #[test]
    fn parses_fenced_json_with_prose() {
        let mine = qb_heavy();
        let partners = vec![rb_heavy()];
        let reply = "Here are my ideas:\n```json\n{\"trades\": [{\"give\": [\"Patrick Mahomes\"], \
                     \"receive\": [{\"name\": \"Josh Jacobs\", \"position\": \"RB\"}], \
                     \"partner_team\": \"Team 2\", \"fairness\": 14, \"reasoning\": \"QB for RB\"}]}\n```\nGood luck!";
        let parsed = parse_advisor_reply(reply, &mine, &partners).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].partner_team, 2);
        assert_eq!(parsed[0].fairness, Some(10.0));
        assert_eq!(parsed[0].give[0].position, Some(Position::QB));
        assert_eq!(parsed[0].receive[0].position, Some(Position::RB));
    }

    #[test]
    fn parses_bare_array_and_drops_hallucinations() {
        let mine = qb_heavy();
        let partners = vec![rb_heavy()];
        let reply = r#"[
            {"give": ["Brock Purdy"], "receive": ["Kyren Williams"], "partner": 2, "fairness": 6},
            {"give": ["Lamar Jackson"], "receive": ["Kyren Williams"], "partner": 2},
            {"give": ["Brock Purdy"], "receive": ["Kyren Williams"], "partner": 9},
            "not a trade"
        ]"#;
        let parsed = parse_advisor_reply(reply, &mine, &partners).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].give[0].name, "Brock Purdy");
    }

    #[test]
    fn unusable_replies_are_errors() {
        let mine = qb_heavy();
        let partners = vec![rb_heavy()];
        assert!(parse_advisor_reply("I can't help with that.", &mine, &partners).is_err());
        assert!(parse_advisor_reply("[{\"give\": [\"Nobody\"]}]", &mine, &partners).is_err());
        assert!(parse_advisor_reply("[]", &mine, &partners).unwrap().is_empty());
    }

    #[test]
    fn advisor_failure_degrades_to_heuristics() {
        let mine = qb_heavy();
        let partners = vec![rb_heavy()];
        let matches = find_trade_partners(&mine, &partners, VIABILITY_THRESHOLD);

        let fallback = finish_suggestions(
            &mine,
            &partners,
            &matches,
            Err(AdvisorError::Unavailable("timeout".into())),
        );
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].source, SuggestionSource::Heuristic);

        let garbage = finish_suggestions(&mine, &partners, &matches, Ok("no idea".into()));
        assert_eq!(garbage, fallback);

        let merged = finish_suggestions(
            &mine,
            &partners,
            &matches,
            Ok(r#"[{"give": ["Brock Purdy"], "receive": ["Josh Jacobs"], "partner_team": 2, "fairness": 8}]"#.into()),
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].source, SuggestionSource::Advisor);
    }
}

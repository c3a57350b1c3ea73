// Operations the transport layer drives against an owned ledger.
//
// Every function takes the ledger explicitly; the caller decides how
// ledgers are scoped (one per channel, per league, ...).

use tracing::{info, warn};

use crate::analysis::roster::{analyze_team, TeamAnalysis};
use crate::analysis::tiers::TierList;
use crate::draft::ledger::{DraftLedger, MAX_TEAMS};
use crate::draft::parser::{parse_board, ParseSkip};
use crate::draft::pick::{normalize_nfl_team, Pick, PickDraft, Position, Provenance};
use crate::error::{ImportError, RangeError, ValidationError};
use crate::players::{PlayerValidator, Validation};
use crate::trade::advisor::{AdviceRequest, TradeAdvisor};
use crate::trade::compatibility::{find_trade_partners, PartnerMatch};
use crate::trade::ranker::{finish_suggestions, TradeSuggestion, TOP_SUGGESTIONS};

pub use crate::trade::ranker::rank_trade_suggestions;

/// Failing lines shown verbatim in an import report.
pub const MAX_REPORTED_SKIPS: usize = 3;

fn check_team(team: u32) -> Result<u32, RangeError> {
    RangeError::check("team number", team, 1, MAX_TEAMS)
}

// ---------------------------------------------------------------------------
// Recording picks
// ---------------------------------------------------------------------------

/// Validate `player_name` and append it for `team` (default: my team).
pub fn record_pick(
    ledger: &mut DraftLedger,
    validator: &dyn PlayerValidator,
    player_name: &str,
    team: Option<u32>,
) -> Result<Pick, ValidationError> {
    let draft_team = check_team(team.unwrap_or(ledger.user_team()))?;

    let info = match validator.validate(player_name) {
        Validation::Valid(info) => info,
        Validation::Ambiguous { candidates } => {
            return Err(ValidationError::AmbiguousPlayer {
                input: player_name.trim().to_string(),
                candidates,
            })
        }
        Validation::Unknown { suggestions } => {
            return Err(ValidationError::UnknownPlayer {
                input: player_name.trim().to_string(),
                suggestions,
            })
        }
    };

    Ok(ledger.append_pick(PickDraft {
        player: info.name,
        position: info.position,
        nfl_team: info.nfl_team,
        draft_team,
        source_pick: None,
        provenance: Provenance::Typed,
    }))
}

/// Append a pick without consulting the validator.
///
/// Position must still be a real position and the team in range; the
/// pro-team code is optional.
pub fn force_record_pick(
    ledger: &mut DraftLedger,
    player_name: &str,
    position: &str,
    nfl_team: Option<&str>,
    team: u32,
) -> Result<Pick, ValidationError> {
    let player = player_name.trim();
    if player.is_empty() {
        return Err(ValidationError::MalformedForcePick(
            "player name is empty".into(),
        ));
    }
    let position = Position::from_str_pos(position)
        .ok_or_else(|| ValidationError::InvalidPosition(position.trim().to_string()))?;
    let nfl_team = match nfl_team.map(str::trim).filter(|s| !s.is_empty()) {
        Some(code) => Some(normalize_nfl_team(code).ok_or_else(|| {
            ValidationError::MalformedForcePick(format!("`{}` is not a pro-team code", code))
        })?),
        None => None,
    };
    let draft_team = check_team(team)?;

    warn!("Force-recording '{}' without validation", player);
    Ok(ledger.append_pick(PickDraft {
        player: player.to_string(),
        position,
        nfl_team,
        draft_team,
        source_pick: None,
        provenance: Provenance::Forced,
    }))
}

// ---------------------------------------------------------------------------
// Board import
// ---------------------------------------------------------------------------

/// Outcome of a board import that was not rejected wholesale.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub imported: Vec<Pick>,
    pub skipped: Vec<ParseSkip>,
}

impl ImportReport {
    /// One message per unparsable line.
    pub fn errors(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|s| format!("line {}: {}", s.line_number, s.text))
            .collect()
    }

    /// Bounded error report: up to three lines verbatim, else a count.
    pub fn error_summary(&self) -> Option<String> {
        match self.skipped.len() {
            0 => None,
            n if n <= MAX_REPORTED_SKIPS => Some(format!(
                "Could not parse {} line{}:\n{}",
                n,
                if n == 1 { "" } else { "s" },
                self.errors().join("\n")
            )),
            n => Some(format!("Could not parse {} lines.", n)),
        }
    }
}

/// Parse a pasted board and append every record that parsed.
///
/// Unparsable lines are reported, not fatal. Oversized or empty pastes are
/// rejected before anything touches the ledger.
pub fn import_board(ledger: &mut DraftLedger, text: &str) -> Result<ImportReport, ImportError> {
    let league_size = ledger.league_size();
    let board = parse_board(text, league_size, ledger.resolver_mut())?;
    let imported = ledger.append_batch(board.drafts);
    info!(
        "Imported {} picks ({} lines skipped)",
        imported.len(),
        board.skipped.len()
    );
    Ok(ImportReport {
        imported,
        skipped: board.skipped,
    })
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub fn set_user_team(ledger: &mut DraftLedger, team: u32) -> Result<(), RangeError> {
    ledger.set_user_team(team)
}

pub fn reset_ledger(ledger: &mut DraftLedger) {
    ledger.reset();
}

// ---------------------------------------------------------------------------
// Analysis and trades
// ---------------------------------------------------------------------------

pub fn roster_analysis(ledger: &DraftLedger, team: u32, tiers: &TierList) -> TeamAnalysis {
    analyze_team(team, ledger.picks_for_team(team), tiers)
}

/// Shortlist partners for `my_team` among `all_teams`.
pub fn trade_opportunities(
    ledger: &DraftLedger,
    my_team: u32,
    all_teams: &[u32],
    tiers: &TierList,
    threshold: f64,
) -> Vec<PartnerMatch> {
    let mine = roster_analysis(ledger, my_team, tiers);
    let others: Vec<TeamAnalysis> = all_teams
        .iter()
        .filter(|t| **t != my_team)
        .map(|t| roster_analysis(ledger, *t, tiers))
        .collect();
    find_trade_partners(&mine, &others, threshold)
}

/// Snapshot the analyses an advisor needs for `my_team`.
pub fn prepare_trade_advice(
    ledger: &DraftLedger,
    my_team: u32,
    tiers: &TierList,
    threshold: f64,
) -> AdviceRequest {
    let mine = roster_analysis(ledger, my_team, tiers);
    let others: Vec<TeamAnalysis> = ledger
        .team_ids()
        .into_iter()
        .filter(|t| *t != my_team)
        .map(|t| roster_analysis(ledger, t, tiers))
        .collect();
    let matches = find_trade_partners(&mine, &others, threshold);
    let partners = others
        .into_iter()
        .filter(|a| matches.iter().any(|m| m.partner == a.team))
        .collect();
    AdviceRequest {
        mine,
        partners,
        matches,
        max_suggestions: TOP_SUGGESTIONS,
    }
}

/// Full trade pipeline against a single ledger snapshot. Never fails.
pub async fn suggest_trades(
    ledger: &DraftLedger,
    my_team: u32,
    advisor: &dyn TradeAdvisor,
    tiers: &TierList,
    threshold: f64,
) -> Vec<TradeSuggestion> {
    let request = prepare_trade_advice(ledger, my_team, tiers, threshold);
    if request.matches.is_empty() {
        info!("No viable trade partners for team {}", my_team);
        return Vec::new();
    }
    let advice = advisor.advise(&request).await;
    finish_suggestions(&request.mine, &request.partners, &request.matches, advice)
}

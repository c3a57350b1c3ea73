// Application state and the command loop.
//
// Commands are handled one at a time against the owned ledger. Trade
// analysis is the exception: the advisor call runs as a spawned task and
// its outcome re-enters the loop on `advice_rx`. The ranking is finished
// against whatever the ledger holds when the advice arrives, so picks
// recorded in the meantime show up in the answer.

use std::sync::Arc;

use anyhow::Context;
use draftline_core::analysis::tiers::TierList;
use draftline_core::draft::ledger::{DraftLedger, MAX_TEAMS};
use draftline_core::ops;
use draftline_core::players::{PlayerValidator, StaticPlayerPool};
use draftline_core::trade::advisor::TradeAdvisor;
use draftline_core::trade::ranker::finish_suggestions;
use draftline_core::RangeError;
use draftline_llm::{ClaudeTradeAdvisor, LlmClient};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::commands::{help_text, parse_command, Command};
use crate::config::Config;
use crate::format;
use crate::protocol::{AdviceOutcome, Inbound, Reply};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub config: Config,
    pub ledger: DraftLedger,
    pub players: Arc<dyn PlayerValidator>,
    pub tiers: TierList,
    pub advisor: Arc<dyn TradeAdvisor>,
    advice_tx: mpsc::Sender<AdviceOutcome>,
    next_request_id: u64,
    /// Advisor tasks spawned but not yet finished.
    pending_advice: usize,
}

impl AppState {
    pub fn new(
        config: Config,
        players: Arc<dyn PlayerValidator>,
        tiers: TierList,
        advisor: Arc<dyn TradeAdvisor>,
        advice_tx: mpsc::Sender<AdviceOutcome>,
    ) -> Self {
        let ledger = config.new_ledger();
        AppState {
            config,
            ledger,
            players,
            tiers,
            advisor,
            advice_tx,
            next_request_id: 1,
            pending_advice: 0,
        }
    }

    /// Build the full state from config: CSV overrides and the Claude advisor.
    pub fn from_config(
        config: Config,
        advice_tx: mpsc::Sender<AdviceOutcome>,
    ) -> anyhow::Result<Self> {
        let players = match &config.league.players_csv {
            Some(path) => {
                let path = config.resolve_path(path);
                StaticPlayerPool::from_csv_path(&path)
                    .with_context(|| format!("failed to load player pool {}", path.display()))?
            }
            None => StaticPlayerPool::builtin(),
        };
        info!("Player pool ready ({} players)", players.len());

        let tiers = match &config.league.tiers_csv {
            Some(path) => {
                let path = config.resolve_path(path);
                TierList::from_csv_path(&path)
                    .with_context(|| format!("failed to load tiers {}", path.display()))?
            }
            None => TierList::builtin(),
        };

        let llm = LlmClient::from_settings(
            config.credentials.anthropic_api_key.as_deref(),
            &config.strategy.llm,
        );
        let advisor = ClaudeTradeAdvisor::new(llm, &config.strategy.llm);
        if advisor.is_enabled() {
            info!("Trade advisor enabled (model {})", config.strategy.llm.model);
        } else {
            info!("Trade advisor disabled (no API key); heuristic trades only");
        }

        Ok(Self::new(
            config,
            Arc::new(players),
            tiers,
            Arc::new(advisor),
            advice_tx,
        ))
    }

    pub fn pending_advice(&self) -> usize {
        self.pending_advice
    }

    // -- command handling --

    /// Handle one inbound message. Returns the immediate reply, if any.
    pub fn handle_inbound(&mut self, msg: &Inbound) -> Option<String> {
        let command = match parse_command(&msg.text)? {
            Ok(command) => command,
            Err(e) => return Some(e.to_string()),
        };
        debug!(id = msg.id, ?command, "handling command");
        Some(self.handle_command(msg.id, command))
    }

    fn handle_command(&mut self, msg_id: u64, command: Command) -> String {
        match command {
            Command::Pick { player, team } => self.record(&player, team),
            Command::MyPick { player } => {
                let team = self.ledger.user_team();
                self.record(&player, Some(team))
            }
            Command::ForcePick {
                player,
                position,
                nfl_team,
                team,
            } => match ops::force_record_pick(
                &mut self.ledger,
                &player,
                &position,
                nfl_team.as_deref(),
                team,
            ) {
                Ok(pick) => format::format_pick_recorded(&self.ledger, &pick),
                Err(e) => format!("Could not record pick: {e}"),
            },
            Command::Import { text } => match ops::import_board(&mut self.ledger, &text) {
                Ok(report) => format::format_import(&self.ledger, &report),
                Err(e) => format!("Import rejected: {e}"),
            },
            Command::MyTeam { team } => match ops::set_user_team(&mut self.ledger, team) {
                Ok(()) => format!("You are now {}.", format::team_label(&self.ledger, team)),
                Err(e) => e.to_string(),
            },
            Command::LeagueSize { size } => match self.ledger.set_league_size(size) {
                Ok(()) => format!("League size set to {size}."),
                Err(e) => e.to_string(),
            },
            Command::Reset => {
                let discarded = self.ledger.len();
                ops::reset_ledger(&mut self.ledger);
                format!("Draft reset; {discarded} picks cleared.")
            }
            Command::Board { count } => format::format_board(&self.ledger, count),
            Command::Roster { team } => match self.team_or_mine(team) {
                Ok(team) => {
                    let analysis = ops::roster_analysis(&self.ledger, team, &self.tiers);
                    format::format_roster(&self.ledger, &analysis)
                }
                Err(e) => e.to_string(),
            },
            Command::Trades { team } => match self.team_or_mine(team) {
                Ok(team) => self.start_trades(msg_id, team),
                Err(e) => e.to_string(),
            },
            Command::Aliases => format::format_aliases(&self.ledger),
            Command::Help => help_text().to_string(),
        }
    }

    fn record(&mut self, player: &str, team: Option<u32>) -> String {
        match ops::record_pick(&mut self.ledger, self.players.as_ref(), player, team) {
            Ok(pick) => format::format_pick_recorded(&self.ledger, &pick),
            Err(e) => format!("Could not record pick: {e}"),
        }
    }

    fn team_or_mine(&self, team: Option<u32>) -> Result<u32, RangeError> {
        RangeError::check(
            "team number",
            team.unwrap_or(self.ledger.user_team()),
            1,
            MAX_TEAMS,
        )
    }

    // -- trade analysis --

    /// Snapshot the analyses and spawn the advisor call.
    fn start_trades(&mut self, msg_id: u64, my_team: u32) -> String {
        let threshold = self.config.strategy.trades.viability_threshold;
        let request = ops::prepare_trade_advice(&self.ledger, my_team, &self.tiers, threshold);
        if request.matches.is_empty() {
            return format::format_trades(&self.ledger, my_team, &[], &[]);
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending_advice += 1;

        let partners = request.matches.len();
        let advisor = Arc::clone(&self.advisor);
        let tx = self.advice_tx.clone();
        tokio::spawn(async move {
            let result = advisor.advise(&request).await;
            let outcome = AdviceOutcome {
                request_id,
                in_reply_to: msg_id,
                my_team,
                result,
            };
            if tx.send(outcome).await.is_err() {
                warn!(request_id, "app loop gone before trade advice arrived");
            }
        });

        info!(request_id, my_team, partners, "Trade analysis started");
        format!(
            "Looking at trades with {} partner{}...",
            partners,
            if partners == 1 { "" } else { "s" }
        )
    }

    /// Rank against the current ledger and render the answer.
    pub fn finish_trades(&mut self, outcome: AdviceOutcome) -> String {
        self.pending_advice = self.pending_advice.saturating_sub(1);
        let threshold = self.config.strategy.trades.viability_threshold;
        let current =
            ops::prepare_trade_advice(&self.ledger, outcome.my_team, &self.tiers, threshold);
        let suggestions = finish_suggestions(
            &current.mine,
            &current.partners,
            &current.matches,
            outcome.result,
        );
        info!(
            request_id = outcome.request_id,
            suggestions = suggestions.len(),
            "Trade analysis finished"
        );
        format::format_trades(&self.ledger, outcome.my_team, &current.matches, &suggestions)
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the command loop.
///
/// Listens on two channels using `tokio::select!`:
/// 1. Inbound chat messages from the transport
/// 2. Advisor outcomes from spawned trade-analysis tasks
///
/// When the transport closes, outstanding trade analyses are still answered
/// before the loop exits.
pub async fn run(
    mut inbound_rx: mpsc::Receiver<Inbound>,
    mut advice_rx: mpsc::Receiver<AdviceOutcome>,
    reply_tx: mpsc::Sender<Reply>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Command loop started");
    let mut inbound_open = true;

    while inbound_open || state.pending_advice() > 0 {
        tokio::select! {
            msg = inbound_rx.recv(), if inbound_open => {
                match msg {
                    Some(msg) => {
                        if let Some(text) = state.handle_inbound(&msg) {
                            send_reply(&reply_tx, msg.id, text).await?;
                        }
                    }
                    None => {
                        info!("Inbound channel closed");
                        inbound_open = false;
                    }
                }
            }

            outcome = advice_rx.recv() => {
                // `state` holds a sender, so the channel cannot close here.
                if let Some(outcome) = outcome {
                    let reply_to = outcome.in_reply_to;
                    let text = state.finish_trades(outcome);
                    send_reply(&reply_tx, reply_to, text).await?;
                }
            }
        }
    }

    info!("Command loop exiting");
    Ok(())
}

async fn send_reply(tx: &mpsc::Sender<Reply>, in_reply_to: u64, text: String) -> anyhow::Result<()> {
    tx.send(Reply {
        in_reply_to,
        text: format::clip(&text),
    })
    .await
    .context("reply channel closed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CredentialsConfig, LeagueConfig, StrategyConfig, TradeSettings};
    use draftline_core::trade::advisor::NoAdvisor;
    use draftline_llm::LlmSettings;
    use std::collections::HashMap;

    fn test_config() -> Config {
        Config {
            league: LeagueConfig {
                name: "Test League".into(),
                league_size: 8,
                user_team: 1,
                team_aliases: HashMap::from([("Baron's Best Team".to_string(), 7)]),
                players_csv: None,
                tiers_csv: None,
            },
            strategy: StrategyConfig {
                llm: LlmSettings::default(),
                trades: TradeSettings::default(),
            },
            credentials: CredentialsConfig::default(),
            base_dir: std::env::temp_dir(),
        }
    }

    fn test_state() -> (AppState, mpsc::Receiver<AdviceOutcome>) {
        let (tx, rx) = mpsc::channel(8);
        let state = AppState::new(
            test_config(),
            Arc::new(StaticPlayerPool::builtin()),
            TierList::builtin(),
            Arc::new(NoAdvisor),
            tx,
        );
        (state, rx)
    }

    fn say(state: &mut AppState, text: &str) -> String {
        state
            .handle_inbound(&Inbound {
                id: 1,
                text: text.to_string(),
            })
            .expect("command should reply")
    }

    #[test]
    fn chat_without_prefix_is_ignored() {
        let (mut state, _rx) = test_state();
        assert!(state
            .handle_inbound(&Inbound {
                id: 1,
                text: "nice pick".into()
            })
            .is_none());
    }

    #[test]
    fn mypick_records_for_user_team() {
        let (mut state, _rx) = test_state();
        say(&mut state, "!myteam 3");
        let reply = say(&mut state, "!mypick Puka Nacua");
        assert!(reply.starts_with("Recorded #1 (R1.01) Puka Nacua WR LAR -> Team 3 [you]"));
        assert_eq!(state.ledger.picks()[0].draft_team, 3);
    }

    #[test]
    fn validation_errors_are_replies() {
        let (mut state, _rx) = test_state();
        let reply = say(&mut state, "!pick Puca Nacuaa");
        assert!(reply.contains("did you mean: Puka Nacua"));
        assert!(say(&mut state, "!myteam 13").contains("between 1 and 12"));
        assert!(say(&mut state, "!leaguesize 1").contains("between 2 and 12"));
        assert!(say(&mut state, "!frobnicate").contains("unknown command"));
        assert!(state.ledger.is_empty());
    }

    #[test]
    fn reset_clears_picks() {
        let (mut state, _rx) = test_state();
        say(&mut state, "!pick Josh Allen");
        say(&mut state, "!forcepick Some Rookie, TE, -, 4");
        assert_eq!(say(&mut state, "!reset"), "Draft reset; 2 picks cleared.");
        assert!(state.ledger.is_empty());
    }

    #[tokio::test]
    async fn trades_without_partners_reply_immediately() {
        let (mut state, _rx) = test_state();
        let reply = say(&mut state, "!trades");
        assert!(reply.starts_with("No viable trade partners"));
        assert_eq!(state.pending_advice(), 0);
    }
}

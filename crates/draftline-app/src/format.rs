// Plain-text rendering of ledger state and analyses for chat replies.
//
// Every reply goes through `clip`, which enforces the transport's
// per-message ceiling.

use std::fmt::Write;

use draftline_core::analysis::roster::{NeedKind, StrengthLevel, TeamAnalysis};
use draftline_core::draft::ledger::{round_and_slot, DraftLedger};
use draftline_core::ops::ImportReport;
use draftline_core::trade::compatibility::PartnerMatch;
use draftline_core::trade::ranker::{SuggestionSource, TradePlayer, TradeSuggestion};
use draftline_core::{Pick, Position, Provenance};

/// Hard ceiling on a single reply.
pub const MAX_RESPONSE_CHARS: usize = 2000;

const CLIP_MARKER: &str = "\n…";

/// Truncate `text` to [`MAX_RESPONSE_CHARS`] characters, marking the cut.
pub fn clip(text: &str) -> String {
    if text.chars().count() <= MAX_RESPONSE_CHARS {
        return text.to_string();
    }
    let keep = MAX_RESPONSE_CHARS - CLIP_MARKER.chars().count();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(CLIP_MARKER);
    out
}

/// "Team 3" or "Team 3 (Gridiron Goblins)", with a marker for my team.
pub fn team_label(ledger: &DraftLedger, team: u32) -> String {
    let mut label = match ledger.resolver().display_name(team) {
        Some(name) => format!("Team {} ({})", team, name),
        None => format!("Team {}", team),
    };
    if team == ledger.user_team() {
        label.push_str(" [you]");
    }
    label
}

/// One line for a recorded pick.
pub fn pick_line(ledger: &DraftLedger, pick: &Pick) -> String {
    let rs = round_and_slot(pick.overall_pick, ledger.league_size());
    let nfl = pick
        .nfl_team
        .as_deref()
        .map(|t| format!(" {}", t))
        .unwrap_or_default();
    let forced = if pick.provenance == Provenance::Forced {
        " (forced)"
    } else {
        ""
    };
    format!(
        "#{} (R{}.{:02}) {} {}{} -> {}{}",
        pick.overall_pick,
        rs.round,
        rs.slot,
        pick.player,
        pick.position,
        nfl,
        team_label(ledger, pick.draft_team),
        forced
    )
}

pub fn format_pick_recorded(ledger: &DraftLedger, pick: &Pick) -> String {
    let next = ledger.current_round_and_slot();
    clip(&format!(
        "Recorded {}\nOn the clock: pick #{} (R{}.{:02})",
        pick_line(ledger, pick),
        ledger.next_pick(),
        next.round,
        next.slot
    ))
}

pub fn format_import(ledger: &DraftLedger, report: &ImportReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Imported {} pick{}.",
        report.imported.len(),
        if report.imported.len() == 1 { "" } else { "s" }
    );
    for pick in &report.imported {
        let _ = writeln!(out, "{}", pick_line(ledger, pick));
    }
    if let Some(summary) = report.error_summary() {
        let _ = writeln!(out, "{}", summary);
    }
    clip(out.trim_end())
}

pub fn format_board(ledger: &DraftLedger, count: usize) -> String {
    if ledger.is_empty() {
        return "No picks recorded yet.".to_string();
    }
    let recent = ledger.recent(count);
    let mut out = format!(
        "Last {} of {} picks (league of {}):\n",
        recent.len(),
        ledger.len(),
        ledger.league_size()
    );
    for pick in recent {
        let _ = writeln!(out, "{}", pick_line(ledger, pick));
    }
    clip(out.trim_end())
}

fn level_word(level: StrengthLevel) -> &'static str {
    match level {
        StrengthLevel::Low => "low",
        StrengthLevel::Medium => "ok",
        StrengthLevel::High => "strong",
    }
}

fn need_word(kind: NeedKind) -> &'static str {
    match kind {
        NeedKind::Starter => "starter",
        NeedKind::Upgrade => "upgrade",
        NeedKind::Depth => "depth",
    }
}

pub fn format_roster(ledger: &DraftLedger, analysis: &TeamAnalysis) -> String {
    let mut out = format!(
        "{}: {} players\n",
        team_label(ledger, analysis.team),
        analysis.player_count()
    );
    for pos in Position::ALL {
        let players = analysis
            .by_position
            .get(&pos)
            .map(|bucket| {
                bucket
                    .iter()
                    .map(|p| format!("{} (T{})", p.name, p.tier))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "{} [{}]: {}", pos, level_word(analysis.level(pos)), players);
    }

    if !analysis.needs.is_empty() {
        out.push_str("Needs: ");
        let needs: Vec<String> = analysis
            .needs
            .iter()
            .map(|n| {
                let kinds: Vec<&str> = n.factors.iter().map(|f| need_word(f.kind)).collect();
                format!("{} {:.0} ({})", n.position, n.priority, kinds.join("+"))
            })
            .collect();
        out.push_str(&needs.join(", "));
        out.push('\n');
    }
    for s in &analysis.strengths {
        let _ = writeln!(out, "Strength {}: {}", s.position, s.reason);
    }
    if !analysis.tradeable.is_empty() {
        let names: Vec<&str> = analysis.tradeable.iter().map(|p| p.name.as_str()).collect();
        let _ = writeln!(out, "Tradeable: {}", names.join(", "));
    }
    clip(out.trim_end())
}

fn player_list(players: &[TradePlayer]) -> String {
    players
        .iter()
        .map(|p| match p.position {
            Some(pos) => format!("{} ({})", p.name, pos),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Partner shortlist plus ranked suggestions.
pub fn format_trades(
    ledger: &DraftLedger,
    my_team: u32,
    matches: &[PartnerMatch],
    suggestions: &[TradeSuggestion],
) -> String {
    if matches.is_empty() {
        return format!(
            "No viable trade partners for {} yet.",
            team_label(ledger, my_team)
        );
    }

    let mut out = format!(
        "Trade partners for {} (as of {} picks):\n",
        team_label(ledger, my_team),
        ledger.len()
    );
    for m in matches {
        let _ = writeln!(
            out,
            "- {}: score {:.0}{}",
            team_label(ledger, m.partner),
            m.compatibility.score,
            if m.compatibility.mutual_benefit {
                " (mutual)"
            } else {
                ""
            }
        );
    }

    if suggestions.is_empty() {
        out.push_str("No concrete trades to suggest.");
        return clip(&out);
    }

    out.push_str("Suggestions:\n");
    for (i, s) in suggestions.iter().enumerate() {
        let source = match s.source {
            SuggestionSource::Advisor => "AI",
            SuggestionSource::Heuristic => "fit",
        };
        let _ = writeln!(
            out,
            "{}. Give {} for {} with {} [fair {:.0}/10, score {:.1}, {}]",
            i + 1,
            player_list(&s.give),
            player_list(&s.receive),
            team_label(ledger, s.partner_team),
            s.fairness,
            s.rank_score,
            source
        );
        if !s.reasoning.is_empty() {
            let _ = writeln!(out, "   {}", s.reasoning);
        }
    }
    clip(out.trim_end())
}

pub fn format_aliases(ledger: &DraftLedger) -> String {
    let resolver = ledger.resolver();
    let mut out = String::new();

    let known = resolver.known_aliases();
    if !known.is_empty() {
        out.push_str("Known teams:\n");
        for (name, id) in known {
            let _ = writeln!(out, "- {} -> Team {}", name, id);
        }
    }
    let learned = resolver.learned_aliases();
    if learned.is_empty() {
        out.push_str("No team names learned yet.");
    } else {
        out.push_str("Learned this draft:\n");
        for (name, id) in learned {
            let _ = writeln!(out, "- {} -> Team {}", name, id);
        }
    }
    clip(out.trim_end())
}

// Prompt templates for trade suggestions.
//
// The analyses are pre-computed; the prompt hands the model the numbers and
// asks only for concrete player swaps in a fixed JSON shape, so the reply
// can be parsed and ranked alongside the heuristic ideas.

use std::fmt::Write;

use draftline_core::analysis::roster::{NeedKind, TeamAnalysis};
use draftline_core::trade::advisor::AdviceRequest;
use draftline_core::trade::compatibility::OpportunityKind;

// ---------------------------------------------------------------------------
// System prompt
// ---------------------------------------------------------------------------

/// Static system prompt for trade advice calls.
pub fn system_prompt() -> String {
    "You are a fantasy football trade advisor for a snake-draft league with \
     QB, RB, WR, TE, K and D/ST roster slots.\n\
     \n\
     You receive my team's positional analysis and the analyses of a shortlist \
     of trade partners. Needs carry a 0-100 priority. Surplus players are the \
     ones a team can move without opening a hole.\n\
     \n\
     Propose realistic trades that fill my highest-priority needs with the \
     partner's surplus while giving them something they need. Only use players \
     listed on the relevant roster. Do NOT do arithmetic the numbers already \
     cover; focus on fit and fairness.\n\
     \n\
     Reply with JSON only, no commentary."
        .to_string()
}

// ---------------------------------------------------------------------------
// Trade prompt
// ---------------------------------------------------------------------------

const REPLY_SCHEMA: &str = r#"{
  "trades": [
    {
      "partner_team": 3,
      "give": [{"name": "Player I send", "position": "RB"}],
      "receive": [{"name": "Player I get", "position": "WR"}],
      "fairness": 7,
      "reasoning": "one sentence"
    }
  ]
}"#;

/// Build the user prompt for an [`AdviceRequest`].
pub fn build_trade_prompt(request: &AdviceRequest) -> String {
    let mut prompt = String::with_capacity(2048);

    let _ = writeln!(prompt, "## MY TEAM (Team {})", request.mine.team);
    prompt.push_str(&format_team_for_prompt(&request.mine));
    prompt.push('\n');

    prompt.push_str("## TRADE PARTNERS\n");
    for m in &request.matches {
        let Some(partner) = request.partner(m.partner) else {
            continue;
        };
        let _ = writeln!(
            prompt,
            "### Team {} (compatibility {:.0})",
            partner.team, m.compatibility.score
        );
        for op in &m.compatibility.opportunities {
            let direction = match op.kind {
                OpportunityKind::NeedForStrength => "they can fill my need at",
                OpportunityKind::StrengthForNeed => "I can fill their need at",
            };
            let _ = writeln!(
                prompt,
                "- {} {} (priority {:.0})",
                direction, op.position, op.priority
            );
        }
        prompt.push_str(&format_team_for_prompt(partner));
        prompt.push('\n');
    }

    prompt.push_str("## INSTRUCTIONS\n");
    let _ = writeln!(
        prompt,
        "Suggest up to {} trades. Fairness is 0-10 where 10 is perfectly even. \
         Respond with exactly this JSON shape:",
        request.max_suggestions
    );
    prompt.push_str(REPLY_SCHEMA);
    prompt.push('\n');
    prompt
}

/// Roster, needs and surplus of one team, one line each.
pub fn format_team_for_prompt(team: &TeamAnalysis) -> String {
    let mut out = String::new();

    for (pos, players) in &team.by_position {
        let names = if players.is_empty() {
            "(none)".to_string()
        } else {
            players
                .iter()
                .map(|p| format!("{} [T{}]", p.name, p.tier))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(out, "{}: {}", pos, names);
    }

    if team.needs.is_empty() {
        out.push_str("Needs: none\n");
    } else {
        let needs: Vec<String> = team
            .needs
            .iter()
            .map(|n| {
                let kinds: Vec<&str> = n
                    .factors
                    .iter()
                    .map(|f| match f.kind {
                        NeedKind::Starter => "starter",
                        NeedKind::Upgrade => "upgrade",
                        NeedKind::Depth => "depth",
                    })
                    .collect();
                format!("{} {:.0} ({})", n.position, n.priority, kinds.join("+"))
            })
            .collect();
        let _ = writeln!(out, "Needs: {}", needs.join(", "));
    }

    if team.tradeable.is_empty() {
        out.push_str("Surplus: none\n");
    } else {
        let surplus: Vec<String> = team
            .tradeable
            .iter()
            .map(|p| format!("{} ({})", p.name, p.position))
            .collect();
        let _ = writeln!(out, "Surplus: {}", surplus.join(", "));
    }
    out
}

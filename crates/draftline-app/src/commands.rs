// Chat command parsing.
//
// Commands start with `!` and are case-insensitive. Everything after the
// command word is the argument text; `!import` keeps its line breaks.

use draftline_core::ValidationError;
use thiserror::Error;

/// Picks shown by `!board` when no count is given.
pub const DEFAULT_BOARD_PICKS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `!pick <player> [| team N]`
    Pick { player: String, team: Option<u32> },
    /// `!mypick <player>`
    MyPick { player: String },
    /// `!forcepick <player>, <POS>, <NFL>, <team>`
    ForcePick {
        player: String,
        position: String,
        nfl_team: Option<String>,
        team: u32,
    },
    /// `!import` followed by pasted board lines.
    Import { text: String },
    MyTeam { team: u32 },
    LeagueSize { size: u32 },
    Reset,
    Board { count: usize },
    Roster { team: Option<u32> },
    Trades { team: Option<u32> },
    Aliases,
    Help,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown command `!{0}`; try !help")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

const PICK_USAGE: &str = "!pick <player> [| team N]";
const MYPICK_USAGE: &str = "!mypick <player>";
const FORCEPICK_USAGE: &str = "!forcepick <player>, <POS>, <NFL team or ->, <team number>";
const MYTEAM_USAGE: &str = "!myteam <team number>";
const LEAGUESIZE_USAGE: &str = "!leaguesize <teams>";
const BOARD_USAGE: &str = "!board [number of picks]";
const ROSTER_USAGE: &str = "!roster [team number]";
const TRADES_USAGE: &str = "!trades [team number]";

/// Parse one chat message.
///
/// Returns `None` for messages that are not commands at all.
pub fn parse_command(message: &str) -> Option<Result<Command, CommandError>> {
    let trimmed = message.trim_start();
    let body = trimmed.strip_prefix('!')?;

    let (word, rest) = match body.find(char::is_whitespace) {
        Some(idx) => (&body[..idx], &body[idx..]),
        None => (body, ""),
    };
    if word.is_empty() {
        return None;
    }
    let args = rest.trim();

    Some(match word.to_ascii_lowercase().as_str() {
        "pick" => parse_pick(args),
        "mypick" => required(args, MYPICK_USAGE).map(|player| Command::MyPick { player }),
        "forcepick" => parse_force_pick(args),
        "import" => Ok(Command::Import {
            text: rest.trim_matches(|c: char| c == ' ' || c == '\t').to_string(),
        }),
        "myteam" => number(args, MYTEAM_USAGE).map(|team| Command::MyTeam { team }),
        "leaguesize" => number(args, LEAGUESIZE_USAGE).map(|size| Command::LeagueSize { size }),
        "reset" => Ok(Command::Reset),
        "board" => optional_number(args, BOARD_USAGE).map(|n| Command::Board {
            count: n.map_or(DEFAULT_BOARD_PICKS, |n| n as usize),
        }),
        "roster" => optional_team(args, ROSTER_USAGE).map(|team| Command::Roster { team }),
        "trades" => optional_team(args, TRADES_USAGE).map(|team| Command::Trades { team }),
        "aliases" => Ok(Command::Aliases),
        "help" => Ok(Command::Help),
        other => Err(CommandError::Unknown(other.to_string())),
    })
}

fn parse_pick(args: &str) -> Result<Command, CommandError> {
    let (player, team) = match args.split_once('|') {
        Some((player, team)) => (player.trim(), Some(team_number(team, PICK_USAGE)?)),
        None => (args, None),
    };
    if player.is_empty() {
        return Err(CommandError::Usage(PICK_USAGE));
    }
    Ok(Command::Pick {
        player: player.to_string(),
        team,
    })
}

fn parse_force_pick(args: &str) -> Result<Command, CommandError> {
    if args.is_empty() {
        return Err(CommandError::Usage(FORCEPICK_USAGE));
    }
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let [player, position, nfl_team, team] = parts.as_slice() else {
        return Err(ValidationError::MalformedForcePick(format!(
            "expected 4 comma-separated fields, got {} ({})",
            parts.len(),
            FORCEPICK_USAGE
        ))
        .into());
    };
    let team = team_number(team, FORCEPICK_USAGE).map_err(|_| {
        ValidationError::MalformedForcePick(format!("`{}` is not a team number", team))
    })?;
    let nfl_team = match *nfl_team {
        "" | "-" => None,
        code => Some(code.to_string()),
    };
    Ok(Command::ForcePick {
        player: player.to_string(),
        position: position.to_string(),
        nfl_team,
        team,
    })
}

fn required(args: &str, usage: &'static str) -> Result<String, CommandError> {
    if args.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(args.to_string())
    }
}

fn number(args: &str, usage: &'static str) -> Result<u32, CommandError> {
    args.parse().map_err(|_| CommandError::Usage(usage))
}

fn optional_number(args: &str, usage: &'static str) -> Result<Option<u32>, CommandError> {
    if args.is_empty() {
        Ok(None)
    } else {
        number(args, usage).map(Some)
    }
}

fn optional_team(args: &str, usage: &'static str) -> Result<Option<u32>, CommandError> {
    if args.is_empty() {
        Ok(None)
    } else {
        team_number(args, usage).map(Some)
    }
}

/// `N`, `team N` or `Team #N`.
fn team_number(text: &str, usage: &'static str) -> Result<u32, CommandError> {
    let text = text.trim();
    let digits = text
        .strip_prefix("team")
        .or_else(|| text.strip_prefix("Team"))
        .or_else(|| text.strip_prefix("TEAM"))
        .unwrap_or(text)
        .trim()
        .trim_start_matches('#')
        .trim();
    digits.parse().map_err(|_| CommandError::Usage(usage))
}

pub fn help_text() -> &'static str {
    "Commands:\n\
     !pick <player> [| team N]  record a pick (default: your team)\n\
     !mypick <player>  record a pick for your team\n\
     !forcepick <player>, <POS>, <NFL>, <team>  record without name check\n\
     !import <pasted board>  import up to 20 lines of draft board\n\
     !myteam <N>  set your team number (1-12)\n\
     !leaguesize <N>  set league size (2-12)\n\
     !reset  clear all picks\n\
     !board [n]  show the last n picks\n\
     !roster [N]  roster needs and strengths\n\
     !trades [N]  trade partners and suggestions\n\
     !aliases  team name mappings\n\
     !help  this message"
}

// Draft-board text parsing.
//
// A pasted board is scanned line by line. At each line the format strategies
// are tried in priority order and the first structurally valid match wins,
// consuming its look-ahead lines. Lines nothing matches are collected as
// skips and scanning continues, so one bad line never sinks the batch.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::identity::TeamResolver;
use super::ledger::overall_from_round_slot;
use super::pick::{normalize_nfl_team, PickDraft, Position, Provenance};
use crate::error::ImportError;

/// Largest paste accepted by a single import (non-blank lines).
pub const MAX_IMPORT_LINES: usize = 20;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

const POS: &str = r"(QB|RB|WR|TE|K|D/ST|DST|DEF)";

// "Bijan Robinson / Atl RB" (the space before the position is optional)
static RE_SLASH_PLAYER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^(.+?)\s*/\s*([a-z]{{2,4}})\s*{POS}$")).expect("slash player regex")
});

// "R1, P2 - Baron's Best Team"
static RE_PICK_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^R\s*(\d+)\s*,\s*P\s*(\d+)\s*[-\u{2013}\u{2014}]\s*(.+)$").expect("pick info regex")
});

// "12. Ja'Marr Chase (WR, CIN) - Team 3"
static RE_NUMBERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(\d+)\s*[.)]\s*(.+?)\s*\(\s*{POS}\s*,\s*([a-z]{{2,4}})\s*\)\s*[-\u{{2013}}\u{{2014}}]\s*(.+)$"
    ))
    .expect("numbered regex")
});

// "Ja'Marr Chase WR CIN - Team 3"
static RE_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(.+?)\s+{POS}\s+([a-z]{{2,4}})\s*[-\u{{2013}}\u{{2014}}]\s*(.+)$"
    ))
    .expect("inline regex")
});

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// One record as read from the text, before team resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub player: String,
    pub position: Position,
    pub nfl_team: Option<String>,
    /// Team name exactly as written (may be "Team N").
    pub team: String,
    pub source_pick: Option<u32>,
}

/// The supported board formats, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `<Player> / <ProTeam><POS>` followed by `R<round>, P<pick> - <Team>`.
    SlashRoundPick,
    /// `<N>. <Player> (<POS>, <ProTeam>) - <Team>`.
    NumberedList,
    /// `<Player> <POS> <ProTeam> - <Team>`.
    SimpleInline,
    /// Four lines: player, pro team, position, drafting team.
    FourLine,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::SlashRoundPick,
        Strategy::NumberedList,
        Strategy::SimpleInline,
        Strategy::FourLine,
    ];

    /// Try this strategy on the window starting at `lines[0]`.
    ///
    /// Returns the record and how many lines it consumed.
    pub fn try_parse(&self, lines: &[&str], league_size: u32) -> Option<(RawRecord, usize)> {
        match self {
            Strategy::SlashRoundPick => parse_slash_round_pick(lines, league_size).map(|r| (r, 2)),
            Strategy::NumberedList => lines.first().and_then(|l| parse_numbered(l)).map(|r| (r, 1)),
            Strategy::SimpleInline => lines.first().and_then(|l| parse_inline(l)).map(|r| (r, 1)),
            Strategy::FourLine => parse_four_line(lines).map(|r| (r, 4)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::SlashRoundPick => "slash/round-pick",
            Strategy::NumberedList => "numbered list",
            Strategy::SimpleInline => "inline",
            Strategy::FourLine => "four-line",
        }
    }
}

fn parse_slash_round_pick(lines: &[&str], league_size: u32) -> Option<RawRecord> {
    let first = RE_SLASH_PLAYER.captures(lines.first()?)?;
    let info = RE_PICK_INFO.captures(lines.get(1)?)?;

    let position = Position::from_str_pos(&first[3])?;
    let round: u32 = info[1].parse().ok().filter(|&r| r >= 1)?;
    let pick_in_round: u32 = info[2].parse().ok().filter(|&p| p >= 1)?;
    let source_pick = overall_from_round_slot(round, pick_in_round, league_size)?;
    if pick_in_round > league_size {
        warn!(
            round,
            pick_in_round, league_size, "pick-in-round exceeds league size"
        );
    }

    Some(RawRecord {
        player: first[1].trim().to_string(),
        position,
        nfl_team: normalize_nfl_team(&first[2]),
        team: info[3].trim().to_string(),
        source_pick: Some(source_pick),
    })
}

fn parse_numbered(line: &str) -> Option<RawRecord> {
    let caps = RE_NUMBERED.captures(line)?;
    let pick: u32 = caps[1].parse().ok().filter(|&n| n >= 1)?;
    Some(RawRecord {
        player: caps[2].trim().to_string(),
        position: Position::from_str_pos(&caps[3])?,
        nfl_team: normalize_nfl_team(&caps[4]),
        team: caps[5].trim().to_string(),
        source_pick: Some(pick),
    })
}

fn parse_inline(line: &str) -> Option<RawRecord> {
    let caps = RE_INLINE.captures(line)?;
    Some(RawRecord {
        player: caps[1].trim().to_string(),
        position: Position::from_str_pos(&caps[2])?,
        nfl_team: normalize_nfl_team(&caps[3]),
        team: caps[4].trim().to_string(),
        source_pick: None,
    })
}

fn parse_four_line(lines: &[&str]) -> Option<RawRecord> {
    let [player, nfl_team, position, team] = lines.get(..4)? else {
        return None;
    };
    // The position line is the gate: without a real position code the group
    // is almost certainly unrelated text.
    let position = Position::from_str_pos(position)?;
    let nfl_team = normalize_nfl_team(nfl_team)?;
    if player.trim().is_empty() || team.trim().is_empty() || is_continuation(player) {
        return None;
    }
    Some(RawRecord {
        player: player.trim().to_string(),
        position,
        nfl_team: Some(nfl_team),
        team: team.trim().to_string(),
        source_pick: None,
    })
}

/// Lines that belong to a record but are meaningless alone: an orphaned
/// `R#, P# - ...` line or a bare position token.
fn is_continuation(line: &str) -> bool {
    RE_PICK_INFO.is_match(line) || Position::from_str_pos(line).is_some()
}

// ---------------------------------------------------------------------------
// Board parsing
// ---------------------------------------------------------------------------

/// A line no strategy could read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSkip {
    /// 1-based line number among the non-blank lines of the paste.
    pub line_number: usize,
    pub text: String,
}

/// The result of parsing one pasted board.
#[derive(Debug, Clone, Default)]
pub struct ParsedBoard {
    pub drafts: Vec<PickDraft>,
    pub skipped: Vec<ParseSkip>,
}

/// Count the lines that matter for the batch-size guard.
pub fn count_board_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}

/// Parse a pasted draft board into pick drafts.
///
/// Team names are resolved through `resolver` only for records that parsed,
/// so garbage lines never mint team ids. Fails only when the paste is empty
/// or exceeds [`MAX_IMPORT_LINES`].
pub fn parse_board(
    text: &str,
    league_size: u32,
    resolver: &mut TeamResolver,
) -> Result<ParsedBoard, ImportError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(ImportError::Empty);
    }
    if lines.len() > MAX_IMPORT_LINES {
        return Err(ImportError::BatchTooLarge {
            lines: lines.len(),
            limit: MAX_IMPORT_LINES,
        });
    }

    let mut board = ParsedBoard::default();
    let mut i = 0;

    while i < lines.len() {
        let window = &lines[i..];
        let matched = Strategy::ALL
            .iter()
            .find_map(|s| s.try_parse(window, league_size).map(|hit| (*s, hit)));

        match matched {
            Some((strategy, (record, consumed))) => {
                debug!(line = i + 1, strategy = strategy.label(), player = %record.player, "parsed pick");
                let draft_team = resolver.resolve(&record.team);
                board.drafts.push(PickDraft {
                    player: record.player,
                    position: record.position,
                    nfl_team: record.nfl_team,
                    draft_team,
                    source_pick: record.source_pick,
                    provenance: Provenance::Imported,
                });
                i += consumed;
            }
            None if is_continuation(lines[i]) => {
                debug!(line = i + 1, text = lines[i], "skipping orphaned continuation line");
                i += 1;
            }
            None => {
                debug!(line = i + 1, text = lines[i], "unparsable line");
                board.skipped.push(ParseSkip {
                    line_number: i + 1,
                    text: lines[i].to_string(),
                });
                i += 1;
            }
        }
    }

    Ok(board)
}

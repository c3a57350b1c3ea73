// Roster composition analysis: tiers and positional needs/strengths.

pub mod roster;
pub mod tiers;

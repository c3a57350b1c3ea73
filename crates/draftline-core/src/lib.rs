// Library root for the draft ledger and trade-compatibility engine.
//
// Everything here is synchronous, in-process state and arithmetic. The only
// async surface is the `TradeAdvisor` seam, which the LLM crate implements.

pub mod analysis;
pub mod draft;
pub mod error;
pub mod ops;
pub mod players;
pub mod trade;

pub use draft::ledger::DraftLedger;
pub use draft::pick::{Pick, PickDraft, Position, Provenance};
pub use error::{ImportError, RangeError, ValidationError};

// Draft bookkeeping: picks, team identities, board parsing and the ledger.

pub mod identity;
pub mod ledger;
pub mod parser;
pub mod pick;

// Trade matching: pairwise compatibility, narrative advice and ranking.

pub mod advisor;
pub mod compatibility;
pub mod ranker;

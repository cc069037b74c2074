pub mod pip;
pub mod scores;

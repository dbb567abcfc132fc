pub mod assemble;
pub mod cache;
pub mod config;
pub mod error;
pub mod gene;
pub mod geneset;
pub mod homology;
pub mod identifier;
pub mod lookup;
pub mod mygene;
pub mod output;
pub mod species;

pub mod caches;
pub mod masking;
pub mod peek;
pub mod scenarios;

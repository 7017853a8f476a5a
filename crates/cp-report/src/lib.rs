//! `cp-report` — post-solve accounting and output files.
//!
//! [`usage`] materializes the final route per covered pair and rolls up
//! per-station demand and charged energy; [`output`] writes the three
//! output CSVs (`od_coverage.csv`, `stations.csv`, `unknown_sites.csv`).

pub mod output;
pub mod usage;

#[cfg(test)]
mod tests;

pub use output::write_outputs;
pub use usage::calc_station_stats;

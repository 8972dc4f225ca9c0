//! End-to-end detection tests.

mod cli;
mod probe;
mod props;

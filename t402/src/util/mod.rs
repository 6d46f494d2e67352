//! Small shared utilities used across the x402 crates.

mod lit_str;

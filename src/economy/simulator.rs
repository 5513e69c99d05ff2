//! Balance simulator over the embedded table.
//! Run with: cargo test simulate_greedy -- --nocapture

//! Integration tests for Scrape-Relay
//!
//! The extraction service is played by a wiremock server; renderers use
//! tools that are guaranteed to be missing so the terminal step is exercised.

mod config_tests;
mod relay_tests;
mod render_tests;

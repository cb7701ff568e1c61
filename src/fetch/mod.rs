// src/fetch/mod.rs
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

pub mod zips;

/// Build the HTTP client used for the dataset download.
pub fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("building HTTP client")
}

use std::{fs, path::Path, str::FromStr, time::Duration};

use alloy_primitives::Address;
use anyhow::{Context, Result};
use registry_core::rpc::{ReceiptPolling, TxOptions};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rpc_url: String,
    pub contract_address: Option<String>,
    pub signer_address: Option<String>,
    pub request_accounts: bool,
    pub chain_id: Option<u64>,
    pub gas_limit: Option<u64>,
    pub gas_price_wei: Option<u128>,
    pub fetch_concurrency: usize,
    pub receipt_poll_ms: u64,
    pub receipt_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            contract_address: None,
            signer_address: None,
            request_accounts: true,
            chain_id: None,
            gas_limit: None,
            gas_price_wei: None,
            fetch_concurrency: 1,
            receipt_poll_ms: 1_000,
            receipt_timeout_secs: 120,
        }
    }
}

impl Settings {
    pub fn rpc_url(&self) -> Result<Url> {
        Url::parse(&self.rpc_url).with_context(|| format!("invalid rpc url '{}'", self.rpc_url))
    }

    pub fn contract(&self) -> Result<Option<Address>> {
        parse_address(self.contract_address.as_deref(), "contract address")
    }

    pub fn signer(&self) -> Result<Option<Address>> {
        parse_address(self.signer_address.as_deref(), "signer address")
    }

    pub fn tx_options(&self) -> TxOptions {
        TxOptions {
            chain_id: self.chain_id,
            gas_limit: self.gas_limit,
            gas_price_wei: self.gas_price_wei,
        }
    }

    pub fn receipt_polling(&self) -> ReceiptPolling {
        ReceiptPolling {
            interval: Duration::from_millis(self.receipt_poll_ms.max(1)),
            timeout: Duration::from_secs(self.receipt_timeout_secs),
        }
    }
}

fn parse_address(raw: Option<&str>, what: &str) -> Result<Option<Address>> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Address::from_str(raw)
            .map(Some)
            .with_context(|| format!("invalid {what} '{raw}'")),
        None => Ok(None),
    }
}

/// File values first, then the process environment on top.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<Settings>(&raw)
            .with_context(|| format!("failed to parse '{}'", path.display()))?,
        Err(_) => Settings::default(),
    };
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |keys: &[&str]| keys.iter().rev().find_map(|key| lookup(key));

    if let Some(v) = var(&["RPC_URL", "APP__RPC_URL"]) {
        settings.rpc_url = v;
    }
    if let Some(v) = var(&["CONTRACT_ADDRESS", "APP__CONTRACT_ADDRESS"]) {
        settings.contract_address = Some(v);
    }
    if let Some(v) = var(&["APP__SIGNER_ADDRESS"]) {
        settings.signer_address = Some(v);
    }
    if let Some(v) = var(&["APP__REQUEST_ACCOUNTS"]).and_then(|v| v.parse().ok()) {
        settings.request_accounts = v;
    }
    if let Some(v) = var(&["APP__CHAIN_ID"]).and_then(|v| v.parse().ok()) {
        settings.chain_id = Some(v);
    }
    if let Some(v) = var(&["APP__GAS_LIMIT"]).and_then(|v| v.parse().ok()) {
        settings.gas_limit = Some(v);
    }
    if let Some(v) = var(&["APP__GAS_PRICE_WEI"]).and_then(|v| v.parse().ok()) {
        settings.gas_price_wei = Some(v);
    }
    if let Some(v) = var(&["APP__FETCH_CONCURRENCY"]).and_then(|v| v.parse().ok()) {
        settings.fetch_concurrency = v;
    }
    if let Some(v) = var(&["APP__RECEIPT_POLL_MS"]).and_then(|v| v.parse().ok()) {
        settings.receipt_poll_ms = v;
    }
    if let Some(v) = var(&["APP__RECEIPT_TIMEOUT_SECS"]).and_then(|v| v.parse().ok()) {
        settings.receipt_timeout_secs = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

use std::{fmt, str::FromStr};

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One entry of the on-chain forward swap registry, as exposed by its read view.
///
/// Margins are consumed by the contract on creation and never read back, so they
/// only exist on [`ContractDraft`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub party_a: Address,
    pub party_b: Address,
    pub eth_notional: U256,
    pub usdc_notional: U256,
    pub eth_rate: U256,
    pub usdc_rate: U256,
    pub payment_interval: U256,
    pub total_duration: U256,
}

impl ContractRecord {
    pub fn class(&self) -> RecordClass {
        RecordClass::of(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordClass {
    /// Both notionals are strictly positive.
    Bilateral,
    Other,
}

impl RecordClass {
    pub fn of(record: &ContractRecord) -> Self {
        if record.eth_notional > U256::ZERO && record.usdc_notional > U256::ZERO {
            Self::Bilateral
        } else {
            Self::Other
        }
    }
}

/// A record together with its position in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedRecord {
    pub index: u64,
    #[serde(flatten)]
    pub record: ContractRecord,
}

/// The two presentation buckets produced by one registry refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub bilateral: Vec<IndexedRecord>,
    pub other: Vec<IndexedRecord>,
}

impl RegistrySnapshot {
    /// Partitions records by [`RecordClass`], keeping the input order inside each bucket.
    pub fn classify(records: impl IntoIterator<Item = IndexedRecord>) -> Self {
        let mut snapshot = Self::default();
        for entry in records {
            match entry.record.class() {
                RecordClass::Bilateral => snapshot.bilateral.push(entry),
                RecordClass::Other => snapshot.other.push(entry),
            }
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.bilateral.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bilateral.is_empty() && self.other.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    PartyA,
    PartyB,
    EthNotional,
    UsdcNotional,
    EthRate,
    UsdcRate,
    PaymentInterval,
    TotalDuration,
    EthMargin,
    UsdcMargin,
}

impl DraftField {
    pub fn name(self) -> &'static str {
        match self {
            Self::PartyA => "partyA",
            Self::PartyB => "partyB",
            Self::EthNotional => "ethNotional",
            Self::UsdcNotional => "usdcNotional",
            Self::EthRate => "ethRate",
            Self::UsdcRate => "usdcRate",
            Self::PaymentInterval => "paymentInterval",
            Self::TotalDuration => "totalDuration",
            Self::EthMargin => "ethMargin",
            Self::UsdcMargin => "usdcMargin",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw form input, one string per field, exactly as the user typed it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftForm {
    pub party_a: String,
    pub party_b: String,
    pub eth_notional: String,
    pub usdc_notional: String,
    pub eth_rate: String,
    pub usdc_rate: String,
    pub payment_interval: String,
    pub total_duration: String,
    pub eth_margin: String,
    pub usdc_margin: String,
}

/// A validated contract-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDraft {
    pub party_a: Address,
    pub party_b: Address,
    pub eth_notional: U256,
    pub usdc_notional: U256,
    pub eth_rate: U256,
    pub usdc_rate: U256,
    pub payment_interval: U256,
    pub total_duration: U256,
    pub eth_margin: U256,
    pub usdc_margin: U256,
}

impl ContractDraft {
    pub fn try_from_form(form: &DraftForm) -> Result<Self, ValidationError> {
        let draft = Self {
            party_a: parse_party(DraftField::PartyA, &form.party_a)?,
            party_b: parse_party(DraftField::PartyB, &form.party_b)?,
            eth_notional: parse_amount(DraftField::EthNotional, &form.eth_notional)?,
            usdc_notional: parse_amount(DraftField::UsdcNotional, &form.usdc_notional)?,
            eth_rate: parse_amount(DraftField::EthRate, &form.eth_rate)?,
            usdc_rate: parse_amount(DraftField::UsdcRate, &form.usdc_rate)?,
            payment_interval: parse_amount(DraftField::PaymentInterval, &form.payment_interval)?,
            total_duration: parse_amount(DraftField::TotalDuration, &form.total_duration)?,
            eth_margin: parse_amount(DraftField::EthMargin, &form.eth_margin)?,
            usdc_margin: parse_amount(DraftField::UsdcMargin, &form.usdc_margin)?,
        };

        for (field, value) in [
            (DraftField::PaymentInterval, draft.payment_interval),
            (DraftField::TotalDuration, draft.total_duration),
        ] {
            if value.is_zero() {
                return Err(ValidationError::NotPositive { field });
            }
        }

        Ok(draft)
    }
}

impl TryFrom<&DraftForm> for ContractDraft {
    type Error = ValidationError;

    fn try_from(form: &DraftForm) -> Result<Self, Self::Error> {
        Self::try_from_form(form)
    }
}

fn parse_party(field: DraftField, raw: &str) -> Result<Address, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    Address::from_str(raw).map_err(|_| ValidationError::InvalidAddress {
        field,
        value: raw.to_string(),
    })
}

fn parse_amount(field: DraftField, raw: &str) -> Result<U256, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    if raw.starts_with('-') {
        return Err(ValidationError::Negative { field });
    }

    let (digits, radix) = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (raw, 10),
    };
    let well_formed = !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix as u32));
    if !well_formed {
        return Err(ValidationError::NotNumeric {
            field,
            value: raw.to_string(),
        });
    }

    U256::from_str_radix(digits, radix).map_err(|_| ValidationError::NotNumeric {
        field,
        value: raw.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: B256,
}

/// Inclusion acknowledgement for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;

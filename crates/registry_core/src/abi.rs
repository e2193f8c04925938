//! Call encoding for the forward swap registry contract.

use alloy_primitives::{keccak256, U256};
use alloy_sol_types::{sol, SolCall, SolValue};
use shared::domain::{ContractDraft, ContractRecord};

sol! {
    interface IForwardSwap {
        function totalContracts() external view returns (uint256);

        function contracts(uint256 index) external view returns (
            address partyA,
            address partyB,
            uint256 ethNotional,
            uint256 usdcNotional,
            uint256 ethRate,
            uint256 usdcRate,
            uint256 paymentInterval,
            uint256 totalDuration
        );

        function createContract(
            address partyA,
            address partyB,
            uint256 ethNotional,
            uint256 usdcNotional,
            uint256 ethRate,
            uint256 usdcRate,
            uint256 paymentInterval,
            uint256 totalDuration,
            uint256 ethMargin,
            uint256 usdcMargin
        ) external;
    }
}

pub fn total_contracts_calldata() -> Vec<u8> {
    IForwardSwap::totalContractsCall {}.abi_encode()
}

pub fn contract_at_calldata(index: u64) -> Vec<u8> {
    IForwardSwap::contractsCall {
        index: U256::from(index),
    }
    .abi_encode()
}

/// Arguments go out in the contract's fixed order: parties, notionals, rates,
/// interval, duration, margins.
pub fn create_contract_calldata(draft: &ContractDraft) -> Vec<u8> {
    IForwardSwap::createContractCall {
        partyA: draft.party_a,
        partyB: draft.party_b,
        ethNotional: draft.eth_notional,
        usdcNotional: draft.usdc_notional,
        ethRate: draft.eth_rate,
        usdcRate: draft.usdc_rate,
        paymentInterval: draft.payment_interval,
        totalDuration: draft.total_duration,
        ethMargin: draft.eth_margin,
        usdcMargin: draft.usdc_margin,
    }
    .abi_encode()
}

/// Calldata for any zero-argument view function.
pub fn view_calldata(function_name: &str) -> Vec<u8> {
    keccak256(format!("{function_name}()"))[..4].to_vec()
}

pub fn decode_uint(data: &[u8]) -> Result<U256, alloy_sol_types::Error> {
    U256::abi_decode(data)
}

pub fn decode_record(data: &[u8]) -> Result<ContractRecord, alloy_sol_types::Error> {
    let ret = IForwardSwap::contractsCall::abi_decode_returns(data)?;
    Ok(ContractRecord {
        party_a: ret.partyA,
        party_b: ret.partyB,
        eth_notional: ret.ethNotional,
        usdc_notional: ret.usdcNotional,
        eth_rate: ret.ethRate,
        usdc_rate: ret.usdcRate,
        payment_interval: ret.paymentInterval,
        total_duration: ret.totalDuration,
    })
}

/// Inverse of [`decode_record`], as a node would answer `contracts(i)`.
pub fn encode_record(record: &ContractRecord) -> Vec<u8> {
    (
        record.party_a,
        record.party_b,
        record.eth_notional,
        record.usdc_notional,
        record.eth_rate,
        record.usdc_rate,
        record.payment_interval,
        record.total_duration,
    )
        .abi_encode()
}

#[cfg(test)]
#[path = "tests/abi_tests.rs"]
mod tests;

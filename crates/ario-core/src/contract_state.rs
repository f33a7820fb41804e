//! Typed view of the ar.io registry contract state.
//!
//! These types validate the cache's JSON snapshot at the provider boundary.
//! Field names follow the contract's camelCase wire names; maps are keyed
//! the way the contract keys them (wallet address, ArNS name, epoch start
//! height).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet address as stored in the contract (not validated: unknown
/// addresses are looked up, not rejected).
pub type WalletAddress = String;

/// Full registry state at one evaluation point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryState {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub balances: BTreeMap<WalletAddress, u64>,
    #[serde(default)]
    pub gateways: BTreeMap<WalletAddress, Gateway>,
    #[serde(default)]
    pub records: BTreeMap<String, ArNSRecord>,
    #[serde(default)]
    pub auctions: BTreeMap<String, Auction>,
    #[serde(default)]
    pub reserved: BTreeMap<String, ReservedName>,
    #[serde(default)]
    pub fees: BTreeMap<String, u64>,
    #[serde(default)]
    pub last_ticked_height: u64,
    /// Observations keyed by epoch start height.
    #[serde(default)]
    pub observations: BTreeMap<u64, EpochObservations>,
    pub distributions: EpochDistributions,
    /// Prescribed observers keyed by epoch start height.
    #[serde(default)]
    pub prescribed_observers: BTreeMap<u64, Vec<WeightedObserver>>,
}

// ---------------------------------------------------------------------------
// Gateways
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Joined,
    Leaving,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySettings {
    pub label: String,
    pub fqdn: String,
    pub port: u16,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayStats {
    pub passed_epoch_count: u64,
    pub failed_consecutive_epochs: u64,
    pub submitted_epoch_count: u64,
    pub total_epoch_participation_count: u64,
    pub total_epochs_prescribed_count: u64,
}

/// Locked stake withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultData {
    pub balance: u64,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub operator_stake: u64,
    pub observer_wallet: WalletAddress,
    pub settings: GatewaySettings,
    pub status: GatewayStatus,
    /// Block height the gateway joined at.
    pub start: u64,
    /// Block height the gateway leaves at; 0 while joined.
    #[serde(default)]
    pub end: u64,
    #[serde(default)]
    pub stats: GatewayStats,
    #[serde(default)]
    pub vaults: BTreeMap<WalletAddress, VaultData>,
}

// ---------------------------------------------------------------------------
// ArNS records, reserved names, auctions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    Lease,
    Permabuy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArNSRecord {
    /// ANT contract the name resolves through.
    pub contract_tx_id: String,
    /// Unix seconds.
    pub start_timestamp: i64,
    /// Unix seconds; absent for permabuys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<i64>,
    #[serde(rename = "type")]
    pub registration_type: RegistrationType,
    pub undernames: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<u64>,
}

impl ArNSRecord {
    /// When a lease runs out. `None` for permabuys.
    pub fn lease_expiry(&self) -> Option<DateTime<Utc>> {
        self.end_timestamp
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    }

    /// Whether the lease has run out at `now`. Permabuys never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.lease_expiry().map(|expiry| expiry <= now).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<WalletAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSettings {
    pub duration_blocks: u64,
    pub decay_rate: f64,
    pub scaling_exponent: f64,
    pub start_price_multiplier: f64,
    pub floor_price_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub start_price: f64,
    pub floor_price: f64,
    pub start_height: u64,
    pub end_height: u64,
    #[serde(rename = "type")]
    pub registration_type: RegistrationType,
    pub initiator: WalletAddress,
    pub contract_tx_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
    pub settings: AuctionSettings,
}

// ---------------------------------------------------------------------------
// Epochs, observations, distributions
// ---------------------------------------------------------------------------

/// The contract's distribution bookkeeping; also carries the epoch schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochDistributions {
    pub epoch_zero_start_height: u64,
    pub epoch_start_height: u64,
    pub epoch_end_height: u64,
    pub epoch_period: u64,
    pub next_distribution_height: u64,
    /// Blocks per epoch; the contract's default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch_block_length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EpochObservations {
    /// Failed gateway → observers that reported it.
    pub failure_summaries: BTreeMap<WalletAddress, Vec<WalletAddress>>,
    /// Observer → report transaction id.
    pub reports: BTreeMap<WalletAddress, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedObserver {
    pub gateway_address: WalletAddress,
    pub observer_address: WalletAddress,
    pub stake: u64,
    pub start: u64,
    pub stake_weight: f64,
    pub tenure_weight: f64,
    pub gateway_reward_ratio_weight: f64,
    pub observer_reward_ratio_weight: f64,
    pub composite_weight: f64,
    pub normalized_composite_weight: f64,
}

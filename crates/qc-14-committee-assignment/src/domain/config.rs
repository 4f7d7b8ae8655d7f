//! # Configuration
//!
//! Sharding instances, the epoch schedule, chain fork epochs and the
//! process-level committee configuration.

use super::errors::{CommitteeError, CommitteeResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Protocol-operated account as written in the sharding configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployAccount {
    /// Hex address (`0x` prefix optional).
    pub address: String,
    /// Hex-encoded serialized BLS public key.
    pub bls_public_key: String,
}

impl DeployAccount {
    /// Create an account entry.
    pub fn new(address: impl Into<String>, bls_public_key: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            bls_public_key: bls_public_key.into(),
        }
    }
}

/// Sharding configuration in force for a range of epochs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardingInstance {
    /// Number of shards.
    pub num_shards: u32,
    /// Total committee seats per shard.
    pub num_nodes_per_shard: usize,
    /// Seats per shard held by protocol-operated nodes.
    pub num_harmony_operated_nodes_per_shard: usize,
    /// Protocol-operated accounts, indexed `shard + j * num_shards`.
    pub hmy_accounts: Vec<DeployAccount>,
    /// Full-node runner accounts used by the pre-staking slate.
    #[serde(default)]
    pub fn_accounts: Vec<DeployAccount>,
    /// Per-shard cap on keys accepted from one validator (0 = no cap).
    #[serde(default)]
    pub slots_limit: usize,
}

impl ShardingInstance {
    /// Number of shards.
    pub fn num_shards(&self) -> u32 {
        self.num_shards
    }

    /// Total committee seats per shard.
    pub fn num_nodes_per_shard(&self) -> usize {
        self.num_nodes_per_shard
    }

    /// Seats per shard held by protocol-operated nodes.
    pub fn num_harmony_operated_nodes_per_shard(&self) -> usize {
        self.num_harmony_operated_nodes_per_shard
    }

    /// Protocol-operated accounts.
    pub fn hmy_accounts(&self) -> &[DeployAccount] {
        &self.hmy_accounts
    }

    /// Full-node runner accounts.
    pub fn fn_accounts(&self) -> &[DeployAccount] {
        &self.fn_accounts
    }

    /// Per-shard key cap.
    pub fn slots_limit(&self) -> usize {
        self.slots_limit
    }

    /// Seats open to external validators across all shards.
    pub fn external_slots_available(&self) -> usize {
        self.num_nodes_per_shard
            .saturating_sub(self.num_harmony_operated_nodes_per_shard)
            .saturating_mul(self.num_shards as usize)
    }

    /// Reject configurations the assigner cannot work with.
    pub fn validate(&self) -> CommitteeResult<()> {
        if self.num_shards == 0 {
            return Err(CommitteeError::Config("num_shards must be positive".into()));
        }
        if self.num_harmony_operated_nodes_per_shard > self.num_nodes_per_shard {
            return Err(CommitteeError::Config(format!(
                "protocol nodes per shard {} exceed nodes per shard {}",
                self.num_harmony_operated_nodes_per_shard, self.num_nodes_per_shard
            )));
        }
        Ok(())
    }
}

/// Ordered list of sharding instances keyed by activation epoch.
///
/// Deserialization goes through [`EpochSchedule::new`], so a decoded
/// schedule always has an entry for epoch 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule")]
pub struct EpochSchedule {
    entries: Vec<ScheduleEntry>,
}

#[derive(Deserialize)]
struct RawSchedule {
    entries: Vec<ScheduleEntry>,
}

impl TryFrom<RawSchedule> for EpochSchedule {
    type Error = CommitteeError;

    fn try_from(raw: RawSchedule) -> CommitteeResult<Self> {
        Self::new(raw.entries)
    }
}

/// One schedule entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// First epoch the instance applies to.
    pub from_epoch: u64,
    /// Instance in force from `from_epoch`.
    pub instance: ShardingInstance,
}

impl EpochSchedule {
    /// Build a schedule. The first entry must start at epoch 0 and entries
    /// must be strictly increasing by epoch.
    pub fn new(entries: Vec<ScheduleEntry>) -> CommitteeResult<Self> {
        match entries.first() {
            None => return Err(CommitteeError::Config("empty schedule".into())),
            Some(first) if first.from_epoch != 0 => {
                return Err(CommitteeError::Config(
                    "schedule must start at epoch 0".into(),
                ))
            }
            Some(_) => {}
        }
        if entries
            .windows(2)
            .any(|w| w[0].from_epoch >= w[1].from_epoch)
        {
            return Err(CommitteeError::Config(
                "schedule epochs must be strictly increasing".into(),
            ));
        }
        for entry in &entries {
            entry.instance.validate()?;
        }
        Ok(Self { entries })
    }

    /// Schedule with a single instance for all epochs.
    pub fn fixed(instance: ShardingInstance) -> CommitteeResult<Self> {
        Self::new(vec![ScheduleEntry {
            from_epoch: 0,
            instance,
        }])
    }

    /// Load from JSON (`{"entries": [{"from_epoch": 0, "instance": {...}}]}`).
    pub fn from_json(json: &str) -> CommitteeResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CommitteeError::Config(format!("invalid schedule: {}", e)))
    }

    /// Instance in force at `epoch`.
    pub fn instance_for_epoch(&self, epoch: u64) -> &ShardingInstance {
        let idx = self
            .entries
            .partition_point(|e| e.from_epoch <= epoch)
            .saturating_sub(1);
        &self.entries[idx].instance
    }
}

/// Fork epochs relevant to committee assignment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChainConfig {
    /// First staking epoch; `None` if staking is never enabled.
    pub staking_epoch: Option<u64>,
    /// First epoch using the widened (35%) effective-stake bound.
    pub epos_bound35_epoch: Option<u64>,
}

impl ChainConfig {
    /// Whether staking is active at `epoch`.
    pub fn is_staking(&self, epoch: u64) -> bool {
        is_forked(self.staking_epoch, epoch)
    }

    /// Whether the widened effective-stake bound is active at `epoch`.
    pub fn is_epos_bound35(&self, epoch: u64) -> bool {
        is_forked(self.epos_bound35_epoch, epoch)
    }
}

fn is_forked(fork: Option<u64>, epoch: u64) -> bool {
    fork.is_some_and(|f| f <= epoch)
}

/// Network the node runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NetworkType {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
    /// Developer network.
    Devnet,
    /// Single-machine network.
    Localnet,
}

impl NetworkType {
    /// Parse a network name, case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "mainnet" => Some(Self::Mainnet),
            "testnet" => Some(Self::Testnet),
            "devnet" => Some(Self::Devnet),
            "localnet" => Some(Self::Localnet),
            _ => None,
        }
    }
}

/// Process-level committee assignment configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitteeConfig {
    /// Network type, used by the shard-reduction fallback.
    pub network: NetworkType,
}

impl Default for CommitteeConfig {
    fn default() -> Self {
        Self {
            network: NetworkType::Mainnet,
        }
    }
}

impl CommitteeConfig {
    /// Create config for testing.
    pub fn for_testing() -> Self {
        Self {
            network: NetworkType::Testnet,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// - `QC_NETWORK`: network name (default: mainnet)
    pub fn from_env() -> Self {
        let network = env::var("QC_NETWORK")
            .ok()
            .and_then(|v| NetworkType::parse(&v))
            .unwrap_or(NetworkType::Mainnet);
        Self { network }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(num_shards: u32) -> ShardingInstance {
        ShardingInstance {
            num_shards,
            num_nodes_per_shard: 10,
            num_harmony_operated_nodes_per_shard: 4,
            hmy_accounts: vec![],
            fn_accounts: vec![],
            slots_limit: 0,
        }
    }

    #[test]
    fn test_external_slots_available() {
        assert_eq!(instance(4).external_slots_available(), 24);
        let mut saturated = instance(4);
        saturated.num_harmony_operated_nodes_per_shard = 12;
        assert_eq!(saturated.external_slots_available(), 0);
    }

    #[test]
    fn test_instance_validate() {
        assert!(instance(4).validate().is_ok());
        assert!(instance(0).validate().is_err());
        let mut bad = instance(4);
        bad.num_harmony_operated_nodes_per_shard = 11;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_schedule_lookup() {
        let schedule = EpochSchedule::new(vec![
            ScheduleEntry {
                from_epoch: 0,
                instance: instance(4),
            },
            ScheduleEntry {
                from_epoch: 10,
                instance: instance(2),
            },
        ])
        .unwrap();
        assert_eq!(schedule.instance_for_epoch(0).num_shards(), 4);
        assert_eq!(schedule.instance_for_epoch(9).num_shards(), 4);
        assert_eq!(schedule.instance_for_epoch(10).num_shards(), 2);
        assert_eq!(schedule.instance_for_epoch(u64::MAX).num_shards(), 2);
    }

    #[test]
    fn test_schedule_rejects_bad_entries() {
        assert!(EpochSchedule::new(vec![]).is_err());
        assert!(EpochSchedule::new(vec![ScheduleEntry {
            from_epoch: 1,
            instance: instance(4),
        }])
        .is_err());
        assert!(EpochSchedule::new(vec![
            ScheduleEntry {
                from_epoch: 0,
                instance: instance(4),
            },
            ScheduleEntry {
                from_epoch: 0,
                instance: instance(2),
            },
        ])
        .is_err());
    }

    #[test]
    fn test_schedule_from_json() {
        let json = r#"{
            "entries": [
                {"from_epoch": 0, "instance": {
                    "num_shards": 2,
                    "num_nodes_per_shard": 3,
                    "num_harmony_operated_nodes_per_shard": 1,
                    "hmy_accounts": [{"address": "0x00", "bls_public_key": "00"}],
                    "slots_limit": 2
                }}
            ]
        }"#;
        let schedule = EpochSchedule::from_json(json).unwrap();
        let inst = schedule.instance_for_epoch(5);
        assert_eq!(inst.num_shards(), 2);
        assert_eq!(inst.slots_limit(), 2);
        assert!(inst.fn_accounts().is_empty());
        assert!(EpochSchedule::from_json("{").is_err());
    }

    #[test]
    fn test_deserialize_validates_schedule() {
        assert!(serde_json::from_str::<EpochSchedule>(r#"{"entries":[]}"#).is_err());
        assert!(EpochSchedule::from_json(r#"{"entries":[]}"#).is_err());

        let late_start = EpochSchedule {
            entries: vec![ScheduleEntry {
                from_epoch: 3,
                instance: instance(4),
            }],
        };
        let json = serde_json::to_string(&late_start).unwrap();
        assert!(serde_json::from_str::<EpochSchedule>(&json).is_err());

        let unordered = EpochSchedule {
            entries: vec![
                ScheduleEntry {
                    from_epoch: 0,
                    instance: instance(4),
                },
                ScheduleEntry {
                    from_epoch: 8,
                    instance: instance(2),
                },
                ScheduleEntry {
                    from_epoch: 5,
                    instance: instance(2),
                },
            ],
        };
        let json = serde_json::to_string(&unordered).unwrap();
        assert!(serde_json::from_str::<EpochSchedule>(&json).is_err());
    }

    #[test]
    fn test_schedule_serde_round_trip() {
        let schedule = EpochSchedule::fixed(instance(4)).unwrap();
        let json = serde_json::to_string(&schedule).unwrap();
        let back: EpochSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schedule);
        assert_eq!(back.instance_for_epoch(0).num_shards(), 4);
    }

    #[test]
    fn test_chain_config_forks() {
        let config = ChainConfig {
            staking_epoch: Some(5),
            epos_bound35_epoch: None,
        };
        assert!(!config.is_staking(4));
        assert!(config.is_staking(5));
        assert!(!config.is_epos_bound35(u64::MAX));
    }

    #[test]
    fn test_network_parse() {
        assert_eq!(NetworkType::parse("TestNet"), Some(NetworkType::Testnet));
        assert_eq!(NetworkType::parse("mainnet"), Some(NetworkType::Mainnet));
        assert_eq!(NetworkType::parse("other"), None);
    }

    #[test]
    fn test_committee_config_defaults() {
        assert_eq!(NetworkType::default(), NetworkType::Mainnet);
        assert_eq!(CommitteeConfig::default().network, NetworkType::Mainnet);
        assert_eq!(CommitteeConfig::for_testing().network, NetworkType::Testnet);
    }
}

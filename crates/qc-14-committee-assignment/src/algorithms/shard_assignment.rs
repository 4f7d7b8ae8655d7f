//! # Shard Assignment Algorithm
//!
//! Builds per-shard committees: protocol-operated seats first, then auction
//! winners placed by `key mod shard_count`.
//!
//! Protocol accounts are laid out interleaved across shards, so the `j`-th
//! protocol seat of shard `i` uses account `i + j * shard_count`.

use crate::domain::{
    parse_address, BlsPublicKey, Committee, CommitteeError, CommitteeResult, DeployAccount,
    ShardId, ShardState, ShardingInstance, Slot, SlotPurchase,
};

/// Protocol-operated slate of an instance, one committee per shard.
pub fn protocol_slate(
    instance: &ShardingInstance,
    shard_count: u32,
) -> CommitteeResult<Vec<Committee>> {
    let protocol_nodes = instance.num_harmony_operated_nodes_per_shard();
    let shard_num = shard_count as usize;
    let mut shards = Vec::with_capacity(shard_num);
    for i in 0..shard_num {
        let mut committee = Committee::new(i as ShardId);
        for j in 0..protocol_nodes {
            let account = account_at(instance.hmy_accounts(), i + j * shard_num)?;
            committee.slots.push(protocol_slot(account)?);
        }
        shards.push(committee);
    }
    Ok(shards)
}

/// Protocol slate plus auction winners, each winner in `key mod shard_count`.
pub fn assign_shards(
    instance: &ShardingInstance,
    winners: &[SlotPurchase],
    shard_count: u32,
) -> CommitteeResult<Vec<Committee>> {
    if shard_count == 0 {
        return Err(CommitteeError::Config("shard count must be positive".into()));
    }
    let mut shards = protocol_slate(instance, shard_count)?;
    for purchase in winners {
        let shard_id = purchase.key.shard_bucket(shard_count) as usize;
        shards[shard_id].slots.push(Slot::purchased(purchase));
    }
    Ok(shards)
}

/// Committee used before staking: protocol accounts followed by full-node
/// runner accounts up to `num_nodes_per_shard` seats per shard.
///
/// The epoch is left unset.
pub fn pre_staking_committee(instance: &ShardingInstance) -> CommitteeResult<ShardState> {
    let shard_num = instance.num_shards() as usize;
    let protocol_nodes = instance.num_harmony_operated_nodes_per_shard();
    let mut shards = protocol_slate(instance, instance.num_shards())?;
    for (i, committee) in shards.iter_mut().enumerate() {
        for j in protocol_nodes..instance.num_nodes_per_shard() {
            let account = account_at(instance.fn_accounts(), i + (j - protocol_nodes) * shard_num)?;
            committee.slots.push(protocol_slot(account)?);
        }
    }
    Ok(ShardState::new(None, shards))
}

fn account_at(accounts: &[DeployAccount], index: usize) -> CommitteeResult<&DeployAccount> {
    accounts.get(index).ok_or_else(|| {
        CommitteeError::Config(format!(
            "account index {} out of range ({} configured)",
            index,
            accounts.len()
        ))
    })
}

fn protocol_slot(account: &DeployAccount) -> CommitteeResult<Slot> {
    let address =
        parse_address(&account.address).map_err(|reason| CommitteeError::AccountParse {
            account: account.address.clone(),
            reason,
        })?;
    let key = BlsPublicKey::from_hex(&account.bls_public_key).map_err(|e| {
        CommitteeError::KeyDeserialization {
            address,
            key: account.bls_public_key.clone(),
            reason: e.to_string(),
        }
    })?;
    Ok(Slot::protocol(address, key))
}

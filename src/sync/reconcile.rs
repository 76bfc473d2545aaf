//! Rank reconciliation against a freshly synced roster.
//!
//! Compares the roster with the local membership store and derives rank
//! changes. Pure: the same inputs always produce the same events, and
//! unchanged inputs produce none, so re-running is always safe.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::{
    ChangeReason, EngineEvent, LocalMember, MemberRecord, RankConfig, RoleChangeEvent,
};
use crate::store::Store;

/// Compute rank changes for every local member against the roster.
///
/// A member absent from the roster targets the unaffiliated rank; an
/// affiliate holding a rank above the configured cap targets the default
/// demotion rank. An event is emitted only when the target differs from
/// the member's current rank.
pub fn reconcile(
    roster: &[MemberRecord],
    local: &[LocalMember],
    ranks: &RankConfig,
    now: DateTime<Utc>,
) -> Vec<RoleChangeEvent> {
    let by_handle: HashMap<String, &MemberRecord> =
        roster.iter().map(|m| (m.key(), m)).collect();
    let affiliate_cap = ranks.index_of(&ranks.max_affiliate_rank);

    let mut changes = Vec::new();
    for member in local {
        let roster_entry = by_handle.get(&member.handle.to_lowercase());

        let (target, reason) = match roster_entry {
            None => (&ranks.unaffiliated_rank, ChangeReason::NotInOrg),
            Some(entry) if entry.affiliation.is_affiliate() => {
                // A rank outside the hierarchy has no position to compare,
                // so the affiliate cap cannot apply to it.
                let above_cap = match (ranks.index_of(&member.rank), affiliate_cap) {
                    (Some(current), Some(cap)) => current > cap,
                    _ => false,
                };
                if !above_cap {
                    continue;
                }
                (&ranks.default_demotion_rank, ChangeReason::Affiliate)
            }
            Some(_) => continue,
        };

        if *target == member.rank {
            continue;
        }

        changes.push(RoleChangeEvent {
            member_id: member.id.clone(),
            handle: member.handle.clone(),
            old_rank: member.rank.clone(),
            new_rank: target.clone(),
            reason,
            changed_at: now,
        });
    }

    changes
}

/// Persist computed rank changes and emit one event per change.
///
/// Updates each member's stored rank, appends to the rank-change log,
/// and sends `MemberReconciled` for every change.
pub async fn apply_changes(
    store: &dyn Store,
    events: &mpsc::Sender<EngineEvent>,
    changes: &[RoleChangeEvent],
) -> Result<()> {
    for change in changes {
        store
            .upsert_member(&LocalMember {
                id: change.member_id.clone(),
                handle: change.handle.clone(),
                rank: change.new_rank.clone(),
            })
            .await?;
        store.append_role_history(change).await?;

        if events
            .send(EngineEvent::MemberReconciled(change.clone()))
            .await
            .is_err()
        {
            log::warn!("Event channel closed; dropping reconciliation event");
        }
    }
    Ok(())
}

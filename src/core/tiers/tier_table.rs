// Tier domain - the ordered trust ranks and the role-id mapping for them.
//
// Role ids come from configuration; everything past the config boundary talks
// in terms of `Tier`, never raw role ids.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// A trust rank tied to a guild role. Lower variants are less trusted.
///
/// The derived `Ord` follows declaration order, so `T0 < T1 < ... < T5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
}

#[cfg(test)]
impl Tier {
    pub const ALL: [Tier; 6] = [Tier::T0, Tier::T1, Tier::T2, Tier::T3, Tier::T4, Tier::T5];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Tier::T0 => "T0",
            Tier::T1 => "T1",
            Tier::T2 => "T2",
            Tier::T3 => "T3",
            Tier::T4 => "T4",
            Tier::T5 => "T5",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TierTableError {
    #[error("Tier {0} is configured more than once")]
    DuplicateTier(Tier),

    #[error("Role {role_id} is mapped to both {first} and {second}")]
    DuplicateRole { role_id: u64, first: Tier, second: Tier },

    #[error("Tier {0} has an invalid role id (0)")]
    InvalidRoleId(Tier),
}

/// A configured tier: which role grants it and how to name it in announcements.
#[derive(Debug, Clone, PartialEq)]
pub struct TierEntry {
    pub tier: Tier,
    pub role_id: u64,
    pub name: String,
}

/// Validated two-way mapping between guild roles and tiers.
#[derive(Debug, Clone, Default)]
pub struct TierTable {
    by_tier: BTreeMap<Tier, TierEntry>,
    by_role: HashMap<u64, Tier>,
}

impl TierTable {
    /// Build the table, rejecting duplicate tiers, shared role ids and zero ids.
    pub fn new(entries: impl IntoIterator<Item = TierEntry>) -> Result<Self, TierTableError> {
        let mut table = Self::default();

        for entry in entries {
            if entry.role_id == 0 {
                return Err(TierTableError::InvalidRoleId(entry.tier));
            }
            if table.by_tier.contains_key(&entry.tier) {
                return Err(TierTableError::DuplicateTier(entry.tier));
            }
            if let Some(existing) = table.by_role.get(&entry.role_id) {
                return Err(TierTableError::DuplicateRole {
                    role_id: entry.role_id,
                    first: *existing,
                    second: entry.tier,
                });
            }

            table.by_role.insert(entry.role_id, entry.tier);
            table.by_tier.insert(entry.tier, entry);
        }

        Ok(table)
    }

    /// Which configured tiers does this role set grant?
    pub fn held_tiers<'a>(&self, role_ids: impl IntoIterator<Item = &'a u64>) -> BTreeSet<Tier> {
        role_ids
            .into_iter()
            .filter_map(|role_id| self.by_role.get(role_id).copied())
            .collect()
    }

    pub fn entry(&self, tier: Tier) -> Option<&TierEntry> {
        self.by_tier.get(&tier)
    }

    /// Display name for announcements, falling back to the tier label.
    pub fn display_name(&self, tier: Tier) -> String {
        self.entry(tier)
            .map(|e| e.name.clone())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| tier.to_string())
    }

    pub fn len(&self) -> usize {
        self.by_tier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tier.is_empty()
    }
}

/// Tiers present in `new_roles` but not in `old_roles`, lowest first.
pub fn gained_tiers(table: &TierTable, old_roles: &[u64], new_roles: &[u64]) -> Vec<Tier> {
    let before = table.held_tiers(old_roles);
    table
        .held_tiers(new_roles)
        .into_iter()
        .filter(|tier| !before.contains(tier))
        .collect()
}

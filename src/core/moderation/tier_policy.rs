// Tier policy table - what each moderated tier may post.
//
// A tier with no `PolicyRule` is unrestricted. Every field of a rule defaults
// to deny, so anything the config does not spell out is not allowed.

use super::message_classifier::domain_matches;
use crate::core::tiers::Tier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Which links a tier may post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LinkPolicy {
    /// No links at all
    #[default]
    None,
    /// Only these domains (and their subdomains), only in the tier's exempt channels
    Domains { domains: BTreeSet<String> },
    /// Any link, anywhere
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    #[serde(default)]
    pub links: LinkPolicy,
    #[serde(default)]
    pub allow_images: bool,
    #[serde(default)]
    pub allow_animated: bool,
    #[serde(default)]
    pub allow_device_video: bool,
    #[serde(default)]
    pub exempt_channel_ids: HashSet<u64>,
}

impl PolicyRule {
    pub fn is_exempt_channel(&self, channel_id: u64) -> bool {
        self.exempt_channel_ids.contains(&channel_id)
    }

    /// Lowercase and strip `www.` from allowlisted domains so they compare
    /// against classifier output directly.
    pub fn normalized(mut self) -> Self {
        if let LinkPolicy::Domains { domains } = &mut self.links {
            *domains = domains
                .iter()
                .map(|d| {
                    let d = d.trim().trim_end_matches('.').to_ascii_lowercase();
                    d.strip_prefix("www.").map(str::to_string).unwrap_or(d)
                })
                .filter(|d| !d.is_empty())
                .collect();
        }
        self
    }
}

/// Outcome of checking one link against a tier's link policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDecision {
    Permitted,
    Forbidden,
    /// The domain is allowlisted but this channel is not one of the exempt ones
    NotExemptChannel,
}

impl LinkPolicy {
    pub fn check(&self, domain: &str, channel_exempt: bool) -> LinkDecision {
        match self {
            LinkPolicy::None => LinkDecision::Forbidden,
            LinkPolicy::All => LinkDecision::Permitted,
            LinkPolicy::Domains { domains } => {
                if !domains.iter().any(|allowed| domain_matches(domain, allowed)) {
                    LinkDecision::Forbidden
                } else if !channel_exempt {
                    LinkDecision::NotExemptChannel
                } else {
                    LinkDecision::Permitted
                }
            }
        }
    }
}

/// Tier -> rule. Exactly one rule per moderated tier.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    rules: BTreeMap<Tier, PolicyRule>,
}

impl PolicyTable {
    pub fn new(rules: impl IntoIterator<Item = (Tier, PolicyRule)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(tier, rule)| (tier, rule.normalized()))
                .collect(),
        }
    }

    pub fn rule(&self, tier: Tier) -> Option<&PolicyRule> {
        self.rules.get(&tier)
    }

    pub fn is_moderated(&self, tier: Tier) -> bool {
        self.rules.contains_key(&tier)
    }

    pub fn moderated_tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        self.rules.keys().copied()
    }
}

/// Precedence rule for members holding several tiers: the highest held tier
/// governs. If that tier has no rule, the member is unrestricted even when
/// they still carry a lower, moderated tier role.
pub fn resolve_effective_tier(held: &BTreeSet<Tier>) -> Option<Tier> {
    held.iter().next_back().copied()
}

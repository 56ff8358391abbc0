// Announcement templates per tier.
//
// A template is a string with a `{member}` placeholder (the platform mention)
// and an optional `{tier}` placeholder (the tier's display name). A tier can
// have several variants; one is picked at random per announcement.

use crate::core::tiers::Tier;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

pub const MEMBER_PLACEHOLDER: &str = "{member}";
pub const TIER_PLACEHOLDER: &str = "{tier}";

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    text: String,
}

impl Template {
    /// `None` if the text has no `{member}` placeholder.
    pub fn parse(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        text.contains(MEMBER_PLACEHOLDER).then_some(Self { text })
    }

    pub fn render(&self, member_ref: &str, tier_name: &str) -> String {
        self.text
            .replace(MEMBER_PLACEHOLDER, member_ref)
            .replace(TIER_PLACEHOLDER, tier_name)
    }
}

fn default_template(tier: Tier) -> &'static str {
    match tier {
        Tier::T0 => "👋 Welcome aboard, {member}! You're now a **{tier}**.",
        Tier::T1 => "🌱 {member} just reached **{tier}**. Keep it up!",
        Tier::T2 => "⭐ {member} has been promoted to **{tier}**!",
        Tier::T3 => "🔥 {member} climbed to **{tier}**. Nice work!",
        Tier::T4 => "💎 {member} is now **{tier}**. Respect.",
        Tier::T5 => "👑 All hail {member}, our newest **{tier}**!",
    }
}

/// Tier -> template variants.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<Tier, Vec<Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the built-in template for `tier`.
    pub fn with_default(mut self, tier: Tier) -> Self {
        if let Some(template) = Template::parse(default_template(tier)) {
            self.templates.insert(tier, vec![template]);
        }
        self
    }

    /// Replace the templates for `tier`. An empty list falls back to the default.
    pub fn with_templates(mut self, tier: Tier, templates: Vec<Template>) -> Self {
        if templates.is_empty() {
            return self.with_default(tier);
        }
        self.templates.insert(tier, templates);
        self
    }

    pub fn has_template(&self, tier: Tier) -> bool {
        self.templates.contains_key(&tier)
    }

    /// Render one randomly chosen variant for `tier`.
    pub fn render(&self, tier: Tier, member_ref: &str, tier_name: &str) -> Option<String> {
        self.templates
            .get(&tier)?
            .choose(&mut rand::thread_rng())
            .map(|template| template.render(member_ref, tier_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_requires_member_placeholder() {
        assert!(Template::parse("Congrats!").is_none());
        assert!(Template::parse("Congrats {member}!").is_some());
    }

    #[test]
    fn render_fills_placeholders() {
        let template = Template::parse("{member} reached {tier}, {member}!").unwrap();
        assert_eq!(
            template.render("<@1>", "Regular"),
            "<@1> reached Regular, <@1>!"
        );
    }

    #[test]
    fn every_default_mentions_the_member() {
        for tier in Tier::ALL {
            let registry = TemplateRegistry::new().with_default(tier);
            let text = registry.render(tier, "<@42>", "Rank").unwrap();
            assert!(text.contains("<@42>"), "default for {} lost the mention", tier);
            assert!(!text.contains('{'));
        }
    }

    #[test]
    fn variants_are_all_reachable_candidates() {
        let variants = vec![
            Template::parse("A {member}").unwrap(),
            Template::parse("B {member}").unwrap(),
        ];
        let registry = TemplateRegistry::new().with_templates(Tier::T3, variants);

        for _ in 0..20 {
            let text = registry.render(Tier::T3, "x", "T3").unwrap();
            assert!(text == "A x" || text == "B x");
        }
    }

    #[test]
    fn empty_override_falls_back_to_default() {
        let registry = TemplateRegistry::new().with_templates(Tier::T2, Vec::new());
        assert!(registry.has_template(Tier::T2));
        assert!(registry.render(Tier::T1, "x", "T1").is_none());
    }
}

// rust_core/src/ability.rs
// Structured ability synthesis.
// Rolling is synchronous and uses only the dice and the balance tables;
// naming is the one step that talks to the text backend. Keeping every
// random draw ahead of the first await means a card can be rolled from a
// seed and named later without holding the random source across I/O.

use tracing::{debug, warn};

use crate::dice::Dice;
use crate::error::GenerationError;
use crate::models::{
    Ability, AbilityEffect, AbilityType, EffectMetadata, EffectType, Element, Rarity, Stat, Target,
};
use crate::rules::{Judge, Ruling};
use crate::services::{ability_name_prompt, clean_reply, TextOptions, TextService, ABILITY_SYSTEM};
use crate::tables::{ability_config, element_synergy, AbilityConfig, EffectTemplate, CONDITION_CHANCE};

/// How the synthesizer enforces the cap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancePolicy {
    /// Clamp the first roll.
    ClampOnly,
    /// Re-roll up to `max_attempts` times, then clamp the last roll.
    RetryThenClamp { max_attempts: u32 },
}

impl Default for BalancePolicy {
    fn default() -> Self {
        BalancePolicy::RetryThenClamp { max_attempts: 3 }
    }
}

impl BalancePolicy {
    fn max_attempts(&self) -> u32 {
        match self {
            BalancePolicy::ClampOnly => 1,
            BalancePolicy::RetryThenClamp { max_attempts } => (*max_attempts).max(1),
        }
    }
}

/// Everything about an ability except its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityBlueprint {
    pub ability_type: AbilityType,
    pub effects: Vec<AbilityEffect>,
    pub limitation: String,
    pub cost: Option<u32>,
    pub cooldown: Option<u32>,
}

impl AbilityBlueprint {
    pub fn total_power(&self) -> u32 {
        self.effects.iter().map(|e| e.value).sum()
    }

    /// Cost and cooldown follow total power, so they are refreshed after any clamp.
    fn settle(&mut self, config: &AbilityConfig) {
        let total = self.total_power();
        let (min, max) = config.cost_range;
        self.cost = Some(total.div_ceil(2).clamp(min, max));
        self.cooldown = match self.ability_type {
            AbilityType::Activated => Some(total.div_ceil(3).max(1)),
            _ => None,
        };
    }

    pub fn into_ability(self, name: String) -> Ability {
        Ability {
            name,
            ability_type: self.ability_type,
            effects: self.effects,
            limitation: self.limitation,
            cost: self.cost,
            cooldown: self.cooldown,
        }
    }
}

fn missing(what: &str, rarity: Rarity) -> GenerationError {
    GenerationError::Configuration(format!("{} table is empty for {}", what, rarity))
}

/// Draws a target on the right side of the table for this effect.
fn pick_target(effect_type: EffectType, pool: &[Target], dice: &mut impl Dice) -> Target {
    let beneficial = effect_type.is_beneficial();
    let sided: Vec<Target> = pool
        .iter()
        .copied()
        .filter(|t| t.is_friendly() == beneficial)
        .collect();
    dice.pick(&sided)
        .copied()
        .unwrap_or_else(|| effect_type.default_target())
}

fn roll_metadata(template: &EffectTemplate, dice: &mut impl Dice) -> Option<EffectMetadata> {
    match template.effect_type {
        EffectType::Buff | EffectType::Debuff => Some(EffectMetadata {
            stat: Some(template.stat.unwrap_or(Stat::Attack)),
            duration: dice.int_inclusive(1, 2),
        }),
        EffectType::Poison => Some(EffectMetadata {
            stat: None,
            duration: dice.int_inclusive(2, 3),
        }),
        _ => None,
    }
}

fn roll_effect(
    template: &EffectTemplate,
    config: &AbilityConfig,
    element: Element,
    with_condition: bool,
    dice: &mut impl Dice,
) -> AbilityEffect {
    let value = dice.int_inclusive(1, config.max_value);
    let target = match template.target {
        Some(target) => target,
        None => pick_target(template.effect_type, config.allowed_targets, dice),
    };
    let condition = if with_condition && dice.chance(CONDITION_CHANCE) {
        dice.pick(element_synergy(element).conditions).copied()
    } else {
        None
    };
    let metadata = roll_metadata(template, dice);

    AbilityEffect {
        effect_type: template.effect_type,
        value,
        target,
        condition,
        metadata,
    }
}

/// One unvalidated roll of an ability for `(element, rarity)`.
pub fn roll_blueprint(
    element: Element,
    rarity: Rarity,
    dice: &mut impl Dice,
) -> Result<AbilityBlueprint, GenerationError> {
    let config = ability_config(rarity);
    let synergy = element_synergy(element);

    let effect_count = dice.int_inclusive(1, config.max_effects);

    let primary = dice
        .pick(synergy.primary_effects)
        .ok_or_else(|| missing("primary effect", rarity))?;
    let mut effects = vec![roll_effect(primary, config, element, true, dice)];

    for _ in 1..effect_count {
        let Some(template) = dice.pick(synergy.synergy_effects) else {
            break;
        };
        // A disallowed synergy costs the slot; no re-draw.
        if config.allowed_effect_types.contains(&template.effect_type) {
            effects.push(roll_effect(template, config, element, false, dice));
        }
    }

    let ability_type = *dice
        .pick(config.allowed_types)
        .ok_or_else(|| missing("ability type", rarity))?;
    let limitation = dice
        .pick(config.limitations)
        .ok_or_else(|| missing("limitation", rarity))?
        .to_string();

    let mut blueprint = AbilityBlueprint {
        ability_type,
        effects,
        limitation,
        cost: None,
        cooldown: None,
    };
    blueprint.settle(config);
    Ok(blueprint)
}

enum BalanceStep {
    Attempt(u32),
    Validate(u32, AbilityBlueprint),
    ForceClamp(AbilityBlueprint),
    Accept(AbilityBlueprint),
}

/// Rolls until the cap table is satisfied or attempts run out, then clamps.
/// Never fails on balance; only an empty table is an error.
pub fn roll_balanced(
    element: Element,
    rarity: Rarity,
    policy: BalancePolicy,
    dice: &mut impl Dice,
) -> Result<AbilityBlueprint, GenerationError> {
    let max_attempts = policy.max_attempts();
    let mut step = BalanceStep::Attempt(1);

    loop {
        step = match step {
            BalanceStep::Attempt(n) => BalanceStep::Validate(n, roll_blueprint(element, rarity, dice)?),
            BalanceStep::Validate(n, blueprint) => match Judge::assess_balance(&blueprint.effects, rarity) {
                Ruling::Balanced => BalanceStep::Accept(blueprint),
                Ruling::OverCap(breaches) if n < max_attempts => {
                    debug!(attempt = n, breaches = breaches.len(), %rarity, "ability over cap, re-rolling");
                    BalanceStep::Attempt(n + 1)
                }
                Ruling::OverCap(_) => BalanceStep::ForceClamp(blueprint),
            },
            BalanceStep::ForceClamp(mut blueprint) => {
                let clamped = Judge::force_clamp(&mut blueprint.effects, rarity);
                debug!(clamped, %rarity, "ability clamped to caps");
                blueprint.settle(ability_config(rarity));
                BalanceStep::Accept(blueprint)
            }
            BalanceStep::Accept(blueprint) => return Ok(blueprint),
        };
    }
}

/// Name used when the text backend cannot supply one, e.g. `Dank Power`.
pub fn fallback_ability_name(element: Element) -> String {
    format!("{} Power", element.title())
}

/// Asks the text backend for a name; any failure yields the fallback.
pub async fn name_ability<T: TextService>(
    text: &T,
    element: Element,
    rarity: Rarity,
    blueprint: &AbilityBlueprint,
) -> String {
    let prompt = ability_name_prompt(element, rarity, blueprint.ability_type, &blueprint.effects);
    let options = TextOptions::new(50, 0.7).with_system(ABILITY_SYSTEM);

    match text.complete(&prompt, &options).await {
        Ok(raw) => clean_reply(&raw).unwrap_or_else(|| {
            warn!("ability name came back empty, using fallback");
            fallback_ability_name(element)
        }),
        Err(e) => {
            warn!(error = %e, "ability name generation failed, using fallback");
            fallback_ability_name(element)
        }
    }
}

/// Rolls a balanced ability and names it.
pub async fn synthesize_ability<T: TextService>(
    element: Element,
    rarity: Rarity,
    policy: BalancePolicy,
    dice: &mut (impl Dice + Send),
    text: &T,
) -> Result<Ability, GenerationError> {
    let blueprint = roll_balanced(element, rarity, policy, dice)?;
    let name = name_ability(text, element, rarity, &blueprint).await;
    Ok(blueprint.into_ability(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{seeded, ScriptedDice};
    use crate::error::ServiceError;
    use crate::services::Offline;
    use crate::tables::balance_cap;
    use proptest::prelude::*;

    struct Canned(&'static str);

    impl TextService for Canned {
        async fn complete(&self, _prompt: &str, _options: &TextOptions) -> Result<String, ServiceError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_common_roll_is_single_effect() {
        let mut dice = seeded(11);
        for _ in 0..200 {
            let bp = roll_blueprint(Element::Toxic, Rarity::Common, &mut dice).unwrap();
            assert_eq!(bp.effects.len(), 1);
            assert!(matches!(bp.ability_type, AbilityType::Passive | AbilityType::EnterBattlefield));
            assert_eq!(bp.limitation, "once per turn");
            assert_eq!(bp.cooldown, None);
            let cost = bp.cost.unwrap();
            assert!((1..=2).contains(&cost));
        }
    }

    #[test]
    fn test_activated_abilities_get_a_cooldown() {
        let mut dice = seeded(5);
        let mut seen = false;
        for _ in 0..500 {
            let bp = roll_blueprint(Element::Cursed, Rarity::GodTier, &mut dice).unwrap();
            match bp.ability_type {
                AbilityType::Activated => {
                    seen = true;
                    assert_eq!(bp.cooldown, Some(bp.total_power().div_ceil(3).max(1)));
                }
                _ => assert_eq!(bp.cooldown, None),
            }
        }
        assert!(seen, "GOD_TIER should roll ACTIVATED at least once in 500 tries");
    }

    #[test]
    fn test_targets_stay_on_the_right_side() {
        let mut dice = seeded(77);
        for element in Element::ALL {
            for _ in 0..200 {
                let bp = roll_blueprint(element, Rarity::Legendary, &mut dice).unwrap();
                for effect in &bp.effects {
                    assert_eq!(
                        effect.target.is_friendly(),
                        effect.effect_type.is_beneficial(),
                        "{:?}",
                        effect
                    );
                }
            }
        }
    }

    #[test]
    fn test_retry_then_clamp_on_persistent_overcap() {
        // DANK at COMMON: primary DRAW (cap 1) rolled for 2, no condition,
        // PASSIVE, the only limitation. Same draws on all three attempts.
        let per_attempt = [0.9, 0.99, 0.9, 0.0, 0.0];
        let mut draws = Vec::new();
        for _ in 0..3 {
            draws.extend_from_slice(&per_attempt);
        }
        let mut dice = ScriptedDice::new(draws);
        let bp = roll_balanced(Element::Dank, Rarity::Common, BalancePolicy::default(), &mut dice).unwrap();
        assert_eq!(dice.consumed(), 15, "all three attempts should have been rolled");
        assert_eq!(bp.effects[0].effect_type, EffectType::Draw);
        assert_eq!(bp.effects[0].value, 1);
        assert_eq!(bp.cost, Some(1));
    }

    #[test]
    fn test_clamp_only_stops_after_one_roll() {
        let mut dice = ScriptedDice::new(vec![0.9, 0.99, 0.9, 0.0, 0.0]).with_fallback(0.0);
        let bp = roll_balanced(Element::Dank, Rarity::Common, BalancePolicy::ClampOnly, &mut dice).unwrap();
        assert_eq!(dice.consumed(), 5);
        assert_eq!(bp.effects[0].value, 1);
    }

    #[test]
    fn test_clamp_recomputes_cost_and_cooldown() {
        // Scenario: LEGENDARY DANK rolls one DRAW for 5 (cap 2) as an ACTIVATED ability.
        // Unclamped that is cost 3 / cooldown 2; after the clamp it must be cost 2 / cooldown 1.
        let draws = vec![0.0, 0.9, 0.99, 0.9, 0.9, 0.0];

        let raw = roll_blueprint(Element::Dank, Rarity::Legendary, &mut ScriptedDice::new(draws.clone())).unwrap();
        assert_eq!(raw.effects[0].value, 5);
        assert_eq!((raw.cost, raw.cooldown), (Some(3), Some(2)));

        let mut dice = ScriptedDice::new(draws);
        let bp = roll_balanced(Element::Dank, Rarity::Legendary, BalancePolicy::ClampOnly, &mut dice).unwrap();
        assert_eq!(dice.consumed(), 6);
        assert_eq!(bp.ability_type, AbilityType::Activated);
        assert_eq!(bp.limitation, "costs 2 mana");
        assert_eq!(bp.effects[0].effect_type, EffectType::Draw);
        assert_eq!(bp.effects[0].value, 2);
        assert_eq!(bp.cost, Some(2));
        assert_eq!(bp.cooldown, Some(1));
    }

    #[test]
    fn test_first_balanced_roll_is_accepted() {
        // DANK DRAW for 1 at COMMON is within cap: no re-roll.
        let mut dice = ScriptedDice::new(vec![0.9, 0.0, 0.9, 0.9, 0.0]).with_fallback(0.5);
        let bp = roll_balanced(Element::Dank, Rarity::Common, BalancePolicy::default(), &mut dice).unwrap();
        assert_eq!(dice.consumed(), 5);
        assert_eq!(bp.effects[0].value, 1);
        assert_eq!(bp.ability_type, AbilityType::EnterBattlefield);
    }

    #[tokio::test]
    async fn test_naming_cleans_and_falls_back() {
        let mut dice = seeded(3);
        let ability = synthesize_ability(
            Element::Dank,
            Rarity::Rare,
            BalancePolicy::default(),
            &mut dice,
            &Canned("Name: Stonks Only Go Up"),
        )
        .await
        .unwrap();
        assert_eq!(ability.name, "Stonks Only Go Up");

        let ability = synthesize_ability(Element::Dank, Rarity::Rare, BalancePolicy::default(), &mut dice, &Offline)
            .await
            .unwrap();
        assert_eq!(ability.name, "Dank Power");

        let ability = synthesize_ability(Element::Toxic, Rarity::Rare, BalancePolicy::default(), &mut dice, &Canned("  "))
            .await
            .unwrap();
        assert_eq!(ability.name, "Toxic Power");
    }

    proptest! {
        #[test]
        fn prop_every_effect_within_cap(seed in any::<u64>(), e in 0usize..4, r in 0usize..6, clamp_only in any::<bool>()) {
            let element = Element::ALL[e];
            let rarity = Rarity::ALL[r];
            let policy = if clamp_only { BalancePolicy::ClampOnly } else { BalancePolicy::default() };
            let mut dice = seeded(seed);
            let bp = roll_balanced(element, rarity, policy, &mut dice).unwrap();
            let config = ability_config(rarity);

            prop_assert!(!bp.effects.is_empty());
            prop_assert!(bp.effects.len() as u32 <= config.max_effects);
            for (i, effect) in bp.effects.iter().enumerate() {
                prop_assert!(effect.value >= 1);
                prop_assert!(effect.value <= balance_cap(effect.effect_type, rarity));
                if i > 0 {
                    prop_assert_eq!(effect.condition, None);
                }
                match (effect.effect_type, effect.metadata) {
                    (EffectType::Buff | EffectType::Debuff, Some(meta)) => {
                        prop_assert!(meta.stat.is_some());
                        prop_assert!((1..=2).contains(&meta.duration));
                    }
                    (EffectType::Poison, Some(meta)) => {
                        prop_assert_eq!(meta.stat, None);
                        prop_assert!((2..=3).contains(&meta.duration));
                    }
                    (EffectType::Buff | EffectType::Debuff | EffectType::Poison, None) => {
                        prop_assert!(false, "{:?} rolled without metadata", effect.effect_type);
                    }
                    (_, metadata) => prop_assert_eq!(metadata, None),
                }
            }

            // Cost and cooldown always follow the final, possibly clamped, power.
            let total = bp.total_power();
            let (min, max) = config.cost_range;
            prop_assert_eq!(bp.cost, Some(total.div_ceil(2).clamp(min, max)));
            match bp.ability_type {
                AbilityType::Activated => prop_assert_eq!(bp.cooldown, Some(total.div_ceil(3).max(1))),
                _ => prop_assert_eq!(bp.cooldown, None),
            }
            prop_assert!(config.allowed_types.contains(&bp.ability_type));
        }
    }
}

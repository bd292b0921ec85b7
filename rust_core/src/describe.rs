// rust_core/src/describe.rs
// Rules text for an ability. Pure and deterministic: the same Ability
// always renders to the same string, with no randomness and no I/O.

use crate::models::{Ability, AbilityEffect, AbilityType, EffectType, Target};

fn trigger_phrase(ability: &Ability) -> String {
    match ability.ability_type {
        AbilityType::EnterBattlefield => "When this card enters the battlefield".to_string(),
        AbilityType::AttackTrigger => "Whenever this card attacks".to_string(),
        AbilityType::DeathTrigger => "When this card dies".to_string(),
        AbilityType::Passive => "While this card is on the battlefield".to_string(),
        AbilityType::Activated => match ability.cost {
            Some(cost) => format!("Pay {} mana", cost),
            None => "Activate".to_string(),
        },
    }
}

fn plural(count: u32, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{} {}", count, one)
    } else {
        format!("{} {}", count, many)
    }
}

fn duration_suffix(effect: &AbilityEffect) -> String {
    match effect.metadata.map(|m| m.duration) {
        Some(1) => " until end of turn".to_string(),
        Some(turns) if turns > 1 => format!(" for {} turns", turns),
        _ => String::new(),
    }
}

fn stat_name(effect: &AbilityEffect) -> &'static str {
    effect
        .metadata
        .and_then(|m| m.stat)
        .map(|s| s.phrase())
        .unwrap_or("attack and defense")
}

/// One effect as a lowercase clause, e.g. `deal 2 damage to an enemy card`.
pub fn effect_clause(effect: &AbilityEffect) -> String {
    let target = effect.target.phrase();
    let v = effect.value;

    let mut clause = match effect.effect_type {
        EffectType::Damage => format!("deal {} damage to {}", v, target),
        EffectType::Heal => format!("restore {} health to {}", v, target),
        EffectType::Buff => format!("give {} +{} {}{}", target, v, stat_name(effect), duration_suffix(effect)),
        EffectType::Debuff => format!("give {} -{} {}{}", target, v, stat_name(effect), duration_suffix(effect)),
        EffectType::Draw => match effect.target {
            Target::Player => format!("draw {}", plural(v, "card", "cards")),
            _ => format!("{} draws {}", target, plural(v, "card", "cards")),
        },
        EffectType::Shield => format!("shield {} from the next {} damage", target, v),
        EffectType::Poison => {
            format!("poison {} for {} damage each turn{}", target, v, duration_suffix(effect))
        }
    };

    if let Some(condition) = effect.condition {
        clause.push(' ');
        clause.push_str(condition.phrase());
    }
    clause
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Full description: trigger, one clause per effect, cooldown, limitation.
pub fn format_description(ability: &Ability) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(ability.effects.len() + 2);

    let trigger = trigger_phrase(ability);
    let mut clauses = ability.effects.iter().map(effect_clause);
    match clauses.next() {
        Some(first) => parts.push(format!("{}, {}", trigger, first)),
        None => parts.push(trigger),
    }
    parts.extend(clauses.map(|c| capitalize(&c)));

    if let Some(cooldown) = ability.cooldown {
        parts.push(format!("Cooldown: {}", plural(cooldown, "turn", "turns")));
    }

    if !ability.limitation.is_empty() {
        parts.push(capitalize(&ability.limitation));
    }

    format!("{}.", parts.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, EffectMetadata, Stat};

    fn ability(ability_type: AbilityType, effects: Vec<AbilityEffect>) -> Ability {
        Ability {
            name: "Much Attack".into(),
            ability_type,
            effects,
            limitation: "once per turn".into(),
            cost: None,
            cooldown: None,
        }
    }

    fn damage(value: u32, target: Target) -> AbilityEffect {
        AbilityEffect {
            effect_type: EffectType::Damage,
            value,
            target,
            condition: None,
            metadata: None,
        }
    }

    #[test]
    fn test_single_effect() {
        let a = ability(AbilityType::AttackTrigger, vec![damage(2, Target::Opponent)]);
        assert_eq!(
            format_description(&a),
            "Whenever this card attacks, deal 2 damage to your opponent. Once per turn."
        );
    }

    #[test]
    fn test_multi_effect_with_cooldown() {
        let mut a = ability(
            AbilityType::Activated,
            vec![
                damage(3, Target::AllEnemies),
                AbilityEffect {
                    effect_type: EffectType::Buff,
                    value: 2,
                    target: Target::Ally,
                    condition: Some(Condition::AllyDied),
                    metadata: Some(EffectMetadata { stat: Some(Stat::Attack), duration: 1 }),
                },
                AbilityEffect {
                    effect_type: EffectType::Draw,
                    value: 1,
                    target: Target::Player,
                    condition: None,
                    metadata: None,
                },
            ],
        );
        a.cost = Some(3);
        a.cooldown = Some(2);
        a.limitation = "once per game & costs 4 mana".into();

        assert_eq!(
            format_description(&a),
            "Pay 3 mana, deal 3 damage to all enemy cards. \
             Give an allied card +2 attack until end of turn if an allied card died this turn. \
             Draw 1 card. \
             Cooldown: 2 turns. \
             Once per game & costs 4 mana."
        );
    }

    #[test]
    fn test_poison_and_debuff_durations() {
        let poison = AbilityEffect {
            effect_type: EffectType::Poison,
            value: 1,
            target: Target::Enemy,
            condition: None,
            metadata: Some(EffectMetadata { stat: None, duration: 3 }),
        };
        assert_eq!(effect_clause(&poison), "poison an enemy card for 1 damage each turn for 3 turns");

        let debuff = AbilityEffect {
            effect_type: EffectType::Debuff,
            value: 2,
            target: Target::AllEnemies,
            condition: Some(Condition::TargetDamaged),
            metadata: Some(EffectMetadata { stat: Some(Stat::Defense), duration: 2 }),
        };
        assert_eq!(
            effect_clause(&debuff),
            "give all enemy cards -2 defense for 2 turns if the target is damaged"
        );
    }

    #[test]
    fn test_opponent_draw_and_shield() {
        let draw = AbilityEffect {
            effect_type: EffectType::Draw,
            value: 2,
            target: Target::Opponent,
            condition: None,
            metadata: None,
        };
        assert_eq!(effect_clause(&draw), "your opponent draws 2 cards");
        let shield = AbilityEffect {
            effect_type: EffectType::Shield,
            value: 2,
            target: Target::SelfCard,
            condition: None,
            metadata: None,
        };
        assert_eq!(effect_clause(&shield), "shield this card from the next 2 damage");
    }

    #[test]
    fn test_description_is_deterministic() {
        let a = ability(AbilityType::DeathTrigger, vec![damage(1, Target::Enemy)]);
        let first = format_description(&a);
        let second = format_description(&a.clone());
        assert_eq!(first, second);
        assert!(first.starts_with("When this card dies, "));
        assert!(first.ends_with('.'));
    }
}

// rust_core/src/tables.rs
// Balance tables for card generation.
// Everything here is a process-wide constant: weights, stat budgets,
// ability configs, caps and prompt styling. Nothing writes to these at
// runtime, so concurrent generations read them without coordination.

use crate::models::{AbilityType, Condition, EffectType, Element, Rarity, Stat, Target};

// --- SAMPLING WEIGHTS ---

/// Rarity weights, walked in declaration order. They do not need to sum to 100.
pub static RARITY_WEIGHTS: [(Rarity, f64); 6] = [
    (Rarity::Common, 70.0),
    (Rarity::Rare, 20.0),
    (Rarity::Epic, 7.0),
    (Rarity::Legendary, 2.89),
    (Rarity::Mythic, 0.1),
    (Rarity::GodTier, 0.01),
];

/// Element weights for a rarity. Higher tiers lean toward CURSED and DANK.
pub fn element_weights(rarity: Rarity) -> &'static [(Element, f64); 4] {
    use Element::*;
    static COMMON: [(Element, f64); 4] = [(Wholesome, 40.0), (Toxic, 30.0), (Dank, 20.0), (Cursed, 10.0)];
    static RARE: [(Element, f64); 4] = [(Wholesome, 30.0), (Toxic, 30.0), (Dank, 25.0), (Cursed, 15.0)];
    static EPIC: [(Element, f64); 4] = [(Wholesome, 25.0), (Toxic, 25.0), (Dank, 30.0), (Cursed, 20.0)];
    static LEGENDARY: [(Element, f64); 4] = [(Wholesome, 20.0), (Toxic, 20.0), (Dank, 30.0), (Cursed, 30.0)];
    static MYTHIC: [(Element, f64); 4] = [(Wholesome, 15.0), (Toxic, 20.0), (Dank, 30.0), (Cursed, 35.0)];
    static GOD_TIER: [(Element, f64); 4] = [(Wholesome, 10.0), (Toxic, 20.0), (Dank, 30.0), (Cursed, 40.0)];

    match rarity {
        Rarity::Common => &COMMON,
        Rarity::Rare => &RARE,
        Rarity::Epic => &EPIC,
        Rarity::Legendary => &LEGENDARY,
        Rarity::Mythic => &MYTHIC,
        Rarity::GodTier => &GOD_TIER,
    }
}

// --- STATS ---

/// Attack + defense points before rounding and wobble.
pub fn power_budget(rarity: Rarity) -> u32 {
    match rarity {
        Rarity::Common => 8,
        Rarity::Rare => 10,
        Rarity::Epic => 12,
        Rarity::Legendary => 14,
        Rarity::Mythic => 16,
        Rarity::GodTier => 18,
    }
}

/// How an element splits its budget, in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementBias {
    pub attack_pct: u32,
    pub defense_pct: u32,
}

pub fn element_bias(element: Element) -> ElementBias {
    match element {
        Element::Wholesome => ElementBias { attack_pct: 30, defense_pct: 70 },
        Element::Toxic => ElementBias { attack_pct: 60, defense_pct: 40 },
        Element::Dank => ElementBias { attack_pct: 70, defense_pct: 30 },
        Element::Cursed => ElementBias { attack_pct: 50, defense_pct: 50 },
    }
}

// --- ABILITIES ---

/// What an ability of a given rarity may contain.
#[derive(Debug)]
pub struct AbilityConfig {
    pub max_effects: u32,
    pub max_value: u32,
    pub allowed_types: &'static [AbilityType],
    pub allowed_effect_types: &'static [EffectType],
    pub allowed_targets: &'static [Target],
    /// Inclusive `(min, max)` mana cost of the ability.
    pub cost_range: (u32, u32),
    pub limitations: &'static [&'static str],
}

const BASIC_EFFECTS: &[EffectType] = &[
    EffectType::Damage,
    EffectType::Heal,
    EffectType::Buff,
    EffectType::Debuff,
    EffectType::Draw,
    EffectType::Shield,
];

const ALL_EFFECTS: &[EffectType] = &[
    EffectType::Damage,
    EffectType::Heal,
    EffectType::Buff,
    EffectType::Debuff,
    EffectType::Draw,
    EffectType::Shield,
    EffectType::Poison,
];

const SINGLE_TARGETS: &[Target] = &[Target::SelfCard, Target::Ally, Target::Enemy];

const PLAYER_TARGETS: &[Target] = &[
    Target::SelfCard,
    Target::Ally,
    Target::Enemy,
    Target::Opponent,
    Target::Player,
];

const ALL_TARGETS: &[Target] = &[
    Target::SelfCard,
    Target::Ally,
    Target::AllAllies,
    Target::Enemy,
    Target::AllEnemies,
    Target::Opponent,
    Target::Player,
];

static COMMON_CONFIG: AbilityConfig = AbilityConfig {
    max_effects: 1,
    max_value: 2,
    allowed_types: &[AbilityType::Passive, AbilityType::EnterBattlefield],
    allowed_effect_types: BASIC_EFFECTS,
    allowed_targets: SINGLE_TARGETS,
    cost_range: (1, 2),
    limitations: &["once per turn"],
};

static RARE_CONFIG: AbilityConfig = AbilityConfig {
    max_effects: 1,
    max_value: 3,
    allowed_types: &[AbilityType::Passive, AbilityType::EnterBattlefield, AbilityType::AttackTrigger],
    allowed_effect_types: BASIC_EFFECTS,
    allowed_targets: PLAYER_TARGETS,
    cost_range: (1, 3),
    limitations: &["once per turn", "costs 1 mana"],
};

static EPIC_CONFIG: AbilityConfig = AbilityConfig {
    max_effects: 2,
    max_value: 4,
    allowed_types: &[
        AbilityType::EnterBattlefield,
        AbilityType::AttackTrigger,
        AbilityType::DeathTrigger,
        AbilityType::Activated,
    ],
    allowed_effect_types: ALL_EFFECTS,
    allowed_targets: PLAYER_TARGETS,
    cost_range: (2, 4),
    limitations: &["once per turn", "costs 1 mana"],
};

static LEGENDARY_CONFIG: AbilityConfig = AbilityConfig {
    max_effects: 2,
    max_value: 5,
    allowed_types: &[
        AbilityType::AttackTrigger,
        AbilityType::DeathTrigger,
        AbilityType::Passive,
        AbilityType::Activated,
    ],
    allowed_effect_types: ALL_EFFECTS,
    allowed_targets: ALL_TARGETS,
    cost_range: (2, 5),
    limitations: &["costs 2 mana", "once per turn & costs 1 mana"],
};

static MYTHIC_CONFIG: AbilityConfig = AbilityConfig {
    max_effects: 3,
    max_value: 6,
    allowed_types: &[
        AbilityType::EnterBattlefield,
        AbilityType::AttackTrigger,
        AbilityType::DeathTrigger,
        AbilityType::Activated,
    ],
    allowed_effect_types: ALL_EFFECTS,
    allowed_targets: ALL_TARGETS,
    cost_range: (3, 6),
    limitations: &["once per game", "costs 3 mana"],
};

static GOD_TIER_CONFIG: AbilityConfig = AbilityConfig {
    max_effects: 3,
    max_value: 8,
    allowed_types: &[
        AbilityType::EnterBattlefield,
        AbilityType::AttackTrigger,
        AbilityType::DeathTrigger,
        AbilityType::Passive,
        AbilityType::Activated,
    ],
    allowed_effect_types: ALL_EFFECTS,
    allowed_targets: ALL_TARGETS,
    cost_range: (4, 8),
    limitations: &["once per game & costs 4 mana"],
};

pub fn ability_config(rarity: Rarity) -> &'static AbilityConfig {
    match rarity {
        Rarity::Common => &COMMON_CONFIG,
        Rarity::Rare => &RARE_CONFIG,
        Rarity::Epic => &EPIC_CONFIG,
        Rarity::Legendary => &LEGENDARY_CONFIG,
        Rarity::Mythic => &MYTHIC_CONFIG,
        Rarity::GodTier => &GOD_TIER_CONFIG,
    }
}

/// Shape of an effect before its value and target are rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectTemplate {
    pub effect_type: EffectType,
    /// Fixed target; `None` means roll one from the rarity's pool.
    pub target: Option<Target>,
    pub stat: Option<Stat>,
}

const fn template(effect_type: EffectType) -> EffectTemplate {
    EffectTemplate { effect_type, target: None, stat: None }
}

const fn aimed(effect_type: EffectType, target: Target) -> EffectTemplate {
    EffectTemplate { effect_type, target: Some(target), stat: None }
}

const fn on_stat(effect_type: EffectType, stat: Stat) -> EffectTemplate {
    EffectTemplate { effect_type, target: None, stat: Some(stat) }
}

/// The effect flavor of an element.
#[derive(Debug)]
pub struct ElementSynergy {
    pub primary_effects: &'static [EffectTemplate],
    pub synergy_effects: &'static [EffectTemplate],
    pub conditions: &'static [Condition],
}

static WHOLESOME_SYNERGY: ElementSynergy = ElementSynergy {
    primary_effects: &[
        template(EffectType::Heal),
        on_stat(EffectType::Buff, Stat::Defense),
        template(EffectType::Shield),
    ],
    synergy_effects: &[
        aimed(EffectType::Draw, Target::Player),
        template(EffectType::Heal),
        on_stat(EffectType::Buff, Stat::Attack),
    ],
    conditions: &[Condition::LowHealth, Condition::AllyDied],
};

static TOXIC_SYNERGY: ElementSynergy = ElementSynergy {
    primary_effects: &[template(EffectType::Damage), on_stat(EffectType::Debuff, Stat::Defense)],
    synergy_effects: &[template(EffectType::Poison), on_stat(EffectType::Debuff, Stat::Attack)],
    conditions: &[Condition::TargetDamaged, Condition::LowHealth],
};

static DANK_SYNERGY: ElementSynergy = ElementSynergy {
    primary_effects: &[template(EffectType::Damage), aimed(EffectType::Draw, Target::Player)],
    synergy_effects: &[
        on_stat(EffectType::Buff, Stat::Attack),
        aimed(EffectType::Draw, Target::Player),
        aimed(EffectType::Damage, Target::Opponent),
    ],
    conditions: &[Condition::FullHand, Condition::ElementAdvantage],
};

static CURSED_SYNERGY: ElementSynergy = ElementSynergy {
    primary_effects: &[on_stat(EffectType::Debuff, Stat::Attack), template(EffectType::Damage)],
    synergy_effects: &[template(EffectType::Poison), aimed(EffectType::Damage, Target::Opponent)],
    conditions: &[Condition::AllyDied, Condition::TargetDamaged],
};

pub fn element_synergy(element: Element) -> &'static ElementSynergy {
    match element {
        Element::Wholesome => &WHOLESOME_SYNERGY,
        Element::Toxic => &TOXIC_SYNERGY,
        Element::Dank => &DANK_SYNERGY,
        Element::Cursed => &CURSED_SYNERGY,
    }
}

/// Chance that a rolled primary effect picks up a condition.
pub const CONDITION_CHANCE: f64 = 1.0 / 3.0;

/// Maximum value an effect of this type may carry at this rarity.
pub fn balance_cap(effect_type: EffectType, rarity: Rarity) -> u32 {
    // Columns: COMMON, RARE, EPIC, LEGENDARY, MYTHIC, GOD_TIER
    let row: [u32; 6] = match effect_type {
        EffectType::Damage => [2, 3, 4, 5, 6, 8],
        EffectType::Heal => [3, 4, 5, 6, 7, 9],
        EffectType::Buff => [2, 3, 4, 5, 6, 7],
        EffectType::Debuff => [2, 3, 4, 5, 6, 7],
        EffectType::Draw => [1, 1, 2, 2, 3, 3],
        EffectType::Shield => [2, 3, 4, 5, 6, 7],
        EffectType::Poison => [1, 2, 2, 3, 4, 5],
    };
    row[rarity as usize]
}

// --- PROMPTS ---

/// Adjective used when asking for an ability name.
pub fn power_word(rarity: Rarity) -> &'static str {
    match rarity {
        Rarity::Common => "basic",
        Rarity::Rare => "moderate",
        Rarity::Epic => "powerful",
        Rarity::Legendary => "very powerful",
        Rarity::Mythic => "extremely powerful",
        Rarity::GodTier => "game-changing",
    }
}

/// Art direction handed to the image backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStyle {
    pub style: &'static str,
    pub guidance_scale: f64,
    pub inference_steps: u32,
}

pub fn image_style(rarity: Rarity) -> ImageStyle {
    let style = match rarity {
        Rarity::Common => "simple meme style",
        Rarity::Rare => "detailed meme artwork",
        Rarity::Epic => "high-quality digital art",
        Rarity::Legendary => "premium fantasy artwork",
        Rarity::Mythic => "ethereal masterpiece",
        Rarity::GodTier => "divine cosmic artwork",
    };
    let (guidance_scale, inference_steps) = match rarity {
        Rarity::GodTier => (9.5, 70),
        Rarity::Mythic => (8.5, 60),
        _ => (7.5, 50),
    };
    ImageStyle { style, guidance_scale, inference_steps }
}

pub const IMAGE_SIZE: u32 = 768;
pub const NEGATIVE_PROMPT: &str = "text, watermark, logo, low quality, blurry, distorted";

// rust_core/src/models.rs
// Models for the meme card game, as they travel between the generator,
// the Python bridge and the JSON wire.
// Rarity, element, trigger and effect kinds are closed enums: a card with
// an "ULTRA_RARE" rarity or a "SPICY" element cannot be constructed or
// deserialized.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Image path used whenever no usable illustration came back.
pub const PLACEHOLDER_IMAGE_PATH: &str = "/api/placeholder/400/400";

// --- ENUMS ---

/// Power tier, ordered from weakest to strongest.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
    GodTier,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
        Rarity::GodTier,
    ];

    /// Wire name, e.g. `GOD_TIER`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "COMMON",
            Rarity::Rare => "RARE",
            Rarity::Epic => "EPIC",
            Rarity::Legendary => "LEGENDARY",
            Rarity::Mythic => "MYTHIC",
            Rarity::GodTier => "GOD_TIER",
        }
    }

    /// Human name used in prompts and fallback names, e.g. `God Tier`.
    pub fn title(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
            Rarity::GodTier => "God Tier",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four factions. Each one beats exactly one other and loses to exactly one other.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Element {
    Wholesome,
    Toxic,
    Dank,
    Cursed,
}

impl Element {
    pub const ALL: [Element; 4] = [Element::Wholesome, Element::Toxic, Element::Dank, Element::Cursed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Wholesome => "WHOLESOME",
            Element::Toxic => "TOXIC",
            Element::Dank => "DANK",
            Element::Cursed => "CURSED",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Element::Wholesome => "Wholesome",
            Element::Toxic => "Toxic",
            Element::Dank => "Dank",
            Element::Cursed => "Cursed",
        }
    }

    /// The element this one deals +50% damage to.
    pub fn strong_against(&self) -> Element {
        match self {
            Element::Wholesome => Element::Cursed,
            Element::Toxic => Element::Wholesome,
            Element::Dank => Element::Toxic,
            Element::Cursed => Element::Dank,
        }
    }

    /// The element this one deals -25% damage to.
    pub fn weak_against(&self) -> Element {
        match self {
            Element::Wholesome => Element::Toxic,
            Element::Toxic => Element::Dank,
            Element::Dank => Element::Cursed,
            Element::Cursed => Element::Wholesome,
        }
    }

    /// Multiplier applied to damage when a card of this element attacks `defender`.
    pub fn damage_multiplier(&self, defender: Element) -> f64 {
        if self.strong_against() == defender {
            1.5
        } else if self.weak_against() == defender {
            0.75
        } else {
            1.0
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When an ability fires.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbilityType {
    EnterBattlefield,
    AttackTrigger,
    DeathTrigger,
    Passive,
    Activated,
}

impl AbilityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbilityType::EnterBattlefield => "ENTER_BATTLEFIELD",
            AbilityType::AttackTrigger => "ATTACK_TRIGGER",
            AbilityType::DeathTrigger => "DEATH_TRIGGER",
            AbilityType::Passive => "PASSIVE",
            AbilityType::Activated => "ACTIVATED",
        }
    }
}

/// What a single effect does.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectType {
    Damage,
    Heal,
    Buff,
    Debuff,
    Draw,
    Shield,
    Poison,
}

impl EffectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectType::Damage => "DAMAGE",
            EffectType::Heal => "HEAL",
            EffectType::Buff => "BUFF",
            EffectType::Debuff => "DEBUFF",
            EffectType::Draw => "DRAW",
            EffectType::Shield => "SHIELD",
            EffectType::Poison => "POISON",
        }
    }

    /// Friendly effects land on your side of the table, the rest on the opponent's.
    pub fn is_beneficial(&self) -> bool {
        matches!(
            self,
            EffectType::Heal | EffectType::Buff | EffectType::Draw | EffectType::Shield
        )
    }

    /// Target used when neither the template nor the rarity's target pool picks one.
    pub fn default_target(&self) -> Target {
        match self {
            EffectType::Damage => Target::Opponent,
            EffectType::Heal => Target::AllAllies,
            EffectType::Buff => Target::Ally,
            EffectType::Debuff => Target::Enemy,
            EffectType::Draw => Target::Player,
            EffectType::Shield => Target::SelfCard,
            EffectType::Poison => Target::Enemy,
        }
    }
}

/// Who or what an effect lands on.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Target {
    #[serde(rename = "SELF")]
    SelfCard,
    Ally,
    AllAllies,
    Enemy,
    AllEnemies,
    Opponent,
    Player,
}

impl Target {
    pub fn is_friendly(&self) -> bool {
        matches!(
            self,
            Target::SelfCard | Target::Ally | Target::AllAllies | Target::Player
        )
    }

    /// Rules-text rendering, e.g. `all enemy cards`.
    pub fn phrase(&self) -> &'static str {
        match self {
            Target::SelfCard => "this card",
            Target::Ally => "an allied card",
            Target::AllAllies => "all your cards",
            Target::Enemy => "an enemy card",
            Target::AllEnemies => "all enemy cards",
            Target::Opponent => "your opponent",
            Target::Player => "you",
        }
    }
}

/// Extra qualifier that must hold for an effect to resolve.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    LowHealth,
    TargetDamaged,
    AllyDied,
    FullHand,
    ElementAdvantage,
}

impl Condition {
    pub fn phrase(&self) -> &'static str {
        match self {
            Condition::LowHealth => "if you have 10 or less health",
            Condition::TargetDamaged => "if the target is damaged",
            Condition::AllyDied => "if an allied card died this turn",
            Condition::FullHand => "if you have 5 or more cards in hand",
            Condition::ElementAdvantage => "if the target is weak to this card's element",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stat {
    Attack,
    Defense,
}

impl Stat {
    pub fn phrase(&self) -> &'static str {
        match self {
            Stat::Attack => "attack",
            Stat::Defense => "defense",
        }
    }
}

// --- STRUCTS ---

/// Which stat a buff/debuff touches and for how many turns.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct EffectMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<Stat>,
    pub duration: u32,
}

/// One atomic action of an ability.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct AbilityEffect {
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    pub value: u32,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EffectMetadata>,
}

/// A fully synthesized ability. `effects` is never empty.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Ability {
    pub name: String,
    #[serde(rename = "type")]
    pub ability_type: AbilityType,
    pub effects: Vec<AbilityEffect>,
    pub limitation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u32>,
}

/// Derived combat numbers.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct Stats {
    pub attack: u32,
    pub defense: u32,
    pub cost: u32,
}

/// The `stats` object of a card on the wire.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CardStats {
    pub attack: u32,
    pub defense: u32,
    pub cost: u32,
    pub element: Element,
    pub rarity: Rarity,
    pub ability_name: String,
    pub ability_description: String,
    pub ability_type: AbilityType,
    /// Always `effects[0]`; kept for consumers that predate multi-effect abilities.
    pub effect: AbilityEffect,
    pub effects: Vec<AbilityEffect>,
    pub limitation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability_cost: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u32>,
}

/// The finished card handed back to callers.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Card {
    pub name: String,
    pub stats: CardStats,
    pub image_path: String,
    pub flavor_text: String,
}

// --- IMAGES ---

/// What the image backend gave us, decided once at the service boundary.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ImageReference {
    Url(String),
    /// Raw image bytes and the MIME type they arrived with.
    InlineData { mime: String, bytes: Vec<u8> },
    Placeholder,
}

impl ImageReference {
    /// Wraps bytes whose format is recognized from their leading signature.
    pub fn sniffed(bytes: Vec<u8>) -> Option<Self> {
        let mime = sniff_image_mime(&bytes)?;
        Some(ImageReference::InlineData { mime: mime.to_string(), bytes })
    }

    /// Renders the reference into the card's `image_path`.
    pub fn to_image_path(&self) -> String {
        match self {
            ImageReference::Url(url) => url.clone(),
            ImageReference::InlineData { mime, bytes } => {
                format!("data:{};base64,{}", mime, BASE64.encode(bytes))
            }
            ImageReference::Placeholder => PLACEHOLDER_IMAGE_PATH.to_string(),
        }
    }
}

/// MIME type of a PNG, JPEG, GIF or WebP payload, judged by its magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

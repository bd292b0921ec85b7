// rust_core/src/generator.rs
// Card assembly: roll everything random first, then dress the roll with
// names, flavor and art from the generative backends.
// Backend failures never escape from here. Each one is logged and swapped
// for a typed default, so callers get a complete card or a configuration
// error, never half a card.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ability::{name_ability, roll_balanced, AbilityBlueprint, BalancePolicy};
use crate::describe::format_description;
use crate::dice::{self, Dice};
use crate::error::GenerationError;
use crate::models::{Card, CardStats, Element, ImageReference, Rarity, Stats};
use crate::sampler::{sample_element, sample_rarity};
use crate::services::{
    card_name_prompt, clean_reply, flavor_prompt, image_prompt_request, ImageOptions, ImageService,
    TextOptions, TextService, FLAVOR_SYSTEM, NAME_SYSTEM,
};
use crate::stats::derive_stats;
use crate::tables::image_style;

pub const DEFAULT_FLAVOR_TEXT: &str = "Such meme, much wow!";

/// Name used when the text backend cannot supply one, e.g. `Dank Common Meme`.
pub fn fallback_card_name(element: Element, rarity: Rarity) -> String {
    format!("{} {} Meme", element.title(), rarity.title())
}

/// Everything random about a card, before any backend is asked for anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRoll {
    pub rarity: Rarity,
    pub element: Element,
    pub stats: Stats,
    pub ability: AbilityBlueprint,
}

/// Result of probing both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub text: bool,
    pub image: bool,
}

pub struct CardGenerator<T, I> {
    text: T,
    image: I,
    policy: BalancePolicy,
}

impl<T: TextService, I: ImageService> CardGenerator<T, I> {
    pub fn new(text: T, image: I) -> Self {
        Self {
            text,
            image,
            policy: BalancePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BalancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Rarity, element, stats and ability structure. Synchronous and pure apart from the dice.
    pub fn roll(&self, dice: &mut impl Dice) -> Result<CardRoll, GenerationError> {
        let rarity = sample_rarity(dice);
        let element = sample_element(rarity, dice);
        let stats = derive_stats(element, rarity, dice);
        let ability = roll_balanced(element, rarity, self.policy, dice)?;
        Ok(CardRoll {
            rarity,
            element,
            stats,
            ability,
        })
    }

    /// Generates a card from fresh entropy.
    pub async fn generate_card(&self) -> Result<Card, GenerationError> {
        let roll = self.roll(&mut dice::fresh())?;
        self.dress(roll).await
    }

    /// Same seed, same roll. Backend output may still differ between runs.
    pub async fn generate_card_seeded(&self, seed: u64) -> Result<Card, GenerationError> {
        let roll = self.roll(&mut dice::seeded(seed))?;
        self.dress(roll).await
    }

    pub async fn generate_card_with(&self, dice: &mut (impl Dice + Send)) -> Result<Card, GenerationError> {
        let roll = self.roll(dice)?;
        self.dress(roll).await
    }

    /// Asks the backends for names, flavor and art, then assembles the card.
    pub async fn dress(&self, roll: CardRoll) -> Result<Card, GenerationError> {
        let CardRoll {
            rarity,
            element,
            stats,
            ability,
        } = roll;

        let ability_name = name_ability(&self.text, element, rarity, &ability).await;
        let name = self.card_name(element, rarity).await;
        let flavor_text = self.flavor_text(&name, element).await;
        let image = self.illustrate(&name, element, rarity).await;

        let ability = ability.into_ability(ability_name);
        let effect = ability
            .effects
            .first()
            .cloned()
            .ok_or_else(|| GenerationError::Configuration("ability rolled without effects".into()))?;
        let ability_description = format_description(&ability);

        let card = Card {
            name,
            stats: CardStats {
                attack: stats.attack,
                defense: stats.defense,
                cost: stats.cost,
                element,
                rarity,
                ability_name: ability.name,
                ability_description,
                ability_type: ability.ability_type,
                effect,
                effects: ability.effects,
                limitation: ability.limitation,
                ability_cost: ability.cost,
                cooldown: ability.cooldown,
            },
            image_path: image.to_image_path(),
            flavor_text,
        };

        info!(name = %card.name, %rarity, %element, "card generated");
        Ok(card)
    }

    pub async fn check_connections(&self) -> ConnectionReport {
        let (text, image) = tokio::join!(self.text.ping(), self.image.ping());
        if let Err(e) = &text {
            warn!(error = %e, "text backend check failed");
        }
        if let Err(e) = &image {
            warn!(error = %e, "image backend check failed");
        }
        ConnectionReport {
            text: text.is_ok(),
            image: image.is_ok(),
        }
    }

    async fn card_name(&self, element: Element, rarity: Rarity) -> String {
        let options = TextOptions::new(50, 0.7).with_system(NAME_SYSTEM);
        match self.text.complete(&card_name_prompt(element, rarity), &options).await {
            Ok(raw) => clean_reply(&raw).unwrap_or_else(|| fallback_card_name(element, rarity)),
            Err(e) => {
                warn!(error = %e, "card name generation failed, using fallback");
                fallback_card_name(element, rarity)
            }
        }
    }

    async fn flavor_text(&self, name: &str, element: Element) -> String {
        let options = TextOptions::new(50, 0.8).with_system(FLAVOR_SYSTEM);
        match self.text.complete(&flavor_prompt(name, element), &options).await {
            Ok(raw) => clean_reply(&raw).unwrap_or_else(|| DEFAULT_FLAVOR_TEXT.to_string()),
            Err(e) => {
                warn!(error = %e, "flavor text generation failed, using fallback");
                DEFAULT_FLAVOR_TEXT.to_string()
            }
        }
    }

    async fn illustrate(&self, name: &str, element: Element, rarity: Rarity) -> ImageReference {
        let style = image_style(rarity);
        let fallback_prompt = format!("{} {} card illustration", style.style, element);

        let request = image_prompt_request(name, element, rarity, &style);
        let prompt = match self.text.complete(&request, &TextOptions::new(100, 0.7)).await {
            Ok(raw) => clean_reply(&raw).unwrap_or(fallback_prompt),
            Err(e) => {
                warn!(error = %e, "image prompt generation failed, using style prompt");
                fallback_prompt
            }
        };

        match self.image.generate(&prompt, &ImageOptions::for_style(&style)).await {
            Ok(reference) => reference,
            Err(e) => {
                warn!(error = %e, "image generation failed, using placeholder");
                ImageReference::Placeholder
            }
        }
    }
}

// --- TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::error::ServiceError;
    use crate::models::{AbilityType, EffectType, Target, PLACEHOLDER_IMAGE_PATH};
    use crate::services::{normalize_image_output, Offline};
    use crate::stats::{MAX_COST, MIN_COST};
    use crate::tables::balance_cap;
    use serde_json::json;
    use std::sync::Arc;

    /// Answers by looking at what the prompt asks for.
    struct CannedText;

    impl TextService for CannedText {
        async fn complete(&self, prompt: &str, _options: &TextOptions) -> Result<String, ServiceError> {
            let reply = if prompt.contains("ability name") {
                "Name: Much Doge"
            } else if prompt.contains("name for a") {
                "Doge Supreme"
            } else if prompt.contains("flavor text") {
                "Much wow"
            } else {
                "a doge in sunglasses"
            };
            Ok(reply.to_string())
        }
    }

    struct FailingText;

    impl TextService for FailingText {
        async fn complete(&self, _prompt: &str, _options: &TextOptions) -> Result<String, ServiceError> {
            Err(ServiceError::Unavailable("connection refused".into()))
        }
    }

    struct CannedImage(&'static str);

    impl ImageService for CannedImage {
        async fn generate(&self, _prompt: &str, _options: &ImageOptions) -> Result<ImageReference, ServiceError> {
            Ok(ImageReference::Url(self.0.to_string()))
        }
    }

    /// Mimics a backend whose payload shape we do not understand.
    struct WeirdImage;

    impl ImageService for WeirdImage {
        async fn generate(&self, _prompt: &str, _options: &ImageOptions) -> Result<ImageReference, ServiceError> {
            normalize_image_output(&json!({ "frames": [[0, 1], [2, 3]], "fps": 12 }))
        }
    }

    fn assert_valid(card: &Card) {
        let s = &card.stats;
        assert!(s.attack >= 1 && s.defense >= 1);
        assert!((MIN_COST..=MAX_COST).contains(&s.cost));
        assert!(!card.name.is_empty());
        assert!(!card.flavor_text.is_empty());
        assert!(!card.image_path.is_empty());
        assert!(!s.ability_name.is_empty());
        assert!(!s.limitation.is_empty());
        assert!(s.ability_description.ends_with('.'));
        assert_eq!(s.effect, s.effects[0]);
        for effect in &s.effects {
            assert!(effect.value <= balance_cap(effect.effect_type, s.rarity));
        }
    }

    #[tokio::test]
    async fn test_pinned_card() {
        // rarity 0.05 -> COMMON, element 0.8 -> DANK, wobble 0.5 -> none,
        // primary 0.0 -> DAMAGE, value 0.9 -> 2, target 0.0 -> ENEMY,
        // condition 0.9 -> none, trigger 0.9 -> ENTER_BATTLEFIELD, limitation 0.0
        let mut dice = ScriptedDice::new(vec![0.05, 0.8, 0.5, 0.0, 0.9, 0.0, 0.9, 0.9, 0.0]);
        let generator = CardGenerator::new(CannedText, CannedImage("http://img/x.png"));

        let card = generator.generate_card_with(&mut dice).await.unwrap();
        assert_eq!(dice.consumed(), 9);

        assert_eq!(card.name, "Doge Supreme");
        assert_eq!(card.flavor_text, "Much wow");
        assert_eq!(card.image_path, "http://img/x.png");

        let s = &card.stats;
        assert_eq!((s.attack, s.defense, s.cost), (6, 3, 3));
        assert_eq!(s.element, Element::Dank);
        assert_eq!(s.rarity, Rarity::Common);
        assert_eq!(s.ability_name, "Much Doge");
        assert_eq!(s.ability_type, AbilityType::EnterBattlefield);
        assert_eq!(s.effect.effect_type, EffectType::Damage);
        assert_eq!(s.effect.value, 2);
        assert_eq!(s.effect.target, Target::Enemy);
        assert_eq!(s.effect.condition, None);
        assert_eq!(s.limitation, "once per turn");
        assert_eq!(s.ability_cost, Some(1));
        assert_eq!(s.cooldown, None);
        assert_eq!(
            s.ability_description,
            "When this card enters the battlefield, deal 2 damage to an enemy card. Once per turn."
        );

        let wire = serde_json::to_value(&card).unwrap();
        assert_eq!(wire["stats"]["rarity"], "COMMON");
        assert_eq!(wire["stats"]["element"], "DANK");
        assert_eq!(wire["stats"]["effect"]["type"], "DAMAGE");
        assert_eq!(wire["stats"]["effect"]["target"], "ENEMY");
        assert_eq!(wire["stats"]["ability_type"], "ENTER_BATTLEFIELD");
        assert_eq!(wire["image_path"], "http://img/x.png");
    }

    #[tokio::test]
    async fn test_failing_text_backend_uses_defaults() {
        let generator = CardGenerator::new(FailingText, CannedImage("http://img/x.png"));
        for seed in 0..25 {
            let card = generator.generate_card_seeded(seed).await.unwrap();
            assert_valid(&card);
            let s = &card.stats;
            assert_eq!(card.name, fallback_card_name(s.element, s.rarity));
            assert_eq!(card.flavor_text, DEFAULT_FLAVOR_TEXT);
            assert_eq!(s.ability_name, format!("{} Power", s.element.title()));
            // The image backend still works with the style prompt.
            assert_eq!(card.image_path, "http://img/x.png");
        }
    }

    #[tokio::test]
    async fn test_unrecognized_image_payload_becomes_placeholder() {
        let generator = CardGenerator::new(CannedText, WeirdImage);
        let card = generator.generate_card_seeded(7).await.unwrap();
        assert_eq!(card.image_path, PLACEHOLDER_IMAGE_PATH);
        assert_valid(&card);
    }

    #[tokio::test]
    async fn test_seed_reproduces_the_card() {
        let generator = CardGenerator::new(CannedText, CannedImage("http://img/x.png"));
        let a = generator.generate_card_seeded(4242).await.unwrap();
        let b = generator.generate_card_seeded(4242).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_concurrent_generations_are_independent() {
        let generator = Arc::new(CardGenerator::new(Offline, Offline));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let generator = Arc::clone(&generator);
                tokio::spawn(async move { generator.generate_card().await })
            })
            .collect();

        for handle in handles {
            let card = handle.await.unwrap().unwrap();
            assert_valid(&card);
            assert_eq!(card.image_path, PLACEHOLDER_IMAGE_PATH);
        }
    }

    #[tokio::test]
    async fn test_check_connections() {
        let offline = CardGenerator::new(Offline, Offline);
        assert_eq!(
            offline.check_connections().await,
            ConnectionReport { text: false, image: false }
        );
        let canned = CardGenerator::new(CannedText, CannedImage("http://img/x.png"));
        assert_eq!(
            canned.check_connections().await,
            ConnectionReport { text: true, image: true }
        );
    }
}

// rust_core/src/lib.rs
// Rust core library for the meme trading-card engine.
// The engine rolls rarity, element, stats and a balanced ability from a
// random source, then asks a text backend and an image backend to dress
// the card. With the `python` feature this crate also builds as a Python
// extension module; every exported function takes and returns JSON strings.

pub mod ability;
pub mod clients;
pub mod config;
pub mod describe;
pub mod dice;
pub mod error;
pub mod generator;
pub mod models;
pub mod rules;
pub mod sampler;
pub mod services;
pub mod stats;
pub mod tables;

pub use ability::BalancePolicy;
pub use clients::LiveGenerator;
pub use config::GeneratorConfig;
pub use error::{ConfigError, GenerationError, ServiceError};
pub use generator::{CardGenerator, ConnectionReport};
pub use models::{Ability, Card, CardStats, Element, ImageReference, Rarity};
pub use rules::{Judge, Ruling};
pub use services::{ImageService, Offline, TextService};

/// Parses an ability from JSON and renders its rules text.
pub fn describe_ability_json(payload: &str) -> Result<String, serde_json::Error> {
    let ability: Ability = serde_json::from_str(payload)?;
    Ok(describe::format_description(&ability))
}

#[cfg(any(feature = "python", test))]
fn error_payload(message: impl std::fmt::Display) -> String {
    serde_json::json!({ "status": "error", "message": message.to_string() }).to_string()
}

// --- PYTHON BRIDGE ---

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;
    use std::sync::OnceLock;
    use tokio::runtime::Runtime;

    use super::{describe_ability_json, error_payload, GeneratorConfig, LiveGenerator};

    // Tokio Runtime (Heavy: Thread Pool)
    // Created once, reused for all async calls.
    static RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();

    fn get_runtime() -> Result<&'static Runtime, String> {
        RUNTIME
            .get_or_init(|| Runtime::new().map_err(|e| format!("Failed to create Tokio Runtime: {}", e)))
            .as_ref()
            .map_err(Clone::clone)
    }

    // The generator holds the shared HTTP client, so it lives as long as the module.
    // A missing key is remembered and reported on every call instead of panicking.
    static GENERATOR: OnceLock<Result<LiveGenerator, String>> = OnceLock::new();

    fn get_generator() -> Result<&'static LiveGenerator, String> {
        GENERATOR
            .get_or_init(|| {
                GeneratorConfig::from_env()
                    .and_then(|config| LiveGenerator::from_config(&config))
                    .map_err(|e| format!("Configuration Error: {}", e))
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    fn run_generation(seed: Option<u64>) -> Result<String, String> {
        let rt = get_runtime()?;
        let generator = get_generator()?;

        let card = rt
            .block_on(async {
                match seed {
                    Some(seed) => generator.generate_card_seeded(seed).await,
                    None => generator.generate_card().await,
                }
            })
            .map_err(|e| e.to_string())?;

        serde_json::to_string(&card).map_err(|e| format!("Serialization Error: {}", e))
    }

    #[pyfunction]
    fn generate_card() -> PyResult<String> {
        Ok(run_generation(None).unwrap_or_else(error_payload))
    }

    #[pyfunction]
    fn generate_card_seeded(seed: u64) -> PyResult<String> {
        Ok(run_generation(Some(seed)).unwrap_or_else(error_payload))
    }

    #[pyfunction]
    fn format_ability(json_payload: String) -> PyResult<String> {
        Ok(describe_ability_json(&json_payload)
            .unwrap_or_else(|e| error_payload(format!("JSON Parse Error: {}", e))))
    }

    #[pyfunction]
    fn check_connections() -> PyResult<String> {
        let report = get_runtime().and_then(|rt| {
            let generator = get_generator()?;
            let report = rt.block_on(generator.check_connections());
            serde_json::to_string(&report).map_err(|e| e.to_string())
        });
        Ok(report.unwrap_or_else(error_payload))
    }

    #[pymodule]
    fn meme_card_core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(generate_card, m)?)?;
        m.add_function(wrap_pyfunction!(generate_card_seeded, m)?)?;
        m.add_function(wrap_pyfunction!(format_ability, m)?)?;
        m.add_function(wrap_pyfunction!(check_connections, m)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_describe_ability_json() {
        // Scenario: a Python caller hands over an ability in wire shape.
        let payload = json!({
            "name": "Much Doge",
            "type": "ENTER_BATTLEFIELD",
            "effects": [{ "type": "DAMAGE", "value": 2, "target": "ENEMY" }],
            "limitation": "once per turn"
        })
        .to_string();

        assert_eq!(
            describe_ability_json(&payload).unwrap(),
            "When this card enters the battlefield, deal 2 damage to an enemy card. Once per turn."
        );
    }

    #[test]
    fn test_bad_payload_becomes_error_json() {
        let err = describe_ability_json("{ not json").unwrap_err();
        let body: Value = serde_json::from_str(&error_payload(err)).unwrap();
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().len() > 0);
    }
}

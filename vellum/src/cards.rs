//! Atomic-section (card) registry
//!
//! Cards are atomic sections with a named schema and an opaque payload the
//! core does not interpret. The session is configured with the set of
//! schemas it understands; anything else is routed through a fallback
//! handler whose contract is to either produce a substitute section or
//! signal unrecoverable failure. The default fallback fails loudly —
//! silently dropping content is treated as worse than a hard stop.

use crate::post::Section;
use hashbrown::HashMap;
use serde_json::Value;
use thiserror::Error;

/// Payload validator for a registered card schema
pub type CardValidator = Box<dyn Fn(&Value) -> Result<(), String>>;

/// Handler for card schemas the registry does not recognize
///
/// Returns a substitute section, or `None` to decline (which surfaces as
/// [`CardError::UnknownCard`]).
pub type UnknownCardFallback = Box<dyn Fn(&str, &Value) -> Option<Section>>;

/// Errors produced while resolving an atomic section against the registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    /// The schema is not registered and the fallback declined to substitute
    #[error("unknown card schema '{name}' and the fallback handler declined it")]
    UnknownCard {
        /// The unrecognized schema name
        name: String,
    },

    /// A registered schema rejected its payload
    #[error("invalid payload for card '{name}': {reason}")]
    InvalidPayload {
        /// The schema name
        name: String,
        /// Validator diagnostic
        reason: String,
    },
}

/// Name-keyed registry of the card schemas a session understands
pub struct CardRegistry {
    validators: HashMap<String, Option<CardValidator>>,
    fallback: UnknownCardFallback,
}

impl CardRegistry {
    /// Create a registry with no schemas and the fail-loud default fallback
    pub fn new() -> Self {
        Self {
            validators: HashMap::new(),
            fallback: Box::new(|_, _| None),
        }
    }

    /// Register a schema that accepts any payload
    pub fn register(&mut self, name: impl Into<String>) {
        self.validators.insert(name.into(), None);
    }

    /// Register a schema with a payload validator
    pub fn register_with(&mut self, name: impl Into<String>, validator: CardValidator) {
        self.validators.insert(name.into(), Some(validator));
    }

    /// Replace the unknown-schema fallback
    pub fn set_fallback(&mut self, fallback: UnknownCardFallback) {
        self.fallback = fallback;
    }

    /// Whether a schema name is registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Resolve a named payload into a section
    ///
    /// # Returns
    /// * `Ok(Section)` - A card section for registered schemas, or the
    ///   fallback's substitute for unknown ones
    /// * `Err(CardError)` - Unknown schema with a declining fallback, or a
    ///   payload the schema's validator rejected
    pub fn resolve(&self, name: &str, payload: &Value) -> Result<Section, CardError> {
        match self.validators.get(name) {
            Some(validator) => {
                if let Some(validate) = validator {
                    validate(payload).map_err(|reason| CardError::InvalidPayload {
                        name: name.to_string(),
                        reason,
                    })?;
                }
                Ok(Section::Card {
                    name: name.to_string(),
                    payload: payload.clone(),
                })
            }
            None => match (self.fallback)(name, payload) {
                Some(substitute) => {
                    log::warn!("substituting unknown card schema '{}'", name);
                    Ok(substitute)
                }
                None => Err(CardError::UnknownCard {
                    name: name.to_string(),
                }),
            },
        }
    }
}

impl Default for CardRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registered_schema_resolves_to_card_section() {
        // Arrange: a registry knowing one schema
        let mut registry = CardRegistry::new();
        registry.register("embed");

        // Act
        let section = registry.resolve("embed", &json!({"url": "x"})).unwrap();

        // Assert: card section with the payload passed through
        assert_eq!(
            section,
            Section::Card {
                name: "embed".to_string(),
                payload: json!({"url": "x"}),
            }
        );
    }

    #[test]
    fn test_default_fallback_fails_loudly() {
        // Arrange: an empty registry
        let registry = CardRegistry::new();

        // Act
        let result = registry.resolve("mystery", &Value::Null);

        // Assert: unknown schema is an error, not silent loss
        assert_eq!(
            result,
            Err(CardError::UnknownCard {
                name: "mystery".to_string()
            })
        );
    }

    #[test]
    fn test_substituting_fallback_produces_the_substitute() {
        // Arrange: a fallback that degrades unknown cards to a paragraph
        let mut registry = CardRegistry::new();
        registry.set_fallback(Box::new(|name, _| {
            Some(Section::paragraph_with_text(format!("[missing: {name}]")))
        }));

        // Act
        let section = registry.resolve("mystery", &Value::Null).unwrap();

        // Assert
        assert_eq!(section.plain_text(), "[missing: mystery]");
    }

    #[test]
    fn test_validator_rejection_propagates() {
        // Arrange: a schema requiring an object payload
        let mut registry = CardRegistry::new();
        registry.register_with(
            "strict",
            Box::new(|payload| {
                if payload.is_object() {
                    Ok(())
                } else {
                    Err("payload must be an object".to_string())
                }
            }),
        );

        // Act
        let result = registry.resolve("strict", &Value::Null);

        // Assert
        assert_eq!(
            result,
            Err(CardError::InvalidPayload {
                name: "strict".to_string(),
                reason: "payload must be an object".to_string(),
            })
        );
    }
}

//! Static encounter and item tables shared read-only by every session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ActionId, ConditionDescriptor, EncounterId, ItemId, TriggerDescriptor};

/// Tag marking encounters that are placed on the map as houses.
pub const HOUSE_TAG: &str = "house";
/// Tag marking encounters that are placed along corridors.
pub const WANDERING_TAG: &str = "wandering";
/// Tag marking items every character starts with.
pub const STARTER_TAG: &str = "starter";

/// How a chosen action is recorded against the house that offered it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// The action is neither a trick nor a treat.
    #[default]
    Neutral,
    /// The visitor played a trick on the house.
    Trick,
    /// The visitor accepted a treat from the house.
    Treat,
}

/// Choice offered to a character while an encounter is pending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Identifier submitted by participants to pick this action.
    pub id: ActionId,
    /// Display text shown on the controller.
    pub text: String,
    /// Gates that must pass before the action may be chosen.
    #[serde(default)]
    pub conditions: Vec<ConditionDescriptor>,
    /// Effects applied when the action resolves.
    #[serde(default)]
    pub triggers: Vec<TriggerDescriptor>,
    /// Trick/treat bookkeeping applied when chosen at a house.
    #[serde(default)]
    pub stance: Stance,
    /// Encounter chained after this action resolves.
    #[serde(default)]
    pub next: Option<EncounterId>,
}

/// Encounter definition as authored in the content tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterDescriptor {
    /// Unique identifier of the encounter.
    pub id: EncounterId,
    /// Display text shown when the encounter starts.
    pub text: String,
    /// Choices offered once the encounter has started.
    #[serde(default)]
    pub actions: Vec<ActionDescriptor>,
    /// Gates that must pass before the encounter starts.
    #[serde(default)]
    pub conditions: Vec<ConditionDescriptor>,
    /// Effects applied when the encounter starts.
    #[serde(default)]
    pub triggers: Vec<TriggerDescriptor>,
    /// Free-form labels used for placement and grouping.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl EncounterDescriptor {
    /// Reports whether the encounter carries the provided tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }

    /// Looks up one of the encounter's actions.
    #[must_use]
    pub fn action(&self, id: &ActionId) -> Option<&ActionDescriptor> {
        self.actions.iter().find(|action| &action.id == id)
    }
}

/// Item definition as authored in the content tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    /// Unique identifier of the item.
    pub id: ItemId,
    /// Display text shown in inventories.
    pub text: String,
    /// Follow-up choices authored for the item.
    #[serde(default)]
    pub actions: Vec<ActionDescriptor>,
    /// Gates that must pass before the item may be used.
    #[serde(default)]
    pub conditions: Vec<ConditionDescriptor>,
    /// Effects applied when the item is used.
    #[serde(default)]
    pub triggers: Vec<TriggerDescriptor>,
    /// Free-form labels used for grouping.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Items flagged reusable stay in the inventory after use.
    #[serde(default)]
    pub reusable: bool,
}

impl ItemDescriptor {
    /// Reports whether the item carries the provided tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}

/// Problems detected while loading content tables.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The document could not be parsed.
    #[error("content tables are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// Two encounters share an identifier.
    #[error("encounter `{0}` is defined more than once")]
    DuplicateEncounter(EncounterId),
    /// Two items share an identifier.
    #[error("item `{0}` is defined more than once")]
    DuplicateItem(ItemId),
    /// An action chains into an encounter that does not exist.
    #[error("action `{action}` of encounter `{encounter}` chains into unknown encounter `{next}`")]
    DanglingChain {
        /// Encounter owning the action.
        encounter: EncounterId,
        /// Action carrying the chain.
        action: ActionId,
        /// Missing chained encounter.
        next: EncounterId,
    },
}

#[derive(Deserialize)]
struct ContentDocument {
    #[serde(default)]
    encounters: Vec<EncounterDescriptor>,
    #[serde(default)]
    items: Vec<ItemDescriptor>,
}

/// Read-only encounter and item tables keyed by identifier.
#[derive(Clone, Debug, Default)]
pub struct ContentTables {
    encounters: BTreeMap<EncounterId, EncounterDescriptor>,
    items: BTreeMap<ItemId, ItemDescriptor>,
}

impl ContentTables {
    /// Parses a `{ "encounters": [...], "items": [...] }` document.
    pub fn from_json_str(source: &str) -> Result<Self, ContentError> {
        let document: ContentDocument = serde_json::from_str(source)?;
        Self::from_descriptors(document.encounters, document.items)
    }

    /// Builds validated tables from already-parsed descriptors.
    pub fn from_descriptors(
        encounters: Vec<EncounterDescriptor>,
        items: Vec<ItemDescriptor>,
    ) -> Result<Self, ContentError> {
        let mut tables = Self::default();

        for encounter in encounters {
            let id = encounter.id.clone();
            if tables.encounters.insert(id.clone(), encounter).is_some() {
                return Err(ContentError::DuplicateEncounter(id));
            }
        }
        for item in items {
            let id = item.id.clone();
            if tables.items.insert(id.clone(), item).is_some() {
                return Err(ContentError::DuplicateItem(id));
            }
        }

        for encounter in tables.encounters.values() {
            for action in &encounter.actions {
                let Some(next) = &action.next else {
                    continue;
                };
                if !tables.encounters.contains_key(next) {
                    return Err(ContentError::DanglingChain {
                        encounter: encounter.id.clone(),
                        action: action.id.clone(),
                        next: next.clone(),
                    });
                }
            }
        }

        Ok(tables)
    }

    /// Looks up an encounter descriptor.
    #[must_use]
    pub fn encounter(&self, id: &EncounterId) -> Option<&EncounterDescriptor> {
        self.encounters.get(id)
    }

    /// Looks up an item descriptor.
    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&ItemDescriptor> {
        self.items.get(id)
    }

    /// Encounters in identifier order.
    pub fn encounters(&self) -> impl Iterator<Item = &EncounterDescriptor> {
        self.encounters.values()
    }

    /// Items in identifier order.
    pub fn items(&self) -> impl Iterator<Item = &ItemDescriptor> {
        self.items.values()
    }
}

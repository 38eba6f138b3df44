//! Engraving node names and their translations

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Built-in table of engraving node labels, origin language to localized.
///
/// The sheet mixes abbreviations and full names, and `ATK`/`MTK` show up in
/// both Latin and Cyrillic spellings.
pub const BUILTIN_NODE_TRANSLATIONS: &[(&str, &str)] = &[
    // Abbreviations
    ("УСК", "VEL"),
    ("МУ", "PM"),
    ("ОЗ", "PS"),
    ("СА", "VA"),
    ("ЗЩТ", "DEF"),
    ("ФУ", "PF"),
    ("БКУ", "RDC"),
    ("УКУ", "CDA"),
    ("КРИТ", "Crit"),
    ("ИНТ", "PER"),
    ("MTK", "PRE"),
    ("МТК", "PRE"),
    ("ATK", "ATK"),
    ("АТК", "ATK"),
    // Full names
    ("Крит", "Crit"),
    ("Физ. пробитие", "PP"),
    ("Маг. пробитие", "PM"),
];

/// One step of an engraving upgrade sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngravingNode {
    /// Label as written in the source sheet
    pub original: String,
    /// Localized label, empty when the dictionary has no entry
    pub translated: String,
    /// Whether the dictionary knew this label
    pub found: bool,
}

impl EngravingNode {
    /// Create a node that has no translation
    pub fn untranslated(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            translated: String::new(),
            found: false,
        }
    }

    /// Label to show to users: the translation when known
    pub fn display_label(&self) -> &str {
        if self.translated.is_empty() {
            &self.original
        } else {
            &self.translated
        }
    }
}

/// Lookup table for engraving node labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDictionary {
    entries: BTreeMap<String, String>,
}

impl Default for NodeDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NodeDictionary {
    /// Dictionary with no entries
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Dictionary seeded with [`BUILTIN_NODE_TRANSLATIONS`]
    pub fn builtin() -> Self {
        let entries = BUILTIN_NODE_TRANSLATIONS
            .iter()
            .map(|(original, translated)| (original.to_string(), translated.to_string()))
            .collect();
        Self { entries }
    }

    /// Add or replace entries, later ones winning
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (original, translated) in overrides {
            self.entries.insert(original.clone(), translated.clone());
        }
        self
    }

    /// Exact lookup of an origin-language label
    pub fn lookup(&self, original: &str) -> Option<&str> {
        self.entries
            .get(original)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Build a node for a label fragment
    pub fn node(&self, original: &str) -> EngravingNode {
        match self.lookup(original) {
            Some(translated) => EngravingNode {
                original: original.to_string(),
                translated: translated.to_string(),
                found: true,
            },
            None => EngravingNode::untranslated(original),
        }
    }

    /// Number of known labels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

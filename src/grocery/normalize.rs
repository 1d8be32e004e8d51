//! Grocery name normalization used to group items that mean the same thing.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Grouping key of an item name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameKey {
    /// Key after singularization and synonym folding
    pub key: String,
    /// Key before synonym folding
    pub base: String,
}

impl NameKey {
    pub fn via_synonym(&self) -> bool {
        self.key != self.base
    }
}

/// Words dropped from names because they do not change what is bought.
const DESCRIPTORS: &[&str] = &[
    "fresh", "organic", "large", "small", "medium", "ripe", "chopped", "diced", "minced", "sliced",
];

/// Words that end in "s" but are already singular.
const INVARIANT_WORDS: &[&str] = &[
    "asparagus", "hummus", "couscous", "molasses", "swiss", "grits", "citrus", "octopus", "bass",
    "lemongrass", "series", "species", "brussels",
];

static IRREGULAR_PLURALS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("leaves", "leaf"),
        ("loaves", "loaf"),
        ("halves", "half"),
        ("knives", "knife"),
        ("geese", "goose"),
        ("mice", "mouse"),
        ("teeth", "tooth"),
    ])
});

/// Folded name → preferred name. Both sides are already singular.
static SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("scallion", "green onion"),
        ("spring onion", "green onion"),
        ("cilantro", "coriander"),
        ("garbanzo bean", "chickpea"),
        ("garbanzo", "chickpea"),
        ("aubergine", "eggplant"),
        ("courgette", "zucchini"),
        ("capsicum", "bell pepper"),
        ("icing sugar", "powdered sugar"),
        ("confectioners sugar", "powdered sugar"),
        ("minced beef", "ground beef"),
        ("beef mince", "ground beef"),
        ("rocket", "arugula"),
        ("prawn", "shrimp"),
        ("caster sugar", "superfine sugar"),
        ("double cream", "heavy cream"),
        ("plain flour", "all purpose flour"),
    ])
});

/// Reduce a plural English word to its singular form with a few simple rules.
pub fn singularize(word: &str) -> String {
    if word.len() <= 3 || INVARIANT_WORDS.contains(&word) {
        return word.to_string();
    }
    if let Some(singular) = IRREGULAR_PLURALS.get(word) {
        return (*singular).to_string();
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    if let Some(stem) = word.strip_suffix("oes") {
        return format!("{}o", stem);
    }
    for suffix in ["ches", "shes", "xes", "zes", "sses"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

/// Normalize an item name into its grouping key.
pub fn normalize_name(raw: &str) -> NameKey {
    let lowered = raw.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let words: Vec<String> = cleaned
        .split_whitespace()
        .filter(|w| !DESCRIPTORS.contains(w))
        .map(singularize)
        .collect();

    // A name made only of descriptors ("Fresh") still needs a key.
    let base = if words.is_empty() {
        cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        words.join(" ")
    };

    let key = SYNONYMS
        .get(base.as_str())
        .map(|s| (*s).to_string())
        .unwrap_or_else(|| base.clone());

    NameKey { key, base }
}

/// Shorthand for the grouping key alone.
pub fn name_key(raw: &str) -> String {
    normalize_name(raw).key
}

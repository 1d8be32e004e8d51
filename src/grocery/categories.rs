//! Default grocery categories and keyword-based category suggestion.

use super::normalize::name_key;

/// Categories seeded for every new household, in display order.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Produce",
    "Dairy & Eggs",
    "Meat & Seafood",
    "Bakery",
    "Pantry",
    "Frozen",
    "Beverages",
    "Snacks",
    "Household",
    "Other",
];

pub const FALLBACK_CATEGORY: &str = "Other";

/// Keyword → default category. Keywords are matched against singular words
/// of the normalized item name; multi-word keywords against the whole name.
const KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Frozen",
        &["frozen", "ice cream", "popsicle", "frozen pea", "frozen pizza"],
    ),
    (
        "Produce",
        &[
            "apple", "banana", "orange", "lemon", "lime", "berry", "strawberry", "blueberry",
            "grape", "tomato", "potato", "onion", "garlic", "carrot", "celery", "lettuce",
            "spinach", "kale", "cucumber", "pepper", "zucchini", "eggplant", "broccoli",
            "cauliflower", "mushroom", "avocado", "ginger", "basil", "parsley", "coriander",
            "cilantro", "mint", "herb", "pear", "peach", "mango", "cabbage", "green onion",
            "bell pepper", "sweet potato", "squash", "asparagus", "corn",
        ],
    ),
    (
        "Dairy & Eggs",
        &[
            "milk", "cheese", "butter", "yogurt", "yoghurt", "cream", "egg", "parmesan",
            "mozzarella", "cheddar", "feta", "heavy cream", "sour cream",
        ],
    ),
    (
        "Meat & Seafood",
        &[
            "chicken", "beef", "pork", "lamb", "turkey", "bacon", "sausage", "ham", "fish",
            "salmon", "tuna", "shrimp", "cod", "steak", "mince", "ground beef",
        ],
    ),
    (
        "Bakery",
        &["bread", "bagel", "baguette", "bun", "roll", "croissant", "tortilla", "pita", "muffin"],
    ),
    (
        "Beverages",
        &["water", "juice", "coffee", "tea", "soda", "beer", "wine", "kombucha"],
    ),
    (
        "Snacks",
        &["chip", "cracker", "cookie", "chocolate", "candy", "popcorn", "pretzel", "nut", "granola"],
    ),
    (
        "Household",
        &[
            "detergent", "soap", "sponge", "paper towel", "toilet paper", "tissue", "trash bag",
            "foil", "dish", "shampoo", "toothpaste",
        ],
    ),
    (
        "Pantry",
        &[
            "rice", "pasta", "flour", "sugar", "salt", "oil", "vinegar", "bean", "lentil",
            "chickpea", "oat", "cereal", "spice", "sauce", "stock", "broth", "honey", "noodle",
            "can", "tomato paste", "peanut butter", "yeast", "baking powder", "baking soda",
        ],
    ),
];

/// Suggest a default category for an item name.
///
/// Whole-name matches win over single-word matches so that "peanut butter"
/// lands in Pantry rather than Dairy & Eggs.
pub fn suggest_category(name: &str) -> Option<&'static str> {
    let key = name_key(name);
    if key.is_empty() {
        return None;
    }

    for (category, keywords) in KEYWORDS {
        if keywords.iter().any(|k| k.contains(' ') && key.contains(k)) {
            return Some(*category);
        }
    }

    let words: Vec<&str> = key.split_whitespace().collect();
    for (category, keywords) in KEYWORDS {
        if keywords.iter().any(|k| !k.contains(' ') && words.contains(k)) {
            return Some(*category);
        }
    }
    None
}

/// Suggest one of the household's own categories for an item name.
///
/// Falls back to "Other" when the household has it, and to nothing otherwise.
pub fn suggest_from(name: &str, available: &[String]) -> Option<String> {
    let find = |wanted: &str| {
        available
            .iter()
            .find(|c| c.eq_ignore_ascii_case(wanted))
            .cloned()
    };
    suggest_category(name)
        .and_then(find)
        .or_else(|| find(FALLBACK_CATEGORY))
}

//! Food-relevance heuristic.
//!
//! Used to prefer culinary-sense text ("used as a spice in curries") over
//! botanical or chemical descriptions ("a perennial flowering plant") when a
//! source returns several candidate snippets. Matching is plain
//! case-insensitive keyword containment; false positives are acceptable.

/// Words and phrases that mark a snippet as being about food use.
const FOOD_KEYWORDS: &[&str] = &[
    "food",
    "used in",
    "cooking",
    "ingredient",
    "additive",
    "seasoning",
    "flavour",
    "flavor",
    "preservative",
    "spice",
    "culinary",
    "color",
    "colour",
    "sweetener",
    "thickener",
    "oil",
    "flour",
    "dye",
    "coloring",
    "used as",
];

/// Returns true if `text` mentions food or culinary use.
pub fn looks_like_food_use(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    FOOD_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

//! Category rule table
//!
//! Maps each category to the literal phrases that trigger it. The table is
//! compile-time data and is never mutated; editing it defines a new
//! classification version (previously stored tags are not migrated).
//!
//! # Ordering
//! Categories are declared meal types first, then cuisines, then styles.
//! The classifier breaks score ties by this declared order, so reordering
//! entries changes results for tied recipes.
//!
//! # Keywords
//! Keywords are matched as substrings of normalized text (see
//! [`crate::normalize`]), so they must be lower-case words separated by single
//! spaces. A keyword's weight is its word count: "ice cream" scores 2.

/// Tag stored when no category matches
pub const SENTINEL_TAG: &str = "general";

/// One category and its trigger phrases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

impl CategoryRule {
    pub const fn new(name: &'static str, keywords: &'static [&'static str]) -> Self {
        Self { name, keywords }
    }
}

/// Score contributed by one matching keyword
pub fn keyword_weight(keyword: &str) -> u32 {
    keyword.split_whitespace().count() as u32
}

/// Standard recipe categories in tie-break order
pub const STANDARD_RULES: &[CategoryRule] = &[
    // Meal types
    CategoryRule::new(
        "breakfast",
        &[
            "breakfast", "morning", "cereal", "pancake", "waffle", "toast", "omelette", "omelet",
            "eggs", "bacon", "sausage", "hash", "granola", "oatmeal", "porridge", "muffin",
        ],
    ),
    CategoryRule::new(
        "lunch",
        &["lunch", "sandwich", "wrap", "salad", "soup", "burger", "pizza slice"],
    ),
    CategoryRule::new(
        "dinner",
        &[
            "dinner", "main course", "steak", "roast", "pasta", "rice dish", "casserole",
            "curry", "stir fry", "grilled", "baked", "braised",
        ],
    ),
    CategoryRule::new(
        "snack",
        &["snack", "chips", "crackers", "nuts", "trail mix", "popcorn", "pretzel", "bite"],
    ),
    CategoryRule::new(
        "dessert",
        &[
            "dessert", "cake", "cookie", "pie", "ice cream", "chocolate", "sweet", "candy",
            "pudding", "tart", "brownie", "cheesecake", "tiramisu", "mousse",
        ],
    ),
    CategoryRule::new(
        "drink",
        &[
            "drink", "beverage", "smoothie", "juice", "cocktail", "coffee", "tea", "shake",
            "lemonade", "soda", "water",
        ],
    ),
    // Cuisines
    CategoryRule::new(
        "indian",
        &[
            "indian", "curry", "tandoor", "masala", "biryani", "dal", "naan", "chapati",
            "turmeric", "cumin", "coriander", "garam masala", "tikka",
        ],
    ),
    CategoryRule::new(
        "italian",
        &[
            "italian", "pasta", "pizza", "risotto", "lasagna", "spaghetti", "penne",
            "marinara", "parmesan", "mozzarella", "basil", "oregano", "focaccia",
        ],
    ),
    CategoryRule::new(
        "chinese",
        &[
            "chinese", "stir fry", "wok", "soy sauce", "ginger", "garlic", "rice",
            "noodles", "dumpling", "fried rice", "sweet and sour",
        ],
    ),
    CategoryRule::new(
        "mexican",
        &[
            "mexican", "taco", "burrito", "quesadilla", "salsa", "guacamole", "cilantro",
            "lime", "jalapeno", "chili", "tortilla", "enchilada",
        ],
    ),
    CategoryRule::new(
        "mediterranean",
        &[
            "mediterranean", "olive oil", "olives", "feta", "hummus", "pita", "tzatziki",
            "lemon", "herbs", "tomatoes",
        ],
    ),
    CategoryRule::new(
        "american",
        &[
            "american", "bbq", "burger", "hot dog", "fries", "mac and cheese",
            "fried chicken", "apple pie", "coleslaw",
        ],
    ),
    CategoryRule::new(
        "french",
        &[
            "french", "butter", "cream", "wine", "herbs", "baguette", "croissant", "brie",
            "camembert", "ratatouille",
        ],
    ),
    CategoryRule::new(
        "thai",
        &[
            "thai", "coconut", "lemongrass", "thai basil", "fish sauce", "curry paste",
            "pad thai", "tom yum", "galangal",
        ],
    ),
    CategoryRule::new(
        "japanese",
        &[
            "japanese", "soy", "miso", "sake", "sushi", "ramen", "udon", "tempura", "wasabi",
            "ginger", "seaweed",
        ],
    ),
    // Styles
    CategoryRule::new(
        "quick meal",
        &["quick", "easy", "fast", "minute", "instant", "ready", "simple", "no cook"],
    ),
    CategoryRule::new(
        "comfort food",
        &[
            "comfort", "hearty", "creamy", "rich", "warm", "cozy", "homestyle", "traditional",
            "classic",
        ],
    ),
    CategoryRule::new(
        "healthy",
        &[
            "healthy", "light", "fresh", "lean", "low fat", "nutritious", "vitamin", "fiber",
            "antioxidant", "organic",
        ],
    ),
    CategoryRule::new(
        "spicy",
        &[
            "spicy", "hot", "chili", "pepper", "jalapeno", "habanero", "cayenne", "paprika",
            "tabasco", "sriracha",
        ],
    ),
    CategoryRule::new(
        "sweet",
        &[
            "sweet", "sugar", "honey", "maple", "vanilla", "cinnamon", "fruit", "berry",
            "chocolate", "caramel",
        ],
    ),
    CategoryRule::new(
        "vegetarian",
        &[
            "vegetarian", "veggie", "vegetables", "beans", "lentils", "tofu", "quinoa",
            "spinach", "mushroom",
        ],
    ),
    CategoryRule::new(
        "fusion",
        &["fusion", "modern", "contemporary", "twist", "inspired", "style"],
    ),
];

/// Ordered, read-only view over a set of category rules
#[derive(Debug, Clone, Copy)]
pub struct RuleTable<'a> {
    rules: &'a [CategoryRule],
}

impl Default for RuleTable<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleTable<'static> {
    /// The built-in recipe categories
    pub fn standard() -> Self {
        Self { rules: STANDARD_RULES }
    }
}

impl<'a> RuleTable<'a> {
    pub fn new(rules: &'a [CategoryRule]) -> Self {
        Self { rules }
    }

    /// Rules in declared (tie-break) order
    pub fn rules(&self) -> &'a [CategoryRule] {
        self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&'a CategoryRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Declared position of a category, used as the tie-break rank
    pub fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|rule| rule.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use std::collections::HashSet;

    #[test]
    fn test_standard_table_order() {
        let table = RuleTable::standard();
        assert_eq!(table.len(), 22);
        assert_eq!(table.rules()[0].name, "breakfast");
        assert_eq!(table.position("dessert"), Some(4));
        assert_eq!(table.position("indian"), Some(6));
        assert_eq!(table.rules()[21].name, "fusion");
        assert_eq!(table.position("unknown"), None);
    }

    #[test]
    fn test_category_names_unique() {
        let mut seen = HashSet::new();
        for rule in STANDARD_RULES {
            assert!(seen.insert(rule.name), "duplicate category {}", rule.name);
            assert_ne!(rule.name, SENTINEL_TAG);
        }
    }

    #[test]
    fn test_keywords_unique_within_category() {
        for rule in STANDARD_RULES {
            let mut seen = HashSet::new();
            assert!(!rule.keywords.is_empty(), "{} has no keywords", rule.name);
            for keyword in rule.keywords {
                assert!(seen.insert(*keyword), "{} repeats '{}'", rule.name, keyword);
            }
        }
    }

    #[test]
    fn test_keywords_are_normalized() {
        // A keyword that normalization would alter could never match
        for rule in STANDARD_RULES {
            for keyword in rule.keywords {
                assert_eq!(normalize(Some(keyword), None), *keyword, "in {}", rule.name);
            }
        }
    }

    #[test]
    fn test_keyword_weight() {
        assert_eq!(keyword_weight("cake"), 1);
        assert_eq!(keyword_weight("ice cream"), 2);
        assert_eq!(keyword_weight("mac and cheese"), 3);
    }

    #[test]
    fn test_lookup() {
        let table = RuleTable::standard();
        let thai = table.get("thai").unwrap();
        assert!(thai.keywords.contains(&"lemongrass"));
        assert!(table.get("general").is_none());
    }
}

//! Keyword classifier
//!
//! Scores every category of a [`RuleTable`] against normalized text and keeps
//! the strongest ones as tags.
//!
//! # Algorithm
//! 1. For each category (declared order) and each of its keywords, a keyword
//!    that occurs as a substring of the text adds its word count to the
//!    category score. Each keyword is checked once.
//! 2. No positive score: the tag set is the sentinel `["general"]`.
//! 3. Otherwise categories are ranked by score, descending, with a stable sort
//!    so ties keep declared order. Categories scoring at least
//!    `threshold_ratio * max_score` are taken in rank order, up to `max_tags`.
//!
//! The classifier holds no mutable state; the same table, policy and text
//! always produce the same tag sequence.

use crate::rules::{keyword_weight, RuleTable, SENTINEL_TAG};
use recipe_common::config::TaggingConfig;
use std::fmt;

/// Separator used when a tag set is stored as one text field
pub const TAG_SEPARATOR: &str = ", ";

/// Product policy turning scores into a bounded tag set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    /// Upper bound on returned tags
    pub max_tags: usize,
    /// Fraction of the top score a category must reach
    pub threshold_ratio: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_tags: 4,
            threshold_ratio: 0.5,
        }
    }
}

impl From<&TaggingConfig> for SelectionPolicy {
    fn from(config: &TaggingConfig) -> Self {
        Self {
            max_tags: config.max_tags,
            threshold_ratio: config.threshold_ratio,
        }
    }
}

/// Score of one category for one text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryScore<'a> {
    pub category: &'a str,
    pub score: u32,
}

/// Ordered tags for one recipe, highest score first; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    /// The "no category matched" tag set
    pub fn sentinel() -> Self {
        Self {
            tags: vec![SENTINEL_TAG.to_string()],
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.tags.len() == 1 && self.tags[0] == SENTINEL_TAG
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Storage form: names joined with `", "`
    pub fn encode(&self) -> String {
        self.tags.join(TAG_SEPARATOR)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Split a stored tag string back into category names
pub fn parse_tags(stored: &str) -> Vec<&str> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(TAG_SEPARATOR).collect()
}

/// Rule-based recipe classifier
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    table: RuleTable<'a>,
    policy: SelectionPolicy,
}

impl Classifier<'static> {
    /// Standard rule table with the default policy
    pub fn standard() -> Self {
        Self::new(RuleTable::standard(), SelectionPolicy::default())
    }
}

impl<'a> Classifier<'a> {
    pub fn new(table: RuleTable<'a>, policy: SelectionPolicy) -> Self {
        Self { table, policy }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn table(&self) -> RuleTable<'a> {
        self.table
    }

    /// Positive category scores in declared table order
    pub fn score(&self, text: &str) -> Vec<CategoryScore<'a>> {
        self.table
            .rules()
            .iter()
            .filter_map(|rule| {
                let score: u32 = rule
                    .keywords
                    .iter()
                    .filter(|keyword| text.contains(**keyword))
                    .map(|keyword| keyword_weight(keyword))
                    .sum();
                (score > 0).then_some(CategoryScore {
                    category: rule.name,
                    score,
                })
            })
            .collect()
    }

    /// Classify normalized text into a tag set
    pub fn classify(&self, text: &str) -> TagSet {
        let mut scores = self.score(text);
        if scores.is_empty() {
            return TagSet::sentinel();
        }

        // Stable: equal scores keep declared order
        scores.sort_by(|a, b| b.score.cmp(&a.score));

        let max_score = f64::from(scores[0].score);
        let threshold = max_score * self.policy.threshold_ratio;

        let tags: Vec<String> = scores
            .iter()
            .filter(|s| f64::from(s.score) >= threshold)
            .take(self.policy.max_tags)
            .map(|s| s.category.to_string())
            .collect();

        if tags.is_empty() {
            return TagSet::sentinel();
        }

        TagSet { tags }
    }
}

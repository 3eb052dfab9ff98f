//! Mocked knowledge-base search
//!
//! A fixed result set standing in for a real search index: entries are
//! grouped by category with static relevance scores. A category filter
//! returns that category's entries in insertion order; without a category
//! all entries are returned sorted by relevance.

use serde::{Deserialize, Serialize};

/// One knowledge-base entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KbEntry {
    pub title: String,
    pub content: String,
    pub category: String,
    pub relevance: f64,
}

/// The fixed company knowledge base
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KbEntry>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        let entries = vec![
            KbEntry {
                title: "AI Strategy Framework".to_string(),
                content: "Our AI strategy framework includes assessment, roadmap development, and implementation planning.".to_string(),
                category: "AI Strategy".to_string(),
                relevance: 0.95,
            },
            KbEntry {
                title: "AI ROI Calculator".to_string(),
                content: "Method for calculating return on investment for AI initiatives based on industry benchmarks.".to_string(),
                category: "AI Strategy".to_string(),
                relevance: 0.85,
            },
            KbEntry {
                title: "Digital Maturity Assessment".to_string(),
                content: "Framework for assessing an organization's digital maturity across key dimensions.".to_string(),
                category: "Digital Transformation".to_string(),
                relevance: 0.9,
            },
            KbEntry {
                title: "Change Management Playbook".to_string(),
                content: "Guide for managing organizational change during digital transformation initiatives.".to_string(),
                category: "Digital Transformation".to_string(),
                relevance: 0.8,
            },
            KbEntry {
                title: "Competitive Analysis Framework".to_string(),
                content: "Methodology for analyzing competitors and market positioning.".to_string(),
                category: "Market Intelligence".to_string(),
                relevance: 0.88,
            },
            KbEntry {
                title: "Industry Trend Reports".to_string(),
                content: "Quarterly reports on emerging trends across key industries.".to_string(),
                category: "Market Intelligence".to_string(),
                relevance: 0.82,
            },
        ];

        Self { entries }
    }

    /// Search the knowledge base
    ///
    /// The query is carried through for reporting; matching is by category
    /// only, as this is a canned result set.
    pub fn search(&self, category: Option<&str>) -> Vec<KbEntry> {
        match category {
            Some(category) if self.entries.iter().any(|e| e.category == category) => self
                .entries
                .iter()
                .filter(|e| e.category == category)
                .cloned()
                .collect(),
            _ => {
                let mut all = self.entries.clone();
                all.sort_by(|a, b| {
                    b.relevance
                        .partial_cmp(&a.relevance)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                all
            }
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_filter_returns_insertion_order() {
        let kb = KnowledgeBase::new();
        let results = kb.search(Some("AI Strategy"));

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "AI Strategy Framework");
        assert_eq!(results[0].relevance, 0.95);
        assert_eq!(results[1].title, "AI ROI Calculator");
        assert_eq!(results[1].relevance, 0.85);
    }

    #[test]
    fn test_no_category_returns_all_sorted_by_relevance() {
        let kb = KnowledgeBase::new();
        let results = kb.search(None);

        assert_eq!(results.len(), 6);
        assert_eq!(results[0].relevance, 0.95);
        let relevances: Vec<f64> = results.iter().map(|e| e.relevance).collect();
        let mut sorted = relevances.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(relevances, sorted);
    }

    #[test]
    fn test_unknown_category_falls_back_to_all() {
        let kb = KnowledgeBase::new();
        let results = kb.search(Some("Quantum Gardening"));
        assert_eq!(results.len(), 6);
    }
}

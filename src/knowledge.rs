// 📚 Knowledge Base - Rules as Data
// Condition/result records loaded from JSON or CSV, searched by keyword and
// matched against a chart digest. Never feeds the fixed interpreters.

use crate::chart::Chart;
use crate::config::EngineConfig;
use crate::summary::StructuralSummary;
use anyhow::{Context as AnyhowContext, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRule {
    /// Rule ID for tracking
    pub id: String,

    /// Condition text, e.g. "辛 in day" or "午卯破"
    pub condition: String,

    /// What the rule concludes
    pub result: String,

    #[serde(default)]
    pub category: String,

    /// Where the rule was taken from (book, case file)
    #[serde(default)]
    pub source: String,
}

impl KnowledgeRule {
    pub fn new(id: &str, condition: &str, result: &str, category: &str) -> Self {
        KnowledgeRule {
            id: id.to_string(),
            condition: condition.to_string(),
            result: result.to_string(),
            category: category.to_string(),
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Serialized JSON text of the rule body (id excluded) the matcher searches
    fn search_text(&self) -> String {
        let body = RuleBodyRef {
            condition: &self.condition,
            result: &self.result,
            category: &self.category,
            source: &self.source,
        };
        serde_json::to_string(&body).unwrap_or_else(|_| {
            format!(
                "{} {} {} {}",
                self.condition, self.result, self.category, self.source
            )
        })
    }
}

#[derive(Serialize)]
struct RuleBodyRef<'a> {
    condition: &'a str,
    result: &'a str,
    category: &'a str,
    source: &'a str,
}

/// Body of a rule keyed by id in a JSON map
#[derive(Debug, Deserialize)]
struct RuleBody {
    condition: String,
    result: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    source: String,
}

/// JSON files hold either `{id: rule}` or `[rule, ...]`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleDocument {
    Keyed(BTreeMap<String, RuleBody>),
    List(Vec<KnowledgeRule>),
}

// ============================================================================
// KNOWLEDGE BASE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    rules: Vec<KnowledgeRule>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base
    pub fn new() -> Self {
        KnowledgeBase { rules: Vec::new() }
    }

    /// Create from a list of rules; later duplicates of an id replace earlier ones
    pub fn from_rules(rules: Vec<KnowledgeRule>) -> Self {
        let mut kb = KnowledgeBase::new();
        for rule in rules {
            kb.add_rule(rule);
        }
        kb
    }

    /// Load rules from a JSON file (id map or list)
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rules file: {:?}", path.as_ref()))?;

        let document: RuleDocument =
            serde_json::from_str(&content).context("Failed to parse rules JSON")?;

        let rules = match document {
            RuleDocument::Keyed(map) => map
                .into_iter()
                .map(|(id, body)| KnowledgeRule {
                    id,
                    condition: body.condition,
                    result: body.result,
                    category: body.category,
                    source: body.source,
                })
                .collect(),
            RuleDocument::List(rules) => rules,
        };

        let kb = KnowledgeBase::from_rules(rules);
        info!(rules = kb.rule_count(), "knowledge base loaded from JSON");
        Ok(kb)
    }

    /// Load rules from CSV with columns id,condition,result,category,source
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path.as_ref())
            .with_context(|| format!("Failed to open rules CSV: {:?}", path.as_ref()))?;

        let mut rules = Vec::new();
        for result in rdr.deserialize() {
            let rule: KnowledgeRule = result.context("Failed to deserialize rule")?;
            rules.push(rule);
        }

        let kb = KnowledgeBase::from_rules(rules);
        info!(rules = kb.rule_count(), "knowledge base loaded from CSV");
        Ok(kb)
    }

    /// Pick the loader by file extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let is_csv = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv {
            Self::from_csv(path)
        } else {
            Self::from_json_file(path)
        }
    }

    /// Add a single rule, replacing any rule with the same id
    pub fn add_rule(&mut self, rule: KnowledgeRule) {
        match self.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Fold another knowledge base into this one (master merge)
    pub fn merge(&mut self, other: KnowledgeBase) {
        for rule in other.rules {
            self.add_rule(rule);
        }
    }

    /// Rules whose condition or result contains the keyword
    pub fn search(&self, keyword: &str) -> Vec<&KnowledgeRule> {
        self.rules
            .iter()
            .filter(|r| r.condition.contains(keyword) || r.result.contains(keyword))
            .collect()
    }

    pub fn rules(&self) -> &[KnowledgeRule] {
        &self.rules
    }

    /// Get number of rules loaded
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

// ============================================================================
// MATCHER
// ============================================================================

/// The few chart facts the matcher looks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDigest {
    pub day_master: String,
    pub branches: Vec<String>,
    #[serde(default)]
    pub relation_labels: Vec<String>,
}

impl ChartDigest {
    pub fn from_summary(chart: &Chart, summary: &StructuralSummary) -> Self {
        ChartDigest {
            day_master: chart.day_master().to_string(),
            branches: chart.branches().iter().map(|b| b.to_string()).collect(),
            relation_labels: summary.relations.iter().map(|r| r.label.clone()).collect(),
        }
    }

    fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.day_master.as_str())
            .chain(self.branches.iter().map(String::as_str))
            .chain(self.relation_labels.iter().map(String::as_str))
            .filter(|token| !token.is_empty())
    }

    /// Any digest token appears anywhere in the rule text
    pub fn matches(&self, rule: &KnowledgeRule) -> bool {
        let text = rule.search_text();
        self.tokens().any(|token| text.contains(token))
    }
}

/// Coarse recall-oriented match: rule id → matched
pub fn match_rules(
    digest: &ChartDigest,
    rules: &[KnowledgeRule],
    config: &EngineConfig,
) -> BTreeMap<String, bool> {
    let parallel = rules.len() >= config.parallel_match_threshold;

    let matched: BTreeMap<String, bool> = if parallel {
        rules
            .par_iter()
            .map(|rule| (rule.id.clone(), digest.matches(rule)))
            .collect()
    } else {
        rules
            .iter()
            .map(|rule| (rule.id.clone(), digest.matches(rule)))
            .collect()
    };

    debug!(
        rules = rules.len(),
        matched = matched.values().filter(|m| **m).count(),
        parallel,
        "knowledge rules matched"
    );
    matched
}

// ============================================================================
// MARRIAGE CATEGORIES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarriageCategories {
    pub divorce: Vec<String>,
    pub remarriage: Vec<String>,
    pub single: Vec<String>,
}

const DIVORCE_KEYWORDS: [&str; 3] = ["이혼", "離婚", "divorce"];
const REMARRIAGE_KEYWORDS: [&str; 3] = ["재혼", "再婚", "remarriage"];
const SINGLE_KEYWORDS: [&str; 4] = ["독신", "獨身", "고독", "single"];

fn mentions(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Bucket matched rules by the marriage outcome their result text names
pub fn categorize_marriage(rules: &[&KnowledgeRule]) -> MarriageCategories {
    let mut categories = MarriageCategories::default();
    for rule in rules {
        if mentions(&rule.result, &DIVORCE_KEYWORDS) {
            categories.divorce.push(rule.id.clone());
        }
        if mentions(&rule.result, &REMARRIAGE_KEYWORDS) {
            categories.remarriage.push(rule.id.clone());
        }
        if mentions(&rule.result, &SINGLE_KEYWORDS) {
            categories.single.push(rule.id.clone());
        }
    }
    categories
}

// ============================================================================
// TESTS
// ============================================================================

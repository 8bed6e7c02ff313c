// Four Pillars Engine - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod symbols;    // Stems, branches, elements
pub mod tables;     // Relation tables (合 沖 刑 破 三合)
pub mod chart;
pub mod config;
pub mod relations;  // Relation Detector
pub mod archetype;  // Archetype Classifier
pub mod summary;    // Structural Summary (relations + archetype + focus)
pub mod inference;  // Explainable Inference Engine
pub mod knowledge;  // Rule Knowledge Base + matcher
pub mod report;

// Re-export commonly used types
pub use error::{ChartError, ChartResult};
pub use symbols::{Branch, Element, Polarity, Stem, Symbol};
pub use chart::{Chart, Gender, Pillar, PillarOrder};
pub use config::{EngineConfig, HiddenCombinationMode};
pub use relations::{
    detect_relations, detect_stem_combinations,
    RelationDetector, RelationKind, RelationRecord,
};
pub use archetype::{classify, Archetype};
pub use summary::{summarize, Focus, StructuralSummary};
pub use inference::{infer, infer_document, Domain, Evidence, InferenceResult};
pub use knowledge::{
    categorize_marriage, match_rules,
    ChartDigest, KnowledgeBase, KnowledgeRule, MarriageCategories,
};
pub use report::{analyze, AnalysisReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

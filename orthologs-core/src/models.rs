use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AgentType, KnowledgeLevel};

/// Fixed edge properties stamped on every association.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub category: String,
    pub predicate: String,
    pub aggregator_knowledge_sources: Vec<String>,
    pub primary_knowledge_source: String,
    pub knowledge_level: KnowledgeLevel,
    pub agent_type: AgentType,
    /// Stop after this many ortholog rows.
    pub row_limit: Option<usize>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            category: "biolink:GeneToGeneHomologyAssociation".to_string(),
            predicate: "biolink:orthologous_to".to_string(),
            aggregator_knowledge_sources: vec!["infores:monarchinitiative".to_string()],
            primary_knowledge_source: "infores:panther".to_string(),
            knowledge_level: KnowledgeLevel::KnowledgeAssertion,
            agent_type: AgentType::NotProvided,
            row_limit: None,
        }
    }
}

/// One gene-to-gene orthology edge.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct HomologyAssociation {
    pub id: String,
    pub category: String,
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub has_evidence: Vec<String>,
    pub aggregator_knowledge_source: Vec<String>,
    pub primary_knowledge_source: String,
    pub knowledge_level: KnowledgeLevel,
    pub agent_type: AgentType,
}

impl HomologyAssociation {
    /// Builds an edge with a fresh `uuid:` identifier. Identifiers are
    /// unique within a run but differ between runs.
    pub fn new(config: &TransformConfig, subject: String, object: String, family_id: &str) -> HomologyAssociation {
        let has_evidence = if family_id.is_empty() {
            Vec::new()
        } else {
            vec![family_id.to_string()]
        };

        HomologyAssociation {
            id: format!("uuid:{}", Uuid::new_v4()),
            category: config.category.clone(),
            subject,
            predicate: config.predicate.clone(),
            object,
            has_evidence,
            aggregator_knowledge_source: config.aggregator_knowledge_sources.clone(),
            primary_knowledge_source: config.primary_knowledge_source.clone(),
            knowledge_level: config.knowledge_level,
            agent_type: config.agent_type,
        }
    }
}

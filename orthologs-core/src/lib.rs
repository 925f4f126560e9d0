#![allow(dead_code)]

use std::convert::TryFrom;
use serde::{Deserialize, Serialize};

pub mod curie;
mod error;
mod ingest;
mod gene_map;
mod models;
mod resolve;
mod export;
mod report;

pub use error::{Error, Result};
pub use ingest::{open_input, GeneInfoRecord, GeneInfoReader, OrthologLine, OrthologReader, OrthologRow, ABSENT};
pub use gene_map::{candidate_identifiers, AnnotationSource, CompositeKey, GeneMapBuilder, MapStats, ReferenceMap, MAP_HEADER};
pub use models::{HomologyAssociation, TransformConfig};
pub use resolve::{resolve_token, OrthologToken, ResolutionBranch, ResolvedGene, Resolver, SkipReason, TransformStats};
pub use export::{AssociationWriter, TSV_HEADER};
pub use report::EdgeReport;

/// Biolink knowledge level of an emitted edge.
#[derive(Debug, Hash, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeLevel {
    KnowledgeAssertion,
    LogicalEntailment,
    Prediction,
    StatisticalAssociation,
    Observation,
    NotProvided,
}

impl KnowledgeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            KnowledgeLevel::KnowledgeAssertion => "knowledge_assertion",
            KnowledgeLevel::LogicalEntailment => "logical_entailment",
            KnowledgeLevel::Prediction => "prediction",
            KnowledgeLevel::StatisticalAssociation => "statistical_association",
            KnowledgeLevel::Observation => "observation",
            KnowledgeLevel::NotProvided => "not_provided",
        }
    }
}

impl TryFrom<&str> for KnowledgeLevel {
    type Error = ();

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let level = match value {
            "knowledge_assertion" => KnowledgeLevel::KnowledgeAssertion,
            "logical_entailment" => KnowledgeLevel::LogicalEntailment,
            "prediction" => KnowledgeLevel::Prediction,
            "statistical_association" => KnowledgeLevel::StatisticalAssociation,
            "observation" => KnowledgeLevel::Observation,
            "not_provided" => KnowledgeLevel::NotProvided,
            _ => return Err(()),
        };
        Ok(level)
    }
}

/// Biolink agent type of an emitted edge.
#[derive(Debug, Hash, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    ManualAgent,
    AutomatedAgent,
    DataAnalysisPipeline,
    ComputationalModel,
    TextMiningAgent,
    ImageProcessingAgent,
    ManualValidationOfAutomatedAgent,
    NotProvided,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentType::ManualAgent => "manual_agent",
            AgentType::AutomatedAgent => "automated_agent",
            AgentType::DataAnalysisPipeline => "data_analysis_pipeline",
            AgentType::ComputationalModel => "computational_model",
            AgentType::TextMiningAgent => "text_mining_agent",
            AgentType::ImageProcessingAgent => "image_processing_agent",
            AgentType::ManualValidationOfAutomatedAgent => "manual_validation_of_automated_agent",
            AgentType::NotProvided => "not_provided",
        }
    }
}

impl TryFrom<&str> for AgentType {
    type Error = ();

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let agent = match value {
            "manual_agent" => AgentType::ManualAgent,
            "automated_agent" => AgentType::AutomatedAgent,
            "data_analysis_pipeline" => AgentType::DataAnalysisPipeline,
            "computational_model" => AgentType::ComputationalModel,
            "text_mining_agent" => AgentType::TextMiningAgent,
            "image_processing_agent" => AgentType::ImageProcessingAgent,
            "manual_validation_of_automated_agent" => AgentType::ManualValidationOfAutomatedAgent,
            "not_provided" => AgentType::NotProvided,
            _ => return Err(()),
        };
        Ok(agent)
    }
}

/// Serialization of the association stream.
#[derive(Debug, Hash, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "tsv")]
    Tsv,
    #[serde(rename = "jsonl")]
    Jsonl,
}

impl TryFrom<&str> for OutputFormat {
    type Error = ();

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let format = match value {
            "tsv" => OutputFormat::Tsv,
            "jsonl" => OutputFormat::Jsonl,
            _ => return Err(()),
        };
        Ok(format)
    }
}

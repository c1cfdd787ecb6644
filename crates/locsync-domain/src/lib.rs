use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SegmentRecord {
    pub schema_version: u32,
    pub file: String,
    pub id: String,
    pub source: String,
    pub target: String,
    pub status: String,
    pub state: String,
    pub tm_match: bool,
    pub translatable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VariationRecord {
    pub text: String,
    pub files: Vec<String>,
    pub segments: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GroupRecord {
    pub normalized_source: String,
    pub source: String,
    pub variations: Vec<VariationRecord>,
    pub affected_files: Vec<String>,
    pub tm_conflict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckReport {
    pub schema_version: u32,
    pub assets: usize,
    pub segments: usize,
    pub score: u8,
    pub groups: Vec<GroupRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolveSummary {
    pub schema_version: u32,
    pub normalized_source: String,
    pub canonical: String,
    pub updated_segments: usize,
    pub changed_files: Vec<String>,
    pub dry_run: bool,
    pub remaining_groups: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuggestionRecord {
    pub schema_version: u32,
    pub normalized_source: String,
    pub recommendation: String,
    pub reasoning: String,
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthIssue {
    pub path: String,
    pub category: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthReport {
    pub checked: usize,
    pub issues: Vec<HealthIssue>,
}

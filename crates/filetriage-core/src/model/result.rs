/// Output envelope of one module invocation on one file.
use crate::model::Finding;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub module_name: String,
    /// Findings in the order the module produced them. May be empty.
    #[serde(default)]
    pub findings: Vec<Finding>,
    /// Free-form summary of what the module observed.
    #[serde(default)]
    pub results: Map<String, Value>,
}

impl EnrichmentResult {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            findings: Vec::new(),
            results: Map::new(),
        }
    }

    pub fn with_finding(mut self, finding: Finding) -> Self {
        self.findings.push(finding);
        self
    }

    pub fn with_result(mut self, key: &str, value: Value) -> Self {
        self.results.insert(key.to_owned(), value);
        self
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

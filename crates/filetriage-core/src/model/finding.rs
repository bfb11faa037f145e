/// Findings: discrete, immutable observations about one file.
///
/// A `Finding` is built once by the module that produced it and is never
/// mutated afterwards: all fields are private and only exposed through
/// accessors. The consuming `with_*` methods exist so a module can finish
/// assembling a finding before handing it over.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Closed taxonomy of finding categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Credential,
    ExtractedHash,
    ExtractedData,
    Vulnerability,
    YaraMatch,
    Pii,
    Misc,
    Informational,
}

impl FindingCategory {
    /// Stable machine-readable label, identical to the serialised form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::ExtractedHash => "extracted_hash",
            Self::ExtractedData => "extracted_data",
            Self::Vulnerability => "vulnerability",
            Self::YaraMatch => "yara_match",
            Self::Pii => "pii",
            Self::Misc => "misc",
            Self::Informational => "informational",
        }
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a finding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingOrigin {
    /// Produced by an analyzer module during a pipeline pass.
    EnrichmentModule,
    /// Produced by an external automated process.
    Automation,
    /// Entered by an operator.
    Manual,
}

impl FindingOrigin {
    pub fn label(self) -> &'static str {
        match self {
            Self::EnrichmentModule => "enrichment_module",
            Self::Automation => "automation",
            Self::Manual => "manual",
        }
    }
}

/// Severity outside the 0–10 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("severity {0} is out of range (0..={max})", max = Severity::MAX)]
pub struct SeverityError(pub u8);

/// Finding severity, 0 (informational) to 10 (most urgent) inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MAX: u8 = 10;

    /// Validate and wrap a raw severity value.
    pub fn new(value: u8) -> Result<Self, SeverityError> {
        if value > Self::MAX {
            return Err(SeverityError(value));
        }
        Ok(Self(value))
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Severity {
    type Error = SeverityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Severity> for u8 {
    fn from(s: Severity) -> u8 {
        s.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

/// A display artifact attached to a finding, e.g. a rendered markdown summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayArtifact {
    /// Artifact kind (`"finding_summary"` for rendered summaries).
    #[serde(rename = "type")]
    pub kind: String,
    pub metadata: Map<String, Value>,
}

impl DisplayArtifact {
    pub const FINDING_SUMMARY: &'static str = "finding_summary";

    /// Wrap a rendered markdown summary.
    pub fn finding_summary(markdown: impl Into<String>) -> Self {
        let mut metadata = Map::new();
        metadata.insert("summary".to_owned(), Value::String(markdown.into()));
        Self {
            kind: Self::FINDING_SUMMARY.to_owned(),
            metadata,
        }
    }

    /// The rendered summary text, if this artifact carries one.
    pub fn summary(&self) -> Option<&str> {
        self.metadata.get("summary").and_then(Value::as_str)
    }
}

/// One security-relevant observation about exactly one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    category: FindingCategory,
    finding_name: String,
    origin_type: FindingOrigin,
    origin_name: String,
    object_id: String,
    severity: Severity,
    raw_data: Value,
    data: Vec<DisplayArtifact>,
}

impl Finding {
    /// Create a module-produced finding with empty evidence.
    pub fn from_module(
        module_name: &str,
        object_id: &str,
        category: FindingCategory,
        finding_name: &str,
        severity: Severity,
    ) -> Self {
        Self {
            category,
            finding_name: finding_name.to_owned(),
            origin_type: FindingOrigin::EnrichmentModule,
            origin_name: module_name.to_owned(),
            object_id: object_id.to_owned(),
            severity,
            raw_data: Value::Null,
            data: Vec::new(),
        }
    }

    /// Override the origin type (findings not produced by a module).
    pub fn with_origin(mut self, origin: FindingOrigin) -> Self {
        self.origin_type = origin;
        self
    }

    /// Attach structured evidence.
    pub fn with_raw_data(mut self, raw_data: Value) -> Self {
        self.raw_data = raw_data;
        self
    }

    /// Append a display artifact.
    pub fn with_artifact(mut self, artifact: DisplayArtifact) -> Self {
        self.data.push(artifact);
        self
    }

    pub fn category(&self) -> FindingCategory {
        self.category
    }

    pub fn finding_name(&self) -> &str {
        &self.finding_name
    }

    pub fn origin_type(&self) -> FindingOrigin {
        self.origin_type
    }

    pub fn origin_name(&self) -> &str {
        &self.origin_name
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn raw_data(&self) -> &Value {
        &self.raw_data
    }

    pub fn data(&self) -> &[DisplayArtifact] {
        &self.data
    }

    /// First rendered summary among the display artifacts.
    pub fn summary(&self) -> Option<&str> {
        self.data.iter().find_map(DisplayArtifact::summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn severity_accepts_full_range() {
        for v in 0..=10 {
            assert_eq!(Severity::new(v).unwrap().value(), v);
        }
    }

    #[test]
    fn severity_rejects_above_ten() {
        assert_eq!(Severity::new(11), Err(SeverityError(11)));
        assert!(serde_json::from_str::<Severity>("42").is_err());
    }

    #[test]
    fn category_serialises_as_label() {
        let s = serde_json::to_string(&FindingCategory::ExtractedHash).unwrap();
        assert_eq!(s, "\"extracted_hash\"");
        assert_eq!(FindingCategory::Misc.to_string(), "misc");
    }

    #[test]
    fn finding_builder_sets_module_origin() {
        let f = Finding::from_module(
            "demo",
            "obj-1",
            FindingCategory::Credential,
            "demo_hit",
            Severity::new(7).unwrap(),
        )
        .with_raw_data(json!({ "k": "v" }))
        .with_artifact(DisplayArtifact::finding_summary("# Demo"));

        assert_eq!(f.origin_type(), FindingOrigin::EnrichmentModule);
        assert_eq!(f.origin_name(), "demo");
        assert_eq!(f.object_id(), "obj-1");
        assert_eq!(f.raw_data()["k"], "v");
        assert_eq!(f.summary(), Some("# Demo"));
        assert_eq!(f.data()[0].kind, DisplayArtifact::FINDING_SUMMARY);
    }

    /// The JSON form uses `type` for the artifact kind and a bare integer severity.
    #[test]
    fn finding_json_shape() {
        let f = Finding::from_module(
            "demo",
            "obj-1",
            FindingCategory::Misc,
            "x",
            Severity::new(4).unwrap(),
        )
        .with_artifact(DisplayArtifact::finding_summary("s"));
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["severity"], 4);
        assert_eq!(v["category"], "misc");
        assert_eq!(v["origin_type"], "enrichment_module");
        assert_eq!(v["data"][0]["type"], "finding_summary");
    }
}

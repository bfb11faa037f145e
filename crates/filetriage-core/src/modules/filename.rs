/// Filename sensitivity scanner.
///
/// Flags files whose name contains a term from a curated list of
/// credential, confidentiality and web-config words. Matching is a plain
/// case-insensitive substring test, so `"password"` also hits
/// `"mypasswordfile"`; downstream consumers rely on that behaviour.
use crate::model::{DisplayArtifact, EnrichmentResult, Finding, FindingCategory, Severity};
use crate::modules::{AnalyzerModule, ModuleError, ProcessResult, DEFAULT_WORKFLOW};
use crate::provider::FileMetadataProvider;
use serde_json::json;
use tracing::debug;

pub const MODULE_NAME: &str = "filename_scanner";
pub const FINDING_NAME: &str = "sensitive_filename";
const SEVERITY: u8 = 4;

/// Curated terms in match-report order.
pub const SENSITIVE_TERMS: &[&str] = &[
    // Credentials & authentication
    "password",
    "passwd",
    "secret",
    "credentials",
    "apikey",
    "api_key",
    "token",
    "oauth",
    "bearer",
    // Authentication info
    "login",
    "logon",
    "signin",
    "signon",
    "credential",
    "keytab",
    // Personal or confidential
    "confidential",
    "proprietary",
    "classified",
    "restricted",
    "sensitive",
    "internal",
    "private",
    // Web related
    "htaccess",
    "htpasswd",
    "wp-config",
    "phpinfo",
];

pub struct FilenameScanner {
    workflows: Vec<String>,
    /// Lower-case, in report order.
    terms: Vec<String>,
}

impl FilenameScanner {
    pub fn new() -> Self {
        Self {
            workflows: vec![DEFAULT_WORKFLOW.to_owned()],
            terms: SENSITIVE_TERMS.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    /// Scanner over a custom term list; report order follows `terms`.
    /// Terms are lower-cased, so matching stays case-insensitive.
    pub fn with_terms<I>(terms: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            workflows: vec![DEFAULT_WORKFLOW.to_owned()],
            terms: terms.into_iter().map(|t| t.as_ref().to_lowercase()).collect(),
        }
    }

    /// Terms contained in `file_name`, in curated-list order.
    pub fn matches(&self, file_name: &str) -> Vec<&str> {
        let lower = file_name.to_lowercase();
        self.terms
            .iter()
            .map(String::as_str)
            .filter(|term| lower.contains(term))
            .collect()
    }
}

impl Default for FilenameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerModule for FilenameScanner {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn workflows(&self) -> &[String] {
        &self.workflows
    }

    fn description(&self) -> &str {
        "Flags filenames containing credential, confidentiality or web-config terms"
    }

    fn should_process(
        &self,
        _object_id: &str,
        _files: &dyn FileMetadataProvider,
    ) -> Result<bool, ModuleError> {
        Ok(true)
    }

    fn process(&self, object_id: &str, files: &dyn FileMetadataProvider) -> ProcessResult {
        let record = files.get_file_metadata(object_id)?;
        debug!(object_id, file_name = %record.file_name, "Scanning filename");

        let matches = self.matches(&record.file_name);
        if matches.is_empty() {
            return Ok(None);
        }

        let severity = Severity::new(SEVERITY).map_err(|e| ModuleError::failed(e.to_string()))?;
        let summary = render_summary(&record.file_name, &matches);
        let finding = Finding::from_module(
            MODULE_NAME,
            &record.object_id,
            FindingCategory::Misc,
            FINDING_NAME,
            severity,
        )
        .with_raw_data(json!({ "filename": &record.file_name, "matches": &matches }))
        .with_artifact(DisplayArtifact::finding_summary(summary));

        Ok(Some(
            EnrichmentResult::new(MODULE_NAME)
                .with_finding(finding)
                .with_result("sensitive_terms", json!(matches)),
        ))
    }
}

/// Markdown summary: heading, offending filename, bulleted matches.
fn render_summary(file_name: &str, matches: &[&str]) -> String {
    let mut lines = vec![
        "# Sensitive Filename Detection".to_owned(),
        format!("\nThe filename **{file_name}** contains potentially sensitive terms:\n"),
        "### Matches".to_owned(),
    ];
    lines.extend(matches.iter().map(|m| format!("- `{m}`")));
    lines.join("\n")
}

pub fn create_module() -> Box<dyn AnalyzerModule> {
    Box::new(FilenameScanner::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileRecord, FindingOrigin};
    use crate::provider::{InMemoryStore, ProviderError};

    fn store_with(name: &str) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert(FileRecord::new("obj", name));
        store
    }

    fn matches_of(name: &str) -> Option<Vec<String>> {
        let store = store_with(name);
        let result = FilenameScanner::new().process("obj", &store).unwrap()?;
        let raw = result.findings[0].raw_data()["matches"].clone();
        Some(serde_json::from_value(raw).unwrap())
    }

    #[test]
    fn password_backup_yields_one_finding() {
        let store = store_with("my_password_backup.zip");
        let result = FilenameScanner::new()
            .process("obj", &store)
            .unwrap()
            .expect("expected a result");

        assert_eq!(result.module_name, MODULE_NAME);
        assert_eq!(result.findings.len(), 1);
        let f = &result.findings[0];
        assert_eq!(f.category(), FindingCategory::Misc);
        assert_eq!(f.finding_name(), FINDING_NAME);
        assert_eq!(f.origin_type(), FindingOrigin::EnrichmentModule);
        assert_eq!(f.origin_name(), MODULE_NAME);
        assert_eq!(f.object_id(), "obj");
        assert_eq!(f.severity().value(), 4);
        assert_eq!(f.raw_data()["filename"], "my_password_backup.zip");
        assert_eq!(f.raw_data()["matches"], json!(["password"]));
        assert_eq!(result.results["sensitive_terms"], json!(["password"]));
    }

    #[test]
    fn clean_filename_is_absent() {
        assert_eq!(matches_of("readme.txt"), None);
    }

    #[test]
    fn wp_config_backup() {
        assert_eq!(matches_of("wp-config.php.bak"), Some(vec!["wp-config".into()]));
    }

    /// Matches follow curated-list order, not position in the filename.
    #[test]
    fn matches_use_list_order() {
        assert_eq!(
            matches_of("secret_password_backup.txt"),
            Some(vec!["password".into(), "secret".into()])
        );
        let scanner = FilenameScanner::new();
        let order: Vec<usize> = scanner
            .matches("secret_password_backup.txt")
            .iter()
            .map(|m| SENSITIVE_TERMS.iter().position(|t| t == m).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn custom_term_order_is_respected() {
        let scanner = FilenameScanner::with_terms(vec!["readme", "secret", "password", "token"]);
        assert_eq!(
            scanner.matches("secret_password_backup.txt"),
            vec!["secret", "password"]
        );
        assert_eq!(
            scanner.matches("password_secret_backup.txt"),
            vec!["secret", "password"]
        );
    }

    #[test]
    fn custom_terms_are_case_insensitive() {
        let scanner = FilenameScanner::with_terms(["Secret", "API_Key"]);
        assert_eq!(scanner.matches("secret.txt"), vec!["secret"]);
        assert_eq!(scanner.matches("Secret.txt"), vec!["secret"]);
        assert_eq!(scanner.matches("prod_api_key.env"), vec!["api_key"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(matches_of("PASSWORD.txt"), matches_of("password.txt"));
        assert_eq!(matches_of("PASSWORD.txt"), Some(vec!["password".into()]));
    }

    /// Substring matching is not word-boundary aware.
    #[test]
    fn substring_inside_words_still_matches() {
        assert_eq!(matches_of("mypasswordfile"), Some(vec!["password".into()]));
    }

    #[test]
    fn overlapping_terms_all_reported() {
        assert_eq!(
            matches_of("credentials.json"),
            Some(vec!["credentials".into(), "credential".into()])
        );
        assert_eq!(
            matches_of(".htpasswd"),
            Some(vec!["passwd".into(), "htpasswd".into()])
        );
    }

    #[test]
    fn summary_lists_every_match() {
        let summary = render_summary("secret_token.txt", &["secret", "token"]);
        assert!(summary.starts_with("# Sensitive Filename Detection"));
        assert!(summary.contains("**secret_token.txt**"));
        assert!(summary.contains("### Matches"));
        assert!(summary.ends_with("- `secret`\n- `token`"));
    }

    #[test]
    fn should_process_is_always_true() {
        let store = InMemoryStore::new();
        let scanner = FilenameScanner::new();
        for id in ["", "obj", "does-not-exist", "☃"] {
            assert!(scanner.should_process(id, &store).unwrap());
        }
    }

    #[test]
    fn process_is_idempotent() {
        let store = store_with("internal_keytab.bin");
        let scanner = FilenameScanner::new();
        let a = scanner.process("obj", &store).unwrap().unwrap();
        let b = scanner.process("obj", &store).unwrap().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_object_is_a_provider_error() {
        let store = InMemoryStore::new();
        let err = FilenameScanner::new().process("nope", &store).unwrap_err();
        assert!(matches!(
            err,
            ModuleError::Provider(ProviderError::NotFound(ref id)) if id == "nope"
        ));
    }

    #[test]
    fn factory_builds_default_workflow_module() {
        let module = create_module();
        assert_eq!(module.name(), MODULE_NAME);
        assert_eq!(module.workflows(), [DEFAULT_WORKFLOW.to_owned()]);
    }
}

//! Step-based compliance checks over serialized files.
//!
//! Each check records a sequence of named [`Step`]s. A step that fails
//! leaves every later step [`Status::NotExecuted`], so a report always lists
//! the full plan of the check even when it stops early.

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::interchange::EnvironmentFormat;
use crate::model::Environment;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Failed,
    NotExecuted,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::NotExecuted => "NOT_EXECUTED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub status: Status,
    pub messages: Vec<String>,
}

/// Outcome of one compliance check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComplianceReport {
    steps: Vec<Step>,
}

impl ComplianceReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Whether no step failed or was skipped.
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.status == Status::Success)
    }

    fn succeed(&mut self, name: impl Into<String>) {
        self.push(name.into(), Status::Success, Vec::new());
    }

    fn fail(&mut self, name: impl Into<String>, message: impl fmt::Display) {
        let name = name.into();
        warn!(step = %name, "compliance step failed: {message}");
        self.push(name, Status::Failed, vec![message.to_string()]);
    }

    fn skip<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.push(name.into(), Status::NotExecuted, Vec::new());
        }
    }

    fn push(&mut self, name: String, status: Status, messages: Vec<String>) {
        debug!(step = %name, %status, "compliance step");
        self.steps.push(Step {
            name,
            status,
            messages,
        });
    }
}

impl fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>2}. {:<13} {}", i + 1, step.status, step.name)?;
            for message in &step.messages {
                writeln!(f, "      {message}")?;
            }
        }
        Ok(())
    }
}

struct StepNames {
    open: String,
    parse: String,
    decode: String,
}

impl StepNames {
    fn new(format: &dyn EnvironmentFormat, label: Option<&str>) -> Self {
        let file = match label {
            Some(label) => format!("{label} file"),
            None => "file".to_string(),
        };
        Self {
            open: format!("Open {file}"),
            parse: format!("Check {file} is well-formed {}", format.name()),
            decode: format!("Decode {file}"),
        }
    }
}

/// Open, parse and decode one file. Returns the environment when every
/// step succeeded.
fn deserialize_into(
    report: &mut ComplianceReport,
    path: &Path,
    format: &dyn EnvironmentFormat,
    label: Option<&str>,
    later: &[&str],
) -> Option<Environment> {
    let names = StepNames::new(format, label);
    let remaining = |from: &[&str]| -> Vec<String> {
        from.iter()
            .map(|s| s.to_string())
            .chain(later.iter().map(|s| s.to_string()))
            .collect()
    };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            report.fail(names.open, format!("{}: {e}", path.display()));
            report.skip(remaining(&[names.parse.as_str(), names.decode.as_str()]));
            return None;
        }
    };
    report.succeed(names.open);

    let input = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
    if let Err(e) = format.validate(input) {
        report.fail(names.parse, e);
        report.skip(remaining(&[names.decode.as_str()]));
        return None;
    }
    report.succeed(names.parse);

    match format.read(input) {
        Ok(env) => {
            report.succeed(names.decode);
            Some(env)
        }
        Err(e) => {
            report.fail(names.decode, e);
            report.skip(remaining(&[]));
            None
        }
    }
}

/// Check that a file decodes cleanly under `format`.
pub fn check_deserialization(path: &Path, format: &dyn EnvironmentFormat) -> ComplianceReport {
    let mut report = ComplianceReport::new();
    deserialize_into(&mut report, path, format, None, &[]);
    report
}

const COMPARE_STEP: &str = "Check files are equivalent";

/// Check that two files decode to the same environment, ignoring the order
/// of identifiables.
pub fn check_files_equivalence(
    first: &Path,
    second: &Path,
    format: &dyn EnvironmentFormat,
) -> ComplianceReport {
    let mut report = ComplianceReport::new();
    let second_names = StepNames::new(format, Some("second"));
    let after_first = [
        second_names.open.as_str(),
        second_names.parse.as_str(),
        second_names.decode.as_str(),
        COMPARE_STEP,
    ];
    let Some(a) = deserialize_into(&mut report, first, format, Some("first"), &after_first)
    else {
        return report;
    };
    let Some(b) = deserialize_into(&mut report, second, format, Some("second"), &[COMPARE_STEP])
    else {
        return report;
    };

    let differences = differences(&a, &b);
    if differences.is_empty() {
        report.succeed(COMPARE_STEP);
    } else {
        warn!(count = differences.len(), "files are not equivalent");
        report.push(COMPARE_STEP.to_string(), Status::Failed, differences);
    }
    report
}

fn differences(a: &Environment, b: &Environment) -> Vec<String> {
    let mut out = Vec::new();
    for item in a.iter() {
        let id = item.identifier().id();
        match b.get(id) {
            None => out.push(format!("`{id}` only in first file")),
            Some(other) if other != item => out.push(format!("`{id}` differs")),
            Some(_) => {}
        }
    }
    for item in b.iter() {
        let id = item.identifier().id();
        if !a.contains(id) {
            out.push(format!("`{id}` only in second file"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::Json;
    use crate::model::{Identifier, Submodel};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    const ONE: &str = r#"{"submodels":[{"modelType":"Submodel","id":"urn:sm:1","idShort":"One"}]}"#;

    #[test]
    fn test_deserialization_passes() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "one.json", ONE);
        let report = check_deserialization(&path, &Json::new());
        assert!(report.passed(), "{report}");
        assert_eq!(report.steps().len(), 3);
    }

    #[test]
    fn test_bom_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bom.json", &format!("\u{feff}{ONE}"));
        assert!(check_deserialization(&path, &Json::new()).passed());
    }

    #[test]
    fn test_missing_file_skips_remaining_steps() {
        let dir = TempDir::new().unwrap();
        let report = check_deserialization(&dir.path().join("absent.json"), &Json::new());
        let statuses: Vec<_> = report.steps().iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            [Status::Failed, Status::NotExecuted, Status::NotExecuted]
        );
        assert_eq!(report.steps()[0].messages.len(), 1);
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "bad.json",
            r#"{"submodels":[{"modelType":"Submodel","idShort":"NoId"}]}"#,
        );
        let report = check_deserialization(&path, &Json::new());
        assert!(!report.passed());
        assert_eq!(report.steps()[2].status, Status::Failed);
        assert!(report.steps()[2].messages[0].contains("id"));
    }

    #[test]
    fn test_equivalence_ignores_order() {
        let dir = TempDir::new().unwrap();
        let mut env = Environment::new();
        env.insert(Submodel::new(Identifier::iri("urn:sm:1").unwrap(), "One").unwrap())
            .unwrap();
        env.insert(Submodel::new(Identifier::iri("urn:sm:2").unwrap(), "Two").unwrap())
            .unwrap();
        let a = write(
            &dir,
            "a.json",
            &String::from_utf8(Json::new().write(&env).unwrap()).unwrap(),
        );
        let b = write(
            &dir,
            "b.json",
            r#"{"submodels":[
                {"modelType":"Submodel","id":"urn:sm:2","idShort":"Two"},
                {"modelType":"Submodel","id":"urn:sm:1","idShort":"One"}
            ]}"#,
        );
        let report = check_files_equivalence(&a, &b, &Json::new());
        assert!(report.passed(), "{report}");
        assert_eq!(report.steps().len(), 7);
    }

    #[test]
    fn test_equivalence_lists_differences() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.json", ONE);
        let b = write(
            &dir,
            "b.json",
            r#"{"submodels":[{"modelType":"Submodel","id":"urn:sm:1","idShort":"Renamed"},
                {"modelType":"Submodel","id":"urn:sm:9"}]}"#,
        );
        let report = check_files_equivalence(&a, &b, &Json::new());
        let compare = report.step(COMPARE_STEP).unwrap();
        assert_eq!(compare.status, Status::Failed);
        assert_eq!(
            compare.messages,
            ["`urn:sm:1` differs", "`urn:sm:9` only in second file"]
        );
    }

    #[test]
    fn test_equivalence_stops_after_first_file() {
        let dir = TempDir::new().unwrap();
        let b = write(&dir, "b.json", ONE);
        let report = check_files_equivalence(&dir.path().join("nope.json"), &b, &Json::new());
        assert_eq!(report.steps().len(), 7);
        assert!(
            report.steps()[1..]
                .iter()
                .all(|s| s.status == Status::NotExecuted)
        );
    }
}

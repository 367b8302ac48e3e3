//! Compliance reports over files written by the codecs.

use aas::compliance::{Status, check_deserialization, check_files_equivalence};
use aas::interchange::{EnvironmentFormat, Json, NS_AAS, Xml};
use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::*;

fn write_fixture(dir: &TempDir, name: &str, format: &dyn EnvironmentFormat) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, format.write(&motor_environment()).unwrap()).unwrap();
    path
}

#[test]
fn test_written_files_pass_deserialization() {
    let dir = TempDir::new().unwrap();
    for (name, format) in [
        ("motor.json", &Json::new() as &dyn EnvironmentFormat),
        ("motor.xml", &Xml::new()),
    ] {
        let path = write_fixture(&dir, name, format);
        let report = check_deserialization(&path, format);
        assert!(report.passed(), "{name}:\n{report}");
    }
}

#[test]
fn test_pretty_and_compact_files_are_equivalent() {
    let dir = TempDir::new().unwrap();
    let pretty = write_fixture(&dir, "pretty.json", &Json::new());
    let compact_format = Json::with_options(aas::interchange::CodecOptions {
        pretty: false,
        ..Default::default()
    });
    let compact = write_fixture(&dir, "compact.json", &compact_format);
    let report = check_files_equivalence(&pretty, &compact, &Json::new());
    assert!(report.passed(), "{report}");
}

#[test]
fn test_wrong_format_fails_at_syntax_check() {
    let dir = TempDir::new().unwrap();
    let xml = write_fixture(&dir, "motor.xml", &Xml::new());
    let report = check_deserialization(&xml, &Json::new());
    let statuses: Vec<_> = report.steps().iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        [Status::Success, Status::Failed, Status::NotExecuted]
    );
}

#[rstest]
#[case("truncated.json", r#"{"submodels": [ {"modelType": "#.to_string())]
#[case("truncated.xml", format!(r#"<environment xmlns="{NS_AAS}"><submodels>"#))]
fn test_truncated_file_fails_at_syntax_check(#[case] name: &str, #[case] content: String) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    let format = aas::interchange::detect_format(&path).unwrap();
    let report = check_deserialization(&path, format.as_ref());
    let statuses: Vec<_> = report.steps().iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        [Status::Success, Status::Failed, Status::NotExecuted],
        "{report}"
    );
}

#[test]
fn test_report_renders_every_step() {
    let dir = TempDir::new().unwrap();
    let report = check_deserialization(&dir.path().join("missing.xml"), &Xml::new());
    let text = report.to_string();
    assert!(text.contains("FAILED"));
    assert_eq!(text.matches("NOT_EXECUTED").count(), 2);
}

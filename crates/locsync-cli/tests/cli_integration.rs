mod helpers;

use helpers::*;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde::Deserialize;

#[derive(Deserialize)]
struct CheckOut {
    schema_version: u32,
    assets: usize,
    segments: usize,
    score: u8,
    groups: Vec<GroupOut>,
}

#[derive(Deserialize)]
struct GroupOut {
    normalized_source: String,
    variations: Vec<VariationOut>,
    affected_files: Vec<String>,
    tm_conflict: bool,
}

#[derive(Deserialize)]
struct VariationOut {
    text: String,
}

#[derive(Deserialize)]
struct ResolveOut {
    updated_segments: usize,
    changed_files: Vec<String>,
    dry_run: bool,
    remaining_groups: usize,
}

#[derive(Deserialize)]
struct SegmentOut {
    file: String,
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct HealthOut {
    checked: usize,
    issues: Vec<IssueOut>,
}

#[derive(Deserialize)]
struct IssueOut {
    category: String,
}

fn check_json(tmp: &std::path::Path, root: &std::path::Path) -> CheckOut {
    let out = bin_cmd(tmp)
        .args(["--quiet", "check", "--format", "json", "--root"])
        .arg(root)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_str(&stdout_of(&out)).expect("valid json")
}

#[test]
fn check_reports_divergent_group() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());

    let report = check_json(tmp.path(), &root);
    assert_eq!(report.schema_version, 1);
    assert_eq!(report.assets, 2);
    assert_eq!(report.segments, 3);
    assert_eq!(report.score, 95);
    assert_eq!(report.groups.len(), 1);
    let g = &report.groups[0];
    assert_eq!(g.normalized_source, "submit");
    assert!(g.tm_conflict);
    let texts: Vec<_> = g.variations.iter().map(|v| v.text.as_str()).collect();
    assert_eq!(texts, vec!["Enviar", "Confirmar"]);
    assert_eq!(g.affected_files, vec!["a.xlf", "nested/b.xlf"]);
    assert!(root.join(".locsync/locsync.assets.json").is_file());
}

#[test]
fn check_falls_back_to_persisted_assets() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());
    check_json(tmp.path(), &root);

    std::fs::remove_file(root.join("a.xlf")).unwrap();
    std::fs::remove_dir_all(root.join("nested")).unwrap();

    let report = check_json(tmp.path(), &root);
    assert_eq!(report.assets, 2);
    assert_eq!(report.segments, 3);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].affected_files, vec!["a.xlf", "nested/b.xlf"]);
}

#[test]
fn strict_check_fails_on_inconsistency() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());
    bin_cmd(tmp.path())
        .args(["--quiet", "check", "--strict", "--root"])
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("check-inconsistent"));
}

#[test]
fn resolve_pick_rewrites_every_file() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());

    let out = bin_cmd(tmp.path())
        .args(["--quiet", "resolve", "--source", "SUBMIT", "--pick", "1", "--format", "json", "--root"])
        .arg(&root)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let summary: ResolveOut = serde_json::from_str(&stdout_of(&out)).unwrap();
    assert_eq!(summary.updated_segments, 2);
    assert_eq!(summary.changed_files, vec!["a.xlf", "nested/b.xlf"]);
    assert!(!summary.dry_run);
    assert_eq!(summary.remaining_groups, 0);

    let b = std::fs::read_to_string(root.join("nested/b.xlf")).unwrap();
    assert!(b.contains(r#"<target state="translated">Enviar</target>"#));
    let a = std::fs::read_to_string(root.join("a.xlf")).unwrap();
    assert!(a.contains("<target>Cancelar</target>"));

    assert_eq!(check_json(tmp.path(), &root).score, 100);
}

#[test]
fn resolve_dry_run_touches_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());

    let out = bin_cmd(tmp.path())
        .args(["--quiet", "resolve", "--source", "Submit", "--canonical", "Aceptar", "--dry-run", "--format", "json", "--root"])
        .arg(&root)
        .output()
        .unwrap();
    assert!(out.status.success());
    let summary: ResolveOut = serde_json::from_str(&stdout_of(&out)).unwrap();
    assert!(summary.dry_run);
    assert_eq!(summary.changed_files.len(), 2);

    assert_eq!(std::fs::read_to_string(root.join("a.xlf")).unwrap(), CHECKOUT);
    assert_eq!(std::fs::read_to_string(root.join("nested/b.xlf")).unwrap(), PROFILE);
    assert!(!root.join(".locsync").exists());
}

#[test]
fn resolve_backup_keeps_originals() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());

    bin_cmd(tmp.path())
        .args(["--quiet", "resolve", "--source", "Submit", "--canonical", "Aceptar", "--backup", "--root"])
        .arg(&root)
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(root.join("a.xlf.bak")).unwrap(), CHECKOUT);
    assert!(std::fs::read_to_string(root.join("a.xlf")).unwrap().contains("Aceptar"));
}

#[test]
fn resolve_rejects_unknown_pick() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());
    bin_cmd(tmp.path())
        .args(["--quiet", "resolve", "--source", "Submit", "--pick", "9", "--root"])
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
    assert_eq!(std::fs::read_to_string(root.join("a.xlf")).unwrap(), CHECKOUT);
}

#[test]
fn scan_lists_units_as_csv_and_json() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());

    bin_cmd(tmp.path())
        .args(["--quiet", "scan", "--format", "csv", "--root"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("file,id,source,target,status,state,tm_match,translatable"))
        .stdout(predicate::str::contains("a.xlf,btn.submit,Submit,Enviar,approved,final,true,true"));

    let out = bin_cmd(tmp.path())
        .args(["--quiet", "scan", "--format", "json", "--root"])
        .arg(&root)
        .output()
        .unwrap();
    let items: Vec<SegmentOut> = serde_json::from_str(&stdout_of(&out)).unwrap();
    let ids: Vec<_> = items.iter().map(|s| (s.file.as_str(), s.id.as_str())).collect();
    assert_eq!(ids, vec![("a.xlf", "btn.submit"), ("a.xlf", "btn.cancel"), ("nested/b.xlf", "save")]);
    assert_eq!(items[1].status, "translated");
}

#[test]
fn search_matches_targets() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());
    let out = bin_cmd(tmp.path())
        .args(["--quiet", "search", "--query", "cancelar", "--format", "json", "--root"])
        .arg(&root)
        .output()
        .unwrap();
    let items: Vec<SegmentOut> = serde_json::from_str(&stdout_of(&out)).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "btn.cancel");
}

#[test]
fn set_source_updates_one_unit() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());
    let file = root.join("nested/b.xlf");

    bin_cmd(tmp.path())
        .args(["--quiet", "set-source", "--id", "save", "--text", "Save & close", "--file"])
        .arg(&file)
        .assert()
        .success();
    let b = std::fs::read_to_string(&file).unwrap();
    assert!(b.contains("<source>Save &amp; close</source>"));
    assert!(b.contains(r#"<target state="new">Confirmar</target>"#));
}

#[test]
fn xml_health_filters_categories() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("project");
    write(&root, "ok.xlf", CHECKOUT);
    write(&root, "ctrl.xlf", "<xliff><trans-unit id=\"a\"><source>bad\u{1b}char</source></trans-unit></xliff>");
    write(&root, "broken.xlf", "<xliff><trans-unit id=\"a\"><source>x</target></trans-unit></xliff>");

    let out = bin_cmd(tmp.path())
        .args(["--quiet", "xml-health", "--format", "json", "--only", "invalid-char", "--root"])
        .arg(&root)
        .output()
        .unwrap();
    assert!(out.status.success());
    let report: HealthOut = serde_json::from_str(&stdout_of(&out)).unwrap();
    assert_eq!(report.checked, 3);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].category, "invalid-char");

    bin_cmd(tmp.path())
        .args(["--quiet", "xml-health", "--format", "json", "--strict", "--root"])
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("xmlhealth-issues"));
}

#[test]
fn schema_dumps_report_schemas() {
    let tmp = tempfile::tempdir().unwrap();
    let out_dir = tmp.path().join("schemas");
    bin_cmd(tmp.path())
        .args(["--quiet", "schema", "--out-dir"])
        .arg(&out_dir)
        .assert()
        .success();
    for name in [
        "segment_record.schema.json",
        "check_report.schema.json",
        "resolve_summary.schema.json",
        "suggestion_record.schema.json",
        "health_report.schema.json",
    ] {
        assert!(out_dir.join(name).is_file(), "missing {name}");
    }
}

#[test]
fn suggest_reports_service_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let root = project(tmp.path());
    write(
        tmp.path(),
        "locsync.toml",
        "target_lang = \"es\"\n[recommend]\nendpoint = \"http://127.0.0.1:9/v1/chat/completions\"\napi_key_env = \"LOCSYNC_TEST_NO_SUCH_KEY\"\ntimeout_secs = 5\n",
    );

    bin_cmd(tmp.path())
        .args(["--quiet", "suggest", "--source", "Submit", "--root"])
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("suggest-failed"));
    assert_eq!(std::fs::read_to_string(root.join("a.xlf")).unwrap(), CHECKOUT);
}

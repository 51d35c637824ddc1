use super::*;
use camino::Utf8Path;
use reqs_manifest::ManifestTree;
use std::fs;
use tempfile::TempDir;

const TITANOBOA: &str = "git+https://github.com/vyperlang/titanoboa.git@40e85c602aa2c15baaf5060547c1224178d9efae";

fn check(content: &str) -> Report {
    let manifest = Manifest::parse(content, "requirements.txt").unwrap();
    Checker::default().check_manifest(&manifest)
}

fn rules(report: &Report) -> Vec<RuleId> {
    report.findings.iter().map(|f| f.rule).collect()
}

#[test]
fn test_clean_manifest() {
    let content = format!(
        "# testing\npytest>=7\nhypothesis==6.74.0\n\n# runtime\nvyper>=0.3.10\n{}\n",
        TITANOBOA
    );
    let report = check(&content);
    assert!(report.is_empty(), "{:?}", report.findings);
    assert!(report.is_success());
}

#[test]
fn test_conflicting_pins() {
    let report = check("hypothesis==6.74.0\nblack\nhypothesis==6.75.0\n");
    assert_eq!(rules(&report), vec![RuleId::ConflictingConstraints]);

    let finding = &report.findings[0];
    assert_eq!(finding.line, 3);
    assert_eq!(finding.level, Level::Deny);
    assert_eq!(finding.package.as_deref(), Some("hypothesis"));
    assert!(finding.message.contains("==6.74.0 and ==6.75.0"));
    assert!(!report.is_success());
}

#[test]
fn test_conflicting_ranges() {
    let report = check("vyper>=0.3.10\nvyper<0.3.9\n");
    assert_eq!(rules(&report), vec![RuleId::ConflictingConstraints]);
}

#[test]
fn test_release_candidate_below_its_own_final_conflicts() {
    let report = check("vyper>=0.4.0rc1\nvyper<0.4.0\n");
    assert_eq!(rules(&report), vec![RuleId::ConflictingConstraints]);
    assert_eq!(report.findings[0].line, 2);
    assert!(report.findings[0].message.contains(">=0.4.0rc1 and <0.4.0"));

    let report = check("hypothesis>6.74\nhypothesis<=6.74.post1\n");
    assert_eq!(rules(&report), vec![RuleId::ConflictingConstraints]);

    let report = check("vyper>=0.4.0rc1\nvyper<0.4.1\n");
    assert_eq!(rules(&report), vec![RuleId::DuplicateDeclaration]);
}

#[test]
fn test_compatible_duplicates_are_warnings() {
    let report = check("vyper>=0.3.10\nVyper<0.5\n");
    assert_eq!(rules(&report), vec![RuleId::DuplicateDeclaration]);
    assert_eq!(report.findings[0].line, 2);
    assert_eq!(report.findings[0].level, Level::Warn);
    assert!(report.findings[0].message.contains("requirements.txt:1"));
    assert!(report.is_success());
}

#[test]
fn test_source_with_constraint_is_not_a_duplicate() {
    let content = format!("titanoboa @ {}\ntitanoboa>=0.1\n", TITANOBOA);
    assert!(check(&content).is_empty());
}

#[test]
fn test_different_sources_conflict() {
    let content = format!(
        "{}\ntitanoboa @ git+https://github.com/fork/titanoboa.git@{}\n",
        TITANOBOA,
        "0".repeat(40)
    );
    let report = check(&content);
    assert_eq!(rules(&report), vec![RuleId::ConflictingConstraints]);
    assert!(report.findings[0].message.contains("requirements.txt:1"));
}

#[test]
fn test_different_markers_are_separate_declarations() {
    let report = check(
        "numpy==1.24.0; python_version < \"3.9\"\nnumpy==1.26.0; python_version >= \"3.9\"\n",
    );
    assert!(report.is_empty(), "{:?}", report.findings);
}

#[test]
fn test_floating_revisions() {
    let report = check(
        "git+https://github.com/vyperlang/titanoboa.git@master#egg=titanoboa\n\
         git+https://github.com/ethereum/eth-utils.git#egg=eth-utils\n\
         git+https://github.com/vyperlang/vyper.git@40e85c6#egg=vyper\n",
    );
    assert_eq!(rules(&report), vec![RuleId::FloatingRevision; 3]);
    assert!(report.findings[0].message.contains("'master'"));
    assert!(report.findings[1].message.contains("does not pin a revision"));
    assert_eq!(report.errors, 3);
}

#[test]
fn test_unpinned_follows_level() {
    assert!(check("black\nflake8\n").is_empty());

    let manifest = Manifest::parse("black\nflake8\n", "requirements.txt").unwrap();
    let mut checker = Checker::default();
    checker.set_level(RuleId::Unpinned, Level::Warn);
    let report = checker.check_manifest(&manifest);
    assert_eq!(rules(&report), vec![RuleId::Unpinned; 2]);
    assert_eq!(report.warnings, 2);
}

#[test]
fn test_levels_from_config() {
    let mut levels = BTreeMap::new();
    levels.insert(RuleId::DuplicateDeclaration, Level::Deny);
    levels.insert(RuleId::ConflictingConstraints, Level::Allow);
    let checker = Checker::new(levels);

    assert_eq!(checker.level(RuleId::FloatingRevision), Level::Deny);
    let manifest =
        Manifest::parse("pytest>=7\npytest>=7.1\nrich==13.0\nrich==13.1\n", "r.txt").unwrap();
    let report = checker.check_manifest(&manifest);
    assert_eq!(rules(&report), vec![RuleId::DuplicateDeclaration]);
    assert!(matches!(
        report.into_result(),
        Err(ReqsError::CheckFailed { errors: 1, warnings: 0 })
    ));
}

#[test]
fn test_partial_hashes() {
    let content = "\
requests==2.31.0 --hash=sha256:942c5a758f98d790eaed1a29cb6eefc7ffb0d1cf7af05c3d2791656dbd6ad1e1
urllib3==2.0.4
-e ./local-tools
";
    let report = check(content);
    assert_eq!(rules(&report), vec![RuleId::PartialHashes]);
    assert_eq!(report.findings[0].line, 2);
    assert_eq!(report.findings[0].package.as_deref(), Some("urllib3"));
}

#[test]
fn test_insecure_transport() {
    let report = check(
        "--index-url http://pypi.internal/simple\n\
         --extra-index-url https://pypi.org/simple\n\
         pkg @ http://example.com/pkg-1.0.tar.gz\n",
    );
    assert_eq!(
        rules(&report),
        vec![RuleId::InsecureTransport, RuleId::InsecureTransport]
    );
    assert_eq!(report.findings[0].package, None);
    assert_eq!(report.findings[1].package.as_deref(), Some("pkg"));
}

#[test]
fn test_finding_display_and_json() {
    let report = check("hypothesis==6.74.0\nhypothesis==6.75.0\n");
    assert!(report.findings[0]
        .to_string()
        .starts_with("requirements.txt:2: deny[conflicting-constraints]"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["errors"], 1);
    assert_eq!(json["findings"][0]["rule"], "conflicting-constraints");
    assert_eq!(json["findings"][0]["level"], "deny");
}

fn write(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).unwrap();
}

async fn load_tree(dir: &TempDir, root: &str) -> ManifestTree {
    let path = dir.path().join(root);
    ManifestTree::load(Utf8Path::from_path(&path).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_constraint_files_take_part_in_conflicts() {
    let dir = TempDir::new().unwrap();
    write(&dir, "requirements.txt", "-c constraints.txt\nhypothesis>=6.80\nblack\n");
    write(&dir, "constraints.txt", "hypothesis==6.74.0\nblack==23.1.0\nrich\n");

    let tree = load_tree(&dir, "requirements.txt").await;
    let mut checker = Checker::default();
    checker.set_level(RuleId::Unpinned, Level::Warn);
    let report = checker.check_tree(&tree);

    // constraints never count as duplicates or unpinned declarations
    let found = rules(&report);
    assert_eq!(
        found,
        vec![RuleId::ConflictingConstraints, RuleId::Unpinned],
        "{:?}",
        report.findings
    );
    assert!(report.findings[0].file.ends_with("constraints.txt"));
    assert!(report.findings[0].message.contains(">=6.80 and ==6.74.0"));
}

#[tokio::test]
async fn test_duplicates_across_included_files() {
    let dir = TempDir::new().unwrap();
    write(&dir, "requirements.txt", "-r dev.txt\npytest>=7\n");
    write(&dir, "dev.txt", "pytest>=7.2\n");

    let tree = load_tree(&dir, "requirements.txt").await;
    let report = Checker::default().check_tree(&tree);
    assert_eq!(rules(&report), vec![RuleId::DuplicateDeclaration]);
    assert!(report.findings[0].file.ends_with("dev.txt"));
    assert!(report.findings[0].message.contains("requirements.txt:2"));
}

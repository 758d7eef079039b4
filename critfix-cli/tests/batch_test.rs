use critfix::config::{BackupPolicy, Config};
use critfix::engine::{self, BackupManager, FileStatus, ProcessMode};
use critfix::rules::RuleKind;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn backups_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".backup_critical"))
        .collect();
    names.sort();
    names
}

fn three_files(dir: &Path) {
    fs::write(
        dir.join("AuthController.cs"),
        "var a = DateTime.Now;\nvar b = DateTime.Now.AddDays(1);\n",
    )
    .unwrap();
    fs::write(dir.join("ClienteController.cs"), "var a = DateTime.UtcNow;\n").unwrap();
    fs::write(dir.join("InfoController.cs"), "return Ok();\n").unwrap();
}

#[test]
fn test_three_file_batch_on_change_policy() {
    let temp = TempDir::new().unwrap();
    three_files(temp.path());

    let mut config = Config::default();
    config.batch.backup_policy = BackupPolicy::OnChange;

    let report = engine::batch_from_config(&config, temp.path().to_path_buf(), ProcessMode::Execute)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.stats.files_scanned, 3);
    assert_eq!(report.stats.files_processed, 1);
    assert_eq!(report.stats.rule_count(RuleKind::TimestampNormalization), 2);
    assert_eq!(report.stats.errors, 0);
    assert_eq!(backups_in(temp.path()), vec!["AuthController.cs.backup_critical"]);
}

#[test]
fn test_three_file_batch_default_policy_backs_up_everything() {
    let temp = TempDir::new().unwrap();
    three_files(temp.path());

    let report = engine::batch_from_config(
        &Config::default(),
        temp.path().to_path_buf(),
        ProcessMode::Execute,
    )
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(report.stats.files_processed, 1);
    assert_eq!(report.stats.timestamp_fixed, 2);
    assert_eq!(report.stats.backups_created, 3);
    assert_eq!(backups_in(temp.path()).len(), 3);

    // Reports come back in sorted order
    let names: Vec<_> = report
        .files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["AuthController.cs", "ClienteController.cs", "InfoController.cs"]
    );
}

#[test]
fn test_backup_files_are_never_input() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("A.cs"), "x = DateTime.Now;").unwrap();
    fs::write(temp.path().join("Old.cs.backup_critical"), "y = DateTime.Now;").unwrap();

    let report = engine::batch_from_config(
        &Config::default(),
        temp.path().to_path_buf(),
        ProcessMode::Execute,
    )
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(report.stats.files_scanned, 1);
    assert_eq!(
        fs::read_to_string(temp.path().join("Old.cs.backup_critical")).unwrap(),
        "y = DateTime.Now;"
    );
    assert!(!temp
        .path()
        .join("Old.cs.backup_critical.backup_critical")
        .exists());
}

#[test]
fn test_second_run_changes_nothing() {
    let temp = TempDir::new().unwrap();
    three_files(temp.path());
    let config = Config::default();

    let first = engine::batch_from_config(&config, temp.path().to_path_buf(), ProcessMode::Execute)
        .unwrap()
        .run()
        .unwrap();
    let after_first = fs::read_to_string(temp.path().join("AuthController.cs")).unwrap();

    let second = engine::batch_from_config(&config, temp.path().to_path_buf(), ProcessMode::Execute)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(first.stats.files_processed, 1);
    assert_eq!(second.stats.files_processed, 0);
    assert_eq!(second.stats.timestamp_fixed, 0);
    assert_eq!(second.stats.backups_created, 0);
    assert_eq!(
        fs::read_to_string(temp.path().join("AuthController.cs")).unwrap(),
        after_first
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("AuthController.cs.backup_critical")).unwrap(),
        "var a = DateTime.Now;\nvar b = DateTime.Now.AddDays(1);\n"
    );
}

#[test]
fn test_bad_file_does_not_abort_batch() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("A.cs"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
    fs::write(temp.path().join("B.cs"), "x = DateTime.Now;").unwrap();

    let report = engine::batch_from_config(
        &Config::default(),
        temp.path().to_path_buf(),
        ProcessMode::Execute,
    )
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.backup_failures, 0);
    assert_eq!(report.stats.files_processed, 1);
    assert_eq!(report.files[0].status, FileStatus::Failed);
    assert_eq!(report.files[1].status, FileStatus::Changed);
    assert_eq!(
        fs::read_to_string(temp.path().join("B.cs")).unwrap(),
        "x = DateTime.UtcNow;"
    );
}

#[test]
fn test_blocked_backup_skips_file_and_batch_continues() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("A.cs"), "x = DateTime.Now;").unwrap();
    fs::create_dir(temp.path().join("A.cs.backup_critical")).unwrap();
    fs::write(temp.path().join("B.cs"), "y = DateTime.Now;").unwrap();

    let report = engine::batch_from_config(
        &Config::default(),
        temp.path().to_path_buf(),
        ProcessMode::Execute,
    )
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(report.stats.files_scanned, 2);
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.backup_failures, 1);
    assert_eq!(report.stats.files_processed, 1);
    assert_eq!(report.stats.timestamp_fixed, 1);
    assert_eq!(report.files[0].status, FileStatus::Failed);
    assert_eq!(report.files[1].status, FileStatus::Changed);
    assert!(!report.is_success());

    assert_eq!(
        fs::read_to_string(temp.path().join("A.cs")).unwrap(),
        "x = DateTime.Now;"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("B.cs")).unwrap(),
        "y = DateTime.UtcNow;"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("B.cs.backup_critical")).unwrap(),
        "y = DateTime.Now;"
    );
}

#[test]
fn test_empty_backup_suffix_is_rejected() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("A.cs"), "x = DateTime.Now;").unwrap();

    let mut config = Config::default();
    config.batch.backup_suffix = String::new();

    assert!(engine::batch_from_config(&config, temp.path().to_path_buf(), ProcessMode::Execute).is_err());
    assert_eq!(
        fs::read_to_string(temp.path().join("A.cs")).unwrap(),
        "x = DateTime.Now;"
    );
}

#[test]
fn test_restore_reproduces_original_bytes() {
    let temp = TempDir::new().unwrap();
    let original = "using System;\r\n\r\nvar t = DateTime.Now; // é\r\n";
    let path = temp.path().join("A.cs");
    fs::write(&path, original).unwrap();

    let mut config = Config::default();
    config.rules.debug_guarding = true;
    engine::batch_from_config(&config, temp.path().to_path_buf(), ProcessMode::Execute)
        .unwrap()
        .run()
        .unwrap();
    assert_ne!(fs::read_to_string(&path).unwrap(), original);

    BackupManager::new(".backup_critical").restore(&path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), original.as_bytes());
}

#[test]
fn test_all_rules_together() {
    let temp = TempDir::new().unwrap();
    let source = "using System;

namespace Crm.Controllers
{
    public class InfoController : ControllerBase
    {
        private readonly CrmContext _context;

        public InfoController(CrmContext context)
        {
            _context = context;
        }

        public IActionResult Get()
        {
            Console.WriteLine(DateTime.Now);
            return Ok();
        }
    }
}
";
    fs::write(temp.path().join("InfoController.cs"), source).unwrap();

    let mut config = Config::default();
    config.rules.debug_guarding = true;
    config.rules.logger_injection = true;

    let report = engine::batch_from_config(&config, temp.path().to_path_buf(), ProcessMode::Execute)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.stats.timestamp_fixed, 1);
    assert_eq!(report.stats.loggers_injected, 1);
    assert_eq!(report.stats.debug_guards_added, 1);

    let rewritten = fs::read_to_string(temp.path().join("InfoController.cs")).unwrap();
    assert!(rewritten.contains("using Microsoft.Extensions.Logging;"));
    assert!(rewritten.contains("private readonly ILogger<InfoController> _logger;"));
    assert!(rewritten.contains("public InfoController(CrmContext context, ILogger<InfoController> logger)"));
    assert!(rewritten.contains(
        "            #if DEBUG\n            Console.WriteLine(DateTime.UtcNow);\n            #endif\n"
    ));
}

#[test]
fn test_dry_run_leaves_directory_untouched() {
    let temp = TempDir::new().unwrap();
    three_files(temp.path());

    let report = engine::batch_from_config(
        &Config::default(),
        temp.path().to_path_buf(),
        ProcessMode::DryRun,
    )
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(report.stats.files_processed, 1);
    assert_eq!(report.stats.timestamp_fixed, 2);
    assert!(backups_in(temp.path()).is_empty());
    assert_eq!(
        fs::read_to_string(temp.path().join("AuthController.cs")).unwrap(),
        "var a = DateTime.Now;\nvar b = DateTime.Now.AddDays(1);\n"
    );
}

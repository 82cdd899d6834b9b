//! Policy-driven copies between file channels.
//!
//! Run with: cargo test --test config_test

use std::path::Path;

use lio::{copy_checked, ConfigError, LatticeConfig, Level, LioError};

fn policy_in(dir: &Path) -> String {
    format!(
        r#"
principals: [alice, bob]
levels:
  public: []
  alice_only: [alice]
  team: [alice, bob]
channels:
  inbox:    {{ path: "{dir}/inbox.txt", level: alice_only }}
  report:   {{ path: "{dir}/report.txt", level: team }}
  bulletin: {{ path: "{dir}/bulletin.txt", level: public }}
  archive:  {{ path: "{dir}/archive.txt", level: top }}
"#,
        dir = dir.display()
    )
}

fn copy(config: &LatticeConfig, from: &str, to: &str) -> lio::Result<()> {
    copy_checked(&config.source(from)?, &config.sink(to)?)?.unsafe_run()
}

#[test]
fn sample_policy_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/lattice.yaml");
    let config = LatticeConfig::load(path).unwrap();
    assert_eq!(config.level("everyone").unwrap(), Level::top());
    assert_eq!(
        config.channel_level("report").unwrap(),
        Level::from_principals(["alice", "bob"])
    );
}

#[test]
fn permitted_copy_writes_the_sink_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("inbox.txt"), "q3 forecast").unwrap();
    let config = LatticeConfig::from_yaml_str(&policy_in(dir.path())).unwrap();

    copy(&config, "inbox", "report").unwrap();
    copy(&config, "report", "archive").unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("archive.txt")).unwrap(),
        "q3 forecast"
    );
}

#[test]
fn denied_copy_leaves_the_sink_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = LatticeConfig::from_yaml_str(&policy_in(dir.path())).unwrap();

    // inbox.txt does not exist, so any read would surface as a Read error
    let err = copy(&config, "inbox", "bulletin").unwrap_err();

    match err {
        LioError::FlowViolation { from, to } => {
            assert_eq!(from, Level::singleton("alice"));
            assert_eq!(to, Level::bot());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.path().join("bulletin.txt").exists());
}

#[test]
fn missing_channel_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = LatticeConfig::from_yaml_str(&policy_in(dir.path())).unwrap();

    let err = copy(&config, "inbox", "report").unwrap_err();

    assert!(matches!(err, LioError::Read { .. }));
}

#[test]
fn unknown_channel_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = LatticeConfig::from_yaml_str(&policy_in(dir.path())).unwrap();

    let err = copy(&config, "inbox", "outbox").unwrap_err();

    assert!(matches!(
        err,
        LioError::Config(ConfigError::UnknownChannel(ref name)) if name == "outbox"
    ));
}

// tests/config.rs

//! Config file loading feeding recipe configuration.

mod common;

use larder::config::PlatformOverrides;
use larder::platform::{BuildType, Os};
use larder::recipe::builtin_recipe;
use larder::{Error, LarderConfig};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
[kitchen]
jobs = 2
allow_system_dependencies = true

[kitchen.dependency_prefixes]
sdl = "/opt/sdl-1.2.15"

[profile]
os = "Linux"
arch = "x86_64"
build_type = "Debug"

[options.sdl_mixer]
mikmod = false
"#;

fn load(dir: &TempDir) -> LarderConfig {
    let path = dir.path().join("config.toml");
    fs::write(&path, CONFIG).unwrap();
    LarderConfig::discover(Some(&path)).unwrap()
}

#[test]
fn test_file_options_reach_configuration() {
    let dir = TempDir::new().unwrap();
    let config = load(&dir);
    assert_eq!(config.kitchen.jobs, 2);
    assert!(config.kitchen.allow_system_dependencies);

    let profile = config
        .profile_for("sdl_mixer", &PlatformOverrides::default(), &BTreeMap::new())
        .unwrap();
    assert_eq!(profile.platform.os, Os::Linux);
    assert_eq!(profile.platform.build_type, BuildType::Debug);

    let resolved = builtin_recipe("sdl_mixer")
        .unwrap()
        .configure(Some("1.2.12"), &profile)
        .unwrap();
    assert!(resolved.requirement("libmikmod").is_none());
    assert!(!resolved.options.is_enabled("mikmod"));
}

#[test]
fn test_command_line_overrides_file() {
    let dir = TempDir::new().unwrap();
    let config = load(&dir);

    let overrides = PlatformOverrides {
        os: Some("Windows".to_string()),
        build_type: Some("Release".to_string()),
        ..PlatformOverrides::default()
    };
    let mut options = BTreeMap::new();
    options.insert("mikmod".to_string(), "True".to_string());

    let profile = config.profile_for("sdl_mixer", &overrides, &options).unwrap();
    assert_eq!(profile.platform.os, Os::Windows);
    assert_eq!(profile.platform.build_type, BuildType::Release);

    let resolved = builtin_recipe("sdl_mixer")
        .unwrap()
        .configure(Some("1.2.12"), &profile)
        .unwrap();
    assert!(resolved.requirement("libmikmod").is_some());
}

#[test]
fn test_other_packages_ignore_foreign_options() {
    let dir = TempDir::new().unwrap();
    let config = load(&dir);

    let profile = config
        .profile_for("libmikmod", &PlatformOverrides::default(), &BTreeMap::new())
        .unwrap();
    assert!(profile.options.is_empty());
}

#[test]
fn test_unknown_platform_rejected() {
    let config = LarderConfig::default();
    let overrides = PlatformOverrides {
        os: Some("Plan9".to_string()),
        ..PlatformOverrides::default()
    };
    assert!(config
        .profile_for("smpeg", &overrides, &BTreeMap::new())
        .is_err());
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = TempDir::new().unwrap();
    let err = LarderConfig::discover(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
}

#[test]
fn test_unknown_keys_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[kitchen]\nthreads = 4\n").unwrap();
    assert!(matches!(
        LarderConfig::load(&path).unwrap_err(),
        Error::ConfigError(_)
    ));
}

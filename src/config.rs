// src/config.rs

//! The larder configuration file
//!
//! ```toml
//! [kitchen]
//! output_dir = "/srv/larder/packages"
//! jobs = 8
//!
//! [kitchen.dependency_prefixes]
//! sdl = "/opt/sdl-1.2.15"
//!
//! [profile]
//! os = "Linux"
//! build_type = "Release"
//! shared_dependencies = ["flac"]
//!
//! [options.sdl_mixer]
//! mikmod = false
//! ```
//!
//! The file is looked up from `--config`, then `LARDER_CONFIG`, then the
//! user config directory. A missing file yields the defaults; command line
//! flags override whatever the file sets.

use crate::error::{Error, Result};
use crate::platform::{parse_component, Arch, BuildType, Compiler, Os, Platform};
use crate::recipe::configure::Profile;
use crate::recipe::kitchen::KitchenConfig;
use crate::recipe::options::OptionValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "LARDER_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LarderConfig {
    pub kitchen: KitchenConfig,
    pub profile: ProfileDefaults,
    /// Option overrides per package name
    pub options: BTreeMap<String, BTreeMap<String, OptionValue>>,
}

/// Default target platform and dependency linkage
///
/// Unset platform fields fall back to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileDefaults {
    pub os: Option<String>,
    pub arch: Option<String>,
    pub compiler: Option<String>,
    pub build_type: Option<String>,
    pub shared_dependencies: BTreeSet<String>,
}

/// Platform fields given on the command line, overriding the file
#[derive(Debug, Clone, Default)]
pub struct PlatformOverrides {
    pub os: Option<String>,
    pub arch: Option<String>,
    pub compiler: Option<String>,
    pub build_type: Option<String>,
}

impl LarderConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Locate and load the config file; absent file means defaults
    ///
    /// An explicitly named file (flag or environment) must exist.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        match default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Build the profile for a package
    ///
    /// Command line platform fields and options win over the file.
    pub fn profile_for(
        &self,
        package: &str,
        platform: &PlatformOverrides,
        options: &BTreeMap<String, String>,
    ) -> Result<Profile> {
        let pick = |cli: &Option<String>, file: &Option<String>| cli.clone().or_else(|| file.clone());

        let os = match pick(&platform.os, &self.profile.os) {
            Some(os) => parse_component::<Os>("operating system", &os)?,
            None => Os::host(),
        };
        let arch = match pick(&platform.arch, &self.profile.arch) {
            Some(arch) => parse_component::<Arch>("architecture", &arch)?,
            None => Arch::host(),
        };
        let mut resolved = Platform::new(os, arch);
        if let Some(compiler) = pick(&platform.compiler, &self.profile.compiler) {
            resolved = resolved.with_compiler(parse_component::<Compiler>("compiler", &compiler)?);
        }
        if let Some(build_type) = pick(&platform.build_type, &self.profile.build_type) {
            resolved =
                resolved.with_build_type(parse_component::<BuildType>("build type", &build_type)?);
        }

        let mut profile = Profile::new(resolved);
        profile.shared_dependencies = self.profile.shared_dependencies.clone();

        let file_options = self
            .options
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(package))
            .map(|(_, opts)| opts);
        if let Some(opts) = file_options {
            for (name, value) in opts {
                profile.options.insert(name.clone(), value.to_string());
            }
        }
        profile
            .options
            .extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(profile)
    }
}

/// `<config dir>/larder/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("larder").join("config.toml"))
}

/// Parse `name=value` option arguments
pub fn parse_option_args(args: &[String]) -> Result<BTreeMap<String, String>> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| {
                    Error::ConfigError(format!("Option must be name=value, got '{}'", arg))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[kitchen]
jobs = 3
output_dir = "/srv/packages"

[profile]
os = "macos"
arch = "armv8"
build_type = "debug"
shared_dependencies = ["flac"]

[options.SDL_mixer]
mikmod = false
"#;

    #[test]
    fn test_load_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, CONFIG.as_bytes()).unwrap();

        let config = LarderConfig::discover(Some(file.path())).unwrap();
        assert_eq!(config.kitchen.jobs, 3);
        assert_eq!(config.kitchen.output_dir, PathBuf::from("/srv/packages"));
        assert_eq!(config.kitchen.cmake, "cmake");
    }

    #[test]
    fn test_profile_merging() {
        let config: LarderConfig = toml::from_str(CONFIG).unwrap();
        let mut cli_options = BTreeMap::new();
        cli_options.insert("ogg".to_string(), "False".to_string());

        let profile = config
            .profile_for("sdl_mixer", &PlatformOverrides::default(), &cli_options)
            .unwrap();
        assert_eq!(profile.platform.os, Os::Macos);
        assert_eq!(profile.platform.arch, Arch::Armv8);
        assert_eq!(profile.platform.compiler, Compiler::AppleClang);
        assert_eq!(profile.platform.build_type, BuildType::Debug);
        assert_eq!(profile.options["mikmod"], "false");
        assert_eq!(profile.options["ogg"], "False");
        assert!(profile.shared_dependencies.contains("flac"));

        let overrides = PlatformOverrides {
            os: Some("Linux".to_string()),
            ..PlatformOverrides::default()
        };
        let profile = config
            .profile_for("smpeg", &overrides, &BTreeMap::new())
            .unwrap();
        assert_eq!(profile.platform.os, Os::Linux);
        assert!(profile.options.is_empty());
    }

    #[test]
    fn test_bad_platform_value() {
        let overrides = PlatformOverrides {
            os: Some("Plan9".to_string()),
            ..PlatformOverrides::default()
        };
        assert!(LarderConfig::default()
            .profile_for("smpeg", &overrides, &BTreeMap::new())
            .is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(matches!(
            LarderConfig::discover(Some(Path::new("/nonexistent/larder.toml"))),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_parse_option_args() {
        let parsed =
            parse_option_args(&["shared=True".to_string(), "with_alsa = False".to_string()]).unwrap();
        assert_eq!(parsed["shared"], "True");
        assert_eq!(parsed["with_alsa"], "False");
        assert!(parse_option_args(&["shared".to_string()]).is_err());
        assert!(parse_option_args(&["=x".to_string()]).is_err());
    }
}

// src/recipe/kitchen/publish.rs

//! Plating: turning an install tree into a published package
//!
//! The install tree is copied into a staging directory inside the output
//! directory, trimmed according to the recipe's publish rules, given its
//! licenses and manifest, and only then renamed to its final name. A failure
//! at any point leaves no package directory behind.

use crate::error::{Error, Result};
use crate::recipe::condition::select_all;
use crate::recipe::configure::Configuration;
use crate::recipe::format::Recipe;
use crate::recipe::manifest::ArtifactManifest;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Directory inside a package holding license files
pub const LICENSE_DIR: &str = "licenses";

/// Outcome of publishing one configuration
#[derive(Debug)]
pub struct Published {
    pub package_dir: PathBuf,
    pub manifest: ArtifactManifest,
    pub warnings: Vec<String>,
    pub log: Vec<String>,
}

/// Publish `install_dir` as `<output_dir>/<name>-<version>-<id>/`
///
/// Licenses are looked up relative to `source_dir`. An existing package
/// directory for the same configuration is replaced.
pub fn publish(
    recipe: &Recipe,
    config: &Configuration,
    install_dir: &Path,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<Published> {
    fs::create_dir_all(output_dir).map_err(|e| {
        Error::PublishError(format!("Failed to create {}: {}", output_dir.display(), e))
    })?;

    let staging = tempfile::Builder::new()
        .prefix(".larder-staging-")
        .tempdir_in(output_dir)
        .map_err(|e| Error::PublishError(format!("Failed to create staging directory: {}", e)))?;
    let root = staging.path();

    let mut log = Vec::new();
    let mut warnings = Vec::new();

    copy_tree(install_dir, root)?;

    let rules = &recipe.publish;
    let (remove, remove_dirs, licenses) = config.evaluate(|ctx| {
        (
            select_all(&rules.remove, ctx),
            select_all(&rules.remove_dirs, ctx),
            select_all(&rules.licenses, ctx),
        )
    })?;

    for file in &remove {
        if is_pattern(file) {
            for path in expand(root, file)? {
                if path.is_file() || path.is_symlink() {
                    fs::remove_file(&path)?;
                    log.push(format!("Removed {}", path.strip_prefix(root).unwrap_or(&path).display()));
                }
            }
            continue;
        }

        let path = root.join(file);
        if !path.is_file() && !path.is_symlink() {
            return Err(Error::PublishError(format!(
                "File listed for removal does not exist: {}",
                file
            )));
        }
        fs::remove_file(&path)?;
        log.push(format!("Removed {}", file));
    }

    for dir in &remove_dirs {
        let path = root.join(dir);
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
            log.push(format!("Removed directory {}", dir));
        } else {
            debug!("Directory {} not present, nothing to remove", dir);
        }
    }

    for license in &licenses {
        let src = source_dir.join(license);
        if !src.is_file() {
            let msg = format!("License file {} not found in source tree", license);
            warn!("{}", msg);
            warnings.push(msg);
            continue;
        }
        let name = Path::new(license)
            .file_name()
            .ok_or_else(|| Error::PublishError(format!("Invalid license path: {}", license)))?;
        let dest_dir = root.join(LICENSE_DIR);
        fs::create_dir_all(&dest_dir)?;
        fs::copy(&src, dest_dir.join(name))?;
        log.push(format!("Copied license {}", license));
    }

    if rules.prune_empty_dirs {
        let pruned = prune_empty_dirs(root)?;
        if pruned > 0 {
            log.push(format!("Pruned {} empty directories", pruned));
        }
    }

    let mut manifest = ArtifactManifest::new(recipe, config);
    manifest.collect_files(root)?;
    manifest.write_to(root)?;

    let package_dir = output_dir.join(config.package_dir_name());
    if package_dir.exists() {
        info!("Replacing existing package {}", package_dir.display());
        fs::remove_dir_all(&package_dir)?;
    }
    fs::rename(root, &package_dir).map_err(|e| {
        Error::PublishError(format!(
            "Failed to move package into {}: {}",
            package_dir.display(),
            e
        ))
    })?;
    log.push(format!(
        "Published {} ({} files)",
        package_dir.display(),
        manifest.files.len()
    ));

    Ok(Published {
        package_dir,
        manifest,
        warnings,
        log,
    })
}

/// Whether a removal entry is a glob pattern rather than a literal path
fn is_pattern(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// Expand a glob relative to `root`; no matches is not an error
fn expand(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = root.join(pattern);
    let full = full.to_string_lossy();
    let paths = glob::glob(&full)
        .map_err(|e| Error::PublishError(format!("Invalid pattern '{}': {}", pattern, e)))?;
    Ok(paths.filter_map(|p| p.ok()).collect())
}

/// Recursively copy `src` into `dest`, keeping symlinks as symlinks
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry
            .map_err(|e| Error::IoError(format!("Failed to walk {}: {}", src.display(), e)))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::IoError(e.to_string()))?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| {
                Error::IoError(format!(
                    "Failed to copy {} to {}: {}",
                    entry.path().display(),
                    target.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    let link = fs::read_link(src)?;
    std::os::unix::fs::symlink(&link, dest)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest)?;
    Ok(())
}

/// Remove empty directories below `root`, deepest first
pub fn prune_empty_dirs(root: &Path) -> Result<usize> {
    let mut pruned = 0;
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry
            .map_err(|e| Error::IoError(format!("Failed to walk {}: {}", root.display(), e)))?;
        if entry.file_type().is_dir() && fs::read_dir(entry.path())?.next().is_none() {
            fs::remove_dir(entry.path())?;
            pruned += 1;
        }
    }
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os, Platform};
    use crate::recipe::builtin::builtin_recipe;
    use crate::recipe::configure::Profile;
    use crate::recipe::manifest::MANIFEST_FILE;

    fn install_tree(root: &Path) {
        for (path, content) in [
            ("include/mikmod.h", "/* mikmod */\n"),
            ("lib/libmikmod.a", "archive"),
            ("lib/pkgconfig/libmikmod.pc", "Name: mikmod\n"),
            ("bin/libmikmod-config", "#!/bin/sh\n"),
            ("share/doc/.keep", ""),
        ] {
            let full = root.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        fs::remove_file(root.join("share/doc/.keep")).unwrap();
    }

    fn libmikmod() -> (Recipe, Configuration) {
        let recipe = builtin_recipe("libmikmod").unwrap();
        let config = recipe
            .configure(None, &Profile::new(Platform::new(Os::Linux, Arch::X86_64)))
            .unwrap();
        (recipe, config)
    }

    #[test]
    fn test_publish_applies_rules() {
        let (recipe, config) = libmikmod();
        let work = tempfile::tempdir().unwrap();
        let install = work.path().join("install");
        let source = work.path().join("source");
        install_tree(&install);
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("COPYING.LESSER"), "LGPL\n").unwrap();

        let output = work.path().join("out");
        let published = publish(&recipe, &config, &install, &source, &output).unwrap();
        let dir = &published.package_dir;

        assert_eq!(dir.file_name().unwrap().to_string_lossy(), config.package_dir_name());
        assert!(dir.join("include/mikmod.h").is_file());
        assert!(dir.join("licenses/COPYING.LESSER").is_file());
        assert!(!dir.join("bin").exists());
        assert!(!dir.join("lib/pkgconfig").exists());
        assert!(!dir.join("share").exists());
        assert!(dir.join(MANIFEST_FILE).is_file());
        assert!(published.warnings.is_empty());

        let paths: Vec<&str> = published.manifest.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["include/mikmod.h", "lib/libmikmod.a", "licenses/COPYING.LESSER"]
        );

        // Nothing but the package is left in the output directory
        let entries: Vec<_> = fs::read_dir(&output).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_file_to_remove_is_fatal() {
        let (recipe, config) = libmikmod();
        let work = tempfile::tempdir().unwrap();
        let install = work.path().join("install");
        install_tree(&install);
        fs::remove_file(install.join("bin/libmikmod-config")).unwrap();

        let output = work.path().join("out");
        let err = publish(&recipe, &config, &install, work.path(), &output).unwrap_err();
        assert!(matches!(err, Error::PublishError(_)));
        assert_eq!(fs::read_dir(&output).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_license_warns() {
        let (recipe, config) = libmikmod();
        let work = tempfile::tempdir().unwrap();
        let install = work.path().join("install");
        install_tree(&install);

        let published =
            publish(&recipe, &config, &install, &work.path().join("nosrc"), &work.path().join("out"))
                .unwrap();
        assert_eq!(published.warnings.len(), 1);
        assert!(!published.package_dir.join(LICENSE_DIR).exists());
    }

    #[test]
    fn test_expand_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        for name in ["liba.la", "libb.la", "liba.a"] {
            fs::write(dir.path().join("lib").join(name), "").unwrap();
        }

        assert!(is_pattern("lib/*.la"));
        assert!(!is_pattern("bin/libmikmod-config"));
        assert_eq!(expand(dir.path(), "lib/*.la").unwrap().len(), 2);
        assert!(expand(dir.path(), "bin/*").unwrap().is_empty());
    }

    #[test]
    fn test_prune_empty_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::create_dir_all(dir.path().join("d")).unwrap();
        fs::write(dir.path().join("d/file"), "x").unwrap();

        assert_eq!(prune_empty_dirs(dir.path()).unwrap(), 3);
        assert!(!dir.path().join("a").exists());
        assert!(dir.path().join("d/file").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_keeps_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join("lib/libx.so.1"), "so").unwrap();
        std::os::unix::fs::symlink("libx.so.1", src.join("lib/libx.so")).unwrap();

        let dest = dir.path().join("dest");
        copy_tree(&src, &dest).unwrap();
        assert_eq!(
            fs::read_link(dest.join("lib/libx.so")).unwrap(),
            PathBuf::from("libx.so.1")
        );
    }
}

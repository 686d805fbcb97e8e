// src/recipe/kitchen/patch.rs

//! Applying recipe patches to an extracted source tree
//!
//! Two kinds of entry exist: exact-match-and-replace edits and unified
//! diffs. Entries run in order and the first failure aborts the run; a file
//! touched by a diff is only written once every hunk for it has applied.
//! A diff whose reverse already applies is reported as previously applied
//! rather than silently applied twice.

use crate::error::{Error, Result};
use crate::recipe::format::{DiffPatch, PatchEntry, ReplaceInFile};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Apply patch entries in order
///
/// `recipe_dir` resolves `patch_file` references. Returns one log line per
/// applied entry.
pub fn apply_patches(
    source_dir: &Path,
    patches: &[&PatchEntry],
    recipe_dir: Option<&Path>,
) -> Result<Vec<String>> {
    let mut applied = Vec::with_capacity(patches.len());

    for entry in patches {
        info!("Applying patch: {}", entry.describe());
        match entry {
            PatchEntry::Replace(r) => {
                let count = replace_in_file(source_dir, r)?;
                applied.push(format!(
                    "Replaced {} occurrence(s) in {}",
                    count, r.file
                ));
            }
            PatchEntry::Diff(d) => {
                let text = diff_text(d, recipe_dir)?;
                let root = match &d.base_path {
                    Some(base) => source_dir.join(base),
                    None => source_dir.to_path_buf(),
                };
                let files = apply_diff(&root, &text, d.strip)?;
                applied.push(format!("Patched {}", files.join(", ")));
            }
        }
    }

    Ok(applied)
}

/// Replace every occurrence of the search text; zero occurrences is fatal
pub fn replace_in_file(source_dir: &Path, edit: &ReplaceInFile) -> Result<usize> {
    let path = source_dir.join(&edit.file);
    let content = fs::read_to_string(&path).map_err(|e| Error::PatchFailed {
        file: edit.file.clone(),
        reason: format!("cannot read file: {}", e),
    })?;

    let count = content.matches(edit.search.as_str()).count();
    if count == 0 {
        return Err(Error::PatchFailed {
            file: edit.file.clone(),
            reason: format!("text not found: {:?}", edit.search),
        });
    }

    fs::write(&path, content.replace(&edit.search, &edit.replace))?;
    debug!("Replaced {} occurrence(s) in {}", count, edit.file);
    Ok(count)
}

fn diff_text(patch: &DiffPatch, recipe_dir: Option<&Path>) -> Result<String> {
    if let Some(text) = &patch.diff {
        return Ok(text.clone());
    }

    let file = patch
        .patch_file
        .as_deref()
        .ok_or_else(|| Error::ParseError("Diff patch without content".to_string()))?;
    let dir = recipe_dir.ok_or_else(|| {
        Error::NotFound(format!(
            "Patch file {} (recipe has no directory to resolve it from)",
            file
        ))
    })?;
    let path = dir.join(file);
    fs::read_to_string(&path)
        .map_err(|_| Error::NotFound(format!("Patch file not found: {}", path.display())))
}

/// Apply a unified diff to files under `root`
///
/// Returns the files that were modified, relative to `root`.
pub fn apply_diff(root: &Path, diff: &str, strip: u32) -> Result<Vec<String>> {
    let sections = split_sections(diff);
    if sections.is_empty() {
        return Err(Error::PatchFailed {
            file: "<diff>".to_string(),
            reason: "no file sections found".to_string(),
        });
    }

    let mut modified = Vec::with_capacity(sections.len());
    for section in &sections {
        let (old_name, new_name) = header_paths(section)?;
        let target = resolve_target(root, old_name, new_name, strip)?;
        let display_name = target.to_string_lossy().to_string();
        let path = root.join(&target);

        let base = if path.exists() {
            fs::read_to_string(&path).map_err(|e| Error::PatchFailed {
                file: display_name.clone(),
                reason: format!("cannot read file: {}", e),
            })?
        } else {
            String::new()
        };

        let patch = diffy::Patch::from_str(section).map_err(|e| Error::PatchFailed {
            file: display_name.clone(),
            reason: format!("invalid diff: {}", e),
        })?;

        let patched = match diffy::apply(&base, &patch) {
            Ok(text) => text,
            Err(e) => {
                let reason = if diffy::apply(&base, &patch.reverse()).is_ok() {
                    "patch already applied".to_string()
                } else {
                    format!("hunk does not apply: {}", e)
                };
                return Err(Error::PatchFailed {
                    file: display_name,
                    reason,
                });
            }
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, patched)?;
        debug!("Patched {}", display_name);
        modified.push(display_name);
    }

    Ok(modified)
}

/// Split a possibly multi-file diff into per-file sections
///
/// Each section starts at its `--- ` header; git preambles (`diff --git`,
/// `index ...`) are dropped.
fn split_sections(diff: &str) -> Vec<String> {
    let lines: Vec<&str> = diff.split_inclusive('\n').collect();
    let mut sections = Vec::new();
    let mut current: Option<String> = None;
    let mut in_preamble = false;

    for (i, line) in lines.iter().enumerate() {
        let file_header =
            line.starts_with("--- ") && lines.get(i + 1).is_some_and(|n| n.starts_with("+++ "));

        if line.starts_with("diff ") {
            if let Some(done) = current.take() {
                sections.push(done);
            }
            in_preamble = true;
            continue;
        }

        if file_header {
            if let Some(done) = current.take() {
                sections.push(done);
            }
            in_preamble = false;
            current = Some(String::new());
        }

        if in_preamble {
            continue;
        }
        if let Some(section) = current.as_mut() {
            section.push_str(line);
            if !line.ends_with('\n') {
                section.push('\n');
            }
        }
    }

    if let Some(done) = current {
        sections.push(done);
    }
    sections
}

fn header_paths(section: &str) -> Result<(&str, &str)> {
    let mut old = None;
    let mut new = None;
    for line in section.lines() {
        if let Some(rest) = line.strip_prefix("--- ") {
            old = Some(header_name(rest));
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            new = Some(header_name(rest));
            break;
        }
    }

    match (old, new) {
        (Some(old), Some(new)) => Ok((old, new)),
        _ => Err(Error::PatchFailed {
            file: "<diff>".to_string(),
            reason: "missing ---/+++ header".to_string(),
        }),
    }
}

/// File name from a header line, dropping any tab-separated timestamp
fn header_name(rest: &str) -> &str {
    rest.split('\t').next().unwrap_or(rest).trim_end()
}

/// Strip `strip` leading components and any `./`
fn strip_components(name: &str, strip: u32) -> Option<PathBuf> {
    let components: Vec<Component> = Path::new(name)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let stripped: PathBuf = components.into_iter().skip(strip as usize).collect();
    if stripped.as_os_str().is_empty()
        || stripped
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        None
    } else {
        Some(stripped)
    }
}

/// Pick the file a section patches
///
/// The `---` name wins when it exists; otherwise the `+++` name is used
/// (new files, or diffs whose `---` side names a scratch copy).
fn resolve_target(root: &Path, old: &str, new: &str, strip: u32) -> Result<PathBuf> {
    let old_path = (old != "/dev/null")
        .then(|| strip_components(old, strip))
        .flatten();
    let new_path = (new != "/dev/null")
        .then(|| strip_components(new, strip))
        .flatten();

    if let Some(p) = &old_path {
        if root.join(p).is_file() {
            return Ok(p.clone());
        }
    }
    if let Some(p) = &new_path {
        if root.join(p).is_file() || old == "/dev/null" {
            return Ok(p.clone());
        }
    }

    Err(Error::PatchFailed {
        file: old.to_string(),
        reason: format!("target file not found (also tried {})", new),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GFX_SOURCE: &str = "\
/* ----- AA Ellipse */

/* Windows targets do not have lrint, so provide a local inline version */
#if defined(_MSC_VER)
/* Detect 64bit and use intrinsic version */
#ifdef _M_X64
#include <emmintrin.h>
";

    const GFX_DIFF: &str = "\
diff --git ./SDL_gfxPrimitives.c ./SDL_gfxPrimitives.patched
index c77d8b5..8bd70c2 100644
--- ./SDL_gfxPrimitives.c
+++ ./SDL_gfxPrimitives.patched
@@ -1,7 +1,7 @@ int ellipseRGBA(SDL_Surface * dst)
 /* ----- AA Ellipse */
\x20
 /* Windows targets do not have lrint, so provide a local inline version */
-#if defined(_MSC_VER)
+#if defined(_MSC_VER) && _MSC_VER < 1928
 /* Detect 64bit and use intrinsic version */
 #ifdef _M_X64
 #include <emmintrin.h>
";

    fn tree(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn replace(file: &str, search: &str, replace: &str) -> ReplaceInFile {
        ReplaceInFile {
            file: file.to_string(),
            search: search.to_string(),
            replace: replace.to_string(),
            versions: Vec::new(),
            description: None,
        }
    }

    #[test]
    fn test_replace_all_occurrences() {
        let dir = tree(&[("CMakeLists.txt", "MESSAGE(WARNING a)\nMESSAGE(WARNING b)\n")]);
        let count = replace_in_file(
            dir.path(),
            &replace("CMakeLists.txt", "MESSAGE(WARNING", "MESSAGE(FATAL_ERROR"),
        )
        .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("CMakeLists.txt")).unwrap(),
            "MESSAGE(FATAL_ERROR a)\nMESSAGE(FATAL_ERROR b)\n"
        );
    }

    #[test]
    fn test_replace_without_match_fails() {
        let dir = tree(&[("CMakeLists.txt", "project(x)\n")]);
        let err = replace_in_file(
            dir.path(),
            &replace("CMakeLists.txt", "CMAKE_SOURCE_DIR", "PROJECT_SOURCE_DIR"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::PatchFailed { .. }));

        let missing = replace_in_file(dir.path(), &replace("nope.c", "a", "b"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_diff_targets_minus_side() {
        let dir = tree(&[("SDL_gfxPrimitives.c", GFX_SOURCE)]);
        let files = apply_diff(dir.path(), GFX_DIFF, 0).unwrap();
        assert_eq!(files, vec!["SDL_gfxPrimitives.c"]);

        let patched = fs::read_to_string(dir.path().join("SDL_gfxPrimitives.c")).unwrap();
        assert!(patched.contains("#if defined(_MSC_VER) && _MSC_VER < 1928"));
        assert!(!dir.path().join("SDL_gfxPrimitives.patched").exists());
    }

    #[test]
    fn test_reapplying_diff_fails() {
        let dir = tree(&[("SDL_gfxPrimitives.c", GFX_SOURCE)]);
        apply_diff(dir.path(), GFX_DIFF, 0).unwrap();

        match apply_diff(dir.path(), GFX_DIFF, 0) {
            Err(Error::PatchFailed { reason, .. }) => assert!(reason.contains("already applied")),
            other => panic!("expected PatchFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_pure_addition_reapply_detected() {
        let dir = tree(&[("src/a.c", "one\ntwo\n")]);
        let diff = "--- a/src/a.c\n+++ b/src/a.c\n@@ -1,2 +1,3 @@\n one\n+inserted\n two\n";
        apply_diff(dir.path(), diff, 1).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("src/a.c")).unwrap(),
            "one\ninserted\ntwo\n"
        );
        assert!(apply_diff(dir.path(), diff, 1).is_err());
    }

    #[test]
    fn test_multi_file_diff_and_strip() {
        let dir = tree(&[("a.c", "a\n"), ("lib/b.c", "b\n")]);
        let diff = "\
diff --git a/a.c b/a.c
--- a/a.c
+++ b/a.c
@@ -1,1 +1,1 @@
-a
+A
diff --git a/lib/b.c b/lib/b.c
--- a/lib/b.c
+++ b/lib/b.c
@@ -1,1 +1,1 @@
-b
+B
";
        let files = apply_diff(dir.path(), diff, 1).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(fs::read_to_string(dir.path().join("a.c")).unwrap(), "A\n");
        assert_eq!(fs::read_to_string(dir.path().join("lib/b.c")).unwrap(), "B\n");
    }

    #[test]
    fn test_mismatched_hunk_fails_without_writing() {
        let dir = tree(&[("a.c", "unrelated\n")]);
        let diff = "--- a.c\n+++ a.c\n@@ -1,1 +1,1 @@\n-a\n+A\n";
        assert!(apply_diff(dir.path(), diff, 0).is_err());
        assert_eq!(fs::read_to_string(dir.path().join("a.c")).unwrap(), "unrelated\n");
    }

    #[test]
    fn test_path_escape_rejected() {
        let dir = tree(&[("a.c", "a\n")]);
        let diff = "--- ../a.c\n+++ ../a.c\n@@ -1,1 +1,1 @@\n-a\n+A\n";
        assert!(apply_diff(dir.path(), diff, 0).is_err());
    }

    #[test]
    fn test_apply_patches_in_order() {
        let dir = tree(&[("drivers/drv_alsa.c", "alsa_pcm_close(pcm_h);\n")]);
        let first = PatchEntry::Replace(replace(
            "drivers/drv_alsa.c",
            "alsa_pcm_close(pcm_h);",
            "if (pcm_h) alsa_pcm_close(pcm_h);",
        ));
        let second = PatchEntry::Diff(DiffPatch {
            diff: Some(
                "--- drivers/drv_alsa.c\n+++ drivers/drv_alsa.c\n@@ -1,1 +1,1 @@\n-if (pcm_h) alsa_pcm_close(pcm_h);\n+if (pcm_h) { alsa_pcm_close(pcm_h); }\n"
                    .to_string(),
            ),
            patch_file: None,
            strip: 0,
            base_path: None,
            versions: Vec::new(),
            description: None,
        });

        let log = apply_patches(dir.path(), &[&first, &second], None).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("drivers/drv_alsa.c")).unwrap(),
            "if (pcm_h) { alsa_pcm_close(pcm_h); }\n"
        );
    }

    #[test]
    fn test_patch_file_needs_recipe_dir() {
        let dir = tree(&[("a.c", "a\n")]);
        let entry = PatchEntry::Diff(DiffPatch {
            diff: None,
            patch_file: Some("patches/fix.patch".to_string()),
            strip: 0,
            base_path: None,
            versions: Vec::new(),
            description: None,
        });
        assert!(apply_patches(dir.path(), &[&entry], None).is_err());

        let recipes = tree(&[("patches/fix.patch", "--- a.c\n+++ a.c\n@@ -1,1 +1,1 @@\n-a\n+A\n")]);
        apply_patches(dir.path(), &[&entry], Some(recipes.path())).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.c")).unwrap(), "A\n");
    }
}

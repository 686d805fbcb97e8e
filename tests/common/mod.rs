// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use larder::platform::{Arch, Os, Platform};
use larder::{KitchenConfig, Profile};
use std::fs;
use std::path::{Path, PathBuf};

/// Files of the `demo` upstream tarball, relative to its top directory
pub const DEMO_FILES: &[(&str, &str)] = &[
    ("demo.h", "#pragma once\n#define DEMO_VERSION 0\nint demo(void);\n"),
    ("demo.c", "#include \"demo.h\"\nint demo(void) { return DEMO_VERSION; }\n"),
    ("LICENSE", "MIT License\n"),
    ("external/bundled.c", "/* vendored copy */\n"),
];

/// Write a gzipped tarball with every entry under `root/`
///
/// Entries carry a fixed mtime so the archive bytes are reproducible.
pub fn make_tarball(path: &Path, root: &str, entries: &[(&str, &str)]) {
    let file = fs::File::create(path).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/{}", root, name), content.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
}

/// Build the demo tarball in `dir` and return its path and SHA-256
pub fn demo_tarball(dir: &Path) -> (PathBuf, String) {
    let path = dir.join("demo-1.0.tar.gz");
    make_tarball(&path, "demo-1.0", DEMO_FILES);
    let checksum = larder::hash::hash_file(&path).unwrap();
    (path, checksum)
}

/// Recipe for the demo tarball; `extra` is appended verbatim
pub fn demo_recipe(archive: &Path, sha256: &str, extra: &str) -> String {
    format!(
        r#"
[package]
name = "demo"
version = "1.0"
license = "MIT"
description = "Demo library"

[sources."1.0"]
url = "file://{url}"
sha256 = "{sha256}"
remove = ["external"]

[options.shared]
default = false

[options.fPIC]
default = true
when = {{ not_os = ["Windows"] }}
dropped_by = "shared"

[options.with_alsa]
default = true
when = {{ os = ["Linux"] }}

[[patches]]
file = "demo.h"
search = "DEMO_VERSION 0"
replace = "DEMO_VERSION 1"

[[definitions]]
name = "ENABLE_ALSA"
option = "with_alsa"

[[definitions]]
name = "DEMO_NAME"
value = "demo \"lib\""

[[variables]]
name = "DEMO_STATIC"
option = "!shared"
otherwise = false

[project]
sources = ["demo.c"]
headers = ["demo.h"]

[publish]
remove = ["bin/demo-config"]
remove_dirs = ["lib/pkgconfig"]
licenses = ["LICENSE"]

[artifacts]
libs = ["demo"]
{extra}
"#,
        url = archive.display(),
        sha256 = sha256,
        extra = extra,
    )
}

pub fn linux_profile() -> Profile {
    Profile::new(Platform::new(Os::Linux, Arch::X86_64))
}

/// Kitchen configuration rooted in a scratch directory
pub fn kitchen_config(work: &Path, cmake: &Path) -> KitchenConfig {
    KitchenConfig {
        source_cache: work.join("cache"),
        build_root: Some(work.join("builds")),
        output_dir: work.join("out"),
        cmake: cmake.display().to_string(),
        jobs: 2,
        ..KitchenConfig::default()
    }
}

/// Write an executable stand-in for cmake
///
/// Configure records the source dir and install prefix in the build dir,
/// build prints a line, and install lays out a small prefix from the
/// (patched) sources. `fail` makes one phase exit with the given code.
#[cfg(unix)]
pub fn write_stub_cmake(dir: &Path, fail: Option<(&str, i32)>) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let (fail_phase, fail_code) = fail.unwrap_or(("none", 0));
    let script = format!(
        r#"#!/bin/sh
set -e
case "$1" in
  -S) phase=configure ;;
  --build) phase=build ;;
  --install) phase=install ;;
  *) echo "unexpected arguments: $*" >&2; exit 64 ;;
esac

if [ "$phase" = "{fail_phase}" ]; then
  echo "stub cmake: $phase failed" >&2
  exit {fail_code}
fi

case "$phase" in
  configure)
    src="$2"
    build="$4"
    mkdir -p "$build"
    printf '%s\n' "$src" > "$build/src.txt"
    printf '%s\n' "$@" > "$build/configure-args.txt"
    for arg in "$@"; do
      case "$arg" in
        -DCMAKE_INSTALL_PREFIX=*) printf '%s\n' "${{arg#-DCMAKE_INSTALL_PREFIX=}}" > "$build/prefix.txt" ;;
      esac
    done
    echo "-- Configuring done"
    ;;
  build)
    echo "[100%] Built target demo"
    ;;
  install)
    build="$2"
    prefix=$(cat "$build/prefix.txt")
    src=$(cat "$build/src.txt")
    mkdir -p "$prefix/include" "$prefix/lib/pkgconfig" "$prefix/bin"
    cp "$src/demo.h" "$prefix/include/demo.h"
    printf 'archive\n' > "$prefix/lib/libdemo.a"
    printf 'Name: demo\n' > "$prefix/lib/pkgconfig/demo.pc"
    printf '#!/bin/sh\n' > "$prefix/bin/demo-config"
    echo "-- Installing: $prefix/lib/libdemo.a"
    ;;
esac
"#,
        fail_phase = fail_phase,
        fail_code = fail_code,
    );

    let path = dir.join("cmake");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn recipe_arg() -> Arg {
    Arg::new("recipe")
        .required(true)
        .help("Built-in recipe name or path to a recipe file")
}

/// Arguments selecting the version, platform and options
fn target_args() -> Vec<Arg> {
    vec![
        recipe_arg(),
        Arg::new("version").long("version").value_name("VERSION").help("Version to use"),
        Arg::new("os").long("os").help("Target operating system"),
        Arg::new("arch").long("arch").help("Target architecture"),
        Arg::new("compiler").long("compiler").help("Compiler"),
        Arg::new("build_type")
            .long("build-type")
            .help("Debug, Release, RelWithDebInfo or MinSizeRel"),
        Arg::new("option")
            .short('o')
            .long("option")
            .value_name("NAME=VALUE")
            .action(ArgAction::Append)
            .help("Option override (repeatable)"),
        Arg::new("shared_dep")
            .long("shared-dep")
            .value_name("NAME")
            .action(ArgAction::Append)
            .help("Treat a requirement as a shared library (repeatable)"),
    ]
}

fn flag(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(long).action(ArgAction::SetTrue).help(help)
}

fn build_cli() -> Command {
    Command::new("larder")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Larder Contributors")
        .about("Recipe-driven packaging of native libraries with CMake")
        .arg(Arg::new("config").long("config").value_name("PATH").help("Config file"))
        .arg(flag("verbose", "verbose", "Log debug output").short('v'))
        .arg(flag("quiet", "quiet", "Only log warnings and errors").short('q'))
        .subcommand_required(true)
        .subcommand(Command::new("list").about("List built-in recipes"))
        .subcommand(
            Command::new("show")
                .about("Show a recipe resolved for a platform")
                .args(target_args())
                .arg(flag("json", "json", "Print as JSON")),
        )
        .subcommand(
            Command::new("validate")
                .about("Parse and validate a recipe")
                .arg(recipe_arg()),
        )
        .subcommand(
            Command::new("generate")
                .about("Write the generated CMakeLists.txt and conanfile.txt")
                .args(target_args())
                .arg(Arg::new("dest").long("dest").required(true).help("Directory to write into")),
        )
        .subcommand(
            Command::new("fetch")
                .about("Fetch and verify sources into the cache")
                .arg(recipe_arg())
                .arg(Arg::new("version").long("version").help("Version to fetch"))
                .arg(flag("all_versions", "all-versions", "Fetch every declared version"))
                .arg(Arg::new("source_cache").long("source-cache").help("Source cache directory")),
        )
        .subcommand(
            Command::new("cook")
                .about("Fetch, patch, build and publish a recipe")
                .args(target_args())
                .arg(Arg::new("output").long("output").help("Output directory"))
                .arg(Arg::new("source_cache").long("source-cache").help("Source cache directory"))
                .arg(Arg::new("jobs").short('j').long("jobs").help("Parallel build jobs"))
                .arg(Arg::new("cmake").long("cmake").help("CMake executable"))
                .arg(Arg::new("generator").short('G').long("generator").help("CMake generator"))
                .arg(
                    Arg::new("prefix")
                        .long("prefix")
                        .value_name("NAME=PATH")
                        .action(ArgAction::Append)
                        .help("Install prefix for a requirement"),
                )
                .arg(flag("allow_system_deps", "allow-system-deps", "Let CMake find unlocated requirements"))
                .arg(flag("keep_builddir", "keep-builddir", "Keep the build directory"))
                .arg(flag("validate_only", "validate-only", "Only validate the recipe"))
                .arg(flag("fetch_only", "fetch-only", "Only fetch sources"))
                .arg(flag("progress", "progress", "Show a download progress bar")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("larder.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}

// src/recipe/kitchen/generate.rs

//! Secondary build descriptors for packages without a usable CMake build
//!
//! Renders a minimal `CMakeLists.txt` from a recipe's `[project]` section and
//! a `conanfile.txt` listing the resolved requirements. Output is a pure
//! function of the recipe and configuration so repeated runs write identical
//! files.

use crate::error::{Error, Result};
use crate::recipe::condition::{holds, select_all};
use crate::recipe::configure::Configuration;
use crate::recipe::format::{ProjectSection, Recipe};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CMAKE_LISTS: &str = "CMakeLists.txt";
pub const DEPENDENCY_FILE: &str = "conanfile.txt";

/// The recipe's project section, if it applies to this configuration
pub fn active_project<'r>(
    recipe: &'r Recipe,
    config: &Configuration,
) -> Result<Option<&'r ProjectSection>> {
    let Some(project) = &recipe.project else {
        return Ok(None);
    };
    let applies = config.evaluate(|ctx| holds(project.when.as_ref(), ctx))?;
    Ok(applies.then_some(project))
}

/// Render the generated `CMakeLists.txt`
pub fn render_cmake_lists(project: &ProjectSection, config: &Configuration) -> Result<String> {
    let (sources, globs, headers, include_dirs, links) = config.evaluate(|ctx| {
        let links: Vec<_> = project
            .link
            .iter()
            .filter(|l| holds(l.when.as_ref(), ctx))
            .collect();
        (
            select_all(&project.sources, ctx),
            select_all(&project.source_globs, ctx),
            select_all(&project.headers, ctx),
            select_all(&project.include_dirs, ctx),
            links,
        )
    })?;

    if sources.is_empty() && globs.is_empty() {
        return Err(Error::ConfigError(format!(
            "Project for {} {} has no sources",
            config.name, config.version
        )));
    }

    let name = project.name.as_deref().unwrap_or(&config.name);
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "# Generated by larder for {}/{}", config.name, config.version);
    let _ = writeln!(out, "cmake_minimum_required(VERSION {})", project.cmake_minimum);
    let _ = writeln!(out, "project({} LANGUAGES {})", name, project.languages.join(" "));
    out.push('\n');
    out.push_str("include(GNUInstallDirs)\n");

    let mut found: Vec<&str> = Vec::new();
    for link in &links {
        if !found.contains(&link.package.as_str()) {
            found.push(&link.package);
        }
    }
    if !found.is_empty() {
        out.push('\n');
        for package in &found {
            let _ = writeln!(out, "find_package({} REQUIRED)", package);
        }
    }

    if !globs.is_empty() {
        out.push_str("\nfile(GLOB LARDER_GLOB_SOURCES\n");
        for glob in &globs {
            let _ = writeln!(out, "    \"${{CMAKE_CURRENT_SOURCE_DIR}}/{}\"", glob);
        }
        out.push_str(")\n");
    }

    out.push_str("\nadd_library(${PROJECT_NAME}\n");
    if !globs.is_empty() {
        out.push_str("    ${LARDER_GLOB_SOURCES}\n");
    }
    for source in &sources {
        let _ = writeln!(out, "    {}", source);
    }
    out.push_str(")\n");

    out.push_str("\ntarget_include_directories(${PROJECT_NAME} PUBLIC\n");
    out.push_str("    $<BUILD_INTERFACE:${CMAKE_CURRENT_SOURCE_DIR}>\n");
    for dir in &include_dirs {
        let _ = writeln!(out, "    $<BUILD_INTERFACE:${{CMAKE_CURRENT_SOURCE_DIR}}/{}>", dir);
    }
    out.push_str("    $<INSTALL_INTERFACE:${CMAKE_INSTALL_INCLUDEDIR}>\n)\n");

    if !links.is_empty() {
        out.push_str("\ntarget_link_libraries(${PROJECT_NAME} PUBLIC\n");
        for link in &links {
            let _ = writeln!(out, "    {}", link.target);
        }
        out.push_str(")\n");
    }

    out.push_str(
        "\ninstall(TARGETS ${PROJECT_NAME} EXPORT ${PROJECT_NAME}Targets\n\
         \x20   ARCHIVE DESTINATION ${CMAKE_INSTALL_LIBDIR}\n\
         \x20   LIBRARY DESTINATION ${CMAKE_INSTALL_LIBDIR}\n\
         \x20   RUNTIME DESTINATION ${CMAKE_INSTALL_BINDIR}\n\
         )\n\
         install(EXPORT ${PROJECT_NAME}Targets\n\
         \x20   NAMESPACE ${PROJECT_NAME}::\n\
         \x20   DESTINATION ${CMAKE_INSTALL_LIBDIR}/cmake/${PROJECT_NAME}\n\
         )\n",
    );

    if !headers.is_empty() {
        out.push_str("install(FILES\n");
        for header in &headers {
            let _ = writeln!(out, "    {}", header);
        }
        out.push_str("    DESTINATION ${CMAKE_INSTALL_INCLUDEDIR}\n)\n");
    }

    Ok(out)
}

/// Render the `[requires]` / `[generators]` dependency declaration
pub fn render_dependency_file(project: &ProjectSection, config: &Configuration) -> String {
    let mut out = String::from("[requires]\n");
    for requirement in &config.requirements {
        let _ = writeln!(out, "{}", requirement);
    }
    out.push_str("\n[generators]\n");
    for generator in &project.generators {
        let _ = writeln!(out, "{}", generator);
    }
    out
}

/// Write the generated descriptors into `dest`
///
/// Returns the files written; empty when the recipe has no project for this
/// configuration. An existing upstream `CMakeLists.txt` is replaced.
pub fn write_descriptors(
    recipe: &Recipe,
    config: &Configuration,
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    let Some(project) = active_project(recipe, config)? else {
        debug!("No generated project for {} {}", config.name, config.version);
        return Ok(Vec::new());
    };

    fs::create_dir_all(dest)?;
    let mut written = Vec::new();

    let cmake_path = dest.join(CMAKE_LISTS);
    if cmake_path.exists() {
        info!("Replacing upstream {}", cmake_path.display());
    }
    fs::write(&cmake_path, render_cmake_lists(project, config)?).map_err(|e| {
        Error::IoError(format!("Failed to write {}: {}", cmake_path.display(), e))
    })?;
    written.push(cmake_path);

    if project.dependency_file {
        let dep_path = dest.join(DEPENDENCY_FILE);
        fs::write(&dep_path, render_dependency_file(project, config)).map_err(|e| {
            Error::IoError(format!("Failed to write {}: {}", dep_path.display(), e))
        })?;
        written.push(dep_path);
    }

    Ok(written)
}

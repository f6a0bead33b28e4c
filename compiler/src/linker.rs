//! The cross-module linker (C7): resolves `IMPORTS` across ASN.1 modules
//! given a set of entry-point files and an include search path, to produce
//! a closed [`ModuleSet`].
//!
//! Recursion between modules needs no special handling here — it is dealt
//! with exactly like intra-module recursion, by [`crate::compiler`]'s
//! compile-stack cycle detection

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use snafu::{OptionExt, ResultExt};

use crate::error::{CompileError, IoSnafu, ParseSnafu, UnresolvedModuleSnafu};
use crate::parser::parse_module;
use crate::tree::{Module, ModuleSet};

/// Loads `entry_points` and the transitive closure of everything they
/// `IMPORTS`, searching `include_dirs` (in order) for each imported
/// module's source file.
///
/// Module name resolution is case-insensitive on the file stem: a module
/// named `Shapes` may live in `shapes.asn1`, `Shapes.asn1`, or
/// `SHAPES.asn1`.
pub fn load_closure(entry_points: &[PathBuf], include_dirs: &[PathBuf]) -> Result<ModuleSet, CompileError> {
    let mut modules = ModuleSet::new();
    let mut pending: Vec<PathBuf> = entry_points.to_vec();
    let mut seen_paths: BTreeSet<PathBuf> = BTreeSet::new();

    while let Some(path) = pending.pop() {
        let canonical = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if !seen_paths.insert(canonical) {
            continue;
        }
        let module = load_module(&path)?;
        for import in &module.imports {
            if modules.contains_key(&import.from_module) {
                continue;
            }
            let found = find_module_file(&import.from_module, include_dirs, entry_points)
                .with_context(|| UnresolvedModuleSnafu {
                    importer: module.name.clone(),
                    module: import.from_module.clone(),
                })?;
            pending.push(found);
        }
        modules.insert(module.name.clone(), module);
    }

    Ok(modules)
}

fn load_module(path: &Path) -> Result<Module, CompileError> {
    let source = fs::read_to_string(path).context(IoSnafu { path: path.to_path_buf() })?;
    parse_module(&source).map_err(|source| CompileError::Parse { path: path.to_path_buf(), source })
}

/// Finds the source file for module `name`: first among the already-queued
/// entry points (by parsing just enough to compare module identifiers would
/// be wasteful, so this matches on file stem, same as the include-dir
/// search below), then by case-insensitive file-stem search of
/// `include_dirs`.
fn find_module_file(name: &str, include_dirs: &[PathBuf], entry_points: &[PathBuf]) -> Option<PathBuf> {
    let dir_files: Vec<PathBuf> = include_dirs.iter().flat_map(read_dir_asn1_files).collect();
    entry_points
        .iter()
        .chain(dir_files.iter())
        .find(|candidate| stem_matches(candidate, name))
        .cloned()
}

fn read_dir_asn1_files(dir: &PathBuf) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(OsStr::to_str) == Some("asn1"))
        .collect()
}

fn stem_matches(path: &Path, name: &str) -> bool {
    path.file_stem()
        .and_then(OsStr::to_str)
        .is_some_and(|stem| stem.eq_ignore_ascii_case(name))
}

/// Resolves a type reference `M.T` (or a bare `T`) to the module that
/// defines it: consult the current module's imports first (case-sensitive
/// on the type identifier), then the current module itself.
pub fn resolve_type_module<'m>(
    modules: &'m ModuleSet,
    current_module: &str,
    qualifier: Option<&str>,
    type_name: &str,
) -> Result<&'m str, CompileError> {
    if let Some(module) = qualifier {
        return modules
            .get(module)
            .map(|m| m.name.as_str())
            .with_context(|| UnresolvedModuleSnafu { importer: current_module, module });
    }
    let current = modules.get(current_module).expect("current module is always loaded");
    for import in &current.imports {
        if import.symbols.iter().any(|s| s == type_name) {
            return Ok(modules
                .get(&import.from_module)
                .map(|m| m.name.as_str())
                .unwrap_or(&import.from_module));
        }
    }
    Ok(current_module)
}

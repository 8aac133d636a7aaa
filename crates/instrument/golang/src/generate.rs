//! One generation run: load, resolve, plan and render in memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use instrument_core::{Interface, PrefixRuleSet, plan};

use crate::emit::{self, Naming, Reporter, Target};
use crate::error::{GoError, Result};
use crate::loader::{Loader, Package, parse_dir};
use crate::module::default_package_name;
use crate::resolve::{Resolver, Selection};
use crate::toolchain::GoEnv;

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub rules: PrefixRuleSet,
    /// Inserted into decorator names as `Instrumented<tag><Name>`.
    pub tag: String,
    pub interfaces: Vec<String>,
    pub exclude: Vec<String>,
    /// Output directory, relative to each source directory.
    pub dirname: Option<PathBuf>,
    /// Single output file name for every interface of a directory.
    pub filename: Option<String>,
    pub package: Option<String>,
    pub reporter: Reporter,
    /// Where dependencies are looked up; detected from the environment
    /// when unset.
    pub go_env: Option<GoEnv>,
}

/// A rendered file that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
    pub interfaces: Vec<String>,
}

pub fn output_filename(unit: &str) -> String {
    format!("{unit}_instrumented.go")
}

/// Render decorators for every selected interface in `dirs`.
pub fn generate(dirs: &[PathBuf], options: &GenerateOptions) -> Result<Vec<OutputFile>> {
    let mut loader = options
        .go_env
        .clone()
        .map_or_else(Loader::from_environment, Loader::with_env);
    let selection = Selection {
        include: &options.interfaces,
        exclude: &options.exclude,
    };
    let mut outputs = Vec::new();

    for dir in dirs {
        let package = loader.load_dir(dir)?;
        let interfaces = Resolver::new(&mut loader).interfaces(&package, selection)?;
        if interfaces.is_empty() {
            tracing::warn!(dir = %dir.display(), "no interfaces to instrument");
            continue;
        }

        let source_dir = package.dir.clone().unwrap_or_else(|| dir.clone());
        let out_dir = match &options.dirname {
            Some(dirname) => source_dir.join(dirname),
            None => source_dir.clone(),
        };
        let (out_package, out_import_path) = if out_dir == source_dir {
            (
                options.package.clone().unwrap_or_else(|| package.name.clone()),
                Some(package.import_path.clone()),
            )
        } else {
            (
                options
                    .package
                    .clone()
                    .map_or_else(|| output_package_name(&out_dir), Ok)?,
                loader.module_import_path(&out_dir)?,
            )
        };

        let naming = Naming {
            package_names: loader.package_names(),
            alias_hints: alias_hints(&package),
        };
        let target = Target {
            package: &out_package,
            import_path: out_import_path.as_deref(),
        };

        for (file_name, group) in group_by_file(&interfaces, options.filename.as_deref()) {
            let plans: Vec<_> = group
                .iter()
                .map(|iface| plan(iface, &options.rules, &options.tag))
                .collect();
            for planned in &plans {
                tracing::info!(
                    interface = %planned.interface.name,
                    decorator = %planned.decorated_type_name,
                    wrapped = planned.wrapped_methods.len(),
                    "planned decorator"
                );
            }

            outputs.push(OutputFile {
                path: out_dir.join(&file_name),
                contents: emit::render_file(target, &plans, &options.reporter, &naming),
                interfaces: group.iter().map(|iface| iface.name.clone()).collect(),
            });
        }
    }

    Ok(outputs)
}

/// Interfaces grouped by output file name, in first-seen order.
fn group_by_file<'a>(
    interfaces: &'a [Interface],
    filename: Option<&str>,
) -> Vec<(String, Vec<&'a Interface>)> {
    let mut groups: Vec<(String, Vec<&Interface>)> = Vec::new();
    for iface in interfaces {
        let name = filename.map_or_else(|| output_filename(&iface.origin.unit), str::to_string);
        match groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, members)) => members.push(iface),
            None => groups.push((name, vec![iface])),
        }
    }
    groups
}

/// Package clause for a separate output directory: whatever package already
/// lives there, else one named after the directory.
fn output_package_name(out_dir: &Path) -> Result<String> {
    if out_dir.is_dir() {
        match parse_dir(out_dir) {
            Ok((name, _)) => return Ok(name),
            Err(GoError::NoGoFiles(_)) => {}
            Err(e) => return Err(e),
        }
    }
    let base = out_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(default_package_name(&base))
}

/// Explicit import aliases used by the source package's files.
fn alias_hints(package: &Package) -> HashMap<String, String> {
    package
        .files
        .iter()
        .flat_map(|file| file.ast.imports.iter())
        .filter_map(|import| {
            import
                .alias
                .as_ref()
                .filter(|alias| !matches!(alias.as_str(), "_" | "."))
                .map(|alias| (import.path.clone(), alias.clone()))
        })
        .collect()
}

//! Package loading.
//!
//! A package is a directory of `.go` files sharing one package clause. Test
//! files and files previously written by this tool are ignored. Packages are
//! cached by import path for the lifetime of a [`Loader`].
//!
//! Packages of the modules being generated are loaded strictly. Dependencies
//! (from `vendor/`, `$GOROOT/src` or the module cache) are loaded leniently:
//! files excluded by a `//go:build ignore` constraint, files the
//! declaration parser cannot read, and files of a stray package clause are
//! skipped.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ast::{File, MethodDecl, TypeExpr, TypeSpec};
use crate::error::{GoError, Result};
use crate::module::{Module, default_package_name, is_standard_library, within};
use crate::parser::parse_file;
use crate::prelude;
use crate::toolchain::GoEnv;

/// Header line marking files produced by this tool.
pub const GENERATED_MARKER: &str = "// Code generated by go-instrument";

#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File stem, used to name generated output.
    pub unit: String,
    pub ast: File,
}

/// Where a package was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Part of a module being generated.
    Local,
    /// Vendored, from `$GOROOT`, or from the module cache.
    Dependency,
    /// Built-in declarations standing in for the standard library.
    Prelude,
}

#[derive(Debug)]
pub struct Package {
    pub import_path: String,
    pub name: String,
    pub kind: PackageKind,
    /// `None` for prelude packages.
    pub dir: Option<PathBuf>,
    pub files: Vec<SourceFile>,
}

impl Package {
    pub fn type_spec(&self, name: &str) -> Option<(&SourceFile, &TypeSpec)> {
        self.files.iter().find_map(|file| {
            file.ast
                .types
                .iter()
                .find(|spec| spec.name == name)
                .map(|spec| (file, spec))
        })
    }

    pub fn methods_of<'a>(
        &'a self,
        receiver: &'a str,
    ) -> impl Iterator<Item = (&'a SourceFile, &'a MethodDecl)> + 'a {
        self.files.iter().flat_map(move |file| {
            file.ast
                .methods
                .iter()
                .filter(move |m| m.receiver == receiver)
                .map(move |m| (file, m))
        })
    }

    /// Interface type declarations in file order.
    pub fn interface_specs(&self) -> impl Iterator<Item = (&SourceFile, &TypeSpec)> {
        self.files.iter().flat_map(|file| {
            file.ast
                .types
                .iter()
                .filter(|spec| !spec.alias && matches!(spec.ty, TypeExpr::Interface(_)))
                .map(move |spec| (file, spec))
        })
    }
}

/// Whether a file's header marks it as generated by this tool.
pub fn is_generated(source: &str) -> bool {
    source
        .lines()
        .take_while(|line| !line.starts_with("package "))
        .any(|line| line.starts_with(GENERATED_MARKER))
}

/// Whether a file's build constraint excludes it from every build.
pub fn is_build_ignored(source: &str) -> bool {
    source
        .lines()
        .take_while(|line| !line.starts_with("package "))
        .filter_map(|line| {
            line.strip_prefix("//go:build")
                .or_else(|| line.strip_prefix("// +build"))
        })
        .any(|constraint| {
            constraint
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .any(|term| term == "ignore")
        })
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    path.is_file()
        && Path::new(name).extension().is_some_and(|ext| ext == "go")
        && !name.ends_with("_test.go")
}

fn file_unit(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse every non-test, non-generated `.go` file in `dir`.
pub fn parse_dir(dir: &Path) -> Result<(String, Vec<SourceFile>)> {
    let entries = std::fs::read_dir(dir).map_err(|e| GoError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| GoError::io(dir, e))?.path();
        if is_go_source(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut package: Option<String> = None;
    let mut files = Vec::new();
    for path in paths {
        let source = std::fs::read_to_string(&path).map_err(|e| GoError::io(&path, e))?;
        if is_generated(&source) {
            tracing::debug!(path = %path.display(), "skipping generated file");
            continue;
        }
        let ast = parse_file(&source).map_err(|source| GoError::Syntax {
            path: path.clone(),
            source,
        })?;

        match &package {
            None => package = Some(ast.package.clone()),
            Some(first) if *first != ast.package => {
                return Err(GoError::MixedPackages {
                    dir: dir.to_path_buf(),
                    first: first.clone(),
                    second: ast.package,
                });
            }
            Some(_) => {}
        }

        files.push(SourceFile {
            unit: file_unit(&path),
            path,
            ast,
        });
    }

    let name = package.ok_or_else(|| GoError::NoGoFiles(dir.to_path_buf()))?;
    Ok((name, files))
}

/// Parse a dependency directory, skipping whatever cannot be read. `None`
/// when no usable file remains.
fn parse_dependency_dir(dir: &Path, import_path: &str) -> Option<(String, Vec<SourceFile>)> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| is_go_source(path))
        .collect();
    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        let Ok(source) = std::fs::read_to_string(&path) else {
            continue;
        };
        if is_build_ignored(&source) {
            continue;
        }
        match parse_file(&source) {
            Ok(ast) => files.push(SourceFile {
                unit: file_unit(&path),
                path,
                ast,
            }),
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "skipping unreadable dependency file");
            }
        }
    }

    let name = dependency_package_name(&files, import_path)?;
    files.retain(|file| file.ast.package == name);
    Some((name, files))
}

/// The package clause of a dependency: the one matching the import path
/// when several appear, else the first that is not `main`.
fn dependency_package_name(files: &[SourceFile], import_path: &str) -> Option<String> {
    let last = import_path.rsplit('/').next().unwrap_or(import_path);
    let guess = default_package_name(import_path);
    let mut names = files
        .iter()
        .map(|file| file.ast.package.as_str())
        .filter(|name| *name != "main");
    let first = names.clone().next();
    names
        .find(|name| *name == guess || *name == last)
        .or(first)
        .map(str::to_string)
}

/// Loads and caches packages for one generation run.
#[derive(Debug)]
pub struct Loader {
    env: GoEnv,
    /// Modules of the directories being generated.
    modules: Vec<Module>,
    /// Modules found while loading dependencies.
    dependencies: Vec<Module>,
    packages: HashMap<String, Arc<Package>>,
    missing: HashSet<String>,
    /// Package names inferred from how a file qualifies an unloadable import.
    assumed_names: HashMap<String, String>,
}

impl Loader {
    /// A loader using the Go installation found in the environment.
    pub fn from_environment() -> Self {
        Self::with_env(GoEnv::detect())
    }

    pub fn with_env(env: GoEnv) -> Self {
        Self {
            env,
            modules: Vec::new(),
            dependencies: Vec::new(),
            packages: HashMap::new(),
            missing: HashSet::new(),
            assumed_names: HashMap::new(),
        }
    }

    /// Load the package in `dir`.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Arc<Package>> {
        let dir = std::fs::canonicalize(dir).map_err(|e| GoError::io(dir, e))?;
        if let Some(existing) = self
            .packages
            .values()
            .find(|p| p.dir.as_deref() == Some(dir.as_path()))
        {
            return Ok(Arc::clone(existing));
        }

        let (name, files) = parse_dir(&dir)?;
        let import_path = self
            .module_import_path(&dir)?
            .unwrap_or_else(|| name.clone());
        tracing::debug!(
            dir = %dir.display(),
            import_path = %import_path,
            files = files.len(),
            "loaded package"
        );

        let package = Arc::new(Package {
            import_path: import_path.clone(),
            name,
            kind: PackageKind::Local,
            dir: Some(dir),
            files,
        });
        self.packages.insert(import_path, Arc::clone(&package));
        Ok(package)
    }

    /// Import path a package in `dir` would have, if `dir` is inside a module.
    pub fn module_import_path(&mut self, dir: &Path) -> Result<Option<String>> {
        let Some(module) = Module::discover(dir)? else {
            return Ok(None);
        };
        let import_path = module.import_path_for(dir);
        if !self.modules.contains(&module) {
            self.modules.push(module);
        }
        Ok(import_path)
    }

    /// Package by import path. Looks in the modules being generated, then
    /// the standard library (`$GOROOT`, else the prelude), then vendored and
    /// required modules. `None` when the package is nowhere to be found.
    pub fn package(&mut self, import_path: &str) -> Result<Option<Arc<Package>>> {
        if let Some(package) = self.packages.get(import_path) {
            return Ok(Some(Arc::clone(package)));
        }
        if self.missing.contains(import_path) {
            return Ok(None);
        }

        let local = self
            .modules
            .iter()
            .filter_map(|module| module.dir_for(import_path).map(|dir| (module, dir)))
            .max_by_key(|(module, _)| module.path.len())
            .map(|(_, dir)| dir);
        if let Some(dir) = local {
            if !dir.is_dir() {
                return Err(GoError::type_resolution(
                    import_path,
                    format!("package directory {} does not exist", dir.display()),
                ));
            }
            return self.load_dir(&dir).map(Some);
        }

        let found = if is_standard_library(import_path) {
            match self.env.std_dir(import_path) {
                Some(dir) => self.load_dependency(import_path, &dir),
                None => self.load_prelude(import_path)?,
            }
        } else {
            self.locate_dependency(import_path)
                .and_then(|dir| self.load_dependency(import_path, &dir))
        };
        if found.is_none() {
            tracing::debug!(import_path, "package not found");
            self.missing.insert(import_path.to_string());
        }
        Ok(found)
    }

    fn locate_dependency(&self, import_path: &str) -> Option<PathBuf> {
        let mod_cache = self.env.mod_cache.as_deref();
        let known = self
            .dependencies
            .iter()
            .filter_map(|module| module.dir_for(import_path).map(|dir| (module, dir)))
            .max_by_key(|(module, _)| module.path.len())
            .map(|(_, dir)| dir);
        known
            .into_iter()
            .chain(self.modules.iter().filter_map(|m| m.vendor_dir(import_path)))
            .chain(
                self.modules
                    .iter()
                    .chain(&self.dependencies)
                    .filter_map(|m| m.required_dir(import_path, mod_cache)),
            )
            .find(|dir| dir.is_dir())
    }

    fn load_dependency(&mut self, import_path: &str, dir: &Path) -> Option<Arc<Package>> {
        let (name, files) = parse_dependency_dir(dir, import_path)?;
        tracing::debug!(
            dir = %dir.display(),
            import_path,
            files = files.len(),
            "loaded dependency"
        );

        // The dependency's own go.mod supplies requirements for its imports.
        if let Ok(Some(module)) = Module::discover(dir)
            && within(import_path, &module.path)
            && !self.modules.contains(&module)
            && !self.dependencies.contains(&module)
        {
            self.dependencies.push(module);
        }

        let package = Arc::new(Package {
            import_path: import_path.to_string(),
            name,
            kind: PackageKind::Dependency,
            dir: Some(dir.to_path_buf()),
            files,
        });
        self.packages
            .insert(import_path.to_string(), Arc::clone(&package));
        Some(package)
    }

    fn load_prelude(&mut self, import_path: &str) -> Result<Option<Arc<Package>>> {
        let Some(source) = prelude::source(import_path) else {
            return Ok(None);
        };
        let path = PathBuf::from(format!("<prelude>/{import_path}.go"));
        let ast = parse_file(source).map_err(|source| GoError::Syntax {
            path: path.clone(),
            source,
        })?;
        let package = Arc::new(Package {
            import_path: import_path.to_string(),
            name: ast.package.clone(),
            kind: PackageKind::Prelude,
            dir: None,
            files: vec![SourceFile {
                path,
                unit: import_path.to_string(),
                ast,
            }],
        });
        self.packages
            .insert(import_path.to_string(), Arc::clone(&package));
        Ok(Some(package))
    }

    /// Remember the name a source file uses for an import that could not be
    /// loaded, so generated code qualifies it the same way.
    pub fn assume_name(&mut self, import_path: &str, name: &str) {
        self.assumed_names
            .entry(import_path.to_string())
            .or_insert_with(|| name.to_string());
    }

    /// Package names by import path, for every package loaded or assumed so far.
    pub fn package_names(&self) -> HashMap<String, String> {
        let mut names = self.assumed_names.clone();
        names.extend(
            self.packages
                .values()
                .map(|p| (p.import_path.clone(), p.name.clone())),
        );
        names
    }
}

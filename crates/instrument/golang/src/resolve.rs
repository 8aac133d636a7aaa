//! Name resolution and method-set computation.
//!
//! The resolver lowers syntax-level types into fully qualified
//! [`TypeExpr`]s and attaches a [`CapabilitySet`] to each, so the
//! planner can ask structural questions without knowing anything about Go.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use instrument_core::{
    CapabilitySet, Interface, Method, Origin, Signature, Type, TypeExpr,
    model::{Field, FuncType},
};

use crate::ast;
use crate::error::{GoError, Result};
use crate::loader::{Loader, Package, PackageKind, SourceFile};
use crate::module::default_package_name;
use crate::prelude::is_predeclared;

/// Lexical context of a declaration: its package, file and type parameters.
#[derive(Clone, Copy)]
struct Scope<'a> {
    package: &'a Package,
    file: &'a SourceFile,
    type_params: &'a [String],
}

type NamedKey = (String, String, bool);

pub struct Resolver<'l> {
    loader: &'l mut Loader,
    capabilities: HashMap<TypeExpr, Arc<CapabilitySet>>,
    interfaces: HashMap<(String, String), Vec<Signature>>,
    in_progress: HashSet<NamedKey>,
}

impl<'l> Resolver<'l> {
    pub fn new(loader: &'l mut Loader) -> Self {
        Self {
            loader,
            capabilities: HashMap::new(),
            interfaces: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Every selected non-generic, non-constraint interface declared in
    /// `package`, in file order. Unselected interfaces are never resolved.
    pub fn interfaces(
        &mut self,
        package: &Arc<Package>,
        selection: Selection<'_>,
    ) -> Result<Vec<Interface>> {
        selection.check(package)?;
        let mut out = Vec::new();
        for (file, spec) in package.interface_specs() {
            let ast::TypeExpr::Interface(body) = &spec.ty else {
                continue;
            };
            if !selection.contains(&spec.name) {
                tracing::debug!(interface = %spec.name, "not selected");
                continue;
            }
            if !spec.type_params.is_empty() {
                tracing::warn!(interface = %spec.name, "skipping generic interface");
                continue;
            }
            if body.constraint {
                tracing::warn!(interface = %spec.name, "skipping constraint interface");
                continue;
            }

            let signatures = self.interface_signatures(package, &spec.name)?;
            let methods = signatures
                .into_iter()
                .map(|sig| self.method(sig))
                .collect::<Result<Vec<_>>>()?;

            tracing::debug!(
                interface = %spec.name,
                unit = %file.unit,
                methods = methods.len(),
                "resolved interface"
            );
            out.push(Interface::new(
                &spec.name,
                Origin::new(&package.import_path, &package.name, &file.unit),
                methods,
            ));
        }
        Ok(out)
    }

    /// Only the trailing result's capabilities decide what gets generated,
    /// so only that type must resolve completely.
    fn method(&mut self, signature: Signature) -> Result<Method> {
        let Signature { name, func } = signature;
        let params = func
            .params
            .into_iter()
            .map(|expr| self.typed(expr, false))
            .collect::<Result<Vec<_>>>()?;
        let last = func.results.len().checked_sub(1);
        let results = func
            .results
            .into_iter()
            .enumerate()
            .map(|(index, expr)| self.typed(expr, Some(index) == last))
            .collect::<Result<Vec<_>>>()?;
        Ok(Method::new(name, params, results, func.variadic))
    }

    fn typed(&mut self, expr: TypeExpr, required: bool) -> Result<Type> {
        let capabilities = match self.capabilities(&expr) {
            Ok(set) => set,
            Err(GoError::Unresolved { name, reason }) if !required => {
                tracing::debug!(%name, %reason, "assuming no methods");
                Arc::new(CapabilitySet::default())
            }
            Err(GoError::Unresolved { name, reason }) => {
                return Err(GoError::type_resolution(name, reason));
            }
            Err(e) => return Err(e),
        };
        Ok(Type::new(expr, capabilities))
    }

    /// Operations exposed by a value of type `expr`.
    pub fn capabilities(&mut self, expr: &TypeExpr) -> Result<Arc<CapabilitySet>> {
        if let Some(cached) = self.capabilities.get(expr) {
            return Ok(Arc::clone(cached));
        }

        let set = match expr {
            TypeExpr::Named { path: None, name, .. } if name == "error" => {
                CapabilitySet::error_capability()
            }
            TypeExpr::Named {
                path: Some(path),
                name,
                ..
            } => self.named_capabilities(path, name, false)?,
            TypeExpr::Pointer(inner) => match inner.as_ref() {
                TypeExpr::Named {
                    path: Some(path),
                    name,
                    ..
                } => self.named_capabilities(path, name, true)?,
                _ => CapabilitySet::default(),
            },
            TypeExpr::Interface(signatures) => CapabilitySet::from_signatures(signatures.clone()),
            _ => CapabilitySet::default(),
        };

        let set = Arc::new(set);
        self.capabilities.insert(expr.clone(), Arc::clone(&set));
        Ok(set)
    }

    fn named_capabilities(&mut self, path: &str, name: &str, pointer: bool) -> Result<CapabilitySet> {
        let Some(package) = self.loader.package(path)? else {
            return Err(not_found(path, name));
        };
        let Some((file, spec)) = package.type_spec(name) else {
            let qualified = format!("{path}.{name}");
            let reason = "not declared in package";
            return Err(match package.kind {
                PackageKind::Local => GoError::type_resolution(qualified, reason),
                PackageKind::Dependency | PackageKind::Prelude => GoError::Unresolved {
                    name: qualified,
                    reason: reason.into(),
                },
            });
        };
        let scope = Scope {
            package: &package,
            file,
            type_params: &spec.type_params,
        };

        match &spec.ty {
            ast::TypeExpr::Interface(_) => {
                if pointer {
                    // pointers to interfaces have no methods
                    return Ok(CapabilitySet::default());
                }
                let signatures = self.interface_signatures(&package, name)?;
                Ok(CapabilitySet::from_signatures(signatures))
            }
            underlying if spec.alias => {
                let target = self.lower(scope, underlying)?;
                let target = if pointer {
                    TypeExpr::pointer_to(target)
                } else {
                    target
                };
                Ok(self.capabilities(&target)?.as_ref().clone())
            }
            underlying => {
                let key = (path.to_string(), name.to_string(), pointer);
                if !self.in_progress.insert(key.clone()) {
                    return Ok(CapabilitySet::default());
                }
                let set = self.defined_type_capabilities(scope, name, underlying, pointer);
                self.in_progress.remove(&key);
                set
            }
        }
    }

    /// Declared methods of a defined type, plus those of an interface
    /// underlying type and those promoted from embedded struct fields.
    fn defined_type_capabilities(
        &mut self,
        scope: Scope<'_>,
        name: &str,
        underlying: &ast::TypeExpr,
        pointer: bool,
    ) -> Result<CapabilitySet> {
        let mut set = CapabilitySet::default();
        for (file, decl) in scope.package.methods_of(name) {
            if decl.pointer_receiver && !pointer {
                continue;
            }
            let method_scope = Scope { file, ..scope };
            let func = self.lower_func(method_scope, &decl.signature)?;
            set.insert(Signature::new(&decl.name, func));
        }

        let promoted = match underlying {
            ast::TypeExpr::Name { .. } => {
                let target = self.lower(scope, underlying)?;
                if self.is_interface(&target)? {
                    vec![self.capabilities(&target)?]
                } else {
                    Vec::new()
                }
            }
            ast::TypeExpr::Struct(fields) => {
                let mut promoted = Vec::new();
                for field in fields.iter().filter(|f| f.names.is_empty()) {
                    let mut target = self.lower(scope, &field.ty)?;
                    if pointer && matches!(target, TypeExpr::Named { .. }) {
                        target = TypeExpr::pointer_to(target);
                    }
                    promoted.push(self.capabilities(&target)?);
                }
                promoted
            }
            _ => Vec::new(),
        };

        for other in promoted {
            for (method, func) in other.iter() {
                if set.get(method).is_none() {
                    set.insert(Signature::new(method, func.clone()));
                }
            }
        }
        Ok(set)
    }

    fn is_interface(&mut self, expr: &TypeExpr) -> Result<bool> {
        match expr {
            TypeExpr::Interface(_) => Ok(true),
            TypeExpr::Named { path: None, name, .. } => Ok(name == "error" || name == "any"),
            TypeExpr::Named {
                path: Some(path),
                name,
                ..
            } => {
                let Some(package) = self.loader.package(path)? else {
                    return Err(not_found(path, name));
                };
                Ok(package
                    .type_spec(name)
                    .is_some_and(|(_, spec)| matches!(spec.ty, ast::TypeExpr::Interface(_))))
            }
            _ => Ok(false),
        }
    }

    /// Flattened method list of a named interface: methods and embedded
    /// interfaces in declaration order, first occurrence of a name wins.
    fn interface_signatures(&mut self, package: &Arc<Package>, name: &str) -> Result<Vec<Signature>> {
        let cache_key = (package.import_path.clone(), name.to_string());
        if let Some(cached) = self.interfaces.get(&cache_key) {
            return Ok(cached.clone());
        }

        let Some((file, spec)) = package.type_spec(name) else {
            return Err(GoError::type_resolution(
                format!("{}.{name}", package.import_path),
                "not declared in package",
            ));
        };
        let scope = Scope {
            package,
            file,
            type_params: &spec.type_params,
        };

        let ast::TypeExpr::Interface(body) = &spec.ty else {
            if spec.alias {
                let target = self.lower(scope, &spec.ty)?;
                return self.embedded_signatures(&target, name);
            }
            return Err(GoError::type_resolution(name, "is not an interface"));
        };

        let key = (package.import_path.clone(), name.to_string(), false);
        if !self.in_progress.insert(key.clone()) {
            return Err(GoError::type_resolution(
                format!("{}.{name}", package.import_path),
                "interface embeds itself",
            ));
        }
        let signatures = self.interface_body(scope, body);
        self.in_progress.remove(&key);

        let signatures = signatures?;
        self.interfaces.insert(cache_key, signatures.clone());
        Ok(signatures)
    }

    fn interface_body(&mut self, scope: Scope<'_>, body: &ast::InterfaceType) -> Result<Vec<Signature>> {
        enum Element<'a> {
            Method(&'a ast::MethodSpec),
            Embed(&'a ast::Embed),
        }

        let mut elements: Vec<(usize, Element<'_>)> = body
            .methods
            .iter()
            .map(|m| (m.position, Element::Method(m)))
            .chain(body.embeds.iter().map(|e| (e.position, Element::Embed(e))))
            .collect();
        elements.sort_by_key(|(position, _)| *position);

        let mut seen = HashSet::new();
        let mut signatures = Vec::new();
        for (_, element) in elements {
            let batch = match element {
                Element::Method(spec) => {
                    vec![Signature::new(&spec.name, self.lower_func(scope, &spec.signature)?)]
                }
                Element::Embed(embed) => {
                    let target = self.lower(scope, &embed.ty)?;
                    let label = describe(&embed.ty);
                    self.embedded_signatures(&target, &label)?
                }
            };
            for signature in batch {
                if seen.insert(signature.name.clone()) {
                    signatures.push(signature);
                }
            }
        }
        Ok(signatures)
    }

    fn embedded_signatures(&mut self, target: &TypeExpr, label: &str) -> Result<Vec<Signature>> {
        match target {
            TypeExpr::Named { path: None, name, .. } if name == "error" => Ok(CapabilitySet::error_capability()
                .iter()
                .map(|(name, func)| Signature::new(name, func.clone()))
                .collect()),
            TypeExpr::Named { path: None, name, .. } if name == "any" => Ok(Vec::new()),
            TypeExpr::Named { args, .. } if !args.is_empty() => Err(GoError::type_resolution(
                label,
                "embedding generic interfaces is not supported",
            )),
            TypeExpr::Named {
                path: Some(path),
                name,
                ..
            } => {
                let Some(package) = self.loader.package(path)? else {
                    return Err(GoError::type_resolution(
                        label,
                        format!("cannot load package {path} to resolve embedded interface"),
                    ));
                };
                self.interface_signatures(&package, name)
            }
            TypeExpr::Interface(signatures) => Ok(signatures.clone()),
            _ => Err(GoError::type_resolution(label, "is not an interface")),
        }
    }

    fn lower_func(&mut self, scope: Scope<'_>, sig: &ast::FuncSig) -> Result<FuncType> {
        let mut params = Vec::with_capacity(sig.params.len());
        for param in &sig.params {
            params.push(self.lower(scope, &param.ty)?);
        }
        if sig.variadic
            && let Some(last) = params.pop()
        {
            params.push(TypeExpr::slice_of(last));
        }
        let mut results = Vec::with_capacity(sig.results.len());
        for result in &sig.results {
            results.push(self.lower(scope, &result.ty)?);
        }
        Ok(FuncType {
            params,
            results,
            variadic: sig.variadic,
        })
    }

    fn lower(&mut self, scope: Scope<'_>, ty: &ast::TypeExpr) -> Result<TypeExpr> {
        Ok(match ty {
            ast::TypeExpr::Name {
                qualifier,
                name,
                args,
            } => {
                let args = args
                    .iter()
                    .map(|arg| self.lower(scope, arg))
                    .collect::<Result<Vec<_>>>()?;
                let path = match qualifier {
                    Some(qualifier) => Some(self.import_for(scope, qualifier, name)?),
                    None => self.unqualified(scope, name)?,
                };
                TypeExpr::Named {
                    path,
                    name: name.clone(),
                    args,
                }
            }
            ast::TypeExpr::Pointer(elem) => TypeExpr::pointer_to(self.lower(scope, elem)?),
            ast::TypeExpr::Slice(elem) => TypeExpr::slice_of(self.lower(scope, elem)?),
            ast::TypeExpr::Array { len, elem } => TypeExpr::Array {
                len: len.clone(),
                elem: Box::new(self.lower(scope, elem)?),
            },
            ast::TypeExpr::Map { key, value } => TypeExpr::Map {
                key: Box::new(self.lower(scope, key)?),
                value: Box::new(self.lower(scope, value)?),
            },
            ast::TypeExpr::Chan { dir, elem } => TypeExpr::Chan {
                dir: *dir,
                elem: Box::new(self.lower(scope, elem)?),
            },
            ast::TypeExpr::Func(sig) => TypeExpr::Func(self.lower_func(scope, sig)?),
            ast::TypeExpr::Interface(body) => {
                if body.constraint {
                    return Err(GoError::type_resolution(
                        "interface literal",
                        "type-set constraints are only valid as type parameter bounds",
                    ));
                }
                TypeExpr::Interface(self.interface_body(scope, body)?)
            }
            ast::TypeExpr::Struct(fields) => {
                let mut lowered = Vec::new();
                for field in fields {
                    let ty = self.lower(scope, &field.ty)?;
                    if field.names.is_empty() {
                        lowered.push(Field {
                            name: None,
                            ty,
                            tag: field.tag.clone(),
                        });
                    } else {
                        lowered.extend(field.names.iter().map(|name| Field {
                            name: Some(name.clone()),
                            ty: ty.clone(),
                            tag: field.tag.clone(),
                        }));
                    }
                }
                TypeExpr::Struct(lowered)
            }
        })
    }

    /// Package path of an unqualified identifier, `None` when predeclared.
    fn unqualified(&mut self, scope: Scope<'_>, name: &str) -> Result<Option<String>> {
        if scope.type_params.iter().any(|param| param == name) {
            return Ok(None);
        }
        if scope.package.type_spec(name).is_some() {
            return Ok(Some(scope.package.import_path.clone()));
        }
        if is_predeclared(name) {
            return Ok(None);
        }
        for import in &scope.file.ast.imports {
            if import.alias.as_deref() != Some(".") {
                continue;
            }
            if let Some(package) = self.loader.package(&import.path)?
                && package.type_spec(name).is_some()
            {
                return Ok(Some(package.import_path.clone()));
            }
        }
        Err(GoError::type_resolution(
            name,
            format!("undefined in {}", scope.file.path.display()),
        ))
    }

    /// Import path bound to `qualifier` in the declaring file. Unaliased
    /// imports match on their package clause, or on the names the import
    /// path suggests when the package cannot be loaded.
    fn import_for(&mut self, scope: Scope<'_>, qualifier: &str, name: &str) -> Result<String> {
        let imports = &scope.file.ast.imports;
        if let Some(import) = imports
            .iter()
            .find(|import| import.alias.as_deref() == Some(qualifier))
        {
            return Ok(import.path.clone());
        }
        for import in imports.iter().filter(|import| import.alias.is_none()) {
            match self.loader.package(&import.path)? {
                Some(package) if package.name == qualifier => return Ok(import.path.clone()),
                Some(_) => {}
                None if guessed_names(&import.path).any(|guess| guess == qualifier) => {
                    self.loader.assume_name(&import.path, qualifier);
                    return Ok(import.path.clone());
                }
                None => {}
            }
        }
        Err(GoError::type_resolution(
            format!("{qualifier}.{name}"),
            format!("no import for {qualifier} in {}", scope.file.path.display()),
        ))
    }
}

fn not_found(path: &str, name: &str) -> GoError {
    GoError::Unresolved {
        name: format!("{path}.{name}"),
        reason: format!("package {path} not found in vendor/, GOROOT or the module cache"),
    }
}

/// Names an unloadable import is likely declared as: the conventional name
/// and the raw last path element (`v1` in `k8s.io/api/core/v1`).
fn guessed_names(import_path: &str) -> impl Iterator<Item = String> {
    let last = import_path.rsplit('/').next().unwrap_or(import_path);
    [default_package_name(import_path), last.to_string()].into_iter()
}

fn describe(ty: &ast::TypeExpr) -> String {
    match ty {
        ast::TypeExpr::Name {
            qualifier: Some(q),
            name,
            ..
        } => format!("{q}.{name}"),
        ast::TypeExpr::Name { name, .. } => name.clone(),
        _ => "embedded element".to_string(),
    }
}

/// Interfaces to instrument: those named in `include` (every interface
/// when empty) minus those named in `exclude`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selection<'a> {
    pub include: &'a [String],
    pub exclude: &'a [String],
}

impl Selection<'_> {
    pub fn contains(&self, name: &str) -> bool {
        (self.include.is_empty() || self.include.iter().any(|n| n == name))
            && !self.exclude.iter().any(|n| n == name)
    }

    /// Naming an interface `package` does not declare is an error.
    pub fn check(&self, package: &Package) -> Result<()> {
        for name in self.include {
            if !package.interface_specs().any(|(_, spec)| &spec.name == name) {
                return Err(GoError::UnknownInterface { name: name.clone() });
            }
        }
        Ok(())
    }
}

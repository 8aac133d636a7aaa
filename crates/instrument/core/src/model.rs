//! Language-agnostic Type Model.
//!
//! Values in this module are produced by an introspection collaborator and
//! stay immutable for the duration of a generation run. Types carry their
//! resolved capability set so that structural checks (such as "is this
//! error-shaped?") are plain queries rather than type-checker calls.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Where an interface was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    /// Import path used to qualify the interface from generated code.
    pub import_path: String,

    /// Package name of the declaring package.
    pub package: String,

    /// Source unit the interface was declared in (file stem).
    pub unit: String,
}

impl Origin {
    pub fn new(
        import_path: impl Into<String>,
        package: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            import_path: import_path.into(),
            package: package.into(),
            unit: unit.into(),
        }
    }
}

/// An interface and its ordered method list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub origin: Origin,
    pub methods: Vec<Method>,
}

impl Interface {
    pub fn new(name: impl Into<String>, origin: Origin, methods: Vec<Method>) -> Self {
        Self {
            name: name.into(),
            origin,
            methods,
        }
    }

    /// The interface as a named type expression.
    pub fn type_expr(&self) -> TypeExpr {
        TypeExpr::Named {
            path: Some(self.origin.import_path.clone()),
            name: self.name.clone(),
            args: Vec::new(),
        }
    }
}

/// A single interface method.
///
/// When `variadic` is set the last parameter is the slice type that the
/// caller's variadic arguments are collected into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    pub variadic: bool,
}

impl Method {
    pub fn new(name: impl Into<String>, params: Vec<Type>, results: Vec<Type>, variadic: bool) -> Self {
        debug_assert!(!variadic || !params.is_empty(), "variadic method without parameters");
        let variadic = variadic && !params.is_empty();
        Self {
            name: name.into(),
            params,
            results,
            variadic,
        }
    }

    pub fn last_result(&self) -> Option<&Type> {
        self.results.last()
    }

    /// Whether the last result satisfies the `Error() string` capability.
    pub fn has_error_result(&self) -> bool {
        self.last_result().is_some_and(Type::is_error_shaped)
    }
}

/// A type expression paired with its resolved capability set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub expr: TypeExpr,
    pub capabilities: Arc<CapabilitySet>,
}

impl Type {
    pub fn new(expr: TypeExpr, capabilities: Arc<CapabilitySet>) -> Self {
        Self { expr, capabilities }
    }

    /// A type with no known operations.
    pub fn opaque(expr: TypeExpr) -> Self {
        Self::new(expr, Arc::new(CapabilitySet::default()))
    }

    /// The predeclared `string` type.
    pub fn string() -> Self {
        Self::opaque(TypeExpr::predeclared("string"))
    }

    /// The predeclared `error` interface.
    pub fn error() -> Self {
        Self::new(
            TypeExpr::predeclared("error"),
            Arc::new(CapabilitySet::error_capability()),
        )
    }

    pub fn is_error_shaped(&self) -> bool {
        self.capabilities.is_error_shaped()
    }
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Structural description of a type as written in a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeExpr {
    /// A named type. `path` is the import path of the declaring package and
    /// is `None` for predeclared identifiers.
    Named {
        path: Option<String>,
        name: String,
        args: Vec<TypeExpr>,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        len: String,
        elem: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr>,
    },
    Func(FuncType),
    /// Interface literal with its flattened method set.
    Interface(Vec<Signature>),
    Struct(Vec<Field>),
}

impl TypeExpr {
    pub fn predeclared(name: impl Into<String>) -> Self {
        Self::Named {
            path: None,
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn named(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named {
            path: Some(path.into()),
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn slice_of(elem: Self) -> Self {
        Self::Slice(Box::new(elem))
    }

    pub fn pointer_to(elem: Self) -> Self {
        Self::Pointer(Box::new(elem))
    }

    pub fn is_predeclared(&self, want: &str) -> bool {
        matches!(self, Self::Named { path: None, name, args } if name == want && args.is_empty())
    }

    /// Element type of a slice; used to spell variadic parameters.
    pub fn slice_elem(&self) -> Option<&Self> {
        match self {
            Self::Slice(elem) => Some(elem),
            _ => None,
        }
    }
}

/// Parameter and result lists of a function or method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncType {
    pub params: Vec<TypeExpr>,
    pub results: Vec<TypeExpr>,
    pub variadic: bool,
}

/// A named operation exposed by a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    pub name: String,
    pub func: FuncType,
}

impl Signature {
    pub fn new(name: impl Into<String>, func: FuncType) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Field {
    /// `None` for embedded fields.
    pub name: Option<String>,
    pub ty: TypeExpr,
    pub tag: Option<String>,
}

/// The operations a type exposes, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    signatures: BTreeMap<String, FuncType>,
}

impl CapabilitySet {
    pub fn from_signatures(signatures: impl IntoIterator<Item = Signature>) -> Self {
        Self {
            signatures: signatures
                .into_iter()
                .map(|sig| (sig.name, sig.func))
                .collect(),
        }
    }

    /// The `{ Error() string }` capability.
    pub fn error_capability() -> Self {
        Self::from_signatures([Signature::new(
            "Error",
            FuncType {
                params: Vec::new(),
                results: vec![TypeExpr::predeclared("string")],
                variadic: false,
            },
        )])
    }

    pub fn get(&self, name: &str) -> Option<&FuncType> {
        self.signatures.get(name)
    }

    pub fn insert(&mut self, signature: Signature) {
        self.signatures.insert(signature.name, signature.func);
    }

    pub fn extend(&mut self, other: &Self) {
        for (name, func) in &other.signatures {
            self.signatures.insert(name.clone(), func.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FuncType)> {
        self.signatures.iter().map(|(name, func)| (name.as_str(), func))
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Structural error check: a zero-argument `Error` returning `string`.
    pub fn is_error_shaped(&self) -> bool {
        self.get("Error").is_some_and(|func| {
            func.params.is_empty()
                && !func.variadic
                && func.results.len() == 1
                && func.results[0].is_predeclared("string")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &str, params: Vec<TypeExpr>, results: Vec<TypeExpr>) -> Signature {
        Signature::new(
            name,
            FuncType {
                params,
                results,
                variadic: false,
            },
        )
    }

    #[test]
    fn error_capability_is_error_shaped() {
        assert!(CapabilitySet::error_capability().is_error_shaped());
        assert!(Type::error().is_error_shaped());
        assert!(!Type::string().is_error_shaped());
    }

    #[test]
    fn structural_match_ignores_other_methods() {
        let caps = CapabilitySet::from_signatures([
            sig("Error", vec![], vec![TypeExpr::predeclared("string")]),
            sig("Temporary", vec![], vec![TypeExpr::predeclared("bool")]),
        ]);
        assert!(caps.is_error_shaped());
    }

    #[test]
    fn wrong_error_signature_is_not_error_shaped() {
        let with_arg = CapabilitySet::from_signatures([sig(
            "Error",
            vec![TypeExpr::predeclared("int")],
            vec![TypeExpr::predeclared("string")],
        )]);
        assert!(!with_arg.is_error_shaped());

        let wrong_result = CapabilitySet::from_signatures([sig(
            "Error",
            vec![],
            vec![TypeExpr::named("example.com/text", "string")],
        )]);
        assert!(!wrong_result.is_error_shaped());

        let two_results = CapabilitySet::from_signatures([sig(
            "Error",
            vec![],
            vec![TypeExpr::predeclared("string"), TypeExpr::predeclared("bool")],
        )]);
        assert!(!two_results.is_error_shaped());
    }

    #[test]
    fn has_error_result_only_looks_at_last_result() {
        let trailing = Method::new("Do", vec![], vec![Type::string(), Type::error()], false);
        assert!(trailing.has_error_result());

        let leading = Method::new("Do", vec![], vec![Type::error(), Type::string()], false);
        assert!(!leading.has_error_result());

        let none = Method::new("Close", vec![], vec![], false);
        assert!(!none.has_error_result());
    }

    #[test]
    fn variadic_methods_keep_their_parameters() {
        let rest = Type::opaque(TypeExpr::slice_of(TypeExpr::predeclared("string")));
        let method = Method::new("Do", vec![Type::string(), rest.clone()], vec![], true);
        assert!(method.variadic);
        assert_eq!(method.params.len(), 2);
        assert_eq!(method.params[1], rest);

        let fixed = Method::new("Do", vec![Type::string()], vec![], false);
        assert!(!fixed.variadic);
    }
}

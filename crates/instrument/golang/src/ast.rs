//! Declaration-level syntax tree.
//!
//! Only what interface introspection needs survives parsing: imports, type
//! declarations and method declarations. Function bodies and value
//! declarations are skipped by the parser.

use instrument_core::model::ChanDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub package: String,
    pub imports: Vec<Import>,
    pub types: Vec<TypeSpec>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Explicit alias, including `_` and `.`.
    pub alias: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: String,
    pub type_params: Vec<String>,
    /// `type A = B`
    pub alias: bool,
    pub ty: TypeExpr,
    pub line: u32,
}

/// A method declared on a named type in this file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub receiver: String,
    pub pointer_receiver: bool,
    pub name: String,
    pub signature: FuncSig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Name {
        qualifier: Option<String>,
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
    Func(FuncSig),
    Interface(InterfaceType),
    Struct(Vec<FieldDecl>),
}

impl TypeExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Name {
            qualifier: None,
            name: name.into(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuncSig {
    pub params: Vec<ParamDecl>,
    pub results: Vec<ParamDecl>,
    /// The last parameter was written `...T`; its `ty` holds `T`.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceType {
    pub methods: Vec<MethodSpec>,
    /// Embedded elements in declaration order, interleaved with methods by
    /// `position` so the resolver can keep source order.
    pub embeds: Vec<Embed>,
    /// Contains type-set terms (`~T`, unions or non-interface elements).
    pub constraint: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: String,
    pub signature: FuncSig,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub ty: TypeExpr,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Empty for an embedded field.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub tag: Option<String>,
}

//! Recursive-descent parser for Go declarations.
//!
//! Parses package clauses, imports, type declarations and method
//! declarations into [`ast`](crate::ast). Function bodies, `var` and `const`
//! declarations are skipped by bracket matching.

use instrument_core::model::ChanDir;

use crate::ast::{
    Embed, FieldDecl, File, FuncSig, Import, InterfaceType, MethodDecl, MethodSpec, ParamDecl,
    TypeExpr, TypeSpec,
};
use crate::error::SyntaxError;
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind};

type PResult<T> = Result<T, SyntaxError>;

/// Parse one Go source file.
pub fn parse_file(source: &str) -> PResult<File> {
    let tokens = tokenize(source)?;
    Parser::new(source, tokens).file()
}

/// Parse a standalone type expression, e.g. `map[string][]*pkg.T`.
pub fn parse_type(source: &str) -> PResult<TypeExpr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(source, tokens);
    let ty = parser.ty()?;
    parser.skip_semis();
    if parser.peek() != TokenKind::Eof {
        return Err(parser.unexpected("end of type"));
    }
    Ok(ty)
}

struct Entry {
    name: Option<String>,
    ty: Option<TypeExpr>,
    variadic: bool,
    token: Token,
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    fn current(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn bump(&mut self) -> Token {
        let token = self.current();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn text(&self, token: Token) -> &'src str {
        token.text(self.source)
    }

    fn error_at(&self, token: Token, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(token.line, token.column, message)
    }

    fn unexpected(&self, what: &str) -> SyntaxError {
        let token = self.current();
        let found = match token.kind {
            TokenKind::Eof => "EOF".to_string(),
            TokenKind::Semicolon if token.start == token.end => "newline".to_string(),
            _ => format!("'{}'", self.text(token)),
        };
        self.error_at(token, format!("expected {what}, found {found}"))
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.peek() == kind {
            Ok(self.bump())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn ident(&mut self) -> PResult<String> {
        let token = self.expect(TokenKind::Ident, "identifier")?;
        Ok(self.text(token).to_string())
    }

    fn skip_semis(&mut self) {
        while self.eat(TokenKind::Semicolon) {}
    }

    /// A `;` may be omitted before a closing `)` or `}`.
    fn expect_semi(&mut self) -> PResult<()> {
        match self.peek() {
            TokenKind::Semicolon => {
                self.bump();
                Ok(())
            }
            TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("';' or newline")),
        }
    }

    fn file(mut self) -> PResult<File> {
        self.skip_semis();
        self.expect(TokenKind::Package, "package clause")?;
        let package = self.ident()?;
        self.expect_semi()?;

        let mut imports = Vec::new();
        loop {
            self.skip_semis();
            if self.peek() != TokenKind::Import {
                break;
            }
            self.bump();
            self.group(|p| {
                imports.push(p.import_spec()?);
                Ok(())
            })?;
        }

        let mut types = Vec::new();
        let mut methods = Vec::new();
        loop {
            self.skip_semis();
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::Type => {
                    self.bump();
                    self.group(|p| {
                        types.push(p.type_spec()?);
                        Ok(())
                    })?;
                }
                TokenKind::Func => {
                    if let Some(method) = self.func_decl()? {
                        methods.push(method);
                    }
                }
                TokenKind::Var | TokenKind::Const => self.skip_decl()?,
                TokenKind::Import => {
                    return Err(self.error_at(
                        self.current(),
                        "imports must appear before other declarations",
                    ));
                }
                _ => return Err(self.unexpected("declaration")),
            }
        }

        Ok(File {
            package,
            imports,
            types,
            methods,
        })
    }

    /// Parse `spec` or `( spec; spec; ... )` followed by a terminator.
    fn group(&mut self, mut spec: impl FnMut(&mut Self) -> PResult<()>) -> PResult<()> {
        if self.eat(TokenKind::LParen) {
            loop {
                self.skip_semis();
                if self.eat(TokenKind::RParen) {
                    break;
                }
                spec(self)?;
                self.expect_semi()?;
            }
        } else {
            spec(self)?;
        }
        self.expect_semi()
    }

    fn import_spec(&mut self) -> PResult<Import> {
        let alias = match self.peek() {
            TokenKind::Ident => Some(self.ident()?),
            TokenKind::Dot => {
                self.bump();
                Some(".".to_string())
            }
            _ => None,
        };
        let token = self.expect(TokenKind::String, "import path")?;
        Ok(Import {
            alias,
            path: unquote(self.text(token)),
        })
    }

    fn type_spec(&mut self) -> PResult<TypeSpec> {
        let line = self.current().line;
        let name = self.ident()?;
        let type_params = if self.at_type_params() {
            self.type_params()?
        } else {
            Vec::new()
        };
        let alias = self.eat(TokenKind::Assign);
        let ty = self.ty()?;
        Ok(TypeSpec {
            name,
            type_params,
            alias,
            ty,
            line,
        })
    }

    /// `[` Ident followed by something that continues a parameter list,
    /// as opposed to an array length such as `[N]`.
    fn at_type_params(&self) -> bool {
        self.peek() == TokenKind::LBrack
            && self.peek_at(1) == TokenKind::Ident
            && {
                let next = self.peek_at(2);
                next.starts_type() || matches!(next, TokenKind::Comma | TokenKind::Tilde)
            }
    }

    fn type_params(&mut self) -> PResult<Vec<String>> {
        self.expect(TokenKind::LBrack, "'['")?;
        let mut names = Vec::new();
        loop {
            if self.eat(TokenKind::RBrack) {
                break;
            }
            names.push(self.ident()?);
            if self.eat(TokenKind::Comma) {
                continue;
            }
            self.constraint()?;
            if !self.eat(TokenKind::Comma) {
                self.expect(TokenKind::RBrack, "']'")?;
                break;
            }
        }
        Ok(names)
    }

    fn constraint(&mut self) -> PResult<()> {
        loop {
            self.eat(TokenKind::Tilde);
            self.ty()?;
            if !self.eat(TokenKind::Pipe) {
                return Ok(());
            }
        }
    }

    fn func_decl(&mut self) -> PResult<Option<MethodDecl>> {
        self.expect(TokenKind::Func, "'func'")?;

        let receiver = if self.peek() == TokenKind::LParen {
            let token = self.current();
            let (params, _) = self.params()?;
            let Some(first) = params.into_iter().next() else {
                return Err(self.error_at(token, "method has no receiver"));
            };
            Some(receiver_base(first.ty).ok_or_else(|| {
                self.error_at(token, "invalid receiver type")
            })?)
        } else {
            None
        };

        let name = self.ident()?;
        if self.peek() == TokenKind::LBrack {
            self.type_params()?;
        }
        let signature = self.signature()?;

        if self.peek() == TokenKind::LBrace {
            self.skip_balanced()?;
        }
        self.expect_semi()?;

        Ok(receiver.map(|(receiver, pointer_receiver)| MethodDecl {
            receiver,
            pointer_receiver,
            name,
            signature,
        }))
    }

    fn skip_decl(&mut self) -> PResult<()> {
        self.bump();
        if self.peek() == TokenKind::LParen {
            self.skip_balanced()?;
        } else {
            while !matches!(self.peek(), TokenKind::Semicolon | TokenKind::Eof) {
                if is_open(self.peek()) {
                    self.skip_balanced()?;
                } else {
                    self.bump();
                }
            }
        }
        self.expect_semi()
    }

    /// Skip from an opening bracket to its matching close.
    fn skip_balanced(&mut self) -> PResult<()> {
        let open = self.bump();
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.bump();
            match token.kind {
                TokenKind::Eof => return Err(self.error_at(open, "unbalanced brackets")),
                kind if is_open(kind) => depth += 1,
                kind if is_close(kind) => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Index of the bracket closing the one at `self.pos + offset`.
    fn matching_close(&self, offset: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(self.pos + offset) {
            if is_open(token.kind) {
                depth += 1;
            } else if is_close(token.kind) {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
        }
        None
    }

    /// For `ident [ ... ]`: whether a type follows the brackets, meaning the
    /// identifier is a name and the brackets start its array or slice type.
    fn name_before_bracket_type(&self) -> bool {
        self.matching_close(1)
            .and_then(|close| self.tokens.get(close + 1))
            .is_some_and(|t| t.kind.starts_type())
    }

    fn ty(&mut self) -> PResult<TypeExpr> {
        match self.peek() {
            TokenKind::Ident => self.type_name(),
            TokenKind::Star => {
                self.bump();
                Ok(TypeExpr::Pointer(Box::new(self.ty()?)))
            }
            TokenKind::LBrack => {
                if self.peek_at(1) == TokenKind::RBrack {
                    self.bump();
                    self.bump();
                    return Ok(TypeExpr::Slice(Box::new(self.ty()?)));
                }
                let open = self.current();
                let Some(close) = self.matching_close(0) else {
                    return Err(self.error_at(open, "unbalanced brackets"));
                };
                // the length is kept verbatim; it is never evaluated
                let len = self.source[open.end..self.tokens[close].start]
                    .trim()
                    .to_string();
                self.pos = close + 1;
                Ok(TypeExpr::Array {
                    len,
                    elem: Box::new(self.ty()?),
                })
            }
            TokenKind::Map => {
                self.bump();
                self.expect(TokenKind::LBrack, "'['")?;
                let key = self.ty()?;
                self.expect(TokenKind::RBrack, "']'")?;
                let value = self.ty()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            TokenKind::Chan => {
                self.bump();
                let dir = if self.eat(TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Ok(TypeExpr::Chan {
                    dir,
                    elem: Box::new(self.ty()?),
                })
            }
            TokenKind::Arrow => {
                self.bump();
                self.expect(TokenKind::Chan, "'chan'")?;
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(self.ty()?),
                })
            }
            TokenKind::Func => {
                self.bump();
                Ok(TypeExpr::Func(self.signature()?))
            }
            TokenKind::Interface => self.interface_type(),
            TokenKind::Struct => self.struct_type(),
            TokenKind::LParen => {
                self.bump();
                let ty = self.ty()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(ty)
            }
            _ => Err(self.unexpected("type")),
        }
    }

    fn type_name(&mut self) -> PResult<TypeExpr> {
        let first = self.ident()?;
        let (qualifier, name) = if self.eat(TokenKind::Dot) {
            (Some(first), self.ident()?)
        } else {
            (None, first)
        };

        let mut args = Vec::new();
        if self.eat(TokenKind::LBrack) {
            loop {
                args.push(self.ty()?);
                if !self.eat(TokenKind::Comma) || self.peek() == TokenKind::RBrack {
                    break;
                }
            }
            self.expect(TokenKind::RBrack, "']'")?;
        }

        Ok(TypeExpr::Name {
            qualifier,
            name,
            args,
        })
    }

    fn signature(&mut self) -> PResult<FuncSig> {
        let (params, variadic) = self.params()?;
        let results = match self.peek() {
            TokenKind::LParen => {
                let token = self.current();
                let (results, variadic) = self.params()?;
                if variadic {
                    return Err(self.error_at(token, "invalid use of '...' in results"));
                }
                results
            }
            kind if kind.starts_type() => vec![ParamDecl {
                name: None,
                ty: self.ty()?,
            }],
            _ => Vec::new(),
        };
        Ok(FuncSig {
            params,
            results,
            variadic,
        })
    }

    /// Parse a parenthesized parameter list in any of its Go forms:
    /// `(int, string)`, `(a int, b, c string)` and `(a string, b ...int)`.
    fn params(&mut self) -> PResult<(Vec<ParamDecl>, bool)> {
        self.expect(TokenKind::LParen, "'('")?;

        let mut entries = Vec::new();
        loop {
            if self.eat(TokenKind::RParen) {
                break;
            }
            entries.push(self.param_entry()?);
            if !self.eat(TokenKind::Comma) {
                self.expect(TokenKind::RParen, "')'")?;
                break;
            }
        }

        if let Some(position) = entries.iter().position(|e| e.variadic)
            && position + 1 != entries.len()
        {
            return Err(self.error_at(
                entries[position].token,
                "can only use '...' with final parameter in list",
            ));
        }
        let variadic = entries.last().is_some_and(|e| e.variadic);

        let named = entries.iter().any(|e| e.name.is_some() && e.ty.is_some());
        if !named {
            let params = entries
                .into_iter()
                .filter_map(|entry| {
                    let ty = entry.ty.or_else(|| entry.name.map(TypeExpr::ident))?;
                    Some(ParamDecl { name: None, ty })
                })
                .collect();
            return Ok((params, variadic));
        }

        let mut params = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for entry in entries {
            match (entry.name, entry.ty) {
                (Some(name), None) => pending.push(name),
                (Some(name), Some(ty)) => {
                    if entry.variadic && !pending.is_empty() {
                        return Err(self.error_at(
                            entry.token,
                            "can only use '...' with final parameter in list",
                        ));
                    }
                    for grouped in pending.drain(..) {
                        params.push(ParamDecl {
                            name: Some(grouped),
                            ty: ty.clone(),
                        });
                    }
                    params.push(ParamDecl {
                        name: Some(name),
                        ty,
                    });
                }
                (None, _) => {
                    return Err(
                        self.error_at(entry.token, "mixed named and unnamed parameters")
                    );
                }
            }
        }
        if !pending.is_empty() {
            return Err(self.error_at(self.current(), "mixed named and unnamed parameters"));
        }
        Ok((params, variadic))
    }

    fn param_entry(&mut self) -> PResult<Entry> {
        let token = self.current();
        let entry = |name, ty, variadic| Entry {
            name,
            ty,
            variadic,
            token,
        };

        if self.eat(TokenKind::Ellipsis) {
            return Ok(entry(None, Some(self.ty()?), true));
        }
        if self.peek() != TokenKind::Ident {
            return Ok(entry(None, Some(self.ty()?), false));
        }

        match self.peek_at(1) {
            TokenKind::Comma | TokenKind::RParen => Ok(entry(Some(self.ident()?), None, false)),
            TokenKind::Dot => Ok(entry(None, Some(self.ty()?), false)),
            TokenKind::LBrack if !self.name_before_bracket_type() => {
                Ok(entry(None, Some(self.ty()?), false))
            }
            TokenKind::Ellipsis => {
                let name = self.ident()?;
                self.bump();
                Ok(entry(Some(name), Some(self.ty()?), true))
            }
            kind if kind.starts_type() => {
                let name = self.ident()?;
                Ok(entry(Some(name), Some(self.ty()?), false))
            }
            _ => {
                self.bump();
                Err(self.unexpected("',' or ')'"))
            }
        }
    }

    fn interface_type(&mut self) -> PResult<TypeExpr> {
        self.expect(TokenKind::Interface, "'interface'")?;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut iface = InterfaceType::default();
        let mut position = 0;
        loop {
            self.skip_semis();
            if self.eat(TokenKind::RBrace) {
                break;
            }

            if self.peek() == TokenKind::Ident && self.peek_at(1) == TokenKind::LParen {
                let name = self.ident()?;
                let signature = self.signature()?;
                iface.methods.push(MethodSpec {
                    name,
                    signature,
                    position,
                });
            } else {
                let mut type_set = self.eat(TokenKind::Tilde);
                let ty = self.ty()?;
                while self.eat(TokenKind::Pipe) {
                    type_set = true;
                    self.eat(TokenKind::Tilde);
                    self.ty()?;
                }
                if type_set {
                    iface.constraint = true;
                } else {
                    iface.embeds.push(Embed { ty, position });
                }
            }
            position += 1;
            self.expect_semi()?;
        }

        Ok(TypeExpr::Interface(iface))
    }

    fn struct_type(&mut self) -> PResult<TypeExpr> {
        self.expect(TokenKind::Struct, "'struct'")?;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            if self.eat(TokenKind::RBrace) {
                break;
            }

            let (names, ty) = match (self.peek(), self.peek_at(1)) {
                (TokenKind::Star, _) => (Vec::new(), self.ty()?),
                (
                    TokenKind::Ident,
                    TokenKind::Dot | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::String,
                ) => (Vec::new(), self.ty()?),
                (TokenKind::Ident, TokenKind::LBrack) if !self.name_before_bracket_type() => {
                    (Vec::new(), self.ty()?)
                }
                (TokenKind::Ident, _) => {
                    let mut names = vec![self.ident()?];
                    while self.eat(TokenKind::Comma) {
                        names.push(self.ident()?);
                    }
                    (names, self.ty()?)
                }
                _ => return Err(self.unexpected("field declaration")),
            };

            let tag = if self.peek() == TokenKind::String {
                let token = self.bump();
                Some(self.text(token).to_string())
            } else {
                None
            };

            fields.push(FieldDecl { names, ty, tag });
            self.expect_semi()?;
        }

        Ok(TypeExpr::Struct(fields))
    }
}

fn is_open(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::LParen | TokenKind::LBrack | TokenKind::LBrace)
}

fn is_close(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::RParen | TokenKind::RBrack | TokenKind::RBrace)
}

/// Base type name of a receiver, and whether it is a pointer receiver.
fn receiver_base(ty: TypeExpr) -> Option<(String, bool)> {
    match ty {
        TypeExpr::Name {
            qualifier: None,
            name,
            ..
        } => Some((name, false)),
        TypeExpr::Pointer(inner) => match *inner {
            TypeExpr::Name {
                qualifier: None,
                name,
                ..
            } => Some((name, true)),
            _ => None,
        },
        _ => None,
    }
}

/// Strip quotes from a string literal, resolving simple escapes.
fn unquote(literal: &str) -> String {
    if let Some(raw) = literal.strip_prefix('`') {
        return raw.strip_suffix('`').unwrap_or(raw).to_string();
    }

    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(escaped @ ('\\' | '"' | '\'')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(name: &str) -> TypeExpr {
        TypeExpr::ident(name)
    }

    fn qualified(qualifier: &str, name: &str) -> TypeExpr {
        TypeExpr::Name {
            qualifier: Some(qualifier.to_string()),
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    fn param(ty: TypeExpr) -> ParamDecl {
        ParamDecl { name: None, ty }
    }

    fn named(n: &str, ty: TypeExpr) -> ParamDecl {
        ParamDecl {
            name: Some(n.to_string()),
            ty,
        }
    }

    fn only_interface(source: &str) -> InterfaceType {
        let file = parse_file(source).unwrap();
        match &file.types[0].ty {
            TypeExpr::Interface(iface) => iface.clone(),
            other => panic!("expected interface, got {other:?}"),
        }
    }

    #[test]
    fn parses_client_fixture() {
        let file = parse_file(
            r#"package e2etests

type Client interface {
	Close()
	Do(command string) (interface{}, error)
	Dof(command string, args ...interface{}) (interface{}, error)
	MustDo(command string) interface{}
}
"#,
        )
        .unwrap();

        assert_eq!(file.package, "e2etests");
        assert_eq!(file.types.len(), 1);
        assert_eq!(file.types[0].name, "Client");

        let TypeExpr::Interface(iface) = &file.types[0].ty else {
            panic!("expected interface");
        };
        let names: Vec<_> = iface.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Close", "Do", "Dof", "MustDo"]);

        let dof = &iface.methods[2].signature;
        assert!(dof.variadic);
        assert_eq!(dof.params.len(), 2);
        assert_eq!(
            dof.params[1],
            named("args", TypeExpr::Interface(InterfaceType::default()))
        );
        assert_eq!(dof.results.len(), 2);
        assert_eq!(dof.results[1], param(name("error")));
    }

    #[test]
    fn parses_imports_in_all_forms() {
        let file = parse_file(
            r#"package a
import "fmt"
import (
	"io"
	merr "github.com/x/mockerror"
	_ "embed"
	. "strings"
)
"#,
        )
        .unwrap();

        let imports: Vec<_> = file
            .imports
            .iter()
            .map(|i| (i.alias.as_deref(), i.path.as_str()))
            .collect();
        assert_eq!(
            imports,
            vec![
                (None, "fmt"),
                (None, "io"),
                (Some("merr"), "github.com/x/mockerror"),
                (Some("_"), "embed"),
                (Some("."), "strings"),
            ]
        );
    }

    #[test]
    fn grouped_and_unnamed_parameters() {
        let ty = parse_type("func(a, b string, c int) (int, error)").unwrap();
        let TypeExpr::Func(sig) = ty else {
            panic!("expected func");
        };
        assert_eq!(
            sig.params,
            vec![
                named("a", name("string")),
                named("b", name("string")),
                named("c", name("int")),
            ]
        );
        assert_eq!(sig.results, vec![param(name("int")), param(name("error"))]);

        let TypeExpr::Func(sig) = parse_type("func(string, []byte, pkg.T)").unwrap() else {
            panic!("expected func");
        };
        assert_eq!(
            sig.params,
            vec![
                param(name("string")),
                param(TypeExpr::Slice(Box::new(name("byte")))),
                param(qualified("pkg", "T")),
            ]
        );
    }

    #[test]
    fn name_followed_by_slice_type() {
        let TypeExpr::Func(sig) = parse_type("func(buf []byte, m [4]int, l List[int])").unwrap()
        else {
            panic!("expected func");
        };
        assert_eq!(sig.params[0], named("buf", TypeExpr::Slice(Box::new(name("byte")))));
        assert_eq!(
            sig.params[1],
            named(
                "m",
                TypeExpr::Array {
                    len: "4".into(),
                    elem: Box::new(name("int"))
                }
            )
        );
        assert_eq!(
            sig.params[2],
            named(
                "l",
                TypeExpr::Name {
                    qualifier: None,
                    name: "List".into(),
                    args: vec![name("int")],
                }
            )
        );
    }

    #[test]
    fn unnamed_variadic() {
        let TypeExpr::Func(sig) = parse_type("func(string, ...string) string").unwrap() else {
            panic!("expected func");
        };
        assert!(sig.variadic);
        assert_eq!(sig.params, vec![param(name("string")), param(name("string"))]);
    }

    #[test]
    fn rejects_misplaced_variadic() {
        let err = parse_type("func(a ...int, b string)").unwrap_err();
        assert!(err.message.contains("final parameter"));
    }

    #[test]
    fn rejects_mixed_parameters() {
        let err = parse_type("func(a int, string)").unwrap_err();
        assert!(err.message.contains("mixed named and unnamed"));
    }

    #[test]
    fn channel_and_map_types() {
        assert_eq!(
            parse_type("map[string]<-chan int").unwrap(),
            TypeExpr::Map {
                key: Box::new(name("string")),
                value: Box::new(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(name("int")),
                }),
            }
        );
        assert_eq!(
            parse_type("chan<- *pkg.T").unwrap(),
            TypeExpr::Chan {
                dir: ChanDir::Send,
                elem: Box::new(TypeExpr::Pointer(Box::new(qualified("pkg", "T")))),
            }
        );
    }

    #[test]
    fn interface_embeds_and_constraints() {
        let iface = only_interface(
            "package a\ntype RW interface {\n\tio.Reader\n\tWriter\n\tFlush() error\n}\n",
        );
        assert_eq!(iface.embeds.len(), 2);
        assert_eq!(iface.embeds[0].ty, qualified("io", "Reader"));
        assert_eq!(iface.embeds[1].position, 1);
        assert_eq!(iface.methods[0].position, 2);
        assert!(!iface.constraint);

        let number = only_interface("package a\ntype Number interface { ~int | ~float64 }\n");
        assert!(number.constraint);
        assert!(number.embeds.is_empty());
    }

    #[test]
    fn methods_and_skipped_declarations() {
        let file = parse_file(
            r#"package a

const limit = 10

var (
	table = map[string]int{"a": 1}
	fn    = func() { if true { return } }
)

type myErr struct {
	code, kind int `json:"code"`
	*Base
	pkg.Mixin
}

func (e *myErr) Error() string {
	return fmt.Sprintf("%d", e.code)
}

func (e myErr) Code() int { return e.code }

func helper() {}
"#,
        )
        .unwrap();

        assert_eq!(file.types.len(), 1);
        let TypeExpr::Struct(fields) = &file.types[0].ty else {
            panic!("expected struct");
        };
        assert_eq!(fields[0].names, vec!["code", "kind"]);
        assert_eq!(fields[0].tag.as_deref(), Some("`json:\"code\"`"));
        assert!(fields[1].names.is_empty());
        assert_eq!(fields[2].ty, qualified("pkg", "Mixin"));

        let methods: Vec<_> = file
            .methods
            .iter()
            .map(|m| (m.receiver.as_str(), m.pointer_receiver, m.name.as_str()))
            .collect();
        assert_eq!(methods, vec![("myErr", true, "Error"), ("myErr", false, "Code")]);
    }

    #[test]
    fn generic_declarations() {
        let file = parse_file(
            "package a\ntype List[T any] struct { items []T }\ntype Pair[K comparable, V any] interface { Get(K) V }\ntype Buf [N]byte\nfunc (l *List[T]) Len() int { return 0 }\n",
        )
        .unwrap();
        assert_eq!(file.types[0].type_params, vec!["T"]);
        assert_eq!(file.types[1].type_params, vec!["K", "V"]);
        assert!(file.types[2].type_params.is_empty());
        assert!(matches!(file.types[2].ty, TypeExpr::Array { ref len, .. } if len == "N"));
        assert_eq!(file.methods[0].receiver, "List");
    }

    #[test]
    fn type_aliases_and_groups() {
        let file = parse_file("package a\ntype (\n\tA = B\n\tB string\n)\n").unwrap();
        assert!(file.types[0].alias);
        assert!(!file.types[1].alias);
    }

    #[test]
    fn reports_positions() {
        let err = parse_file("package a\n\ntype X interface {\n\tDo(\n}\n").unwrap_err();
        assert_eq!(err.line, 5);
        assert!(err.message.contains("expected type"));
    }

    #[test]
    fn unquotes_paths() {
        assert_eq!(unquote("\"a/b\""), "a/b");
        assert_eq!(unquote("`a/b`"), "a/b");
        assert_eq!(unquote("\"a\\\"b\""), "a\"b");
    }
}

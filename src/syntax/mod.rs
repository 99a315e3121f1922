//! The resolved syntax tree of one C++ translation unit, as handed over by the
//! upstream parser and type checker.
use crate::location::{Located, SourceSpan};
use serde::{Deserialize, Serialize};

#[macro_use]
pub mod debug;
#[macro_use]
mod ident;
mod iter;
mod types;

pub use types::{Signature, Type};

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub file: String,
    #[serde(default)]
    pub source: Option<String>,
    pub decls: Vec<Decl>,
    /// The lexer's token stream for the whole file, in source order.
    #[serde(default)]
    pub tokens: Vec<Token>,
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decl {
    Class(ClassDecl),
    Func(FuncDecl),
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: LName,
    #[serde(default)]
    pub bases: Vec<LName>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    pub extent: SourceSpan,
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberDecl {
    Field(FieldDecl),
    Method(FuncDecl),
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: LName,
    #[serde(rename = "type")]
    pub typ: Type,
    #[serde(default)]
    pub is_static: bool,
    pub extent: SourceSpan,
}

/// A method declaration inside a class, or a function at the top level. The
/// latter is an out-of-line method definition when it has a `qualifier`.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    #[serde(default)]
    pub qualifier: Option<LName>,
    pub name: LName,
    #[serde(default)]
    pub params: Vec<Param>,
    /// `None` for constructors and destructors.
    #[serde(default)]
    pub return_type: Option<Type>,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub body: Option<Vec<Stmt>>,
    pub extent: SourceSpan,
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: Option<LName>,
    #[serde(rename = "type")]
    pub typ: Type,
    #[serde(default)]
    pub has_default: bool,
    pub extent: SourceSpan,
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LocalDecl {
    pub name: LName,
    #[serde(rename = "type")]
    pub typ: Type,
    #[serde(default)]
    pub init: Option<LExpr>,
    pub extent: SourceSpan,
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Local(LocalDecl),
    Expr(LExpr),
    Return(Option<LExpr>),
    Block(Vec<Stmt>),
    If(LExpr, Box<Stmt>, Option<Box<Stmt>>),
    While(LExpr, Box<Stmt>),
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A name used without qualification, still to be resolved by scope.
    Ident(LName),
    /// A name the upstream resolver already bound to a parameter.
    ParamRef(LName),
    /// A name the upstream resolver already bound to a local variable.
    LocalRef(LName),
    This,
    Member(Box<LExpr>, AccessOp, LName),
    /// `Class::member`.
    Scoped(LName, LName),
    Call(Box<LExpr>, Vec<LExpr>),
    Unary(LName, Box<LExpr>),
    Binary(Box<LExpr>, LName, Box<LExpr>),
    Literal(Type),
}

pub type LExpr = Located<Expr>;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOp {
    Dot,
    Arrow,
}

/// Token kinds as reported by libclang.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Punctuation,
    Keyword,
    Identifier,
    Literal,
    Comment,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub spelling: String,
    pub span: SourceSpan,
}

/// A non-owning handle to any declaration in a translation unit.
#[derive(Clone, Copy, Debug)]
pub enum DeclRef<'a> {
    Class(&'a ClassDecl),
    Field(&'a FieldDecl),
    Func(&'a FuncDecl),
    Param(&'a Param),
    Local(&'a LocalDecl),
}

ident_type!(Name);
pub type LName = Located<Name>;

impl Name {
    /// Whether this names an operator function such as `operator<<`. Plain
    /// identifiers that merely start with `operator` do not count.
    pub fn is_operator(&self) -> bool {
        self.as_str()
            .strip_prefix("operator")
            .map_or(false, |rest| !rest.starts_with(|c: char| c == '_' || c.is_ascii_alphanumeric()))
    }

    /// The name of the operator function overloading `op`.
    pub fn operator(op: Name) -> Self {
        Self::new(&format!("operator{}", op))
    }
}

impl FuncDecl {
    pub fn signature(&self) -> Signature {
        Signature::new(self.params.iter().map(|param| &param.typ), self.is_const)
    }

    /// The number of arguments a call must pass at least.
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|param| !param.has_default).count()
    }

    pub fn accepts_arity(&self, num_args: usize) -> bool {
        self.required_params() <= num_args && num_args <= self.params.len()
    }
}

impl AccessOp {
    pub fn spelling(self) -> &'static str {
        match self {
            Self::Dot => ".",
            Self::Arrow => "->",
        }
    }
}

impl Token {
    pub fn is(&self, spelling: &str) -> bool {
        self.spelling == spelling
    }
}

impl TranslationUnit {
    /// The tokens lying completely inside `span`.
    pub fn tokens_in(&self, span: SourceSpan) -> &[Token] {
        let start = self.tokens.partition_point(|token| token.span.start < span.start);
        let end = self.tokens.partition_point(|token| token.span.end <= span.end);
        if start < end {
            &self.tokens[start..end]
        } else {
            &[]
        }
    }
}

impl<'a> DeclRef<'a> {
    pub fn name(&self) -> Option<&'a LName> {
        match self {
            Self::Class(decl) => Some(&decl.name),
            Self::Field(decl) => Some(&decl.name),
            Self::Func(decl) => Some(&decl.name),
            Self::Param(decl) => decl.name.as_ref(),
            Self::Local(decl) => Some(&decl.name),
        }
    }

    pub fn extent(&self) -> SourceSpan {
        match self {
            Self::Class(decl) => decl.extent,
            Self::Field(decl) => decl.extent,
            Self::Func(decl) => decl.extent,
            Self::Param(decl) => decl.extent,
            Self::Local(decl) => decl.extent,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Class(_) => "class",
            Self::Field(_) => "field",
            Self::Func(decl) if decl.qualifier.is_some() => "method definition",
            Self::Func(_) => "function",
            Self::Param(_) => "parameter",
            Self::Local(_) => "local variable",
        }
    }
}

derive_fmt_debug!(TranslationUnit);
derive_fmt_debug!(Decl);
derive_fmt_debug!(ClassDecl);
derive_fmt_debug!(MemberDecl);
derive_fmt_debug!(FieldDecl);
derive_fmt_debug!(FuncDecl);
derive_fmt_debug!(Param);
derive_fmt_debug!(LocalDecl);
derive_fmt_debug!(Stmt);
derive_fmt_debug!(Expr);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::SourceLocation;

    #[test]
    fn test_operator_names() {
        assert!(Name::new("operator<<").is_operator());
        assert!(Name::new("operator()").is_operator());
        assert!(Name::new("operator new[]").is_operator());
        assert!(!Name::new("operator_count").is_operator());
        assert!(!Name::new("operators").is_operator());
        assert!(!Name::new("virtual_method").is_operator());
        assert_eq!(Name::operator(Name::new("<<")).as_str(), "operator<<");
    }

    #[test]
    fn test_tokens_in() {
        let token = |line, start, end| Token {
            kind: TokenKind::Identifier,
            spelling: String::from("x"),
            span: SourceSpan::new(SourceLocation::new(line, start), SourceLocation::new(line, end)),
        };
        let unit = TranslationUnit {
            file: String::from("t.cpp"),
            source: None,
            decls: vec![],
            tokens: vec![token(0, 0, 1), token(0, 2, 3), token(1, 0, 1), token(1, 4, 5)],
        };
        let span = |text: &str| text.parse::<SourceSpan>().unwrap();
        assert_eq!(unit.tokens_in(span("1:3-2:2")), &unit.tokens[1..3]);
        assert_eq!(unit.tokens_in(span("1:1-1:3")), &unit.tokens[0..1]);
        assert!(unit.tokens_in(span("3:1-3:9")).is_empty());
    }
}

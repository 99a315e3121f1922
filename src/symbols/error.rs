use crate::diagnostic::Source;
use crate::location::{Located, SourceSpan};
use crate::syntax::{Name, Signature, Type};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("`{0}` is not a member of any class in this translation unit.")]
    InvalidTarget(String),
    #[error(
        "`{class}::{name}` is overloaded. Add one of the signatures {candidates} to pick one."
    )]
    AmbiguousTarget { class: Name, name: Name, candidates: String },
    #[error("Cannot find the name of {kind} `{name}` among its tokens.")]
    NoIdentifierToken { kind: &'static str, name: String },
    #[error("Duplicate definition of class `{class}`.")]
    DuplicateClass { class: Name, original: SourceSpan },
    #[error("Class `{class}` derives from unknown class `{base}`.")]
    UnknownBaseClass { class: Name, base: Name },
    #[error("Class `{0}` derives from itself.")]
    CyclicInheritance(Name),
    #[error("`{0}` qualifies a method definition but is not a class.")]
    UnknownQualifier(Name),
    #[error("Class `{class}` declares no method `{name}{signature}` matching this definition.")]
    UnmatchedDefinition { class: Name, name: Name, signature: Signature },
    #[error("Translation unit has {nodes} syntax nodes, more than the limit of {limit}.")]
    UnitTooLarge { nodes: usize, limit: usize },
    #[error(
        "Bad member `{0}`. Expected `Class::member`, optionally followed by a parameter list \
        and `const`."
    )]
    BadMemberPath(String),
    #[error("{0}")]
    BadType(String),
}

pub type LError = Located<Error>;

/// Why an expression does not resolve to a declaration. Such expressions are
/// left out of all results.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Unresolved {
    #[error("the type of the object expression is unknown")]
    UnknownType,
    #[error("type `{0}` is not a class")]
    NotAClass(Type),
    #[error("`{op}` cannot be applied to an expression of type `{typ}`")]
    AccessMismatch { op: &'static str, typ: Type },
    #[error("class `{class}` has no member `{name}`")]
    NoSuchMember { class: Name, name: Name },
    #[error("`{name}` is a member of several base classes of `{class}`")]
    AmbiguousBase { class: Name, name: Name },
    #[error("no overload of `{name}` can be called here")]
    NoViableOverload { name: Name },
    #[error("several overloads of `{name}` match equally well")]
    AmbiguousOverload { name: Name },
    #[error("`{0}` is not declared in this scope")]
    UnknownName(Name),
    #[error("`{0}` is not bound to a variable of that kind")]
    UnboundLocal(Name),
    #[error("`this` outside of a method")]
    NoEnclosingClass,
}

impl Error {
    pub fn component(&self) -> Source {
        match self {
            Self::InvalidTarget(_) | Self::AmbiguousTarget { .. } | Self::BadMemberPath(_) => {
                Source::Query
            }
            Self::BadType(_) => Source::Query,
            Self::NoIdentifierToken { .. } => Source::Identifier,
            Self::DuplicateClass { .. }
            | Self::UnknownBaseClass { .. }
            | Self::CyclicInheritance(_)
            | Self::UnknownQualifier(_)
            | Self::UnmatchedDefinition { .. }
            | Self::UnitTooLarge { .. } => Source::Symbols,
        }
    }
}

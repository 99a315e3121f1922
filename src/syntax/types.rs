use super::Name;
use join_lazy_fmt::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A C++ type as spelled in declarations. Builtin and class types are both
/// `Named`; whether a name denotes a class is decided by the symbol table.
#[derive(Clone, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    Named(Name),
    Const(Box<Type>),
    Pointer(Box<Type>),
    LRef(Box<Type>),
    RRef(Box<Type>),
}

/// The part of a method type that distinguishes overloads.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub is_const: bool,
}

impl Type {
    pub fn named(name: &str) -> Self {
        Self::Named(Name::new(name))
    }

    pub fn pointer_to(self) -> Self {
        Self::Pointer(Box::new(self))
    }

    pub fn as_const(self) -> Self {
        match self {
            Self::Const(_) => self,
            _ => Self::Const(Box::new(self)),
        }
    }

    /// Removes any reference layers. References are transparent for member
    /// access.
    pub fn strip_refs(&self) -> &Type {
        match self {
            Self::LRef(inner) | Self::RRef(inner) => inner.strip_refs(),
            _ => self,
        }
    }

    /// Removes a top-level `const`.
    pub fn strip_const(&self) -> &Type {
        match self {
            Self::Const(inner) => inner.strip_const(),
            _ => self,
        }
    }

    /// The type with references and top-level `const` removed, as used for
    /// comparing argument types against parameter types.
    pub fn decay(&self) -> &Type {
        self.strip_refs().strip_const()
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Self::Const(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::LRef(_) | Self::RRef(_))
    }

    pub fn is_lvalue_reference(&self) -> bool {
        matches!(self, Self::LRef(_))
    }

    /// Whether binding an argument to a parameter of this type lets the
    /// callee modify the argument.
    pub fn is_non_const_reference(&self) -> bool {
        match self {
            Self::LRef(inner) | Self::RRef(inner) => !inner.is_const(),
            _ => false,
        }
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self.strip_refs().strip_const() {
            Self::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// The name of a (possibly `const`) named type.
    pub fn name(&self) -> Option<Name> {
        match self.strip_const() {
            Self::Named(name) => Some(*name),
            _ => None,
        }
    }
}

impl Signature {
    /// Top-level `const` on parameters does not take part in overloading.
    pub fn new<'a, I: IntoIterator<Item = &'a Type>>(params: I, is_const: bool) -> Self {
        let params = params.into_iter().map(|typ| typ.strip_const().clone()).collect();
        Self { params, is_const }
    }
}

// Parsing of C++ type spellings such as `const Foo&`, `Foo const*` or
// `unsigned int`.

impl FromStr for Type {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let bad = || format!("bad type `{}`", input);
        let mut base_words = Vec::new();
        let mut base_const = false;
        let mut rest = input.trim();
        while let Some(word_len) = leading_word(rest) {
            let word = &rest[..word_len];
            if word == "const" {
                base_const = true;
            } else {
                base_words.push(word);
            }
            rest = rest[word_len..].trim_start();
        }
        if base_words.is_empty() {
            return Err(bad());
        }
        let mut typ = Type::Named(Name::new(&base_words.join(" ")));
        if base_const {
            typ = typ.as_const();
        }
        while !rest.is_empty() {
            let (next, len) = if rest.starts_with("&&") {
                (Type::RRef(Box::new(typ)), 2)
            } else if rest.starts_with('&') {
                (Type::LRef(Box::new(typ)), 1)
            } else if rest.starts_with('*') {
                (Type::Pointer(Box::new(typ)), 1)
            } else if rest.starts_with("const") {
                (typ.as_const(), "const".len())
            } else {
                return Err(bad());
            };
            typ = next;
            rest = rest[len..].trim_start();
        }
        Ok(typ)
    }
}

fn leading_word(input: &str) -> Option<usize> {
    let len = input.find(|c: char| !(c == '_' || c == ':' || c.is_ascii_alphanumeric()))
        .unwrap_or(input.len());
    if len == 0 {
        None
    } else {
        Some(len)
    }
}

impl TryFrom<String> for Type {
    type Error = String;

    fn try_from(input: String) -> Result<Self, Self::Error> {
        input.parse()
    }
}

impl From<Type> for String {
    fn from(typ: Type) -> Self {
        typ.to_string()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::Const(inner) => match inner.as_ref() {
                Self::Named(name) => write!(f, "const {}", name),
                inner => write!(f, "{} const", inner),
            },
            Self::Pointer(inner) => write!(f, "{}*", inner),
            Self::LRef(inner) => write!(f, "{}&", inner),
            Self::RRef(inner) => write!(f, "{}&&", inner),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", ", ".join(&self.params))?;
        if self.is_const {
            write!(f, " const")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature{}", self)
    }
}

//! Naming class members in text, e.g. `Foo::virtual_method() const` or
//! `Foo::operator<<(Foo&)`.
use crate::*;
use join_lazy_fmt::*;
use location::{Located, SourceSpan};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use symbols::{Error, LError, MemberId, SymbolTable};
use syntax::{Name, Signature, Type};

lazy_static! {
    static ref MEMBER_PATH: Regex = Regex::new(
        r"(?x)
        ^\s*
        (?P<class>[A-Za-z_]\w*) \s* :: \s*
        (?P<member>
            operator \s* (?: \(\s*\) | \[\s*\] | (?:new|delete) (?:\s*\[\s*\])? | [^\s\w(]+ )
            | ~?[A-Za-z_]\w*
        )
        \s*
        (?: \( (?P<params>[^()]*) \) \s* (?P<const>const)? )?
        \s*$
        "
    )
    .expect("member path pattern");
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberPath {
    pub class: Name,
    pub member: Name,
    /// Picks one of several overloads.
    pub signature: Option<Signature>,
}

impl FromStr for MemberPath {
    type Err = LError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let bad = || Located::new(Error::BadMemberPath(input.to_string()), SourceSpan::default());
        let captures = MEMBER_PATH.captures(input).ok_or_else(bad)?;
        let class = Name::new(&captures["class"]);
        let member = Name::new(&normalize_member(&captures["member"]));
        let signature = match captures.name("params") {
            None => None,
            Some(params) => {
                let params = parse_params(params.as_str())
                    .map_err(|error| Located::new(Error::BadType(error), SourceSpan::default()))?;
                Some(Signature::new(&params, captures.name("const").is_some()))
            }
        };
        Ok(Self { class, member, signature })
    }
}

/// Removes the blanks inside operator names, except for the one separating
/// `operator` from `new` and `delete`.
fn normalize_member(member: &str) -> String {
    match member.strip_prefix("operator") {
        None => member.to_string(),
        Some(op) => {
            let op = op.split_whitespace().collect::<String>();
            if op.starts_with(|c: char| c.is_ascii_alphabetic()) {
                format!("operator {}", op)
            } else {
                format!("operator{}", op)
            }
        }
    }
}

fn parse_params(params: &str) -> Result<Vec<Type>, String> {
    let params = params.trim();
    if params.is_empty() || params == "void" {
        return Ok(Vec::new());
    }
    params.split(',').map(str::parse).collect()
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.member)?;
        if let Some(signature) = &self.signature {
            write!(f, "{}", signature)?;
        }
        Ok(())
    }
}

impl<'a> SymbolTable<'a> {
    /// The member of the named class a path refers to. Inherited members do
    /// not count, they belong to the base class.
    pub fn lookup_target(&self, path: &MemberPath) -> Result<MemberId, LError> {
        let invalid = || Located::new(Error::InvalidTarget(path.to_string()), SourceSpan::default());
        let class = self.class_named(path.class).ok_or_else(invalid)?;
        let candidates = self
            .class(class)
            .members
            .iter()
            .copied()
            .filter(|member| self.member(*member).name() == path.member)
            .filter(|member| match &path.signature {
                None => true,
                Some(signature) => self
                    .member(*member)
                    .as_method()
                    .map_or(false, |method| method.signature() == *signature),
            })
            .collect::<Vec<_>>();
        match candidates.as_slice() {
            [] => Err(invalid()),
            [member] => Ok(*member),
            _ => {
                let signatures = candidates.iter().filter_map(|member| {
                    self.member(*member).as_method().map(|method| method.signature())
                });
                Err(Located::new(
                    Error::AmbiguousTarget {
                        class: path.class,
                        name: path.member,
                        candidates: ", ".join(signatures).to_string(),
                    },
                    SourceSpan::default(),
                ))
            }
        }
    }
}

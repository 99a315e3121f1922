//! The source range of the name of a declaration, as opposed to its full
//! extent with type, qualifiers, parameters and body.
use crate::*;
use location::{Located, SourceSpan};
use symbols::{Error, LError, MemberId, SymbolTable};
use syntax::{DeclRef, Name, Token, TokenKind, TranslationUnit};

/// Tokens that end the part of a declaration before the declarator's name,
/// when they are not nested in template brackets.
const BOUNDARIES: &[&str] = &["(", "=", "{", "[", ";", ":", ","];

/// Computes the name range of `decl` from the tokens inside its extent.
pub fn name_range(unit: &TranslationUnit, decl: DeclRef<'_>) -> Result<SourceSpan, LError> {
    let no_identifier = || {
        let name = decl.name().map_or("<unnamed>", |name| name.locatee.as_str());
        Located::new(
            Error::NoIdentifierToken { kind: decl.kind(), name: name.to_string() },
            decl.extent(),
        )
    };
    let name = decl.name().ok_or_else(no_identifier)?.locatee;
    let tokens = unit
        .tokens_in(decl.extent())
        .iter()
        .filter(|token| token.kind != TokenKind::Comment)
        .collect::<Vec<_>>();
    let range = if name.is_operator() {
        operator_range(&tokens)
    } else if let Some(class) = name.as_str().strip_prefix('~') {
        destructor_range(&tokens, class)
    } else {
        identifier_range(&tokens, name)
    };
    range.ok_or_else(no_identifier)
}

/// The name ranges of the in-class declaration of `member` and of all its
/// out-of-line definitions, in source order.
pub fn member_name_ranges(
    table: &SymbolTable,
    member: MemberId,
) -> Result<Vec<SourceSpan>, LError> {
    let info = table.member(member);
    let mut ranges = vec![name_range(table.unit(), info.decl_ref())?];
    for definition in &info.definitions {
        ranges.push(name_range(table.unit(), DeclRef::Func(*definition))?);
    }
    ranges.sort();
    Ok(ranges)
}

/// `operator` followed by the tokens spelling the operator, which run up to
/// the opening parenthesis of the parameter list.
fn operator_range(tokens: &[&Token]) -> Option<SourceSpan> {
    let start = tokens.iter().position(|token| token.is("operator"))?;
    let keyword = tokens[start];
    let last = match &tokens[start + 1..] {
        [open, close, ..] if open.is("(") && close.is(")") => Some(*close),
        rest => rest.iter().take_while(|token| !token.is("(")).last().copied(),
    }?;
    Some(keyword.span.cover(&last.span))
}

fn destructor_range(tokens: &[&Token], class: &str) -> Option<SourceSpan> {
    tokens
        .windows(2)
        .find(|pair| pair[0].is("~") && pair[1].kind == TokenKind::Identifier && pair[1].is(class))
        .map(|pair| pair[0].span.cover(&pair[1].span))
}

/// The last identifier spelled like `name` before the first boundary. An
/// identifier followed by `::` qualifies the name and is skipped.
fn identifier_range(tokens: &[&Token], name: Name) -> Option<SourceSpan> {
    let is_name = |index: usize| {
        let token = tokens[index];
        token.kind == TokenKind::Identifier
            && token.is(name.as_str())
            && !tokens.get(index + 1).map_or(false, |next| next.is("::"))
    };
    let mut depth = 0usize;
    let mut found = None;
    for (index, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Punctuation {
            match token.spelling.as_str() {
                "<" => depth += 1,
                ">" => depth = depth.saturating_sub(1),
                ">>" => depth = depth.saturating_sub(2),
                spelling if depth == 0 && BOUNDARIES.contains(&spelling) => break,
                _ => {}
            }
        } else if is_name(index) {
            found = Some(token.span);
        }
    }
    // Declarators such as `int (*callback)(int)` put the name after a boundary.
    found.or_else(|| {
        let index = (0..tokens.len()).find(|index| is_name(*index))?;
        Some(tokens[index].span)
    })
}

//! Finding every reference to one class member.
use crate::*;
use location::SourceSpan;
use log::debug;
use serde::Serialize;
use symbols::{Access, FuncId, LError, MemberId, Referent, SymbolTable};
use syntax::DeclRef;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ReferenceMatch {
    /// The span of the name token doing the referencing.
    pub span: SourceSpan,
    /// The function whose body contains the reference.
    pub function: FuncId,
    pub access: Access,
}

impl ReferenceMatch {
    pub fn describe(&self, table: &SymbolTable) -> String {
        format!("{} in {} ({})", self.span, table.func_name(self.function), self.access)
    }
}

/// Finds all references to the member declared or defined by `target`.
pub fn find_references(
    table: &SymbolTable,
    target: DeclRef<'_>,
) -> Result<Vec<ReferenceMatch>, LError> {
    let member = table.member_of(target)?;
    Ok(find_member_references(table, member))
}

/// Finds all references to `target` in all function bodies, in source order.
pub fn find_member_references(table: &SymbolTable, target: MemberId) -> Vec<ReferenceMatch> {
    let referent = Referent::Member(target);
    let mut matches = table
        .func_ids()
        .flat_map(|func| {
            table
                .resolve(func)
                .occurrences_of(referent)
                .map(|occurrence| ReferenceMatch {
                    span: occurrence.span,
                    function: func,
                    access: occurrence.access,
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    matches.sort_by_key(|reference| reference.span.start);
    debug!("{} references to {}", matches.len(), table.member_name(target));
    matches
}

//! Ranges to highlight in an editor, each computed over the whole translation
//! unit.
use crate::*;
use identifier::{member_name_ranges, name_range};
use location::SourceSpan;
use log::trace;
use serde::Serialize;
use symbols::{Access, FuncId, LError, MemberId, Occurrence, Referent, SymbolTable};
use syntax::{DeclRef, FuncDecl, Type};

#[derive(Debug, Default, Serialize)]
pub struct Highlights {
    pub virtual_method_declarations: Vec<SourceSpan>,
    pub static_method_declarations: Vec<SourceSpan>,
    pub virtual_method_calls: Vec<SourceSpan>,
    pub implicit_member_references: Vec<SourceSpan>,
    pub omitted_default_arguments: Vec<SourceSpan>,
    pub non_const_reference_arguments: Vec<SourceSpan>,
    pub reference_variable_uses: Vec<SourceSpan>,
}

/// A name within a selection whose declaration lies outside of it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct OutsideReference {
    /// The name at the declaration.
    pub declaration: SourceSpan,
    pub reference: SourceSpan,
}

pub fn highlights(table: &SymbolTable) -> Result<Highlights, LError> {
    Ok(Highlights {
        virtual_method_declarations: virtual_method_declarations(table)?,
        static_method_declarations: static_method_declarations(table)?,
        virtual_method_calls: virtual_method_calls(table),
        implicit_member_references: implicit_member_references(table),
        omitted_default_arguments: omitted_default_arguments(table),
        non_const_reference_arguments: non_const_reference_arguments(table),
        reference_variable_uses: reference_variable_uses(table),
    })
}

/// The names of virtual methods, both at their declaration and at their
/// out-of-line definitions.
pub fn virtual_method_declarations(table: &SymbolTable) -> Result<Vec<SourceSpan>, LError> {
    method_names(table, |method| method.is_virtual)
}

/// The names of static methods, both at their declaration and at their
/// out-of-line definitions.
pub fn static_method_declarations(table: &SymbolTable) -> Result<Vec<SourceSpan>, LError> {
    method_names(table, |method| method.is_static)
}

/// Whole call expressions calling a virtual method.
pub fn virtual_method_calls(table: &SymbolTable) -> Vec<SourceSpan> {
    sorted(member_occurrences(table).filter_map(|(member, occurrence)| {
        let call = occurrence.call?;
        if table.member(member).is_virtual() {
            Some(call.span)
        } else {
            None
        }
    }))
}

/// Names of members reached through the implicit `this`.
pub fn implicit_member_references(table: &SymbolTable) -> Vec<SourceSpan> {
    sorted(
        member_occurrences(table)
            .filter(|(_, occurrence)| occurrence.access == Access::Implicit)
            .map(|(_, occurrence)| occurrence.span),
    )
}

/// Whole call expressions relying on at least one default argument.
pub fn omitted_default_arguments(table: &SymbolTable) -> Vec<SourceSpan> {
    sorted(member_occurrences(table).filter_map(|(member, occurrence)| {
        let method = table.member(member).as_method()?;
        let call = occurrence.call?;
        if call.args.len() < method.params.len() {
            Some(call.span)
        } else {
            None
        }
    }))
}

/// Arguments bound to a parameter of non-`const` reference type, which lets
/// the callee modify them.
pub fn non_const_reference_arguments(table: &SymbolTable) -> Vec<SourceSpan> {
    sorted(
        member_occurrences(table)
            .filter_map(|(member, occurrence)| {
                let method = table.member(member).as_method()?;
                let call = occurrence.call?;
                if call.args.len() > method.params.len() {
                    trace!("call at {} passes more arguments than declared", call.span);
                }
                let spans = method
                    .params
                    .iter()
                    .zip(&call.args)
                    .filter(|(param, _)| param.typ.is_non_const_reference())
                    .map(|(_, arg)| arg.span)
                    .collect::<Vec<_>>();
                Some(spans)
            })
            .flatten(),
    )
}

/// Uses of fields, parameters and local variables declared with an lvalue
/// reference type.
pub fn reference_variable_uses(table: &SymbolTable) -> Vec<SourceSpan> {
    sorted(all_occurrences(table).filter_map(|(func, occurrence)| {
        let typ = declared_type(referent_decl(table, func, occurrence.referent)?)?;
        if typ.is_lvalue_reference() {
            Some(occurrence.span)
        } else {
            None
        }
    }))
}

/// The names used within `selection` that are declared outside of it, each
/// paired with the name at its declaration.
pub fn references_outside_of_selection(
    table: &SymbolTable,
    selection: SourceSpan,
) -> Result<Vec<OutsideReference>, LError> {
    let mut references = Vec::new();
    for func in table.func_ids() {
        if !table.func(func).decl.extent.intersects(&selection) {
            continue;
        }
        for occurrence in table.resolve(func).occurrences {
            if !occurrence.span.intersects(&selection) {
                continue;
            }
            let decl = match referent_decl(table, func, occurrence.referent) {
                Some(decl) if !decl.extent().intersects(&selection) => decl,
                _ => continue,
            };
            references.push(OutsideReference {
                declaration: name_range(table.unit(), decl)?,
                reference: occurrence.span,
            });
        }
    }
    references.sort_by_key(|reference| (reference.reference, reference.declaration));
    references.dedup();
    Ok(references)
}

/// The declaration a name in the body of `func` refers to.
fn referent_decl<'a>(
    table: &SymbolTable<'a>,
    func: FuncId,
    referent: Referent,
) -> Option<DeclRef<'a>> {
    match referent {
        Referent::Member(member) => Some(table.member(member).decl_ref()),
        Referent::Param(owner, index) => {
            table.func(owner).decl.params.get(index as usize).map(DeclRef::Param)
        }
        Referent::Local(span) => {
            table.func(func).decl.locals().find(|local| local.name.span == span).map(DeclRef::Local)
        }
    }
}

fn declared_type(decl: DeclRef<'_>) -> Option<&Type> {
    match decl {
        DeclRef::Field(field) => Some(&field.typ),
        DeclRef::Param(param) => Some(&param.typ),
        DeclRef::Local(local) => Some(&local.typ),
        DeclRef::Class(_) | DeclRef::Func(_) => None,
    }
}

fn method_names<F>(table: &SymbolTable, predicate: F) -> Result<Vec<SourceSpan>, LError>
where
    F: Fn(&FuncDecl) -> bool,
{
    let mut ranges = Vec::new();
    for member in table.member_ids() {
        if table.member(member).as_method().map_or(false, &predicate) {
            ranges.extend(member_name_ranges(table, member)?);
        }
    }
    Ok(sorted(ranges))
}

/// All resolved name occurrences in all function bodies.
fn all_occurrences<'t, 'a>(
    table: &'t SymbolTable<'a>,
) -> impl Iterator<Item = (FuncId, Occurrence<'a>)> + 't {
    table.func_ids().flat_map(move |func| {
        let occurrences = table.resolve(func).occurrences;
        occurrences.into_iter().map(move |occurrence| (func, occurrence))
    })
}

fn member_occurrences<'t, 'a>(
    table: &'t SymbolTable<'a>,
) -> impl Iterator<Item = (MemberId, Occurrence<'a>)> + 't {
    all_occurrences(table).filter_map(|(_, occurrence)| match occurrence.referent {
        Referent::Member(member) => Some((member, occurrence)),
        Referent::Param(..) | Referent::Local(_) => None,
    })
}

fn sorted<I: IntoIterator<Item = SourceSpan>>(spans: I) -> Vec<SourceSpan> {
    let mut spans = spans.into_iter().collect::<Vec<_>>();
    spans.sort();
    spans.dedup();
    spans
}

//! Classes, their members and the function bodies of a translation unit, and
//! the scope rules that map names in those bodies to declarations.
use crate::*;
use location::{Located, SourceSpan};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ptr;
use syntax::*;

mod error;
mod resolve;

pub use error::{Error, LError, Unresolved};
pub use resolve::{Access, CallSite, Occurrence, Referent, Resolution, Scope};

macro_rules! index_type {
    ($type_name:ident) => {
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
        pub struct $type_name(u32);

        impl $type_name {
            pub fn index(self) -> usize {
                self.0 as usize
            }

            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

index_type!(ClassId);
index_type!(MemberId);
index_type!(FuncId);

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Options {
    /// Translation units with more syntax nodes than this are rejected.
    pub max_nodes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { max_nodes: 1_000_000 }
    }
}

#[derive(Debug)]
pub struct ClassInfo<'a> {
    pub decl: &'a ClassDecl,
    pub bases: Vec<ClassId>,
    /// The members declared in the class body itself, in declaration order.
    pub members: Vec<MemberId>,
}

#[derive(Clone, Copy, Debug)]
pub enum MemberKind<'a> {
    Field(&'a FieldDecl),
    Method(&'a FuncDecl),
}

#[derive(Debug)]
pub struct MemberInfo<'a> {
    pub class: ClassId,
    pub kind: MemberKind<'a>,
    /// Out-of-line definitions of a method.
    pub definitions: Vec<&'a FuncDecl>,
}

/// A function with a body.
#[derive(Debug)]
pub struct FuncInfo<'a> {
    pub decl: &'a FuncDecl,
    pub class: Option<ClassId>,
    pub member: Option<MemberId>,
}

pub struct SymbolTable<'a> {
    unit: &'a TranslationUnit,
    classes: Vec<ClassInfo<'a>>,
    class_ids: HashMap<Name, ClassId>,
    members: Vec<MemberInfo<'a>>,
    funcs: Vec<FuncInfo<'a>>,
}

assert_impl_all!(SymbolTable<'static>: Send, Sync);

impl<'a> MemberInfo<'a> {
    pub fn name(&self) -> Name {
        self.name_decl().locatee
    }

    pub fn name_decl(&self) -> &'a LName {
        match self.kind {
            MemberKind::Field(field) => &field.name,
            MemberKind::Method(method) => &method.name,
        }
    }

    pub fn decl_ref(&self) -> DeclRef<'a> {
        match self.kind {
            MemberKind::Field(field) => DeclRef::Field(field),
            MemberKind::Method(method) => DeclRef::Func(method),
        }
    }

    pub fn as_method(&self) -> Option<&'a FuncDecl> {
        match self.kind {
            MemberKind::Field(_) => None,
            MemberKind::Method(method) => Some(method),
        }
    }

    pub fn is_static(&self) -> bool {
        match self.kind {
            MemberKind::Field(field) => field.is_static,
            MemberKind::Method(method) => method.is_static,
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.as_method().map_or(false, |method| method.is_virtual)
    }

    /// The type of an expression naming this member. A method only has one
    /// when it gets called.
    pub fn typ(&self, called: bool) -> Option<Type> {
        match self.kind {
            MemberKind::Field(field) if !called => Some(field.typ.clone()),
            MemberKind::Field(_) => None,
            MemberKind::Method(method) if called => method.return_type.clone(),
            MemberKind::Method(_) => None,
        }
    }
}

impl<'a> SymbolTable<'a> {
    pub fn build(unit: &'a TranslationUnit) -> Result<Self, LError> {
        Self::build_with(unit, &Options::default())
    }

    pub fn build_with(unit: &'a TranslationUnit, options: &Options) -> Result<Self, LError> {
        let nodes = unit.node_count();
        if nodes > options.max_nodes {
            return Err(Located::new(
                Error::UnitTooLarge { nodes, limit: options.max_nodes },
                SourceSpan::default(),
            ));
        }
        let mut table = Self {
            unit,
            classes: Vec::new(),
            class_ids: HashMap::new(),
            members: Vec::new(),
            funcs: Vec::new(),
        };
        table.collect_classes()?;
        table.link_bases()?;
        table.check_acyclic()?;
        table.collect_funcs()?;
        debug!(
            "{}: {} classes, {} members, {} function bodies",
            unit.file,
            table.classes.len(),
            table.members.len(),
            table.funcs.len()
        );
        Ok(table)
    }

    fn collect_classes(&mut self) -> Result<(), LError> {
        let unit = self.unit;
        for decl in unit.classes() {
            let name = &decl.name;
            if let Some(original) = self.class_ids.get(&name.locatee) {
                return Err(Located::new(
                    Error::DuplicateClass {
                        class: name.locatee,
                        original: self.classes[original.index()].decl.name.span,
                    },
                    name.span,
                ));
            }
            let class = ClassId::from_index(self.classes.len());
            self.class_ids.insert(name.locatee, class);
            let mut members = Vec::with_capacity(decl.members.len());
            for member in &decl.members {
                let kind = match member {
                    MemberDecl::Field(field) => MemberKind::Field(field),
                    MemberDecl::Method(method) => MemberKind::Method(method),
                };
                members.push(MemberId::from_index(self.members.len()));
                self.members.push(MemberInfo { class, kind, definitions: Vec::new() });
            }
            self.classes.push(ClassInfo { decl, bases: Vec::new(), members });
        }
        Ok(())
    }

    fn link_bases(&mut self) -> Result<(), LError> {
        for info in 0..self.classes.len() {
            let decl = self.classes[info].decl;
            let bases = decl
                .bases
                .iter()
                .map(|base| {
                    self.class_ids.get(&base.locatee).copied().ok_or_else(|| {
                        Located::new(
                            Error::UnknownBaseClass { class: decl.name.locatee, base: base.locatee },
                            base.span,
                        )
                    })
                })
                .collect::<Result<_, _>>()?;
            self.classes[info].bases = bases;
        }
        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), LError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.classes.len()];
        for root in self.class_ids() {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }
            marks[root.index()] = Mark::Active;
            // Classes on the current inheritance path with the index of the
            // next base to visit.
            let mut path = vec![(root, 0)];
            while let Some(&(class, next)) = path.last() {
                match self.class(class).bases.get(next) {
                    Some(&base) => {
                        let top = path.len() - 1;
                        path[top].1 += 1;
                        match marks[base.index()] {
                            Mark::Done => {}
                            Mark::Active => {
                                let name = &self.class(base).decl.name;
                                return Err(Located::new(
                                    Error::CyclicInheritance(name.locatee),
                                    name.span,
                                ));
                            }
                            Mark::Unvisited => {
                                marks[base.index()] = Mark::Active;
                                path.push((base, 0));
                            }
                        }
                    }
                    None => {
                        marks[class.index()] = Mark::Done;
                        path.pop();
                    }
                }
            }
        }
        Ok(())
    }

    /// Registers all function bodies in source order and links out-of-line
    /// definitions to the methods they define.
    fn collect_funcs(&mut self) -> Result<(), LError> {
        let unit = self.unit;
        for decl in &unit.decls {
            match decl {
                Decl::Class(class_decl) => {
                    let class = self.class_ids[&class_decl.name.locatee];
                    for index in 0..self.class(class).members.len() {
                        let member = self.class(class).members[index];
                        if let Some(method) = self.member(member).as_method() {
                            if method.body.is_some() {
                                self.funcs.push(FuncInfo {
                                    decl: method,
                                    class: Some(class),
                                    member: Some(member),
                                });
                            }
                        }
                    }
                }
                Decl::Func(func) => {
                    let (class, member) = match &func.qualifier {
                        None => (None, None),
                        Some(qualifier) => {
                            let (class, member) = self.link_definition(qualifier, func)?;
                            (Some(class), Some(member))
                        }
                    };
                    if func.body.is_some() {
                        self.funcs.push(FuncInfo { decl: func, class, member });
                    }
                }
            }
        }
        Ok(())
    }

    fn link_definition(
        &mut self,
        qualifier: &LName,
        func: &'a FuncDecl,
    ) -> Result<(ClassId, MemberId), LError> {
        let class = self.class_named(qualifier.locatee).ok_or_else(|| {
            Located::new(Error::UnknownQualifier(qualifier.locatee), qualifier.span)
        })?;
        let signature = func.signature();
        let member = self
            .class(class)
            .members
            .iter()
            .copied()
            .find(|member| {
                self.member(*member).as_method().map_or(false, |method| {
                    method.name.locatee == func.name.locatee && method.signature() == signature
                })
            })
            .ok_or_else(|| {
                Located::new(
                    Error::UnmatchedDefinition {
                        class: qualifier.locatee,
                        name: func.name.locatee,
                        signature,
                    },
                    func.name.span,
                )
            })?;
        self.members[member.index()].definitions.push(func);
        Ok((class, member))
    }

    pub fn unit(&self) -> &'a TranslationUnit {
        self.unit
    }

    pub fn class(&self, class: ClassId) -> &ClassInfo<'a> {
        &self.classes[class.index()]
    }

    pub fn member(&self, member: MemberId) -> &MemberInfo<'a> {
        &self.members[member.index()]
    }

    pub fn func(&self, func: FuncId) -> &FuncInfo<'a> {
        &self.funcs[func.index()]
    }

    pub fn class_named(&self, name: Name) -> Option<ClassId> {
        self.class_ids.get(&name).copied()
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(ClassId::from_index)
    }

    pub fn member_ids(&self) -> impl Iterator<Item = MemberId> {
        (0..self.members.len()).map(MemberId::from_index)
    }

    pub fn func_ids(&self) -> impl Iterator<Item = FuncId> {
        (0..self.funcs.len()).map(FuncId::from_index)
    }

    /// `Class::member`.
    pub fn member_name(&self, member: MemberId) -> String {
        let info = self.member(member);
        format!("{}::{}", self.class(info.class).decl.name.locatee, info.name())
    }

    /// `Class::method` for methods, the plain name for free functions.
    pub fn func_name(&self, func: FuncId) -> String {
        let info = self.func(func);
        match info.class {
            Some(class) => {
                format!("{}::{}", self.class(class).decl.name.locatee, info.decl.name.locatee)
            }
            None => info.decl.name.locatee.to_string(),
        }
    }

    /// The member a declaration declares or defines.
    pub fn member_of(&self, decl: DeclRef<'_>) -> Result<MemberId, LError> {
        let found = match decl {
            DeclRef::Field(field) => self.member_ids().find(|member| {
                matches!(self.member(*member).kind, MemberKind::Field(other) if ptr::eq(other, field))
            }),
            DeclRef::Func(func) => self.member_ids().find(|member| {
                let info = self.member(*member);
                matches!(info.kind, MemberKind::Method(other) if ptr::eq(other, func))
                    || info.definitions.iter().any(|other| ptr::eq(*other, func))
            }),
            DeclRef::Class(_) | DeclRef::Param(_) | DeclRef::Local(_) => None,
        };
        found.ok_or_else(|| {
            let name = decl.name().map_or("<unnamed>", |name| name.locatee.as_str());
            Located::new(Error::InvalidTarget(name.to_string()), decl.extent())
        })
    }

    /// Every class reachable from `class` through base lists, each one once,
    /// with bases before the classes deriving from them. The bases of a class
    /// are only visited when `expand` holds for it.
    fn bases_post_order(&self, class: ClassId, expand: impl Fn(ClassId) -> bool) -> Vec<ClassId> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(class);
        let mut stack = vec![(class, 0)];
        while let Some(&(current, next)) = stack.last() {
            match self.class(current).bases.get(next) {
                Some(&base) if expand(current) => {
                    let top = stack.len() - 1;
                    stack[top].1 += 1;
                    if visited.insert(base) {
                        stack.push((base, 0));
                    }
                }
                _ => {
                    order.push(current);
                    stack.pop();
                }
            }
        }
        order
    }

    fn own_members(&self, class: ClassId, name: Name) -> Vec<MemberId> {
        self.class(class)
            .members
            .iter()
            .copied()
            .filter(|member| self.member(*member).name() == name)
            .collect()
    }

    /// The members named `name` visible in `class`. Members declared in the
    /// class itself hide those of its bases. Finding the name in several
    /// bases is ambiguous unless they all lead to the same members.
    pub fn lookup_member(&self, class: ClassId, name: Name) -> Result<Vec<MemberId>, Unresolved> {
        let order =
            self.bases_post_order(class, |current| self.own_members(current, name).is_empty());
        let mut results: HashMap<ClassId, Result<Vec<MemberId>, Unresolved>> = HashMap::new();
        for current in order {
            let result = self.lookup_in_bases(current, name, &results);
            results.insert(current, result);
        }
        let class_name = self.class(class).decl.name.locatee;
        results.remove(&class).unwrap_or(Err(Unresolved::NoSuchMember { class: class_name, name }))
    }

    /// One step of `lookup_member`, given the lookup results of all bases of
    /// `class`.
    fn lookup_in_bases(
        &self,
        class: ClassId,
        name: Name,
        results: &HashMap<ClassId, Result<Vec<MemberId>, Unresolved>>,
    ) -> Result<Vec<MemberId>, Unresolved> {
        let own = self.own_members(class, name);
        if !own.is_empty() {
            return Ok(own);
        }
        let class_name = self.class(class).decl.name.locatee;
        let mut found: Option<&Vec<MemberId>> = None;
        for base in &self.class(class).bases {
            match results.get(base) {
                Some(Ok(members)) => match found {
                    None => found = Some(members),
                    Some(previous) if previous == members => {}
                    Some(_) => return Err(Unresolved::AmbiguousBase { class: class_name, name }),
                },
                Some(Err(Unresolved::NoSuchMember { .. })) | None => {}
                Some(Err(error)) => return Err(error.clone()),
            }
        }
        found.cloned().ok_or(Unresolved::NoSuchMember { class: class_name, name })
    }

    /// All members visible in `class`: its own ones followed by the inherited
    /// ones it does not hide.
    pub fn effective_members(&self, class: ClassId) -> Vec<MemberId> {
        let mut sets: HashMap<ClassId, Vec<MemberId>> = HashMap::new();
        for current in self.bases_post_order(class, |_| true) {
            let own = &self.class(current).members;
            let own_names =
                own.iter().map(|member| self.member(*member).name()).collect::<HashSet<_>>();
            let mut seen = own.iter().copied().collect::<HashSet<_>>();
            let mut result = own.clone();
            for base in &self.class(current).bases {
                for member in sets.get(base).into_iter().flatten() {
                    if !own_names.contains(&self.member(*member).name()) && seen.insert(*member) {
                        result.push(*member);
                    }
                }
            }
            sets.insert(current, result);
        }
        sets.remove(&class).unwrap_or_default()
    }

    /// Whether `class` is `base` or derives from it.
    pub fn derives_from(&self, class: ClassId, base: ClassId) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![class];
        while let Some(current) = pending.pop() {
            if current == base {
                return true;
            }
            if visited.insert(current) {
                pending.extend(self.class(current).bases.iter().copied());
            }
        }
        false
    }
}

use super::*;
use log::trace;
use std::fmt;
use std::slice;

/// What a name in a function body refers to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Referent {
    Member(MemberId),
    /// The parameter with the given index.
    Param(FuncId, u32),
    /// The local variable whose name is declared at the given span.
    Local(SourceSpan),
}

/// The syntactic form through which a name is reached.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// A bare name. For members this means going through an implicit `this`.
    Implicit,
    /// `this->name`.
    This,
    /// `object.name`.
    Object,
    /// `pointer->name`.
    Pointer,
    /// `Class::name`.
    Qualified,
    /// An overloaded operator applied to an object.
    Operator,
}

#[derive(Clone, Debug)]
pub struct CallSite<'a> {
    /// The whole call expression.
    pub span: SourceSpan,
    pub args: Vec<&'a LExpr>,
}

#[derive(Clone, Debug)]
pub struct Occurrence<'a> {
    pub span: SourceSpan,
    pub referent: Referent,
    pub access: Access,
    /// Set when the occurrence is the callee of a call.
    pub call: Option<CallSite<'a>>,
}

/// Every name occurrence in one function body, in source order.
#[derive(Debug)]
pub struct Resolution<'a> {
    pub func: FuncId,
    pub occurrences: Vec<Occurrence<'a>>,
    pub unresolved: Vec<Located<Unresolved>>,
}

#[derive(Clone, Copy)]
struct Binding<'a> {
    referent: Referent,
    typ: &'a Type,
}

/// The names visible at some point of a function body.
#[derive(Clone)]
pub struct Scope<'a> {
    func: FuncId,
    class: Option<ClassId>,
    is_const: bool,
    is_static: bool,
    bindings: im::HashMap<Name, Binding<'a>>,
}

struct Walker<'t, 'a> {
    table: &'t SymbolTable<'a>,
    occurrences: Vec<Occurrence<'a>>,
    unresolved: Vec<Located<Unresolved>>,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Implicit => "implicit",
            Self::This => "this",
            Self::Object => "object",
            Self::Pointer => "pointer",
            Self::Qualified => "qualified",
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'a> Resolution<'a> {
    pub fn occurrences_of(&self, referent: Referent) -> impl Iterator<Item = &Occurrence<'a>> {
        self.occurrences.iter().filter(move |occurrence| occurrence.referent == referent)
    }
}

impl<'a> Scope<'a> {
    pub fn func(&self) -> FuncId {
        self.func
    }

    pub fn class(&self) -> Option<ClassId> {
        self.class
    }

    fn bind(&mut self, name: Name, referent: Referent, typ: &'a Type) {
        self.bindings.insert(name, Binding { referent, typ });
    }

    /// The type of a parameter or local variable.
    fn lookup(&self, name: Name) -> Option<Type> {
        self.bindings.get(&name).map(|binding| binding.typ.clone())
    }

    fn this_type(&self, table: &SymbolTable<'a>) -> Option<Type> {
        if self.is_static {
            return None;
        }
        let class = Type::Named(table.class(self.class?).decl.name.locatee);
        let object = if self.is_const { class.as_const() } else { class };
        Some(object.pointer_to())
    }
}

/// The type of the object a member is accessed on with `op`.
fn object_type(typ: &Type, op: AccessOp) -> Result<&Type, Unresolved> {
    let typ = typ.strip_refs();
    match (op, typ.pointee()) {
        (AccessOp::Arrow, Some(pointee)) => Ok(pointee.strip_refs()),
        (AccessOp::Dot, None) => Ok(typ),
        (op, _) => Err(Unresolved::AccessMismatch { op: op.spelling(), typ: typ.clone() }),
    }
}

impl<'a> SymbolTable<'a> {
    /// The scope at the start of the body of `func`, with all its named
    /// parameters bound.
    pub fn scope(&self, func: FuncId) -> Scope<'a> {
        let decl = self.func(func).decl;
        let bindings = decl
            .params
            .iter()
            .enumerate()
            .filter_map(|(index, param)| {
                let name = param.name.as_ref()?;
                let referent = Referent::Param(func, index as u32);
                Some((name.locatee, Binding { referent, typ: &param.typ }))
            })
            .collect();
        Scope {
            func,
            class: self.func(func).class,
            is_const: decl.is_const,
            is_static: decl.is_static,
            bindings,
        }
    }

    pub fn class_of(&self, typ: &Type) -> Result<ClassId, Unresolved> {
        typ.name()
            .and_then(|name| self.class_named(name))
            .ok_or_else(|| Unresolved::NotAClass(typ.clone()))
    }

    /// Resolves a name written without qualification. Parameters and local
    /// variables hide members of the enclosing class.
    pub fn resolve_bare_identifier(
        &self,
        name: Name,
        scope: &Scope<'a>,
        arg_types: Option<&[Option<Type>]>,
    ) -> Result<Referent, Unresolved> {
        if let Some(binding) = scope.bindings.get(&name) {
            return Ok(binding.referent);
        }
        let class = scope.class.ok_or(Unresolved::UnknownName(name))?;
        let candidates = self.lookup_member(class, name).map_err(|error| match error {
            Unresolved::NoSuchMember { .. } => Unresolved::UnknownName(name),
            error => error,
        })?;
        self.select_overload(name, &candidates, arg_types, scope.is_const).map(Referent::Member)
    }

    /// Resolves `object.name` or `pointer->name`, where the object expression
    /// has type `typ`.
    pub fn resolve_member_access(
        &self,
        typ: &Type,
        op: AccessOp,
        name: Name,
        arg_types: Option<&[Option<Type>]>,
    ) -> Result<MemberId, Unresolved> {
        let object = object_type(typ, op)?;
        let class = self.class_of(object)?;
        let candidates = self.lookup_member(class, name)?;
        self.select_overload(name, &candidates, arg_types, object.is_const())
    }

    /// Resolves `Class::name`. Inside a method of `Class` or of a class
    /// derived from it, the implicit object is `this`.
    pub fn resolve_scoped(
        &self,
        class: Name,
        name: Name,
        scope: &Scope<'a>,
        arg_types: Option<&[Option<Type>]>,
    ) -> Result<MemberId, Unresolved> {
        let class = self.class_named(class).ok_or(Unresolved::NotAClass(Type::Named(class)))?;
        let candidates = self.lookup_member(class, name)?;
        let is_const =
            scope.is_const && scope.class.map_or(false, |own| self.derives_from(own, class));
        self.select_overload(name, &candidates, arg_types, is_const)
    }

    /// Picks one of the members a name lookup found. A single candidate is
    /// taken as is. Overloads need the argument types of a call: among those
    /// accepting the number of arguments and the constness of the object, the
    /// one with most exactly matching argument types wins, and ties go to the
    /// one whose constness matches the object.
    pub fn select_overload(
        &self,
        name: Name,
        candidates: &[MemberId],
        arg_types: Option<&[Option<Type>]>,
        object_const: bool,
    ) -> Result<MemberId, Unresolved> {
        if let [member] = candidates {
            return Ok(*member);
        }
        let args = arg_types.ok_or(Unresolved::AmbiguousOverload { name })?;
        let viable = candidates
            .iter()
            .filter_map(|member| {
                let method = self.member(*member).as_method()?;
                let callable = method.accepts_arity(args.len())
                    && (!object_const || method.is_const || method.is_static);
                if !callable {
                    return None;
                }
                let exact = args
                    .iter()
                    .zip(&method.params)
                    .filter(|(arg, param)| {
                        arg.as_ref().map_or(false, |arg| arg.decay() == param.typ.decay())
                    })
                    .count();
                Some((*member, (exact, method.is_const == object_const)))
            })
            .collect::<Vec<_>>();
        let best = viable
            .iter()
            .map(|(_, rank)| *rank)
            .max()
            .ok_or(Unresolved::NoViableOverload { name })?;
        let mut winners =
            viable.iter().filter(|(_, rank)| *rank == best).map(|(member, _)| *member);
        match (winners.next(), winners.next()) {
            (Some(member), None) => Ok(member),
            _ => Err(Unresolved::AmbiguousOverload { name }),
        }
    }

    /// Resolves every name occurrence in the body of `func`.
    pub fn resolve(&self, func: FuncId) -> Resolution<'a> {
        let decl = self.func(func).decl;
        let mut walker = Walker { table: self, occurrences: Vec::new(), unresolved: Vec::new() };
        if let Some(body) = &decl.body {
            walker.stmts(body, &self.scope(func));
        }
        let Walker { mut occurrences, mut unresolved, .. } = walker;
        occurrences.sort_by_key(|occurrence| occurrence.span.start);
        unresolved.sort_by_key(|unresolved| unresolved.span.start);
        trace!(
            "{}: {} occurrences, {} unresolved",
            self.func_name(func),
            occurrences.len(),
            unresolved.len()
        );
        Resolution { func, occurrences, unresolved }
    }
}

impl<'t, 'a> Walker<'t, 'a> {
    fn stmts(&mut self, stmts: &'a [Stmt], scope: &Scope<'a>) {
        let scope = &mut scope.clone();
        for stmt in stmts {
            self.stmt(stmt, scope);
        }
    }

    fn stmt(&mut self, stmt: &'a Stmt, scope: &mut Scope<'a>) {
        match stmt {
            Stmt::Local(local) => {
                // The variable is in scope within its own initializer.
                scope.bind(local.name.locatee, Referent::Local(local.name.span), &local.typ);
                if let Some(init) = &local.init {
                    self.expr(init, scope);
                }
            }
            Stmt::Expr(expr) => {
                self.expr(expr, scope);
            }
            Stmt::Return(opt_expr) => {
                if let Some(expr) = opt_expr {
                    self.expr(expr, scope);
                }
            }
            Stmt::Block(stmts) => self.stmts(stmts, scope),
            Stmt::If(cond, then, elze) => {
                self.expr(cond, scope);
                self.stmts(slice::from_ref(then.as_ref()), scope);
                if let Some(elze) = elze {
                    self.stmts(slice::from_ref(elze.as_ref()), scope);
                }
            }
            Stmt::While(cond, body) => {
                self.expr(cond, scope);
                self.stmts(slice::from_ref(body.as_ref()), scope);
            }
        }
    }

    /// Resolves the names in `expr` and returns its type, if it is known.
    fn expr(&mut self, expr: &'a LExpr, scope: &Scope<'a>) -> Option<Type> {
        match &expr.locatee {
            Expr::Ident(name) => self.ident(name, None, None, scope),
            Expr::ParamRef(name) => self.bound(name, true, scope),
            Expr::LocalRef(name) => self.bound(name, false, scope),
            Expr::This => {
                let typ = scope.this_type(self.table);
                if typ.is_none() {
                    self.fail(expr.span, Unresolved::NoEnclosingClass);
                }
                typ
            }
            Expr::Member(base, op, member) => {
                let base_type = self.expr(base, scope);
                self.member_access(base, base_type, *op, member, None, None)
            }
            Expr::Scoped(class, member) => self.scoped(class, member, None, None, scope),
            Expr::Call(callee, args) => self.call(expr.span, callee, args, scope),
            Expr::Unary(op, operand) => {
                let typ = self.expr(operand, scope)?;
                if let Some(result) = self.operator(expr.span, op, &typ, vec![], &[]) {
                    return result;
                }
                match op.locatee.as_str() {
                    "*" => typ.pointee().cloned(),
                    "&" => Some(typ.strip_refs().clone().pointer_to()),
                    "!" => Some(Type::named("bool")),
                    _ => Some(typ.decay().clone()),
                }
            }
            Expr::Binary(lhs, op, rhs) => {
                let lhs_type = self.expr(lhs, scope);
                let rhs_type = self.expr(rhs, scope);
                if let Some(typ) = &lhs_type {
                    let arg_types = [rhs_type.clone()];
                    if let Some(result) =
                        self.operator(expr.span, op, typ, vec![rhs.as_ref()], &arg_types)
                    {
                        return result;
                    }
                }
                builtin_binary_type(op.locatee.as_str(), lhs_type, rhs_type)
            }
            Expr::Literal(typ) => Some(typ.clone()),
        }
    }

    fn call(
        &mut self,
        span: SourceSpan,
        callee: &'a LExpr,
        args: &'a [LExpr],
        scope: &Scope<'a>,
    ) -> Option<Type> {
        let site = CallSite { span, args: args.iter().collect() };
        match &callee.locatee {
            Expr::Ident(name) => {
                let arg_types = self.args(args, scope);
                self.ident(name, Some(site), Some(&arg_types), scope)
            }
            Expr::Member(base, op, member) => {
                let base_type = self.expr(base, scope);
                let arg_types = self.args(args, scope);
                self.member_access(base, base_type, *op, member, Some(site), Some(&arg_types))
            }
            Expr::Scoped(class, member) => {
                let arg_types = self.args(args, scope);
                self.scoped(class, member, Some(site), Some(&arg_types), scope)
            }
            _ => {
                self.expr(callee, scope);
                self.args(args, scope);
                None
            }
        }
    }

    fn args(&mut self, args: &'a [LExpr], scope: &Scope<'a>) -> Vec<Option<Type>> {
        args.iter().map(|arg| self.expr(arg, scope)).collect()
    }

    fn ident(
        &mut self,
        name: &'a LName,
        site: Option<CallSite<'a>>,
        arg_types: Option<&[Option<Type>]>,
        scope: &Scope<'a>,
    ) -> Option<Type> {
        match self.table.resolve_bare_identifier(name.locatee, scope, arg_types) {
            Ok(referent) => {
                let typ = match referent {
                    Referent::Member(member) => {
                        self.member_type(member, site.is_some(), scope.is_const)
                    }
                    Referent::Param(..) | Referent::Local(_) if site.is_none() => {
                        scope.lookup(name.locatee)
                    }
                    Referent::Param(..) | Referent::Local(_) => None,
                };
                self.record(name.span, referent, Access::Implicit, site);
                typ
            }
            Err(error) => {
                self.fail(name.span, error);
                None
            }
        }
    }

    /// A name the upstream resolver already bound to a parameter or a local
    /// variable.
    fn bound(&mut self, name: &'a LName, param: bool, scope: &Scope<'a>) -> Option<Type> {
        match scope.bindings.get(&name.locatee) {
            Some(binding) if matches!(binding.referent, Referent::Param(..)) == param => {
                let Binding { referent, typ } = *binding;
                self.record(name.span, referent, Access::Implicit, None);
                Some(typ.clone())
            }
            _ => {
                self.fail(name.span, Unresolved::UnboundLocal(name.locatee));
                None
            }
        }
    }

    fn member_access(
        &mut self,
        base: &'a LExpr,
        base_type: Option<Type>,
        op: AccessOp,
        member: &'a LName,
        site: Option<CallSite<'a>>,
        arg_types: Option<&[Option<Type>]>,
    ) -> Option<Type> {
        let access = match (&base.locatee, op) {
            (Expr::This, _) => Access::This,
            (_, AccessOp::Dot) => Access::Object,
            (_, AccessOp::Arrow) => Access::Pointer,
        };
        let table = self.table;
        let resolved = base_type.ok_or(Unresolved::UnknownType).and_then(|typ| {
            let object_const = object_type(&typ, op)?.is_const();
            let id = table.resolve_member_access(&typ, op, member.locatee, arg_types)?;
            Ok((id, object_const))
        });
        match resolved {
            Ok((id, object_const)) => {
                let typ = self.member_type(id, site.is_some(), object_const);
                self.record(member.span, Referent::Member(id), access, site);
                typ
            }
            Err(error) => {
                self.fail(member.span, error);
                None
            }
        }
    }

    fn scoped(
        &mut self,
        class: &'a LName,
        member: &'a LName,
        site: Option<CallSite<'a>>,
        arg_types: Option<&[Option<Type>]>,
        scope: &Scope<'a>,
    ) -> Option<Type> {
        match self.table.resolve_scoped(class.locatee, member.locatee, scope, arg_types) {
            Ok(id) => {
                let typ = self.member_type(id, site.is_some(), scope.is_const);
                self.record(member.span, Referent::Member(id), Access::Qualified, site);
                typ
            }
            Err(error) => {
                self.fail(member.span, error);
                None
            }
        }
    }

    /// Resolves an operator applied to an object of class type to the member
    /// overloading it. Returns `None` when the builtin operator applies, which
    /// includes the case of a member overload taking another number of
    /// operands.
    fn operator(
        &mut self,
        span: SourceSpan,
        op: &'a LName,
        operand: &Type,
        args: Vec<&'a LExpr>,
        arg_types: &[Option<Type>],
    ) -> Option<Option<Type>> {
        let class = self.table.class_of(operand.decay()).ok()?;
        let name = Name::operator(op.locatee);
        let object_const = operand.strip_refs().is_const();
        let table = self.table;
        let resolved = table.lookup_member(class, name).and_then(|candidates| {
            let viable = candidates
                .into_iter()
                .filter(|member| {
                    table
                        .member(*member)
                        .as_method()
                        .map_or(false, |method| method.accepts_arity(arg_types.len()))
                })
                .collect::<Vec<_>>();
            table.select_overload(name, &viable, Some(arg_types), object_const)
        });
        match resolved {
            Ok(member) => {
                let typ = self.table.member(member).typ(true);
                let site = CallSite { span, args };
                self.record(op.span, Referent::Member(member), Access::Operator, Some(site));
                Some(typ)
            }
            // A free operator function or a builtin one.
            Err(Unresolved::NoSuchMember { .. } | Unresolved::NoViableOverload { .. }) => None,
            Err(error) => {
                self.fail(op.span, error);
                Some(None)
            }
        }
    }

    /// Fields of a `const` object are `const` themselves.
    fn member_type(&self, member: MemberId, called: bool, object_const: bool) -> Option<Type> {
        let info = self.table.member(member);
        let typ = info.typ(called)?;
        if object_const && !called && !info.is_static() && !typ.is_reference() {
            Some(typ.as_const())
        } else {
            Some(typ)
        }
    }

    fn record(
        &mut self,
        span: SourceSpan,
        referent: Referent,
        access: Access,
        call: Option<CallSite<'a>>,
    ) {
        self.occurrences.push(Occurrence { span, referent, access, call });
    }

    fn fail(&mut self, span: SourceSpan, reason: Unresolved) {
        trace!("unresolved at {}: {}", span, reason);
        self.unresolved.push(Located::new(reason, span));
    }
}

fn builtin_binary_type(op: &str, lhs: Option<Type>, rhs: Option<Type>) -> Option<Type> {
    match op {
        "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" => Some(Type::named("bool")),
        "," => rhs,
        _ if op.ends_with('=') => lhs,
        _ => match (lhs, rhs) {
            (Some(lhs), _) if lhs.pointee().is_some() => Some(lhs),
            (_, Some(rhs)) if rhs.pointee().is_some() => Some(rhs),
            (lhs, rhs) => lhs.or(rhs).map(|typ| typ.decay().clone()),
        },
    }
}

use super::*;

impl TranslationUnit {
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Class(class) => Some(class),
            Decl::Func(_) => None,
        })
    }

    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Func(func) => Some(func),
            Decl::Class(_) => None,
        })
    }

    /// The number of syntax nodes: declarations, statements and expressions.
    pub fn node_count(&self) -> usize {
        self.decls
            .iter()
            .map(|decl| match decl {
                Decl::Class(class) => {
                    1 + class
                        .members
                        .iter()
                        .map(|member| match member {
                            MemberDecl::Field(_) => 1,
                            MemberDecl::Method(method) => method.node_count(),
                        })
                        .sum::<usize>()
                }
                Decl::Func(func) => func.node_count(),
            })
            .sum()
    }
}

impl FuncDecl {
    /// The local variables declared anywhere in the body, in source order.
    pub fn locals(&self) -> impl Iterator<Item = &LocalDecl> {
        use genawaiter::{rc::gen, yield_};
        gen!({
            let mut pending = self.body.iter().flatten().rev().collect::<Vec<_>>();
            while let Some(stmt) = pending.pop() {
                if let Stmt::Local(local) = stmt {
                    yield_!(local);
                }
                let nested = stmt.stmts().collect::<Vec<_>>();
                pending.extend(nested.into_iter().rev());
            }
        })
        .into_iter()
    }

    fn node_count(&self) -> usize {
        let body = self.body.iter().flatten().map(Stmt::node_count).sum::<usize>();
        1 + self.params.len() + body
    }
}

impl Stmt {
    /// The expressions directly contained in this statement.
    pub fn exprs(&self) -> impl Iterator<Item = &LExpr> {
        use genawaiter::{rc::gen, yield_};
        gen!({
            match self {
                Self::Local(LocalDecl { init, .. }) => {
                    if let Some(init) = init {
                        yield_!(init);
                    }
                }
                Self::Expr(expr) => yield_!(expr),
                Self::Return(opt_expr) => {
                    if let Some(expr) = opt_expr {
                        yield_!(expr);
                    }
                }
                Self::Block(_) => {}
                Self::If(cond, _then, _elze) => yield_!(cond),
                Self::While(cond, _body) => yield_!(cond),
            }
        })
        .into_iter()
    }

    /// The statements directly nested in this statement.
    pub fn stmts(&self) -> impl Iterator<Item = &Stmt> {
        use genawaiter::{rc::gen, yield_};
        gen!({
            match self {
                Self::Local(_) | Self::Expr(_) | Self::Return(_) => {}
                Self::Block(stmts) => {
                    for stmt in stmts {
                        yield_!(stmt);
                    }
                }
                Self::If(_cond, then, elze) => {
                    yield_!(then.as_ref());
                    if let Some(elze) = elze {
                        yield_!(elze.as_ref());
                    }
                }
                Self::While(_cond, body) => yield_!(body.as_ref()),
            }
        })
        .into_iter()
    }

    fn node_count(&self) -> usize {
        1 + self.exprs().map(LExpr::node_count).sum::<usize>()
            + self.stmts().map(Stmt::node_count).sum::<usize>()
    }
}

impl LExpr {
    pub fn children(&self) -> impl Iterator<Item = &LExpr> {
        self.locatee.children()
    }

    fn node_count(&self) -> usize {
        1 + self.children().map(LExpr::node_count).sum::<usize>()
    }
}

impl Expr {
    /// The direct subexpressions, in source order.
    pub fn children(&self) -> impl Iterator<Item = &LExpr> {
        use genawaiter::{rc::gen, yield_};
        gen!({
            match self {
                Self::Ident(_)
                | Self::ParamRef(_)
                | Self::LocalRef(_)
                | Self::This
                | Self::Scoped(_, _)
                | Self::Literal(_) => {}
                Self::Member(base, _op, _member) => yield_!(base.as_ref()),
                Self::Call(callee, args) => {
                    yield_!(callee.as_ref());
                    for arg in args {
                        yield_!(arg);
                    }
                }
                Self::Unary(_op, operand) => yield_!(operand.as_ref()),
                Self::Binary(lhs, _op, rhs) => {
                    yield_!(lhs.as_ref());
                    yield_!(rhs.as_ref());
                }
            }
        })
        .into_iter()
    }
}

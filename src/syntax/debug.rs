use super::*;
use crate::location::{Located, SourceSpan};
use std::fmt;

pub trait Debug {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result;
}

impl<T: Debug> Debug for Located<T> {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        writer.set_next_span(self.span);
        self.locatee.write(writer)
    }
}

impl<T: Debug> Debug for Box<T> {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        self.as_ref().write(writer)
    }
}

impl<T: Debug> Debug for &T {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        (*self).write(writer)
    }
}

pub struct DebugWriter<'a> {
    writer: &'a mut dyn fmt::Write,
    indent_level: usize,
    next_span: Option<SourceSpan>,
}

impl<'a> DebugWriter<'a> {
    const INDENT_SIZE: usize = 4;

    pub fn new(writer: &'a mut dyn fmt::Write) -> Self {
        Self { writer, indent_level: 0, next_span: None }
    }

    pub fn fmt(debug: &dyn Debug, writer: &'a mut dyn fmt::Write) -> fmt::Result {
        debug.write(&mut Self::new(writer))
    }

    pub fn set_next_span(&mut self, span: SourceSpan) {
        self.next_span = Some(span)
    }

    pub fn leaf(&mut self, label: &str) -> fmt::Result {
        match self.next_span.take() {
            None => self.writer.write_str(label),
            Some(span) => write!(self.writer, "{} @ {}", label, span),
        }
    }

    pub fn node<F>(&mut self, label: &str, f: F) -> fmt::Result
    where
        F: Fn(&mut Self) -> fmt::Result,
    {
        self.leaf(label)?;
        self.indent_level += 1;
        f(self)?;
        self.indent_level -= 1;
        Ok(())
    }

    pub fn child<T: Debug>(&mut self, label: &str, item: &T) -> fmt::Result {
        self.writer.write_char('\n')?;
        self.indent()?;
        write!(self.writer, "{}: ", label)?;
        item.write(self)
    }

    pub fn child_if_some<T: Debug>(&mut self, label: &str, opt_item: &Option<T>) -> fmt::Result {
        if let Some(item) = opt_item {
            self.child(label, item)?;
        }
        Ok(())
    }

    pub fn children<T, I>(&mut self, label: &str, items: I) -> fmt::Result
    where
        T: Debug,
        I: IntoIterator<Item = T>,
    {
        for item in items {
            self.child(label, &item)?;
        }
        Ok(())
    }

    /// Writes `label: text` as a child without a span.
    pub fn attr(&mut self, label: &str, text: &dyn fmt::Display) -> fmt::Result {
        self.writer.write_char('\n')?;
        self.indent()?;
        write!(self.writer, "{}: {}", label, text)
    }

    pub fn flag(&mut self, label: &str, set: bool) -> fmt::Result {
        if set {
            self.writer.write_char('\n')?;
            self.indent()?;
            self.writer.write_str(label)?;
        }
        Ok(())
    }

    fn indent(&mut self) -> fmt::Result {
        self.writer.write_str(&" ".repeat(Self::INDENT_SIZE * self.indent_level))
    }
}

#[macro_export]
macro_rules! derive_fmt_debug {
    ($type_name:ident) => {
        impl std::fmt::Debug for $type_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                $crate::syntax::debug::DebugWriter::fmt(self, f)
            }
        }
    };
}

impl Debug for TranslationUnit {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        let Self { file, source: _, decls, tokens: _ } = self;
        writer.node(&format!("UNIT {}", file), |writer| writer.children("decl", decls))
    }
}

impl Debug for Decl {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        match self {
            Self::Class(decl) => decl.write(writer),
            Self::Func(decl) => decl.write(writer),
        }
    }
}

impl Debug for ClassDecl {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        let Self { name, bases, members, extent } = self;
        writer.set_next_span(*extent);
        writer.node("CLASS", |writer| {
            writer.child("name", name)?;
            writer.children("base", bases)?;
            writer.children("member", members)
        })
    }
}

impl Debug for MemberDecl {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        match self {
            Self::Field(decl) => decl.write(writer),
            Self::Method(decl) => decl.write(writer),
        }
    }
}

impl Debug for FieldDecl {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        let Self { name, typ, is_static, extent } = self;
        writer.set_next_span(*extent);
        writer.node("FIELD", |writer| {
            writer.child("name", name)?;
            writer.attr("type", typ)?;
            writer.flag("static", *is_static)
        })
    }
}

impl Debug for FuncDecl {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        let Self {
            qualifier,
            name,
            params,
            return_type,
            is_const,
            is_static,
            is_virtual,
            body,
            extent,
        } = self;
        writer.set_next_span(*extent);
        writer.node("FUNC", |writer| {
            writer.child_if_some("qualifier", qualifier)?;
            writer.child("name", name)?;
            writer.children("param", params)?;
            if let Some(typ) = return_type {
                writer.attr("result", typ)?;
            }
            writer.flag("const", *is_const)?;
            writer.flag("static", *is_static)?;
            writer.flag("virtual", *is_virtual)?;
            if let Some(stmts) = body {
                writer.children("stmt", stmts)?;
            }
            Ok(())
        })
    }
}

impl Debug for Param {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        let Self { name, typ, has_default, extent } = self;
        writer.set_next_span(*extent);
        writer.node("PARAM", |writer| {
            writer.child_if_some("name", name)?;
            writer.attr("type", typ)?;
            writer.flag("default", *has_default)
        })
    }
}

impl Debug for LocalDecl {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        let Self { name, typ, init, extent } = self;
        writer.set_next_span(*extent);
        writer.node("LOCAL", |writer| {
            writer.child("name", name)?;
            writer.attr("type", typ)?;
            writer.child_if_some("init", init)
        })
    }
}

impl Debug for Stmt {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        match self {
            Self::Local(decl) => decl.write(writer),
            Self::Expr(expr) => expr.write(writer),
            Self::Return(opt_expr) => {
                writer.node("RETURN", |writer| writer.child_if_some("value", opt_expr))
            }
            Self::Block(stmts) => writer.node("BLOCK", |writer| writer.children("stmt", stmts)),
            Self::If(cond, then, elze) => writer.node("IF", |writer| {
                writer.child("cond", cond)?;
                writer.child("then", then)?;
                writer.child_if_some("else", elze)
            }),
            Self::While(cond, body) => writer.node("WHILE", |writer| {
                writer.child("cond", cond)?;
                writer.child("body", body)
            }),
        }
    }
}

impl Debug for Name {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        writer.leaf(self.as_str())
    }
}

impl Debug for Expr {
    fn write(&self, writer: &mut DebugWriter) -> fmt::Result {
        match self {
            Self::Ident(name) => name.write(writer),
            Self::ParamRef(name) => writer.node("PARAM_REF", |writer| writer.child("name", name)),
            Self::LocalRef(name) => writer.node("LOCAL_REF", |writer| writer.child("name", name)),
            Self::This => writer.leaf("THIS"),
            Self::Member(base, op, member) => {
                let label = match op {
                    AccessOp::Dot => "DOT",
                    AccessOp::Arrow => "ARROW",
                };
                writer.node(label, |writer| {
                    writer.child("base", base)?;
                    writer.child("member", member)
                })
            }
            Self::Scoped(class, member) => writer.node("SCOPED", |writer| {
                writer.child("class", class)?;
                writer.child("member", member)
            }),
            Self::Call(callee, args) => writer.node("CALL", |writer| {
                writer.child("callee", callee)?;
                writer.children("arg", args)
            }),
            Self::Unary(op, operand) => writer.node("UNARY", |writer| {
                writer.child("op", op)?;
                writer.child("operand", operand)
            }),
            Self::Binary(lhs, op, rhs) => writer.node("BINARY", |writer| {
                writer.child("lhs", lhs)?;
                writer.child("op", op)?;
                writer.child("rhs", rhs)
            }),
            Self::Literal(typ) => writer.leaf(&format!("LITERAL {}", typ)),
        }
    }
}

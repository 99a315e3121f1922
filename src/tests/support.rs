//! A throwaway lexer for C++ snippets and helpers to build resolved syntax
//! trees over them, with spans pointing at the right tokens.
use crate::location::{Humanizer, Located, SourceSpan};
use crate::syntax::*;

const KEYWORDS: &[&str] = &[
    "bool", "char", "class", "const", "delete", "double", "else", "false", "float", "if", "int",
    "long", "new", "operator", "private", "protected", "public", "return", "static", "struct",
    "this", "true", "unsigned", "virtual", "void", "while",
];

const PUNCTUATORS: &[&str] = &[
    "<<=", ">>=", "->*", "...", "::", "->", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "++",
    "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
];

pub fn lex(source: &str) -> Vec<Token> {
    let humanizer = Humanizer::new(source);
    let mut tokens = Vec::new();
    let mut offset = 0;
    while offset < source.len() {
        let rest = &source[offset..];
        let c = rest.chars().next().unwrap();
        let (kind, len) = if c.is_whitespace() {
            offset += c.len_utf8();
            continue;
        } else if rest.starts_with("//") {
            (TokenKind::Comment, rest.find('\n').unwrap_or(rest.len()))
        } else if c == '_' || c.is_ascii_alphabetic() {
            let len = rest
                .find(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
                .unwrap_or(rest.len());
            let kind = if KEYWORDS.contains(&&rest[..len]) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            (kind, len)
        } else if c.is_ascii_digit() {
            let len = rest
                .find(|c: char| !(c == '.' || c.is_ascii_alphanumeric()))
                .unwrap_or(rest.len());
            (TokenKind::Literal, len)
        } else if c == '"' {
            (TokenKind::Literal, rest[1..].find('"').map_or(rest.len(), |end| end + 2))
        } else {
            let len = PUNCTUATORS
                .iter()
                .find(|punctuator| rest.starts_with(**punctuator))
                .map_or(c.len_utf8(), |punctuator| punctuator.len());
            (TokenKind::Punctuation, len)
        };
        tokens.push(Token {
            kind,
            spelling: rest[..len].to_string(),
            span: humanizer.span(offset, offset + len).unwrap(),
        });
        offset += len;
    }
    tokens
}

pub struct Fixture {
    pub source: &'static str,
    pub tokens: Vec<Token>,
}

impl Fixture {
    pub fn new(source: &'static str) -> Self {
        Self { source, tokens: lex(source) }
    }

    pub fn unit(&self, decls: Vec<Decl>) -> TranslationUnit {
        TranslationUnit {
            file: String::from("fixture.cpp"),
            source: Some(self.source.to_string()),
            decls,
            tokens: self.tokens.clone(),
        }
    }

    /// The index of the `nth` token spelled `spelling`, counting from zero.
    fn index(&self, spelling: &str, nth: usize) -> usize {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| token.is(spelling))
            .nth(nth)
            .map(|(index, _)| index)
            .unwrap_or_else(|| panic!("no token #{} spelled `{}`", nth, spelling))
    }

    fn index_at(&self, span: SourceSpan) -> usize {
        self.tokens.iter().position(|token| token.span.start == span.start).unwrap()
    }

    pub fn span(&self, spelling: &str, nth: usize) -> SourceSpan {
        self.tokens[self.index(spelling, nth)].span
    }

    pub fn name(&self, spelling: &str, nth: usize) -> LName {
        Located::new(Name::new(spelling), self.span(spelling, nth))
    }

    /// A name located at another token, as for `operator<<` which sits at the
    /// `operator` keyword.
    pub fn name_at(&self, name: &str, spelling: &str, nth: usize) -> LName {
        Located::new(Name::new(name), self.span(spelling, nth))
    }

    /// The index of the last token before the `)`, `]` or `}` closing the
    /// nesting level `from` is in, or before the first of `stops` on that
    /// level. A `}` closing a body opened on that level ends the scan too.
    fn scan_end(&self, from: usize, stops: &[&str]) -> usize {
        let mut depth = 0;
        for index in from.. {
            let token = &self.tokens[index];
            match token.spelling.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" if depth == 0 => return index - 1,
                ")" | "]" => depth -= 1,
                "}" => {
                    depth -= 1;
                    if depth == 0 {
                        return index;
                    }
                }
                spelling if depth == 0 && stops.contains(&spelling) => return index - 1,
                _ => {}
            }
        }
        unreachable!()
    }

    /// The extent of the declaration whose name is at `name`: from the token
    /// after the previous `;`, `{`, `}` or access specifier up to the `;`
    /// (excluded) or the end of the body.
    fn decl_extent(&self, name: SourceSpan) -> SourceSpan {
        let anchor = self.index_at(name);
        let mut start = anchor;
        while start > 0 && ![";", "{", "}", ":"].contains(&self.tokens[start - 1].spelling.as_str()) {
            start -= 1;
        }
        let end = self.scan_end(anchor, &[";"]);
        self.tokens[start].span.cover(&self.tokens[end].span)
    }

    fn param_extent(&self, anchor: usize) -> SourceSpan {
        let mut start = anchor;
        while !["(", ","].contains(&self.tokens[start - 1].spelling.as_str()) {
            start -= 1;
        }
        let end = self.scan_end(anchor, &[","]);
        self.tokens[start].span.cover(&self.tokens[end].span)
    }

    pub fn class(&self, name: &str, bases: Vec<LName>, members: Vec<MemberDecl>) -> Decl {
        self.class_at(self.name(name, 0), bases, members)
    }

    pub fn class_at(&self, name: LName, bases: Vec<LName>, members: Vec<MemberDecl>) -> Decl {
        let extent = self.decl_extent(name.span);
        Decl::Class(ClassDecl { name, bases, members, extent })
    }

    pub fn field(&self, name: &str, nth: usize, typ: &str) -> MemberDecl {
        let name = self.name(name, nth);
        let extent = self.decl_extent(name.span);
        MemberDecl::Field(FieldDecl { name, typ: typ.parse().unwrap(), is_static: false, extent })
    }

    pub fn func(&self, name: LName, params: Vec<Param>, return_type: Option<&str>) -> FuncDecl {
        let extent = self.decl_extent(name.span);
        FuncDecl {
            qualifier: None,
            name,
            params,
            return_type: return_type.map(|typ| typ.parse().unwrap()),
            is_const: false,
            is_static: false,
            is_virtual: false,
            body: None,
            extent,
        }
    }

    pub fn param(&self, name: &str, nth: usize, typ: &str) -> Param {
        let name = self.name(name, nth);
        let extent = self.param_extent(self.index_at(name.span));
        Param { name: Some(name), typ: typ.parse().unwrap(), has_default: false, extent }
    }

    /// A parameter without a name, whose type starts at the given token.
    pub fn unnamed_param(&self, spelling: &str, nth: usize, typ: &str) -> Param {
        let extent = self.param_extent(self.index(spelling, nth));
        Param { name: None, typ: typ.parse().unwrap(), has_default: false, extent }
    }

    pub fn local(&self, name: &str, nth: usize, typ: &str, init: Option<LExpr>) -> Stmt {
        let name = self.name(name, nth);
        let extent = self.decl_extent(name.span);
        Stmt::Local(LocalDecl { name, typ: typ.parse().unwrap(), init, extent })
    }

    pub fn ident(&self, name: &str, nth: usize) -> LExpr {
        let name = self.name(name, nth);
        Located::new(Expr::Ident(name), name.span)
    }

    pub fn param_ref(&self, name: &str, nth: usize) -> LExpr {
        let name = self.name(name, nth);
        Located::new(Expr::ParamRef(name), name.span)
    }

    pub fn local_ref(&self, name: &str, nth: usize) -> LExpr {
        let name = self.name(name, nth);
        Located::new(Expr::LocalRef(name), name.span)
    }

    pub fn this(&self, nth: usize) -> LExpr {
        Located::new(Expr::This, self.span("this", nth))
    }

    pub fn literal(&self, spelling: &str, nth: usize, typ: &str) -> LExpr {
        Located::new(Expr::Literal(typ.parse().unwrap()), self.span(spelling, nth))
    }

    pub fn member(&self, base: LExpr, op: AccessOp, name: &str, nth: usize) -> LExpr {
        let name = self.name(name, nth);
        let span = base.span.cover(&name.span);
        Located::new(Expr::Member(Box::new(base), op, name), span)
    }

    pub fn scoped(&self, class: &str, class_nth: usize, name: &str, nth: usize) -> LExpr {
        let class = self.name(class, class_nth);
        let name = self.name(name, nth);
        let span = class.span.cover(&name.span);
        Located::new(Expr::Scoped(class, name), span)
    }

    /// A call of `callee`, extending up to the matching `)`.
    pub fn call(&self, callee: LExpr, args: Vec<LExpr>) -> LExpr {
        let open = self.tokens.iter().position(|token| token.span.start >= callee.span.end).unwrap();
        assert!(self.tokens[open].is("("), "callee not followed by `(`");
        let close = self.scan_end(open + 1, &[]) + 1;
        let span = callee.span.cover(&self.tokens[close].span);
        Located::new(Expr::Call(Box::new(callee), args), span)
    }

    pub fn unary(&self, op: &str, nth: usize, operand: LExpr) -> LExpr {
        let op = self.name(op, nth);
        let span = op.span.cover(&operand.span);
        Located::new(Expr::Unary(op, Box::new(operand)), span)
    }

    pub fn binary(&self, lhs: LExpr, op: &str, nth: usize, rhs: LExpr) -> LExpr {
        let op = self.name(op, nth);
        let span = lhs.span.cover(&rhs.span);
        Located::new(Expr::Binary(Box::new(lhs), op, Box::new(rhs)), span)
    }
}

#[test]
fn test_lexer() {
    let tokens = lex("Foo& operator << (Foo&); // done\nx->y::z");
    let spellings = tokens.iter().map(|token| token.spelling.as_str()).collect::<Vec<_>>();
    assert_eq!(
        spellings,
        vec!["Foo", "&", "operator", "<<", "(", "Foo", "&", ")", ";", "// done", "x", "->", "y", "::", "z"]
    );
    assert_eq!(tokens[2].kind, TokenKind::Keyword);
    assert_eq!(tokens[3].span.to_string(), "1:15-1:17");
    assert_eq!(tokens[9].kind, TokenKind::Comment);
    assert_eq!(tokens[10].span.to_string(), "2:1-2:2");
}

#[test]
fn test_member_references_tree() {
    let unit = member_references();
    let bar = match &unit.classes().nth(2).unwrap().members[0] {
        MemberDecl::Method(bar) => bar,
        MemberDecl::Field(_) => panic!("expected method `bar`"),
    };
    insta::assert_debug_snapshot!(bar, @r###"
    FUNC @ 15:3-22:4
        name: bar @ 15:7-15:10
        param: PARAM @ 15:11-15:33
            name: parameter @ 15:24-15:33
            type: AnotherClass
        result: int
        stmt: LOCAL @ 17:5-17:41
            name: non_member_being_referenced @ 17:9-17:36
            type: int
            init: LITERAL int @ 17:39-17:41
        stmt: RETURN
            value: BINARY @ 18:12-21:18
                lhs: BINARY @ 18:12-20:34
                    lhs: BINARY @ 18:12-19:23
                        lhs: member_being_referenced @ 18:12-18:35
                        op: + @ 18:36-18:37
                        rhs: CALL @ 19:7-19:23
                            callee: DefinedInSuper @ 19:7-19:21
                    op: + @ 19:24-19:25
                    rhs: non_member_being_referenced @ 20:7-20:34
                op: + @ 20:35-20:36
                rhs: DOT @ 21:7-21:18
                    base: parameter @ 21:7-21:16
                    member: x @ 21:17-21:18
    "###);
}

/// Finds a member declaration by class name, member name and position among
/// the members of that name.
pub fn member_decl<'a>(
    unit: &'a TranslationUnit,
    class: &str,
    member: &str,
    nth: usize,
) -> DeclRef<'a> {
    let class = unit.classes().find(|decl| decl.name.locatee.as_str() == class).unwrap();
    class
        .members
        .iter()
        .filter_map(|decl| match decl {
            MemberDecl::Field(field) if field.name.locatee.as_str() == member => {
                Some(DeclRef::Field(field))
            }
            MemberDecl::Method(method) if method.name.locatee.as_str() == member => {
                Some(DeclRef::Func(method))
            }
            _ => None,
        })
        .nth(nth)
        .unwrap()
}

pub const MEMBER_REFERENCES: &str = "\
class AnotherClass
{
  public:
    int x;
};

class TestSuper
{
public:
  int DefinedInSuper();
};

class Test : public TestSuper
{
  int bar(AnotherClass parameter)
  {
    int non_member_being_referenced = 42;
    return member_being_referenced +
      DefinedInSuper() +
      non_member_being_referenced +
      parameter.x;
  }

  int member_being_referenced;
};
";

pub fn member_references() -> TranslationUnit {
    let f = Fixture::new(MEMBER_REFERENCES);
    let sum = f.binary(
        f.binary(
            f.binary(
                f.ident("member_being_referenced", 0),
                "+",
                0,
                f.call(f.ident("DefinedInSuper", 1), vec![]),
            ),
            "+",
            1,
            f.ident("non_member_being_referenced", 1),
        ),
        "+",
        2,
        f.member(f.ident("parameter", 1), AccessOp::Dot, "x", 1),
    );
    let bar = FuncDecl {
        body: Some(vec![
            f.local("non_member_being_referenced", 0, "int", Some(f.literal("42", 0, "int"))),
            Stmt::Return(Some(sum)),
        ]),
        ..f.func(f.name("bar", 0), vec![f.param("parameter", 0, "AnotherClass")], Some("int"))
    };
    f.unit(vec![
        f.class("AnotherClass", vec![], vec![f.field("x", 0, "int")]),
        f.class(
            "TestSuper",
            vec![],
            vec![MemberDecl::Method(f.func(f.name("DefinedInSuper", 0), vec![], Some("int")))],
        ),
        f.class(
            "Test",
            vec![f.name("TestSuper", 1)],
            vec![MemberDecl::Method(bar), f.field("member_being_referenced", 1, "int")],
        ),
    ])
}

pub const IDENTIFIER_RANGES: &str = "\
class Foo
{
public:
  static void static_method();
  virtual void virtual_method();
  virtual void virtual_method() const;
  Foo& operator << (Foo&);
};

void Foo::static_method()
{
}

void Foo::virtual_method()
{
}

void Foo::virtual_method() const
{
}

Foo& Foo::operator << (Foo&)
{
  return *this;
}
";

pub fn identifier_ranges() -> TranslationUnit {
    let f = Fixture::new(IDENTIFIER_RANGES);
    let shift = |nth| f.name_at("operator<<", "operator", nth);
    let definition = |qualifier, name: LName, params, return_type, body| FuncDecl {
        qualifier: Some(f.name("Foo", qualifier)),
        body: Some(body),
        ..f.func(name, params, return_type)
    };
    f.unit(vec![
        f.class(
            "Foo",
            vec![],
            vec![
                MemberDecl::Method(FuncDecl {
                    is_static: true,
                    ..f.func(f.name("static_method", 0), vec![], Some("void"))
                }),
                MemberDecl::Method(FuncDecl {
                    is_virtual: true,
                    ..f.func(f.name("virtual_method", 0), vec![], Some("void"))
                }),
                MemberDecl::Method(FuncDecl {
                    is_virtual: true,
                    is_const: true,
                    ..f.func(f.name("virtual_method", 1), vec![], Some("void"))
                }),
                MemberDecl::Method(f.func(
                    shift(0),
                    vec![f.unnamed_param("Foo", 2, "Foo&")],
                    Some("Foo&"),
                )),
            ],
        ),
        Decl::Func(definition(3, f.name("static_method", 1), vec![], Some("void"), vec![])),
        Decl::Func(definition(4, f.name("virtual_method", 2), vec![], Some("void"), vec![])),
        Decl::Func(FuncDecl {
            is_const: true,
            ..definition(5, f.name("virtual_method", 3), vec![], Some("void"), vec![])
        }),
        Decl::Func(definition(
            7,
            shift(1),
            vec![f.unnamed_param("Foo", 8, "Foo&")],
            Some("Foo&"),
            vec![Stmt::Return(Some(f.unary("*", 0, f.this(0))))],
        )),
    ])
}

pub const SCENARIOS: &str = "\
class Other
{
public:
  void some_method();
  int value;
};

class Base
{
public:
  virtual void some_method();
  void helper(int count, bool flag = false);
  int shared;
};

class Test : public Base
{
public:
  void some_method();
  void some_method() const;
  void take(Test& target, const Test& source);
  Test& operator<<(int amount);
  void run(Test test, Other* mpOther, int shared);
  static Test* create();
  int member_being_referenced;
};

void Test::run(Test test, Other* mpOther, int shared)
{
  this->member_being_referenced = shared;
  test.member_being_referenced = member_being_referenced;
  mpOther->some_method();
  some_method();
  Base::some_method();
  helper(1);
  take(test, *this);
  *this << 2;
  const Test* view = this;
  view->some_method();
  {
    int member_being_referenced = 3;
    member_being_referenced = 4;
  }
  member_being_referenced = 5;
  Test::create()->some_method();
}
";

pub fn scenarios() -> TranslationUnit {
    let f = Fixture::new(SCENARIOS);
    let method = |name, nth| f.func(f.name(name, nth), vec![], Some("void"));
    let field = "member_being_referenced";
    let call = |callee| f.call(callee, vec![]);
    let assign = |lhs, nth, rhs| Stmt::Expr(f.binary(lhs, "=", nth, rhs));
    let body = vec![
        assign(f.member(f.this(0), AccessOp::Arrow, field, 1), 1, f.ident("shared", 3)),
        assign(f.member(f.ident("test", 2), AccessOp::Dot, field, 2), 2, f.ident(field, 3)),
        Stmt::Expr(call(f.member(f.ident("mpOther", 2), AccessOp::Arrow, "some_method", 4))),
        Stmt::Expr(call(f.ident("some_method", 5))),
        Stmt::Expr(call(f.scoped("Base", 2, "some_method", 6))),
        Stmt::Expr(f.call(f.ident("helper", 1), vec![f.literal("1", 0, "int")])),
        Stmt::Expr(f.call(
            f.ident("take", 1),
            vec![f.ident("test", 3), f.unary("*", 3, f.this(1))],
        )),
        Stmt::Expr(f.binary(f.unary("*", 4, f.this(2)), "<<", 1, f.literal("2", 0, "int"))),
        f.local("view", 0, "const Test*", Some(f.this(3))),
        Stmt::Expr(call(f.member(f.ident("view", 1), AccessOp::Arrow, "some_method", 7))),
        Stmt::Block(vec![
            f.local(field, 4, "int", Some(f.literal("3", 0, "int"))),
            assign(f.ident(field, 5), 5, f.literal("4", 0, "int")),
        ]),
        assign(f.ident(field, 6), 6, f.literal("5", 0, "int")),
        Stmt::Expr(call(f.member(
            call(f.scoped("Test", 9, "create", 1)),
            AccessOp::Arrow,
            "some_method",
            8,
        ))),
    ];
    let run_params = |nth: usize, shared| {
        vec![
            f.param("test", nth, "Test"),
            f.param("mpOther", nth, "Other*"),
            f.param("shared", shared, "int"),
        ]
    };
    let run = FuncDecl {
        qualifier: Some(f.name("Test", 6)),
        body: Some(body),
        ..f.func(f.name("run", 1), run_params(1, 2), Some("void"))
    };
    let helper_params = vec![
        f.param("count", 0, "int"),
        Param { has_default: true, ..f.param("flag", 0, "bool") },
    ];
    f.unit(vec![
        f.class(
            "Other",
            vec![],
            vec![MemberDecl::Method(method("some_method", 0)), f.field("value", 0, "int")],
        ),
        f.class(
            "Base",
            vec![],
            vec![
                MemberDecl::Method(FuncDecl { is_virtual: true, ..method("some_method", 1) }),
                MemberDecl::Method(f.func(f.name("helper", 0), helper_params, Some("void"))),
                f.field("shared", 0, "int"),
            ],
        ),
        f.class(
            "Test",
            vec![f.name("Base", 1)],
            vec![
                MemberDecl::Method(method("some_method", 2)),
                MemberDecl::Method(FuncDecl { is_const: true, ..method("some_method", 3) }),
                MemberDecl::Method(f.func(
                    f.name("take", 0),
                    vec![f.param("target", 0, "Test&"), f.param("source", 0, "const Test&")],
                    Some("void"),
                )),
                MemberDecl::Method(f.func(
                    f.name_at("operator<<", "operator", 0),
                    vec![f.param("amount", 0, "int")],
                    Some("Test&"),
                )),
                MemberDecl::Method(f.func(f.name("run", 0), run_params(0, 1), Some("void"))),
                MemberDecl::Method(FuncDecl {
                    is_static: true,
                    ..f.func(f.name("create", 0), vec![], Some("Test*"))
                }),
                f.field(field, 0, "int"),
            ],
        ),
        Decl::Func(run),
    ])
}

pub const UNRESOLVED: &str = "\
class A
{
public:
  int id;
};

class B
{
public:
  int id;
  void draw(int scale);
  void draw(bool filled);
};

class C : public A, public B
{
public:
  void f()
  {
    id;
  }
};

void g(B* shape)
{
  this;
  shape.id;
  missing;
  shape->draw(unknown);
  shape->draw(true);
}
";

pub fn unresolved() -> TranslationUnit {
    let f = Fixture::new(UNRESOLVED);
    let draw = |nth, param, typ| {
        f.func(f.name("draw", nth), vec![f.param(param, 0, typ)], Some("void"))
    };
    let f_method = FuncDecl {
        body: Some(vec![Stmt::Expr(f.ident("id", 2))]),
        ..f.func(f.name("f", 0), vec![], Some("void"))
    };
    let g = FuncDecl {
        body: Some(vec![
            Stmt::Expr(f.this(0)),
            Stmt::Expr(f.member(f.ident("shape", 1), AccessOp::Dot, "id", 3)),
            Stmt::Expr(f.ident("missing", 0)),
            Stmt::Expr(f.call(
                f.member(f.ident("shape", 2), AccessOp::Arrow, "draw", 2),
                vec![f.ident("unknown", 0)],
            )),
            Stmt::Expr(f.call(
                f.member(f.ident("shape", 3), AccessOp::Arrow, "draw", 3),
                vec![f.literal("true", 0, "bool")],
            )),
        ]),
        ..f.func(f.name("g", 0), vec![f.param("shape", 0, "B*")], Some("void"))
    };
    f.unit(vec![
        f.class("A", vec![], vec![f.field("id", 0, "int")]),
        f.class(
            "B",
            vec![],
            vec![
                f.field("id", 1, "int"),
                MemberDecl::Method(draw(0, "scale", "int")),
                MemberDecl::Method(draw(1, "filled", "bool")),
            ],
        ),
        f.class("C", vec![f.name("A", 1), f.name("B", 1)], vec![MemberDecl::Method(f_method)]),
        Decl::Func(g),
    ])
}


#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate static_assertions;

pub mod actions;
pub mod diagnostic;
pub mod finder;
pub mod identifier;
pub mod location;
pub mod query;
pub mod symbols;
pub mod syntax;

lazy_static! {
    static ref INTERNER: lasso::ThreadedRodeo = lasso::ThreadedRodeo::new();
}

assert_eq_size!(syntax::Name, u32);

pub mod first_follow;
pub mod grammar;
pub mod ll1_parsing_table;
pub mod parse;
pub mod pretty_print;
pub mod tokenize;
pub mod trace;
pub use grammar::Grammar;

pub const EPSILON: &str = "ε";
pub const EPSILON_ALIAS: &str = "epsilon";
pub const END_MARK: &str = "$";
pub const ARROWS: [&str; 2] = ["→", "->"];

#[cfg(test)]
pub(crate) const EXPRESSION_GRAMMAR: &str = "E -> T E'
E' -> + T E' | ε
T -> F T'
T' -> * F T' | ε
F -> id | ( E )";

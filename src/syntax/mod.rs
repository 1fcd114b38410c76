//! Parsing and printing of the JavaScript subset handled by the rewriter.

pub mod parser;
pub mod printer;
pub mod source;

pub use parser::{parse, parse_with_mode, ParseMode};
pub use printer::print;
pub use source::SourceContext;

/// Binding power of a binary operator; higher binds tighter.
pub fn binary_precedence(operator: &str) -> u8 {
    match operator {
        "??" | "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" | "===" | "!==" => 6,
        "<" | ">" | "<=" | ">=" | "instanceof" | "in" => 7,
        "<<" | ">>" | ">>>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        "**" => 11,
        _ => 0,
    }
}

pub fn is_right_associative(operator: &str) -> bool {
    operator == "**"
}

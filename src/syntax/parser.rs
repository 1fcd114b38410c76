//! JavaScript subset parser.
//!
//! Converts source text into a [`Tree`] with byte spans on every node. The
//! parser is purely syntactic; labeled statements are kept as-is for the
//! rewriter to find.

use pest::{
    error::{Error, InputLocation},
    iterators::Pair,
    Parser,
};
use pest_derive::Parser;

use crate::ast::{FunctionForm, Key, MethodKind, NodeId, NodeKind, Span, Tree, VarKind};
use crate::diagnostics::SourceArc;
use crate::syntax::{binary_precedence, is_right_associative, SourceContext};
use crate::{err_ctx, err_msg, MetalogError};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct JsParser;

/// Whether `%%name%%` placeholders are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Source,
    Template,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse a source file into a program tree.
pub fn parse(source: &SourceContext) -> Result<Tree, MetalogError> {
    parse_with_mode(source, ParseMode::Source)
}

pub fn parse_with_mode(source: &SourceContext, mode: ParseMode) -> Result<Tree, MetalogError> {
    let named = source.to_named_source();
    let mut pairs = JsParser::parse(Rule::program, &source.content)
        .map_err(|e| convert_parse_error(e, &named))?;
    let program = pairs
        .next()
        .ok_or_else(|| err_msg!(Internal, "parser produced no program"))?;

    let mut builder = TreeBuilder {
        tree: Tree::new(&source.content),
        source: named,
        mode,
    };
    let body = program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(|p| builder.statement(p))
        .collect::<Result<Vec<_>, _>>()?;
    builder.tree.set_program_body(body);
    Ok(builder.tree)
}

// ============================================================================
// TREE BUILDER
// ============================================================================

struct TreeBuilder {
    tree: Tree,
    source: SourceArc,
    mode: ParseMode,
}

impl TreeBuilder {
    fn alloc(&mut self, kind: NodeKind, span: Span) -> Result<NodeId, MetalogError> {
        Ok(self.tree.alloc(kind, span))
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn statement(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let span = span_of(&pair);
        match pair.as_rule() {
            Rule::block => {
                let body = pair
                    .into_inner()
                    .map(|p| self.statement(p))
                    .collect::<Result<Vec<_>, _>>()?;
                self.alloc(NodeKind::Block { body }, span)
            }
            Rule::empty_stmt => self.alloc(NodeKind::Empty, span),
            Rule::var_decl => {
                let mut inner = pair.into_inner();
                let kind = match next_pair(&mut inner, "declaration kind")?.as_str() {
                    "const" => VarKind::Const,
                    "let" => VarKind::Let,
                    _ => VarKind::Var,
                };
                let declarators = inner
                    .map(|d| self.declarator(d))
                    .collect::<Result<Vec<_>, _>>()?;
                self.alloc(NodeKind::VarDecl { kind, declarators }, span)
            }
            Rule::function_decl => self.function(pair, FunctionForm::Declaration),
            Rule::class_decl => self.class(pair, true),
            Rule::return_stmt => {
                let argument = significant(pair)
                    .next()
                    .map(|p| self.expression(p))
                    .transpose()?;
                self.alloc(NodeKind::Return { argument }, span)
            }
            Rule::throw_stmt => {
                let mut inner = significant(pair);
                let argument = self.expression(next_pair(&mut inner, "thrown expression")?)?;
                self.alloc(NodeKind::Throw { argument }, span)
            }
            Rule::break_stmt | Rule::continue_stmt => {
                let is_break = pair.as_rule() == Rule::break_stmt;
                let label = significant(pair).next().map(|p| p.as_str().to_string());
                let kind = if is_break {
                    NodeKind::Break { label }
                } else {
                    NodeKind::Continue { label }
                };
                self.alloc(kind, span)
            }
            Rule::if_stmt => {
                let mut inner = significant(pair);
                let test = self.expression(next_pair(&mut inner, "if condition")?)?;
                let consequent = self.statement(next_pair(&mut inner, "if body")?)?;
                let alternate = inner.next().map(|p| self.statement(p)).transpose()?;
                self.alloc(
                    NodeKind::If {
                        test,
                        consequent,
                        alternate,
                    },
                    span,
                )
            }
            Rule::while_stmt => {
                let mut inner = significant(pair);
                let test = self.expression(next_pair(&mut inner, "while condition")?)?;
                let body = self.statement(next_pair(&mut inner, "while body")?)?;
                self.alloc(NodeKind::While { test, body }, span)
            }
            Rule::labeled_stmt => {
                let mut inner = pair.into_inner();
                let label = next_pair(&mut inner, "label")?.as_str().to_string();
                let body = self.statement(next_pair(&mut inner, "labeled body")?)?;
                self.alloc(NodeKind::Labeled { label, body }, span)
            }
            Rule::expr_stmt => {
                let mut inner = pair.into_inner();
                let expr = self.expression(next_pair(&mut inner, "expression")?)?;
                self.alloc(NodeKind::Expression { expr }, span)
            }
            other => Err(err_msg!(Internal, "unexpected statement rule {:?}", other)),
        }
    }

    fn declarator(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let name = next_pair(&mut inner, "binding name")?.as_str().to_string();
        let init = inner.next().map(|p| self.expression(p)).transpose()?;
        self.alloc(NodeKind::Declarator { name, init }, span)
    }

    fn function(&mut self, pair: Pair<Rule>, form: FunctionForm) -> Result<NodeId, MetalogError> {
        let span = span_of(&pair);
        let mut name = None;
        let mut params = Vec::new();
        let mut body = None;
        let mut is_async = false;
        let mut is_generator = false;

        for part in significant(pair) {
            match part.as_rule() {
                Rule::async_kw => is_async = true,
                Rule::generator_star => is_generator = true,
                Rule::identifier => name = Some(part.as_str().to_string()),
                Rule::params => params = param_names(part),
                Rule::block => body = Some(self.statement(part)?),
                other => return Err(err_msg!(Internal, "unexpected function part {:?}", other)),
            }
        }

        let body = body.ok_or_else(|| err_msg!(Internal, "function without body"))?;
        self.alloc(
            NodeKind::Function {
                name,
                params,
                body,
                form,
                is_async,
                is_generator,
            },
            span,
        )
    }

    fn arrow_function(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner().peekable();
        let is_async = inner
            .next_if(|p| p.as_rule() == Rule::arrow_async)
            .is_some();
        let head = next_pair(&mut inner, "arrow parameters")?;
        let params = match head.into_inner().next() {
            Some(p) if p.as_rule() == Rule::params => param_names(p),
            Some(p) => vec![p.as_str().to_string()],
            None => Vec::new(),
        };
        let body_pair = next_pair(&mut inner, "arrow body")?;
        let body = if body_pair.as_rule() == Rule::block {
            self.statement(body_pair)?
        } else {
            self.expression(body_pair)?
        };
        self.alloc(
            NodeKind::Function {
                name: None,
                params,
                body,
                form: FunctionForm::Arrow,
                is_async,
                is_generator: false,
            },
            span,
        )
    }

    fn class(&mut self, pair: Pair<Rule>, is_declaration: bool) -> Result<NodeId, MetalogError> {
        let span = span_of(&pair);
        let mut name = None;
        let mut superclass = None;
        let mut body = None;

        for part in significant(pair) {
            match part.as_rule() {
                Rule::identifier => name = Some(part.as_str().to_string()),
                Rule::heritage => {
                    let mut inner = significant(part);
                    superclass = Some(self.expression(next_pair(&mut inner, "superclass")?)?);
                }
                Rule::class_body => body = Some(self.class_body(part)?),
                other => return Err(err_msg!(Internal, "unexpected class part {:?}", other)),
            }
        }

        let body = body.ok_or_else(|| err_msg!(Internal, "class without body"))?;
        self.alloc(
            NodeKind::Class {
                name,
                superclass,
                body,
                is_declaration,
            },
            span,
        )
    }

    fn class_body(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let span = span_of(&pair);
        let members = pair
            .into_inner()
            .map(|m| self.method(m))
            .collect::<Result<Vec<_>, _>>()?;
        self.alloc(NodeKind::ClassBody { members }, span)
    }

    fn method(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let span = span_of(&pair);
        let mut is_static = false;
        let mut is_async = false;
        let mut is_generator = false;
        let mut kind = MethodKind::Method;
        let mut key = None;
        let mut params = Vec::new();
        let mut body = None;

        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::static_kw => is_static = true,
                Rule::async_kw => is_async = true,
                Rule::generator_star => is_generator = true,
                Rule::accessor_kw => {
                    kind = if part.as_str() == "get" {
                        MethodKind::Getter
                    } else {
                        MethodKind::Setter
                    }
                }
                Rule::params => params = param_names(part),
                Rule::block => body = Some(self.statement(part)?),
                _ => key = Some(self.key(part)?),
            }
        }

        let key = key.ok_or_else(|| err_msg!(Internal, "method without key"))?;
        if !is_static && kind == MethodKind::Method && key == Key::Named("constructor".into()) {
            kind = MethodKind::Constructor;
        }
        let body = body.ok_or_else(|| err_msg!(Internal, "method without body"))?;
        self.alloc(
            NodeKind::Method {
                key,
                kind,
                is_static,
                is_async,
                is_generator,
                params,
                body,
            },
            span,
        )
    }

    fn key(&mut self, pair: Pair<Rule>) -> Result<Key, MetalogError> {
        match pair.as_rule() {
            Rule::identifier_name | Rule::number => Ok(Key::Named(pair.as_str().to_string())),
            Rule::string => Ok(match decode_string(pair.as_str()) {
                Some(value) => Key::Str(value),
                None => Key::Named(pair.as_str().to_string()),
            }),
            Rule::computed_key => {
                let mut inner = pair.into_inner();
                Ok(Key::Computed(
                    self.expression(next_pair(&mut inner, "computed key")?)?,
                ))
            }
            other => Err(err_msg!(Internal, "unexpected key rule {:?}", other)),
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn expression(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let span = span_of(&pair);
        match pair.as_rule() {
            Rule::expression => {
                let mut expressions = pair
                    .into_inner()
                    .map(|p| self.expression(p))
                    .collect::<Result<Vec<_>, _>>()?;
                if expressions.len() == 1 {
                    return expressions
                        .pop()
                        .ok_or_else(|| err_msg!(Internal, "empty expression"));
                }
                self.alloc(NodeKind::Sequence { expressions }, span)
            }
            Rule::assign_expr => {
                let mut inner = pair.into_inner();
                let target = self.expression(next_pair(&mut inner, "assignment target")?)?;
                let operator = next_pair(&mut inner, "assignment operator")?
                    .as_str()
                    .to_string();
                let value = self.expression(next_pair(&mut inner, "assigned value")?)?;
                self.alloc(
                    NodeKind::Assign {
                        operator,
                        target,
                        value,
                    },
                    span,
                )
            }
            Rule::arrow_function => self.arrow_function(pair),
            Rule::yield_expr => {
                let mut delegate = false;
                let mut argument = None;
                for part in significant(pair) {
                    if part.as_rule() == Rule::generator_star {
                        delegate = true;
                    } else {
                        argument = Some(self.expression(part)?);
                    }
                }
                self.alloc(NodeKind::Yield { argument, delegate }, span)
            }
            Rule::conditional => {
                let mut inner = pair.into_inner();
                let test = self.expression(next_pair(&mut inner, "condition")?)?;
                let Some(consequent) = inner.next() else {
                    return Ok(test);
                };
                let consequent = self.expression(consequent)?;
                let alternate = self.expression(next_pair(&mut inner, "alternate")?)?;
                self.alloc(
                    NodeKind::Conditional {
                        test,
                        consequent,
                        alternate,
                    },
                    span,
                )
            }
            Rule::binary => self.binary(pair),
            Rule::unary => self.unary(pair),
            Rule::postfix => {
                let mut inner = pair.into_inner();
                let argument = self.expression(next_pair(&mut inner, "operand")?)?;
                match inner.next() {
                    Some(op) => self.alloc(
                        NodeKind::Update {
                            operator: op.as_str().to_string(),
                            prefix: false,
                            argument,
                        },
                        span,
                    ),
                    None => Ok(argument),
                }
            }
            Rule::call_member | Rule::new_callee => self.call_member(pair),
            Rule::new_expr => {
                let mut inner = significant(pair);
                let callee = self.expression(next_pair(&mut inner, "constructor")?)?;
                let arguments = match inner.next() {
                    Some(args) => self.arguments(args)?,
                    None => Vec::new(),
                };
                self.alloc(NodeKind::New { callee, arguments }, span)
            }
            Rule::paren | Rule::yield_argument => {
                let mut inner = pair.into_inner();
                self.expression(next_pair(&mut inner, "inner expression")?)
            }
            Rule::number => self.alloc(NodeKind::Number(pair.as_str().to_string()), span),
            Rule::string => {
                let kind = match decode_string(pair.as_str()) {
                    Some(value) => NodeKind::Str(value),
                    None => NodeKind::RawStr(pair.as_str().to_string()),
                };
                self.alloc(kind, span)
            }
            Rule::boolean => self.alloc(NodeKind::Bool(pair.as_str() == "true"), span),
            Rule::null_lit => self.alloc(NodeKind::Null, span),
            Rule::this_lit => self.alloc(NodeKind::This, span),
            Rule::identifier => self.alloc(NodeKind::Ident(pair.as_str().to_string()), span),
            Rule::placeholder => self.placeholder(pair),
            Rule::function_expr => self.function(pair, FunctionForm::Expression),
            Rule::class_expr => self.class(pair, false),
            Rule::array => {
                let elements = pair
                    .into_inner()
                    .map(|p| self.expression(p))
                    .collect::<Result<Vec<_>, _>>()?;
                self.alloc(NodeKind::Array { elements }, span)
            }
            Rule::object => {
                let properties = pair
                    .into_inner()
                    .map(|p| self.property(p))
                    .collect::<Result<Vec<_>, _>>()?;
                self.alloc(NodeKind::Object { properties }, span)
            }
            other => Err(err_msg!(Internal, "unexpected expression rule {:?}", other)),
        }
    }

    /// Folds `operand (op operand)*` by operator precedence.
    fn binary(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let mut inner = pair.into_inner();
        let mut operands = vec![self.expression(next_pair(&mut inner, "operand")?)?];
        let mut operators = Vec::new();
        while let Some(op) = inner.next() {
            operators.push(op.as_str().to_string());
            operands.push(self.expression(next_pair(&mut inner, "operand")?)?);
        }
        let mut pos = 0;
        Ok(self.climb(&operands, &operators, &mut pos, 1))
    }

    fn climb(
        &mut self,
        operands: &[NodeId],
        operators: &[String],
        pos: &mut usize,
        min_precedence: u8,
    ) -> NodeId {
        let mut left = operands[*pos];
        while *pos < operators.len() {
            let operator = &operators[*pos];
            let precedence = binary_precedence(operator);
            if precedence < min_precedence {
                break;
            }
            let next_min = if is_right_associative(operator) {
                precedence
            } else {
                precedence + 1
            };
            *pos += 1;
            let right = self.climb(operands, operators, pos, next_min);
            let span = Span {
                start: self.tree.span(left).start,
                end: self.tree.span(right).end,
            };
            left = self.tree.alloc(
                NodeKind::Binary {
                    operator: operator.clone(),
                    left,
                    right,
                },
                span,
            );
        }
        left
    }

    fn unary(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let end = span_of(&pair).end;
        let mut parts: Vec<Pair<Rule>> = pair.into_inner().collect();
        let operand = parts
            .pop()
            .ok_or_else(|| err_msg!(Internal, "unary without operand"))?;
        let mut node = self.expression(operand)?;
        for op in parts.into_iter().rev() {
            let span = Span {
                start: op.as_span().start(),
                end,
            };
            let operator = op.as_str().to_string();
            let kind = if operator == "++" || operator == "--" {
                NodeKind::Update {
                    operator,
                    prefix: true,
                    argument: node,
                }
            } else {
                NodeKind::Unary {
                    operator,
                    argument: node,
                }
            };
            node = self.tree.alloc(kind, span);
        }
        Ok(node)
    }

    fn call_member(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let start = span_of(&pair).start;
        let mut inner = pair.into_inner();
        let mut node = self.expression(next_pair(&mut inner, "callee")?)?;
        for suffix in inner {
            let span = Span {
                start,
                end: suffix.as_span().end(),
            };
            let kind = match suffix.as_rule() {
                Rule::arguments => NodeKind::Call {
                    callee: node,
                    arguments: self.arguments(suffix)?,
                },
                Rule::member_dot => {
                    let mut parts = suffix.into_inner();
                    let name = next_pair(&mut parts, "property name")?.as_str().to_string();
                    NodeKind::Member {
                        object: node,
                        property: Key::Named(name),
                    }
                }
                Rule::member_index => {
                    let mut parts = suffix.into_inner();
                    let index = self.expression(next_pair(&mut parts, "index")?)?;
                    NodeKind::Member {
                        object: node,
                        property: Key::Computed(index),
                    }
                }
                other => return Err(err_msg!(Internal, "unexpected suffix {:?}", other)),
            };
            node = self.tree.alloc(kind, span);
        }
        Ok(node)
    }

    fn arguments(&mut self, pair: Pair<Rule>) -> Result<Vec<NodeId>, MetalogError> {
        pair.into_inner().map(|p| self.expression(p)).collect()
    }

    fn property(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let first = next_pair(&mut inner, "property")?;
        if first.as_rule() == Rule::shorthand {
            let name = first.as_str().to_string();
            let value = self.alloc(NodeKind::Ident(name.clone()), span)?;
            return self.alloc(
                NodeKind::Property {
                    key: Key::Named(name),
                    value,
                    shorthand: true,
                },
                span,
            );
        }
        let key = self.key(first)?;
        let value = self.expression(next_pair(&mut inner, "property value")?)?;
        self.alloc(
            NodeKind::Property {
                key,
                value,
                shorthand: false,
            },
            span,
        )
    }

    fn placeholder(&mut self, pair: Pair<Rule>) -> Result<NodeId, MetalogError> {
        let span = span_of(&pair);
        if self.mode == ParseMode::Source {
            return Err(err_ctx!(
                Parse,
                "template placeholders are only allowed in alias templates",
                &self.source,
                span
            ));
        }
        let mut inner = pair.into_inner();
        let name = next_pair(&mut inner, "placeholder name")?.as_str().to_string();
        self.alloc(NodeKind::Placeholder(name), span)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn span_of(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    Span {
        start: span.start(),
        end: span.end(),
    }
}

fn next_pair<'i>(pairs: &mut impl Iterator<Item = Pair<'i, Rule>>, what: &str) -> Result<Pair<'i, Rule>, MetalogError> {
    pairs
        .next()
        .ok_or_else(|| err_msg!(Internal, "grammar produced no {}", what))
}

fn is_keyword_rule(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::function_kw
            | Rule::class_kw
            | Rule::extends_kw
            | Rule::return_kw
            | Rule::throw_kw
            | Rule::if_kw
            | Rule::else_kw
            | Rule::while_kw
            | Rule::new_kw
            | Rule::yield_kw
            | Rule::break_kw
            | Rule::continue_kw
    )
}

/// Inner pairs without bare keyword tokens.
fn significant(pair: Pair<'_, Rule>) -> impl Iterator<Item = Pair<'_, Rule>> {
    pair.into_inner().filter(|p| !is_keyword_rule(p.as_rule()))
}

fn param_names(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner().map(|p| p.as_str().to_string()).collect()
}

fn convert_parse_error(error: Error<Rule>, source: &SourceArc) -> MetalogError {
    let span = match error.location {
        InputLocation::Pos(pos) => Span {
            start: pos,
            end: pos,
        },
        InputLocation::Span((start, end)) => Span { start, end },
    };
    let message = error.variant.message().to_string();
    err_ctx!(Parse, message, source, span)
}

/// Decodes a quoted string literal, including its surrounding quotes.
///
/// Returns `None` when the value has no UTF-8 form (a lone UTF-16 surrogate)
/// or an escape is malformed; such literals are kept as written.
pub(crate) fn decode_string(raw: &str) -> Option<String> {
    let body = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next()?;
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\n' => {}
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(code_point(&hex, 2)?);
            }
            'u' => {
                let unit = utf16_unit(&mut chars)?;
                if (0xD800..0xDC00).contains(&unit) {
                    // A high surrogate must be followed by `\u` and a low one.
                    let mut ahead = chars.clone();
                    if ahead.next() != Some('\\') || ahead.next() != Some('u') {
                        return None;
                    }
                    let low = utf16_unit(&mut ahead)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return None;
                    }
                    chars = ahead;
                    let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    out.push(char::from_u32(combined)?);
                } else {
                    out.push(char::from_u32(unit)?);
                }
            }
            other => out.push(other),
        }
    }
    Some(out)
}

/// Reads the digits after `\u`: four hex digits or a braced code point.
fn utf16_unit(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<u32> {
    if chars.peek() == Some(&'{') {
        chars.next();
        let hex: String = chars.by_ref().take_while(|&c| c != '}').collect();
        if hex.is_empty() || hex.len() > 6 {
            return None;
        }
        return u32::from_str_radix(&hex, 16).ok();
    }
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok()
}

fn code_point(hex: &str, digits: usize) -> Option<char> {
    if hex.len() != digits {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(text: &str) -> Tree {
        parse(&SourceContext::from_file("test.js", text)).expect("parse should succeed")
    }

    fn first_expression(tree: &Tree) -> NodeId {
        let stmt = tree.statements(tree.root())[0];
        match tree.kind(stmt) {
            NodeKind::Expression { expr } => *expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn binary_operators_follow_precedence() {
        let tree = parse_str("a + b * c;");
        let expr = first_expression(&tree);
        let NodeKind::Binary { operator, right, .. } = tree.kind(expr) else {
            panic!("expected binary");
        };
        assert_eq!(operator, "+");
        assert!(matches!(tree.kind(*right), NodeKind::Binary { operator, .. } if operator == "*"));
    }

    #[test]
    fn exponent_is_right_associative() {
        let tree = parse_str("a ** b ** c;");
        let expr = first_expression(&tree);
        let NodeKind::Binary { left, right, .. } = tree.kind(expr) else {
            panic!("expected binary");
        };
        assert!(matches!(tree.kind(*left), NodeKind::Ident(name) if name == "a"));
        assert!(matches!(tree.kind(*right), NodeKind::Binary { .. }));
    }

    #[test]
    fn comma_expression_becomes_sequence() {
        let tree = parse_str("trace: (a, b, c);");
        let label = tree.statements(tree.root())[0];
        let NodeKind::Labeled { label: name, body } = tree.kind(label) else {
            panic!("expected label");
        };
        assert_eq!(name, "trace");
        let NodeKind::Expression { expr } = tree.kind(*body) else {
            panic!("expected expression body");
        };
        assert!(
            matches!(tree.kind(*expr), NodeKind::Sequence { expressions } if expressions.len() == 3)
        );
    }

    #[test]
    fn class_methods_record_kind_and_key() {
        let tree = parse_str("class A { constructor() {} static get size() { return 1; } [key]() {} }");
        let class = tree.statements(tree.root())[0];
        let NodeKind::Class { body, .. } = tree.kind(class) else {
            panic!("expected class");
        };
        let NodeKind::ClassBody { members } = tree.kind(*body) else {
            panic!("expected class body");
        };
        let kinds: Vec<_> = members
            .iter()
            .map(|m| match tree.kind(*m) {
                NodeKind::Method { kind, is_static, .. } => (*kind, *is_static),
                _ => panic!("expected method"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (MethodKind::Constructor, false),
                (MethodKind::Getter, true),
                (MethodKind::Method, false)
            ]
        );
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert!(parse(&SourceContext::from_file("t.js", "var = 1;")).is_err());
        let tree = parse_str("var index = instance;");
        assert_eq!(tree.statements(tree.root()).len(), 1);
    }

    #[test]
    fn placeholders_rejected_outside_templates() {
        let err = parse(&SourceContext::from_file("t.js", "%%content%%;")).unwrap_err();
        assert_eq!(err.error_type(), crate::diagnostics::ErrorType::Parse);
        let tree = parse_with_mode(
            &SourceContext::from_file("t.js", "%%logFunction%%(%%content%%);"),
            ParseMode::Template,
        )
        .unwrap();
        assert_eq!(tree.statements(tree.root()).len(), 1);
    }

    #[test]
    fn string_escapes_are_decoded() {
        assert_eq!(decode_string(r#""a\nb""#).as_deref(), Some("a\nb"));
        assert_eq!(decode_string(r"'it\'s'").as_deref(), Some("it's"));
        assert_eq!(decode_string(r#""A\x42\u{43}""#).as_deref(), Some("ABC"));
    }

    #[test]
    fn surrogate_pairs_are_combined() {
        assert_eq!(decode_string(r#""\uD83D\uDE00""#).as_deref(), Some("\u{1F600}"));
        assert_eq!(decode_string(r#""\u{1F600}!""#).as_deref(), Some("\u{1F600}!"));
    }

    #[test]
    fn undecodable_strings_are_kept_raw() {
        assert_eq!(decode_string(r#""\ud83d""#), None);
        assert_eq!(decode_string(r#""\uDE00\uD83D""#), None);
        assert_eq!(decode_string(r#""\xZZ""#), None);

        let tree = parse_str(r#"x = "\ud83d";"#);
        let expr = first_expression(&tree);
        let NodeKind::Assign { value, .. } = tree.kind(expr) else {
            panic!("expected assignment");
        };
        assert_eq!(tree.kind(*value), &NodeKind::RawStr(r#""\ud83d""#.to_string()));
    }

    #[test]
    fn label_lines_are_recorded() {
        let tree = parse_str("function f() {\n  a;\n  debug: b;\n}");
        let func = tree.statements(tree.root())[0];
        let label = tree.statements(func)[1];
        assert_eq!(tree.line_of(label), 3);
    }
}

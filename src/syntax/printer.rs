//! Renders a [`Tree`] back to JavaScript source.
//!
//! Output uses two-space indentation and one statement per line. Parentheses
//! are inserted from operator precedence rather than remembered from the
//! input, so redundant parentheses in the original are dropped.

use crate::ast::{FunctionForm, Key, MethodKind, NodeId, NodeKind, Tree};
use crate::syntax::{binary_precedence, is_right_associative};

const INDENT: &str = "  ";

// Expression binding powers; higher binds tighter.
const PREC_SEQUENCE: u8 = 1;
const PREC_ASSIGN: u8 = 2;
const PREC_CONDITIONAL: u8 = 3;
const PREC_BINARY_BASE: u8 = 4;
const PREC_PREFIX: u8 = 16;
const PREC_POSTFIX: u8 = 17;
const PREC_CALL: u8 = 18;
const PREC_PRIMARY: u8 = 19;

/// Prints the whole program.
pub fn print(tree: &Tree) -> String {
    let mut printer = Printer::new(tree);
    for &stmt in tree.statements(tree.root()) {
        printer.statement(stmt);
    }
    printer.out
}

/// Prints a single expression or statement without trailing newline.
pub fn print_node(tree: &Tree, id: NodeId) -> String {
    let mut printer = Printer::new(tree);
    if tree.kind(id).is_statement() {
        printer.statement(id);
        printer.out.trim_end().to_string()
    } else {
        printer.expr(id, PREC_SEQUENCE);
        printer.out
    }
}

struct Printer<'t> {
    tree: &'t Tree,
    out: String,
    depth: usize,
}

impl<'t> Printer<'t> {
    fn new(tree: &'t Tree) -> Self {
        Self {
            tree,
            out: String::new(),
            depth: 0,
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    /// Prints an indented statement followed by a newline.
    fn statement(&mut self, id: NodeId) {
        self.indent();
        self.statement_inline(id);
        self.push("\n");
    }

    /// Prints a statement starting at the current column.
    fn statement_inline(&mut self, id: NodeId) {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Block { .. } => self.block(id),
            NodeKind::Empty => self.push(";"),
            NodeKind::Expression { expr } => {
                if self.needs_statement_parens(*expr) {
                    self.push("(");
                    self.expr(*expr, PREC_SEQUENCE);
                    self.push(")");
                } else {
                    self.expr(*expr, PREC_SEQUENCE);
                }
                self.push(";");
            }
            NodeKind::Labeled { label, body } => {
                self.push(label);
                self.push(": ");
                self.statement_inline(*body);
            }
            NodeKind::VarDecl { kind, declarators } => {
                self.push(kind.as_str());
                self.push(" ");
                for (i, declarator) in declarators.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    if let NodeKind::Declarator { name, init } = tree.kind(*declarator) {
                        self.push(name);
                        if let Some(init) = init {
                            self.push(" = ");
                            self.expr(*init, PREC_ASSIGN);
                        }
                    }
                }
                self.push(";");
            }
            NodeKind::Return { argument } => {
                self.push("return");
                if let Some(argument) = argument {
                    self.push(" ");
                    self.expr(*argument, PREC_SEQUENCE);
                }
                self.push(";");
            }
            NodeKind::Throw { argument } => {
                self.push("throw ");
                self.expr(*argument, PREC_SEQUENCE);
                self.push(";");
            }
            NodeKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.push("if (");
                self.expr(*test, PREC_SEQUENCE);
                self.push(")");
                self.nested(*consequent);
                if let Some(alternate) = alternate {
                    if tree.is_block(*consequent) {
                        self.push(" else");
                    } else {
                        self.push("\n");
                        self.indent();
                        self.push("else");
                    }
                    if matches!(tree.kind(*alternate), NodeKind::If { .. }) {
                        self.push(" ");
                        self.statement_inline(*alternate);
                    } else {
                        self.nested(*alternate);
                    }
                }
            }
            NodeKind::While { test, body } => {
                self.push("while (");
                self.expr(*test, PREC_SEQUENCE);
                self.push(")");
                self.nested(*body);
            }
            NodeKind::Break { label } => self.jump("break", label.as_deref()),
            NodeKind::Continue { label } => self.jump("continue", label.as_deref()),
            NodeKind::Function { .. } => self.function(id),
            NodeKind::Class { .. } => self.class(id),
            kind if !kind.is_statement() => self.expr(id, PREC_SEQUENCE),
            _ => {}
        }
    }

    fn jump(&mut self, keyword: &str, label: Option<&str>) {
        self.push(keyword);
        if let Some(label) = label {
            self.push(" ");
            self.push(label);
        }
        self.push(";");
    }

    /// Body of `if`/`while`/`else`: blocks stay on the same line, other
    /// statements go on the next line one level deeper.
    fn nested(&mut self, id: NodeId) {
        if self.tree.is_block(id) {
            self.push(" ");
            self.block(id);
        } else {
            self.push("\n");
            self.depth += 1;
            self.indent();
            self.statement_inline(id);
            self.depth -= 1;
        }
    }

    fn block(&mut self, id: NodeId) {
        let tree = self.tree;
        let body = tree.statements(id);
        if body.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{\n");
        self.depth += 1;
        for &stmt in body {
            self.statement(stmt);
        }
        self.depth -= 1;
        self.indent();
        self.push("}");
    }

    fn params(&mut self, params: &[String]) {
        self.push("(");
        self.push(&params.join(", "));
        self.push(")");
    }

    fn function(&mut self, id: NodeId) {
        let tree = self.tree;
        let NodeKind::Function {
            name,
            params,
            body,
            form,
            is_async,
            is_generator,
        } = tree.kind(id)
        else {
            return;
        };
        if *form == FunctionForm::Arrow {
            if *is_async {
                self.push("async ");
            }
            self.params(params);
            self.push(" => ");
            if tree.is_block(*body) {
                self.block(*body);
            } else if matches!(tree.kind(self.leftmost(*body)), NodeKind::Object { .. }) {
                self.push("(");
                self.expr(*body, PREC_ASSIGN);
                self.push(")");
            } else {
                self.expr(*body, PREC_ASSIGN);
            }
            return;
        }
        if *is_async {
            self.push("async ");
        }
        self.push("function");
        if *is_generator {
            self.push("*");
        }
        if let Some(name) = name {
            self.push(" ");
            self.push(name);
        }
        self.params(params);
        self.push(" ");
        self.block(*body);
    }

    fn class(&mut self, id: NodeId) {
        let tree = self.tree;
        let NodeKind::Class {
            name,
            superclass,
            body,
            ..
        } = tree.kind(id)
        else {
            return;
        };
        self.push("class");
        if let Some(name) = name {
            self.push(" ");
            self.push(name);
        }
        if let Some(superclass) = superclass {
            self.push(" extends ");
            self.expr(*superclass, PREC_CALL);
        }
        self.push(" ");
        let NodeKind::ClassBody { members } = tree.kind(*body) else {
            self.push("{}");
            return;
        };
        if members.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{\n");
        self.depth += 1;
        for &member in members {
            self.indent();
            self.method(member);
            self.push("\n");
        }
        self.depth -= 1;
        self.indent();
        self.push("}");
    }

    fn method(&mut self, id: NodeId) {
        let tree = self.tree;
        let NodeKind::Method {
            key,
            kind,
            is_static,
            is_async,
            is_generator,
            params,
            body,
        } = tree.kind(id)
        else {
            return;
        };
        if *is_static {
            self.push("static ");
        }
        match kind {
            MethodKind::Getter => self.push("get "),
            MethodKind::Setter => self.push("set "),
            MethodKind::Method | MethodKind::Constructor => {}
        }
        if *is_async {
            self.push("async ");
        }
        if *is_generator {
            self.push("*");
        }
        self.key(key);
        self.params(params);
        self.push(" ");
        self.block(*body);
    }

    fn key(&mut self, key: &Key) {
        match key {
            Key::Named(name) => self.push(name),
            Key::Str(value) => self.push(&quote(value)),
            Key::Computed(id) => {
                self.push("[");
                self.expr(*id, PREC_ASSIGN);
                self.push("]");
            }
        }
    }

    /// An expression statement may not start with `{`, `function` or `class`.
    fn needs_statement_parens(&self, expr: NodeId) -> bool {
        match self.tree.kind(self.leftmost(expr)) {
            NodeKind::Object { .. } | NodeKind::Class { .. } => true,
            NodeKind::Function { form, .. } => *form != FunctionForm::Arrow,
            _ => false,
        }
    }

    /// The node whose text starts the printed form of `expr`.
    fn leftmost(&self, expr: NodeId) -> NodeId {
        let tree = self.tree;
        let mut current = expr;
        loop {
            match tree.kind(current) {
                NodeKind::Call { callee, .. } => current = *callee,
                NodeKind::Member { object, .. } => current = *object,
                NodeKind::Binary { left, .. } => current = *left,
                NodeKind::Assign { target, .. } => current = *target,
                NodeKind::Conditional { test, .. } => current = *test,
                NodeKind::Update {
                    prefix: false,
                    argument,
                    ..
                } => current = *argument,
                NodeKind::Sequence { expressions } => match expressions.first() {
                    Some(first) => current = *first,
                    None => return current,
                },
                _ => return current,
            }
        }
    }

    /// `new f()()` would call the result of `new f()`; a call anywhere in the
    /// callee's member chain needs parentheses.
    fn callee_has_call(&self, callee: NodeId) -> bool {
        let mut current = callee;
        loop {
            match self.tree.kind(current) {
                NodeKind::Call { .. } => return true,
                NodeKind::Member { object, .. } => current = *object,
                _ => return false,
            }
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn precedence(&self, id: NodeId) -> u8 {
        match self.tree.kind(id) {
            NodeKind::Sequence { .. } => PREC_SEQUENCE,
            NodeKind::Assign { .. } | NodeKind::Yield { .. } => PREC_ASSIGN,
            NodeKind::Function {
                form: FunctionForm::Arrow,
                ..
            } => PREC_ASSIGN,
            NodeKind::Conditional { .. } => PREC_CONDITIONAL,
            NodeKind::Binary { operator, .. } => PREC_BINARY_BASE + binary_precedence(operator),
            NodeKind::Unary { .. } => PREC_PREFIX,
            NodeKind::Update { prefix: true, .. } => PREC_PREFIX,
            NodeKind::Update { prefix: false, .. } => PREC_POSTFIX,
            NodeKind::Call { .. } | NodeKind::New { .. } | NodeKind::Member { .. } => PREC_CALL,
            _ => PREC_PRIMARY,
        }
    }

    fn expr(&mut self, id: NodeId, min_precedence: u8) {
        if self.precedence(id) < min_precedence {
            self.push("(");
            self.expr_unwrapped(id);
            self.push(")");
        } else {
            self.expr_unwrapped(id);
        }
    }

    fn list(&mut self, items: &[NodeId]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(*item, PREC_ASSIGN);
        }
    }

    fn expr_unwrapped(&mut self, id: NodeId) {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Ident(name) => self.push(name),
            NodeKind::This => self.push("this"),
            NodeKind::Number(raw) => self.push(raw),
            NodeKind::Str(value) => self.push(&quote(value)),
            NodeKind::RawStr(raw) => self.push(raw),
            NodeKind::Bool(value) => self.push(if *value { "true" } else { "false" }),
            NodeKind::Null => self.push("null"),
            NodeKind::Placeholder(name) => {
                self.push("%%");
                self.push(name);
                self.push("%%");
            }
            NodeKind::Array { elements } => {
                self.push("[");
                self.list(elements);
                self.push("]");
            }
            NodeKind::Object { properties } => {
                if properties.is_empty() {
                    self.push("{}");
                    return;
                }
                self.push("{ ");
                for (i, property) in properties.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr_unwrapped(*property);
                }
                self.push(" }");
            }
            NodeKind::Property {
                key,
                value,
                shorthand,
            } => {
                self.key(key);
                if !shorthand {
                    self.push(": ");
                    self.expr(*value, PREC_ASSIGN);
                }
            }
            NodeKind::Call { callee, arguments } => {
                self.expr(*callee, PREC_CALL);
                self.push("(");
                self.list(arguments);
                self.push(")");
            }
            NodeKind::New { callee, arguments } => {
                self.push("new ");
                if self.callee_has_call(*callee) {
                    self.push("(");
                    self.expr_unwrapped(*callee);
                    self.push(")");
                } else {
                    self.expr(*callee, PREC_CALL);
                }
                self.push("(");
                self.list(arguments);
                self.push(")");
            }
            NodeKind::Member { object, property } => {
                let bare_integer = matches!(property, Key::Named(_))
                    && matches!(tree.kind(*object), NodeKind::Number(raw)
                        if raw.chars().all(|c| c.is_ascii_digit() || c == '_'));
                if bare_integer {
                    self.push("(");
                    self.expr_unwrapped(*object);
                    self.push(")");
                } else {
                    self.expr(*object, PREC_CALL);
                }
                match property {
                    Key::Computed(index) => {
                        self.push("[");
                        self.expr(*index, PREC_SEQUENCE);
                        self.push("]");
                    }
                    Key::Named(name) => {
                        self.push(".");
                        self.push(name);
                    }
                    Key::Str(value) => {
                        self.push("[");
                        self.push(&quote(value));
                        self.push("]");
                    }
                }
            }
            NodeKind::Unary { operator, argument } => {
                self.push(operator);
                if operator.chars().all(|c| c.is_ascii_alphabetic()) {
                    self.push(" ");
                } else if self.starts_with_same_sign(operator, *argument) {
                    self.push(" ");
                }
                self.expr(*argument, PREC_PREFIX);
            }
            NodeKind::Update {
                operator,
                prefix,
                argument,
            } => {
                if *prefix {
                    self.push(operator);
                    self.expr(*argument, PREC_PREFIX);
                } else {
                    self.expr(*argument, PREC_POSTFIX);
                    self.push(operator);
                }
            }
            NodeKind::Binary {
                operator,
                left,
                right,
            } => {
                let precedence = PREC_BINARY_BASE + binary_precedence(operator);
                let (mut left_min, mut right_min) = if is_right_associative(operator) {
                    (precedence + 1, precedence)
                } else {
                    (precedence, precedence + 1)
                };
                // A unary operand of `**` must be parenthesized.
                if operator == "**" {
                    left_min = PREC_POSTFIX;
                }
                // `??` cannot be mixed with `||` or `&&` without parentheses.
                if self.mixes_nullish(operator, *left) {
                    left_min = PREC_PRIMARY;
                }
                if self.mixes_nullish(operator, *right) {
                    right_min = PREC_PRIMARY;
                }
                self.expr(*left, left_min);
                self.push(" ");
                self.push(operator);
                self.push(" ");
                self.expr(*right, right_min);
            }
            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(*test, PREC_CONDITIONAL + 1);
                self.push(" ? ");
                self.expr(*consequent, PREC_ASSIGN);
                self.push(" : ");
                self.expr(*alternate, PREC_ASSIGN);
            }
            NodeKind::Assign {
                operator,
                target,
                value,
            } => {
                self.expr(*target, PREC_POSTFIX);
                self.push(" ");
                self.push(operator);
                self.push(" ");
                self.expr(*value, PREC_ASSIGN);
            }
            NodeKind::Sequence { expressions } => {
                for (i, item) in expressions.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(*item, PREC_ASSIGN);
                }
            }
            NodeKind::Yield { argument, delegate } => {
                self.push("yield");
                if *delegate {
                    self.push("*");
                }
                if let Some(argument) = argument {
                    self.push(" ");
                    self.expr(*argument, PREC_ASSIGN);
                }
            }
            NodeKind::Function { .. } => self.function(id),
            NodeKind::Class { .. } => self.class(id),
            NodeKind::Method { .. } => self.method(id),
            kind if kind.is_statement() => self.statement_inline(id),
            _ => {}
        }
    }

    fn mixes_nullish(&self, operator: &str, operand: NodeId) -> bool {
        let NodeKind::Binary { operator: inner, .. } = self.tree.kind(operand) else {
            return false;
        };
        let logical = |op: &str| op == "||" || op == "&&";
        (operator == "??" && logical(inner)) || (inner == "??" && logical(operator))
    }

    /// `- -x` and `+ +x` must keep a space to avoid printing `--x`.
    fn starts_with_same_sign(&self, operator: &str, argument: NodeId) -> bool {
        match self.tree.kind(argument) {
            NodeKind::Unary { operator: inner, .. }
            | NodeKind::Update {
                operator: inner,
                prefix: true,
                ..
            } => inner.starts_with(operator),
            _ => false,
        }
    }
}

/// Double-quoted JavaScript string literal.
pub fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()))
}

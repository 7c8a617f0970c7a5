// Restricted arithmetic expressions for user-defined transition rules.
//
// The functional rule strategy lets the user type a formula that is
// evaluated once per rule-matrix cell. The text comes straight from a form
// field, so it is treated as untrusted input: a small hand-written
// tokenizer and recursive-descent parser accept integer literals, the
// three rule variables, `+ - * %`, unary minus, and parentheses, nothing
// else. No calls, no loops, no assignment.
//
// Parse depth and literal size are bounded, and evaluation uses checked
// arithmetic throughout, so malformed or adversarial input fails with an
// `ExprError` instead of wrapping, recursing without bound, or panicking.
//
// `%` is the euclidean remainder: for a positive divisor the result is
// always non-negative, which is what rule formulas like
// `(state + neighbor_sum) % num_states` rely on.
//
// Used by rule.rs when building a matrix from `RuleStrategy::Functional`.

use std::fmt;

/// Maximum nesting depth accepted by the parser. Deep enough for any
/// plausible rule formula, shallow enough to keep recursion bounded on
/// adversarial input.
const MAX_DEPTH: usize = 64;

/// Maximum token count. A long flat chain like `1 + 1 + …` parses without
/// deep grammar nesting but still builds a left-deep tree, so evaluation
/// recursion is bounded by the token count. Capping it keeps both sides
/// bounded.
const MAX_TOKENS: usize = 1024;

/// Why an expression failed to parse or evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Unexpected character, unexpected token, or trailing input.
    Syntax(String),
    /// An identifier other than `state`, `neighbor_sum`, or `num_states`.
    UnknownIdentifier(String),
    /// The right-hand side of `%` evaluated to zero.
    RemainderByZero,
    /// A literal or intermediate result does not fit in `i64`.
    Overflow,
    /// Nesting exceeded the parser's depth limit.
    TooDeep,
    /// The expression has more tokens than the evaluator accepts.
    TooLong,
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::Syntax(msg) => write!(f, "syntax error: {msg}"),
            ExprError::UnknownIdentifier(name) => {
                write!(f, "unknown identifier '{name}'")
            }
            ExprError::RemainderByZero => write!(f, "remainder by zero"),
            ExprError::Overflow => write!(f, "arithmetic overflow"),
            ExprError::TooDeep => write!(f, "expression nested too deeply"),
            ExprError::TooLong => write!(f, "expression too long"),
        }
    }
}

impl std::error::Error for ExprError {}

/// The three variables a rule formula may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Var {
    State,
    NeighborSum,
    NumStates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Rem,
}

/// Parsed expression tree. Evaluation recursion is bounded by the parse
/// depth limit, so `eval` cannot blow the stack on any accepted input.
#[derive(Debug, Clone)]
enum Ast {
    Literal(i64),
    Variable(Var),
    Negate(Box<Ast>),
    Binary(Op, Box<Ast>, Box<Ast>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Percent,
    LParen,
    RParen,
}

/// A compiled rule expression. Parse once, evaluate per matrix cell.
#[derive(Debug, Clone)]
pub struct Expr {
    ast: Ast,
}

impl Expr {
    /// Parse an expression, rejecting anything outside the restricted
    /// grammar. Unknown identifiers are rejected here rather than at
    /// evaluation time.
    pub fn parse(text: &str) -> Result<Expr, ExprError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let ast = parser.expression(0)?;
        if parser.pos != parser.tokens.len() {
            return Err(ExprError::Syntax(format!(
                "unexpected trailing input at token {}",
                parser.pos
            )));
        }
        Ok(Expr { ast })
    }

    /// Evaluate with the given variable bindings.
    pub fn eval(
        &self,
        state: i64,
        neighbor_sum: i64,
        num_states: i64,
    ) -> Result<i64, ExprError> {
        eval_node(&self.ast, state, neighbor_sum, num_states)
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' => {
                let mut value: i64 = 0;
                while let Some(&d) = chars.peek() {
                    let Some(digit) = d.to_digit(10) else { break };
                    chars.next();
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(i64::from(digit)))
                        .ok_or(ExprError::Overflow)?;
                }
                tokens.push(Token::Int(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => {
                return Err(ExprError::Syntax(format!("unexpected character '{other}'")));
            }
        }
        if tokens.len() > MAX_TOKENS {
            return Err(ExprError::TooLong);
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    // expression := term (('+' | '-') term)*
    fn expression(&mut self, depth: usize) -> Result<Ast, ExprError> {
        if depth > MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        let mut node = self.term(depth + 1)?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Op::Add,
                Some(Token::Minus) => Op::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term(depth + 1)?;
            node = Ast::Binary(op, Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    // term := unary (('*' | '%') unary)*
    fn term(&mut self, depth: usize) -> Result<Ast, ExprError> {
        if depth > MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        let mut node = self.unary(depth + 1)?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Op::Mul,
                Some(Token::Percent) => Op::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary(depth + 1)?;
            node = Ast::Binary(op, Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    // unary := '-' unary | primary
    fn unary(&mut self, depth: usize) -> Result<Ast, ExprError> {
        if depth > MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            let inner = self.unary(depth + 1)?;
            return Ok(Ast::Negate(Box::new(inner)));
        }
        self.primary(depth + 1)
    }

    // primary := integer | identifier | '(' expression ')'
    fn primary(&mut self, depth: usize) -> Result<Ast, ExprError> {
        if depth > MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ExprError::Syntax("unexpected end of expression".into()))?;
        match token {
            Token::Int(value) => {
                self.pos += 1;
                Ok(Ast::Literal(value))
            }
            Token::Ident(name) => {
                self.pos += 1;
                let var = match name.as_str() {
                    "state" => Var::State,
                    "neighbor_sum" => Var::NeighborSum,
                    "num_states" => Var::NumStates,
                    _ => return Err(ExprError::UnknownIdentifier(name)),
                };
                Ok(Ast::Variable(var))
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.expression(depth + 1)?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(ExprError::Syntax("expected ')'".into()));
                }
                self.pos += 1;
                Ok(inner)
            }
            other => Err(ExprError::Syntax(format!("unexpected token {other:?}"))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }
}

fn eval_node(
    node: &Ast,
    state: i64,
    neighbor_sum: i64,
    num_states: i64,
) -> Result<i64, ExprError> {
    match node {
        Ast::Literal(value) => Ok(*value),
        Ast::Variable(Var::State) => Ok(state),
        Ast::Variable(Var::NeighborSum) => Ok(neighbor_sum),
        Ast::Variable(Var::NumStates) => Ok(num_states),
        Ast::Negate(inner) => {
            let v = eval_node(inner, state, neighbor_sum, num_states)?;
            v.checked_neg().ok_or(ExprError::Overflow)
        }
        Ast::Binary(op, lhs, rhs) => {
            let a = eval_node(lhs, state, neighbor_sum, num_states)?;
            let b = eval_node(rhs, state, neighbor_sum, num_states)?;
            match op {
                Op::Add => a.checked_add(b).ok_or(ExprError::Overflow),
                Op::Sub => a.checked_sub(b).ok_or(ExprError::Overflow),
                Op::Mul => a.checked_mul(b).ok_or(ExprError::Overflow),
                Op::Rem => {
                    if b == 0 {
                        Err(ExprError::RemainderByZero)
                    } else {
                        a.checked_rem_euclid(b).ok_or(ExprError::Overflow)
                    }
                }
            }
        }
    }
}

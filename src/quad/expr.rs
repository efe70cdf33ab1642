use std::f64::consts::PI;

use crate::QuadError;

/// A compiled scalar function of (x, y, z).
///
/// Built once per calculation from the user's TeX-like expression text and
/// discarded afterwards. Evaluation is total: domain faults surface as the
/// IEEE NaN/infinity values the arithmetic produces, never as an error.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    root: Expr,
}

impl CompiledExpr {
    pub fn eval(&self, x: f64, y: f64, z: f64) -> f64 {
        eval_node(&self.root, x, y, z)
    }
}

/// Compiles a TeX-like expression into an evaluable function of (x, y, z).
///
/// The text is first translated to plain arithmetic (function macros mapped,
/// unknown macros stripped, grouping braces stripped, implicit multiplication
/// inserted), then parsed into an AST. No code generation is involved.
pub fn compile(expr: &str) -> Result<CompiledExpr, QuadError> {
    let translated = insert_implicit_mul(&translate_tex(expr));
    let tokens = tokenize(&translated).map_err(QuadError::ExpressionSyntax)?;

    if tokens.is_empty() {
        return Err(QuadError::ExpressionSyntax("expression is empty".to_string()));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let root = parser.parse_expr().map_err(QuadError::ExpressionSyntax)?;
    parser.expect_end().map_err(QuadError::ExpressionSyntax)?;

    Ok(CompiledExpr { root })
}

// --- AST ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone)]
enum Expr {
    Num(f64),
    Var(Axis),
    Neg(Box<Expr>),
    Bin(Op, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

fn eval_node(node: &Expr, x: f64, y: f64, z: f64) -> f64 {
    match node {
        Expr::Num(v) => *v,
        Expr::Var(Axis::X) => x,
        Expr::Var(Axis::Y) => y,
        Expr::Var(Axis::Z) => z,
        Expr::Neg(inner) => -eval_node(inner, x, y, z),
        Expr::Bin(op, lhs, rhs) => {
            let l = eval_node(lhs, x, y, z);
            let r = eval_node(rhs, x, y, z);
            match op {
                Op::Add => l + r,
                Op::Sub => l - r,
                Op::Mul => l * r,
                Op::Div => l / r,
                Op::Pow => l.powf(r),
            }
        }
        Expr::Call(func, arg) => {
            let v = eval_node(arg, x, y, z);
            match func {
                Func::Sin => v.sin(),
                Func::Cos => v.cos(),
                Func::Tan => v.tan(),
                Func::Exp => v.exp(),
                Func::Log => v.ln(),
                Func::Sqrt => v.sqrt(),
            }
        }
    }
}

// --- TeX translation ---

/// Rewrites TeX-like notation into plain arithmetic text.
///
/// Known macros are mapped (\sin, \frac{a}{b}, \cdot, ...), \left/\right
/// markers are dropped, any other backslash command is stripped rather than
/// rejected, and grouping braces are removed once translation has consumed
/// the ones it needs.
fn translate_tex(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            let start = i + 1;
            let mut j = start;
            while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            if j == start {
                // Lone backslash; leave it for the tokenizer to reject.
                out.push('\\');
                i += 1;
                continue;
            }
            let word: String = chars[start..j].iter().collect();
            i = j;
            match word.as_str() {
                "sin" | "cos" | "tan" | "exp" | "sqrt" => out.push_str(&word),
                "log" | "ln" => out.push_str("log"),
                "pi" => out.push_str("pi"),
                "cdot" | "times" => out.push('*'),
                "div" => out.push('/'),
                // The delimiter that follows survives on its own.
                "left" | "right" => {}
                "frac" => {
                    if let Some((numerator, rest)) = brace_group(&chars, i) {
                        if let Some((denominator, rest2)) = brace_group(&chars, rest) {
                            out.push('(');
                            out.push_str(&translate_tex(&numerator));
                            out.push_str(")/(");
                            out.push_str(&translate_tex(&denominator));
                            out.push(')');
                            i = rest2;
                        }
                        // Malformed \frac falls through as a stripped macro.
                    }
                }
                // Unrecognized command: strip it, keep going.
                _ => {}
            }
        } else if c == '{' || c == '}' {
            i += 1;
        } else {
            out.push(c);
            i += 1;
        }
    }

    out
}

/// Reads a balanced {...} group starting at `from`; returns its contents and
/// the index just past the closing brace.
fn brace_group(chars: &[char], from: usize) -> Option<(String, usize)> {
    if from >= chars.len() || chars[from] != '{' {
        return None;
    }
    let mut depth = 1;
    let mut j = from + 1;
    while j < chars.len() {
        match chars[j] {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let content: String = chars[from + 1..j].iter().collect();
                    return Some((content, j + 1));
                }
            }
            _ => {}
        }
        j += 1;
    }
    None
}

/// Inserts the multiplication a user left implicit: between a numeral and a
/// variable letter (either order) and between adjacent variable letters.
fn insert_implicit_mul(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let prev_var = matches!(prev, 'x' | 'y' | 'z');
            let here_var = matches!(c, 'x' | 'y' | 'z');
            if (prev.is_ascii_digit() && here_var)
                || (prev_var && c.is_ascii_digit())
                || (prev_var && here_var)
            {
                out.push('*');
            }
        }
        out.push(c);
    }

    out
}

// --- Tokenizer ---

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Word(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // Scientific notation: consume e/E only when an exponent follows.
            if chars.get(i).is_some_and(|&e| e == 'e' || e == 'E') {
                let mut k = i + 1;
                if chars.get(k).is_some_and(|&s| s == '+' || s == '-') {
                    k += 1;
                }
                if chars.get(k).is_some_and(|d| d.is_ascii_digit()) {
                    i = k;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let literal: String = chars[start..i].iter().collect();
            let value: f64 = literal
                .parse()
                .map_err(|_| format!("invalid number literal {:?}", literal))?;
            tokens.push(Token::Num(value));
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            tokens.push(Token::Word(chars[start..i].iter().collect()));
        } else {
            match c {
                '+' => tokens.push(Token::Plus),
                '-' => tokens.push(Token::Minus),
                '*' => {
                    // The original notation's JS target also accepted **.
                    if chars.get(i + 1) == Some(&'*') {
                        tokens.push(Token::Caret);
                        i += 1;
                    } else {
                        tokens.push(Token::Star);
                    }
                }
                '/' => tokens.push(Token::Slash),
                '^' => tokens.push(Token::Caret),
                '(' => tokens.push(Token::LParen),
                ')' => tokens.push(Token::RParen),
                '[' => tokens.push(Token::LBracket),
                ']' => tokens.push(Token::RBracket),
                _ => return Err(format!("unexpected character {:?}", c)),
            }
            i += 1;
        }
    }

    Ok(tokens)
}

// --- Parser ---

// expr   := term (('+' | '-') term)*
// term   := unary (('*' | '/') unary)*
// unary  := ('-' | '+') unary | power
// power  := atom ('^' unary)?          -- right-associative
// atom   := number | variable | pi | func '(' expr ')' | '(' expr ')' | '[' expr ']'
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token, context: &str) -> Result<(), String> {
        match self.advance() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(format!("expected {} but found {:?}", context, t)),
            None => Err(format!("expected {} but the expression ended", context)),
        }
    }

    fn expect_end(&self) -> Result<(), String> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(format!("unexpected {:?} after the expression", t)),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Op::Add,
                Some(Token::Minus) => Op::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Op::Mul,
                Some(Token::Slash) => Op::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, String> {
        let base = self.parse_atom()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Expr::Bin(Op::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::Num(v)) => Ok(Expr::Num(v)),
            Some(Token::Word(word)) => match word.as_str() {
                "x" => Ok(Expr::Var(Axis::X)),
                "y" => Ok(Expr::Var(Axis::Y)),
                "z" => Ok(Expr::Var(Axis::Z)),
                "pi" => Ok(Expr::Num(PI)),
                _ => {
                    let func = match word.as_str() {
                        "sin" => Func::Sin,
                        "cos" => Func::Cos,
                        "tan" => Func::Tan,
                        "exp" => Func::Exp,
                        "log" | "ln" => Func::Log,
                        "sqrt" => Func::Sqrt,
                        _ => return Err(format!("unknown identifier {:?}", word)),
                    };
                    self.expect(Token::LParen, &format!("'(' after {}", word))?;
                    let arg = self.parse_expr()?;
                    self.expect(Token::RParen, "')'")?;
                    Ok(Expr::Call(func, Box::new(arg)))
                }
            },
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::LBracket) => {
                let inner = self.parse_expr()?;
                self.expect(Token::RBracket, "']'")?;
                Ok(inner)
            }
            Some(t) => Err(format!("unexpected {:?}", t)),
            None => Err("the expression ended unexpectedly".to_string()),
        }
    }
}

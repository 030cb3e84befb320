use super::lexer::{Spanned, Token, tokenize};
use super::{MAX_DEPTH, MAX_SOURCE_LEN, MAX_STATEMENTS, PolicyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Str(String),
    Bool(bool),
    Var(String),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

/// `target = value`, with or without a leading `let`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub target: String,
    pub value: Expr,
    pub line: usize,
}

/// A parsed policy, ready to evaluate any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

pub fn parse(src: &str) -> Result<Program, PolicyError> {
    if src.len() > MAX_SOURCE_LEN {
        return Err(PolicyError::TooLong(src.len()));
    }
    let tokens = tokenize(src)?;
    Parser {
        tokens,
        pos: 0,
        depth: 0,
    }
    .program()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn line(&self) -> usize {
        self.tokens[self.pos].line
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), PolicyError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}, found {:?}", self.peek())))
        }
    }

    fn error(&self, msg: String) -> PolicyError {
        PolicyError::Syntax {
            line: self.line(),
            msg,
        }
    }

    fn program(mut self) -> Result<Program, PolicyError> {
        let mut stmts = Vec::new();
        loop {
            while self.eat(&Token::Sep) {}
            if *self.peek() == Token::Eof {
                break;
            }
            if stmts.len() == MAX_STATEMENTS {
                return Err(PolicyError::TooManyStatements(MAX_STATEMENTS));
            }
            stmts.push(self.statement()?);
            if !matches!(self.peek(), Token::Sep | Token::Eof) {
                return Err(self.error(format!(
                    "expected end of statement, found {:?}",
                    self.peek()
                )));
            }
        }
        Ok(Program { stmts })
    }

    fn statement(&mut self) -> Result<Stmt, PolicyError> {
        let line = self.line();
        self.eat(&Token::Let);
        let target = match self.advance() {
            Token::Ident(name) => name,
            other => return Err(self.error(format!("expected variable name, found {other:?}"))),
        };
        self.expect(Token::Assign, "`=`")?;
        let value = self.expr()?;
        Ok(Stmt {
            target,
            value,
            line,
        })
    }

    /// One more level of tree nesting, counted against `MAX_DEPTH`.
    fn deepen(&mut self) -> Result<(), PolicyError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(PolicyError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr, PolicyError> {
        self.deepen()?;
        let out = self.or_expr();
        self.depth -= 1;
        out
    }

    // Left-associative chains nest one level per operator, so every fold
    // below deepens the tree until the chain ends.

    fn or_expr(&mut self) -> Result<Expr, PolicyError> {
        let start = self.depth;
        let mut lhs = self.and_expr()?;
        while self.eat(&Token::Or) {
            self.deepen()?;
            let rhs = self.and_expr()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        self.depth = start;
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, PolicyError> {
        let start = self.depth;
        let mut lhs = self.not_expr()?;
        while self.eat(&Token::And) {
            self.deepen()?;
            let rhs = self.not_expr()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        self.depth = start;
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, PolicyError> {
        if self.eat(&Token::Not) {
            let inner = self.nested(Self::not_expr)?;
            return Ok(Expr::Unary(UnOp::Not, Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, PolicyError> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Token::Lt => BinOp::Lt,
            Token::Le => BinOp::Le,
            Token::Gt => BinOp::Gt,
            Token::Ge => BinOp::Ge,
            Token::EqEq => BinOp::Eq,
            Token::Ne => BinOp::Ne,
            _ => return Ok(lhs),
        };
        self.advance();
        self.deepen()?;
        let rhs = self.additive();
        self.depth -= 1;
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs?)))
    }

    fn additive(&mut self) -> Result<Expr, PolicyError> {
        let start = self.depth;
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            self.deepen()?;
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth = start;
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, PolicyError> {
        let start = self.depth;
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            self.deepen()?;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth = start;
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, PolicyError> {
        if self.eat(&Token::Minus) {
            let inner = self.nested(Self::unary)?;
            return Ok(Expr::Unary(UnOp::Neg, Box::new(inner)));
        }
        self.primary()
    }

    /// Recurse through `f` while counting towards the depth limit.
    fn nested(
        &mut self,
        f: fn(&mut Self) -> Result<Expr, PolicyError>,
    ) -> Result<Expr, PolicyError> {
        self.deepen()?;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn primary(&mut self) -> Result<Expr, PolicyError> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Num(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::If => {
                let cond = self.expr()?;
                self.expect(Token::Then, "`then`")?;
                let then = self.expr()?;
                self.expect(Token::Else, "`else`")?;
                let otherwise = self.expr()?;
                Ok(Expr::If(Box::new(cond), Box::new(then), Box::new(otherwise)))
            }
            Token::Ident(name) => {
                if !self.eat(&Token::LParen) {
                    return Ok(Expr::Var(name));
                }
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.expect(Token::Comma, "`,` or `)`")?;
                    }
                }
                Ok(Expr::Call(name, args))
            }
            other => Err(self.error(format!("unexpected {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(src: &str) -> Expr {
        let program = parse(src).unwrap();
        assert_eq!(program.stmts.len(), 1);
        program.stmts.into_iter().next().unwrap().value
    }

    #[test]
    fn precedence_mul_over_add_and_cmp_over_and() {
        let e = single("x = 1 + 2 * 3 > 4 and true");
        let expected = Expr::Binary(
            BinOp::And,
            Box::new(Expr::Binary(
                BinOp::Gt,
                Box::new(Expr::Binary(
                    BinOp::Add,
                    Box::new(Expr::Num(1.0)),
                    Box::new(Expr::Binary(
                        BinOp::Mul,
                        Box::new(Expr::Num(2.0)),
                        Box::new(Expr::Num(3.0)),
                    )),
                )),
                Box::new(Expr::Num(4.0)),
            )),
            Box::new(Expr::Bool(true)),
        );
        assert_eq!(e, expected);
    }

    #[test]
    fn if_and_calls() {
        let e = single("let best_pool = if price('poolA') > 0.05 then 'poolA' else best_by(-gas)");
        match e {
            Expr::If(cond, then, otherwise) => {
                assert!(matches!(*cond, Expr::Binary(BinOp::Gt, _, _)));
                assert_eq!(*then, Expr::Str("poolA".into()));
                assert!(matches!(*otherwise, Expr::Call(ref name, ref args) if name == "best_by" && args.len() == 1));
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn statements_split_on_newlines_and_semicolons() {
        let program = parse("\n# pick\nlet a = 1; b = a\n\nbest_pool = 'poolA'\n").unwrap();
        let targets: Vec<&str> = program.stmts.iter().map(|s| s.target.as_str()).collect();
        assert_eq!(targets, vec!["a", "b", "best_pool"]);
        assert_eq!(program.stmts[2].line, 5);
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(parse("best_pool ="), Err(PolicyError::Syntax { .. })));
        assert!(matches!(parse("1 = 2"), Err(PolicyError::Syntax { .. })));
        assert!(matches!(parse("x = (1 + 2"), Err(PolicyError::Syntax { .. })));
        assert!(matches!(parse("x = 1 y = 2"), Err(PolicyError::Syntax { .. })));
        assert!(matches!(parse("x = if true then 1"), Err(PolicyError::Syntax { .. })));
    }

    #[test]
    fn limits_are_enforced() {
        let long = format!("x = '{}'", "a".repeat(MAX_SOURCE_LEN));
        assert!(matches!(parse(&long), Err(PolicyError::TooLong(_))));

        let many = "x = 1\n".repeat(MAX_STATEMENTS + 1);
        assert!(matches!(parse(&many), Err(PolicyError::TooManyStatements(_))));

        let deep = format!("x = {}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(matches!(parse(&deep), Err(PolicyError::TooDeep(_))));

        let negs = format!("x = {}1", "-".repeat(MAX_DEPTH + 1));
        assert!(matches!(parse(&negs), Err(PolicyError::TooDeep(_))));
    }

    #[test]
    fn flat_operator_chains_count_towards_depth() {
        // Fills the whole source budget without a single bracket.
        let sum = format!("x = {}1", "1+".repeat((MAX_SOURCE_LEN - 5) / 2));
        assert!(sum.len() <= MAX_SOURCE_LEN);
        assert!(matches!(parse(&sum), Err(PolicyError::TooDeep(_))));

        let product = format!("x = {}2", "2*".repeat((MAX_SOURCE_LEN - 5) / 2));
        assert!(matches!(parse(&product), Err(PolicyError::TooDeep(_))));

        let conj = format!("x = {}true", "true and ".repeat((MAX_SOURCE_LEN - 8) / 9));
        assert!(conj.len() <= MAX_SOURCE_LEN);
        assert!(matches!(parse(&conj), Err(PolicyError::TooDeep(_))));

        let disj = format!("x = {}false", "false or ".repeat(400));
        assert!(matches!(parse(&disj), Err(PolicyError::TooDeep(_))));

        // Depth is released when a chain ends.
        let ok = format!("x = {}1\ny = {}1", "1+".repeat(20), "1*".repeat(20));
        assert_eq!(parse(&ok).unwrap().stmts.len(), 2);
    }
}

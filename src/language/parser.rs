use crate::language::ast::{
    AssignOp, BinaryOp, Declarator, Expr, ExprKind, FunctionDef, Lit, Module, Param, Stmt,
    UnaryOp,
};
use crate::language::error::Diagnostic;
use crate::language::lexer::{Token, TokenKind, lex};
use crate::language::types::{KernelTarget, Type};

pub(crate) fn parse_module(src: &str) -> Result<Module, Diagnostic> {
    let tokens = lex(src)?;
    let mut p = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let mut functions = Vec::new();
    while p.peek().kind != TokenKind::Eof {
        functions.push(p.parse_function()?);
    }
    Ok(Module { functions })
}

/// Deepest statement or expression nesting the parser accepts.
const MAX_NESTING: usize = 128;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) => format!("identifier '{s}'"),
        TokenKind::Int(v) => format!("integer {v}"),
        TokenKind::Float(v) => format!("number {v}"),
        TokenKind::Eof => "end of input".to_owned(),
        TokenKind::LParen => "'('".to_owned(),
        TokenKind::RParen => "')'".to_owned(),
        TokenKind::LBrace => "'{'".to_owned(),
        TokenKind::RBrace => "'}'".to_owned(),
        TokenKind::Comma => "','".to_owned(),
        TokenKind::Semi => "';'".to_owned(),
        other => format!("{other:?}"),
    }
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        let i = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[i].kind
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if t.kind != TokenKind::Eof {
            self.pos += 1;
        }
        t
    }

    fn offset(&self) -> usize {
        self.peek().span.start
    }

    fn error(&self, what: &str) -> Diagnostic {
        Diagnostic::new(
            self.offset(),
            format!("expected {what}, found {}", describe(&self.peek().kind)),
        )
    }

    fn nest(&mut self, what: &str) -> Result<(), Diagnostic> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(Diagnostic::new(
                self.offset(),
                format!("{what} nesting is deeper than {MAX_NESTING} levels"),
            ));
        }
        Ok(())
    }

    fn nested<T>(
        &mut self,
        what: &str,
        f: impl FnOnce(&mut Self) -> Result<T, Diagnostic>,
    ) -> Result<T, Diagnostic> {
        self.nest(what)?;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), Diagnostic> {
        if self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(self.error(what))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn ident(&mut self, what: &str) -> Result<(String, usize), Diagnostic> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let offset = self.offset();
                self.bump();
                Ok((name, offset))
            }
            _ => Err(self.error(what)),
        }
    }

    fn type_name(&mut self) -> Result<Type, Diagnostic> {
        let offset = self.offset();
        let (name, _) = self.ident("a type name")?;
        Type::from_name(&name).ok_or_else(|| Diagnostic::new(offset, format!("unknown type '{name}'")))
    }

    fn at_declaration(&self) -> bool {
        match (&self.peek().kind, self.peek_at(1)) {
            (TokenKind::Const, _) => true,
            (TokenKind::Ident(name), TokenKind::Ident(_)) => Type::from_name(name).is_some(),
            _ => false,
        }
    }

    // ---- top level ----

    fn parse_function(&mut self) -> Result<FunctionDef, Diagnostic> {
        let offset = self.offset();
        let kernel = if self.consume(TokenKind::Kernel) {
            if self.consume(TokenKind::Reduce) {
                Some(KernelTarget::Reduce)
            } else {
                Some(KernelTarget::Normal)
            }
        } else {
            None
        };
        let ret = self.type_name()?;
        let (name, _) = self.ident("a function name")?;
        self.expect(TokenKind::LParen, "'('")?;

        let mut params = Vec::new();
        let empty_void = matches!(&self.peek().kind, TokenKind::Ident(s) if s == "void")
            && *self.peek_at(1) == TokenKind::RParen;
        if empty_void {
            self.bump();
        }
        if !self.consume(TokenKind::RParen) {
            loop {
                let is_static = self.consume(TokenKind::Static);
                self.consume(TokenKind::Const);
                let ty = self.type_name()?;
                let (pname, poffset) = self.ident("a parameter name")?;
                params.push(Param {
                    name: pname,
                    ty,
                    is_static,
                    offset: poffset,
                });
                if self.consume(TokenKind::Comma) {
                    continue;
                }
                self.expect(TokenKind::RParen, "',' or ')'")?;
                break;
            }
        }

        self.expect(TokenKind::LBrace, "'{' to open the function body")?;
        let body = self.parse_block_rest()?;
        Ok(FunctionDef {
            name,
            ret,
            params,
            body,
            kernel,
            offset,
        })
    }

    // ---- statements ----

    /// Statements up to and including the closing `}`.
    fn parse_block_rest(&mut self) -> Result<Vec<Stmt>, Diagnostic> {
        let mut out = Vec::new();
        while !self.consume(TokenKind::RBrace) {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.error("'}'"));
            }
            out.push(self.parse_stmt()?);
        }
        Ok(out)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        self.nested("statement", Self::stmt_body)
    }

    fn stmt_body(&mut self) -> Result<Stmt, Diagnostic> {
        let offset = self.offset();
        match self.peek().kind {
            TokenKind::LBrace => {
                self.bump();
                Ok(Stmt::Block(self.parse_block_rest()?))
            }
            TokenKind::Semi => {
                self.bump();
                Ok(Stmt::Empty)
            }
            TokenKind::If => {
                self.bump();
                self.expect(TokenKind::LParen, "'(' after 'if'")?;
                let cond = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                let then = Box::new(self.parse_stmt()?);
                let otherwise = if self.consume(TokenKind::Else) {
                    Some(Box::new(self.parse_stmt()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then,
                    otherwise,
                })
            }
            TokenKind::For => {
                self.bump();
                self.expect(TokenKind::LParen, "'(' after 'for'")?;
                let init = if self.consume(TokenKind::Semi) {
                    None
                } else if self.at_declaration() {
                    Some(Box::new(self.parse_decl()?))
                } else {
                    let e = self.parse_expr()?;
                    self.expect(TokenKind::Semi, "';'")?;
                    Some(Box::new(Stmt::Expr(e)))
                };
                let cond = if self.peek().kind == TokenKind::Semi {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semi, "';'")?;
                let step = if self.peek().kind == TokenKind::RParen {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::RParen, "')'")?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::For {
                    init,
                    cond,
                    step,
                    body,
                })
            }
            TokenKind::While => {
                self.bump();
                self.expect(TokenKind::LParen, "'(' after 'while'")?;
                let cond = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::While { cond, body })
            }
            TokenKind::Do => {
                self.bump();
                let body = Box::new(self.parse_stmt()?);
                self.expect(TokenKind::While, "'while' after do body")?;
                self.expect(TokenKind::LParen, "'('")?;
                let cond = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::DoWhile { body, cond })
            }
            TokenKind::Break => {
                self.bump();
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Break(offset))
            }
            TokenKind::Continue => {
                self.bump();
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Continue(offset))
            }
            TokenKind::Return => {
                self.bump();
                let value = if self.peek().kind == TokenKind::Semi {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Return { value, offset })
            }
            _ if self.at_declaration() => self.parse_decl(),
            _ => {
                let e = self.parse_expr()?;
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Expr(e))
            }
        }
    }

    fn parse_decl(&mut self) -> Result<Stmt, Diagnostic> {
        let offset = self.offset();
        let is_const = self.consume(TokenKind::Const);
        let ty = self.type_name()?;
        let mut vars = Vec::new();
        loop {
            let (name, voffset) = self.ident("a variable name")?;
            let init = if self.consume(TokenKind::Assign) {
                Some(self.parse_ternary()?)
            } else {
                None
            };
            vars.push(Declarator {
                name,
                offset: voffset,
                init,
            });
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semi, "';'")?;
        Ok(Stmt::Decl {
            ty,
            is_const,
            vars,
            offset,
        })
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<Expr, Diagnostic> {
        self.nested("expression", Self::assign_body)
    }

    fn assign_body(&mut self) -> Result<Expr, Diagnostic> {
        let target = self.parse_ternary()?;
        let op = match self.peek().kind {
            TokenKind::Assign => AssignOp::Set,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Sub,
            TokenKind::StarAssign => AssignOp::Mul,
            TokenKind::SlashAssign => AssignOp::Div,
            _ => return Ok(target),
        };
        let offset = self.offset();
        self.bump();
        let value = self.parse_assign()?;
        Ok(Expr {
            kind: ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            offset,
        })
    }

    fn parse_ternary(&mut self) -> Result<Expr, Diagnostic> {
        let cond = self.parse_or()?;
        if self.peek().kind != TokenKind::Question {
            return Ok(cond);
        }
        let offset = self.offset();
        self.bump();
        let then = self.parse_assign()?;
        self.expect(TokenKind::Colon, "':' in conditional expression")?;
        let otherwise = self.nested("expression", Self::parse_ternary)?;
        Ok(Expr {
            kind: ExprKind::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            offset,
        })
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr, offset: usize) -> Expr {
        Expr {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            offset,
        }
    }

    fn parse_or(&mut self) -> Result<Expr, Diagnostic> {
        let mut e = self.parse_and()?;
        let mark = self.depth;
        while self.peek().kind == TokenKind::OrOr {
            let offset = self.offset();
            self.bump();
            let r = self.parse_and()?;
            self.nest("expression")?;
            e = Self::binary(BinaryOp::Or, e, r, offset);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_and(&mut self) -> Result<Expr, Diagnostic> {
        let mut e = self.parse_equality()?;
        let mark = self.depth;
        while self.peek().kind == TokenKind::AndAnd {
            let offset = self.offset();
            self.bump();
            let r = self.parse_equality()?;
            self.nest("expression")?;
            e = Self::binary(BinaryOp::And, e, r, offset);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_equality(&mut self) -> Result<Expr, Diagnostic> {
        let mut e = self.parse_comparison()?;
        let mark = self.depth;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::Ne => BinaryOp::Ne,
                _ => break,
            };
            let offset = self.offset();
            self.bump();
            let r = self.parse_comparison()?;
            self.nest("expression")?;
            e = Self::binary(op, e, r, offset);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut e = self.parse_term()?;
        let mark = self.depth;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            let offset = self.offset();
            self.bump();
            let r = self.parse_term()?;
            self.nest("expression")?;
            e = Self::binary(op, e, r, offset);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_term(&mut self) -> Result<Expr, Diagnostic> {
        let mut e = self.parse_factor()?;
        let mark = self.depth;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let offset = self.offset();
            self.bump();
            let r = self.parse_factor()?;
            self.nest("expression")?;
            e = Self::binary(op, e, r, offset);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_factor(&mut self) -> Result<Expr, Diagnostic> {
        let mut e = self.parse_unary()?;
        let mark = self.depth;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            let offset = self.offset();
            self.bump();
            let r = self.parse_unary()?;
            self.nest("expression")?;
            e = Self::binary(op, e, r, offset);
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        let offset = self.offset();
        let kind = match self.peek().kind {
            TokenKind::Minus => {
                self.bump();
                ExprKind::Unary {
                    op: UnaryOp::Neg,
                    expr: Box::new(self.nested("expression", Self::parse_unary)?),
                }
            }
            TokenKind::Bang => {
                self.bump();
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(self.nested("expression", Self::parse_unary)?),
                }
            }
            TokenKind::Plus => {
                self.bump();
                return self.nested("expression", Self::parse_unary);
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let increment = self.bump().kind == TokenKind::PlusPlus;
                ExprKind::Step {
                    target: Box::new(self.nested("expression", Self::parse_unary)?),
                    increment,
                    prefix: true,
                }
            }
            _ => return self.parse_postfix(),
        };
        Ok(Expr { kind, offset })
    }

    fn parse_postfix(&mut self) -> Result<Expr, Diagnostic> {
        let mut e = self.parse_primary()?;
        let mark = self.depth;
        loop {
            let offset = self.offset();
            match self.peek().kind {
                TokenKind::Dot => {
                    self.nest("expression")?;
                    self.bump();
                    let (fields, _) = self.ident("a component selection after '.'")?;
                    e = Expr {
                        kind: ExprKind::Swizzle {
                            base: Box::new(e),
                            fields,
                        },
                        offset,
                    };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    self.nest("expression")?;
                    let increment = self.bump().kind == TokenKind::PlusPlus;
                    e = Expr {
                        kind: ExprKind::Step {
                            target: Box::new(e),
                            increment,
                            prefix: false,
                        },
                        offset,
                    };
                }
                _ => break,
            }
        }
        self.depth = mark;
        Ok(e)
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let offset = self.offset();
        let kind = match self.peek().kind.clone() {
            TokenKind::Int(v) => {
                self.bump();
                ExprKind::Lit(Lit::Int(v))
            }
            TokenKind::Float(v) => {
                self.bump();
                ExprKind::Lit(Lit::Float(v))
            }
            TokenKind::True => {
                self.bump();
                ExprKind::Lit(Lit::Bool(true))
            }
            TokenKind::False => {
                self.bump();
                ExprKind::Lit(Lit::Bool(false))
            }
            TokenKind::Ident(name) => {
                self.bump();
                if self.consume(TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !self.consume(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_assign()?);
                            if self.consume(TokenKind::Comma) {
                                continue;
                            }
                            self.expect(TokenKind::RParen, "',' or ')' in argument list")?;
                            break;
                        }
                    }
                    ExprKind::Call { func: name, args }
                } else {
                    ExprKind::Var(name)
                }
            }
            TokenKind::LParen => {
                self.bump();
                let e = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(e);
            }
            _ => return Err(self.error("an expression")),
        };
        Ok(Expr { kind, offset })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/language/parser.rs"]
mod tests;

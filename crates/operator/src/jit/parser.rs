//! Recursive-descent parser for the generated kernel dialect.
//!
//! Hand-written over the token stream, one function per grammar rule,
//! precedence climbing for expressions. The grammar is exactly what the
//! source renderer emits:
//!
//! ```text
//! program := "int" IDENT "(" param ("," param)* ")" "{" stmt* "return" INT ";" "}"
//! param   := type "*" "restrict" IDENT | "const" type IDENT
//! stmt    := for | "const" "long" IDENT "=" expr ";" | IDENT "[" expr "]" "=" expr ";"
//! for     := "for" "(" "long" IDENT "=" expr ";" IDENT "<=" expr ";" IDENT "+=" "1" ")" "{" stmt* "}"
//! expr    := additive with "*" "/" "%" binding tighter, unary "-"
//! ```

use mantle_foundation::DType;
use mantle_symbolics::Node;

use super::lexer::Token;
use super::program::{KernelProgram, ParamDecl, ParamKind, Stmt};

#[derive(Debug, thiserror::Error)]
#[error("parse error at token {at}: {message}")]
pub(crate) struct ParseError {
    pub at: usize,
    pub message: String,
}

struct TokenStream<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> TokenStream<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        TokenStream { tokens, pos: 0 }
    }

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

    /// Consume the next token if it equals `expected`.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {expected:?}, found {:?}", self.peek())))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            other => Err(self.error(format!("expected identifier, found {other:?}"))),
        }
    }

    fn expect_int(&mut self) -> Result<i64, ParseError> {
        match self.advance() {
            Some(Token::Int(v)) => Ok(v),
            other => Err(self.error(format!("expected integer literal, found {other:?}"))),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            at: self.pos,
            message,
        }
    }
}

pub(crate) fn parse(tokens: &[Token]) -> Result<KernelProgram, ParseError> {
    let mut stream = TokenStream::new(tokens);

    stream.expect(&Token::KwInt)?;
    let name = stream.expect_ident()?;
    stream.expect(&Token::LParen)?;

    let mut params = Vec::new();
    if !stream.eat(&Token::RParen) {
        loop {
            params.push(parse_param(&mut stream)?);
            if stream.eat(&Token::RParen) {
                break;
            }
            stream.expect(&Token::Comma)?;
        }
    }

    stream.expect(&Token::LBrace)?;
    let body = parse_stmts(&mut stream)?;
    stream.expect(&Token::KwReturn)?;
    let status = stream.expect_int()?;
    if status != 0 {
        return Err(stream.error(format!("kernel must return 0, returns {status}")));
    }
    stream.expect(&Token::Semi)?;
    stream.expect(&Token::RBrace)?;
    if !stream.at_end() {
        return Err(stream.error("trailing input after kernel".into()));
    }

    Ok(KernelProgram { name, params, body })
}

fn parse_type(stream: &mut TokenStream) -> Result<DType, ParseError> {
    match stream.advance() {
        Some(Token::KwFloat) => Ok(DType::F32),
        Some(Token::KwDouble) => Ok(DType::F64),
        Some(Token::KwInt) => Ok(DType::I32),
        Some(Token::KwLong) => Ok(DType::I64),
        Some(Token::KwUnsigned) => {
            stream.expect(&Token::KwChar)?;
            Ok(DType::U8)
        }
        other => Err(stream.error(format!("expected type, found {other:?}"))),
    }
}

fn parse_param(stream: &mut TokenStream) -> Result<ParamDecl, ParseError> {
    if stream.eat(&Token::KwConst) {
        let dtype = parse_type(stream)?;
        let name = stream.expect_ident()?;
        Ok(ParamDecl {
            name,
            dtype,
            kind: ParamKind::Scalar,
        })
    } else {
        let dtype = parse_type(stream)?;
        stream.expect(&Token::Star)?;
        stream.expect(&Token::KwRestrict)?;
        let name = stream.expect_ident()?;
        Ok(ParamDecl {
            name,
            dtype,
            kind: ParamKind::Buffer,
        })
    }
}

/// Statements up to the closing token of the enclosing block, which is
/// left unconsumed (`return` for the kernel body, `}` for loop bodies).
fn parse_stmts(stream: &mut TokenStream) -> Result<Vec<Stmt>, ParseError> {
    let mut stmts = Vec::new();
    loop {
        match stream.peek() {
            Some(Token::KwFor) => stmts.push(parse_for(stream)?),
            Some(Token::KwConst) => stmts.push(parse_decl(stream)?),
            Some(Token::Ident(_)) => stmts.push(parse_store(stream)?),
            Some(Token::KwReturn) | Some(Token::RBrace) | None => return Ok(stmts),
            other => return Err(stream.error(format!("expected statement, found {other:?}"))),
        }
    }
}

fn parse_for(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    stream.expect(&Token::KwFor)?;
    stream.expect(&Token::LParen)?;
    stream.expect(&Token::KwLong)?;
    let var = stream.expect_ident()?;
    stream.expect(&Token::Assign)?;
    let lo = parse_expr(stream)?;
    stream.expect(&Token::Semi)?;

    let cond_var = stream.expect_ident()?;
    if cond_var != var {
        return Err(stream.error(format!(
            "loop condition tests `{cond_var}`, loop variable is `{var}`"
        )));
    }
    stream.expect(&Token::Le)?;
    let hi = parse_expr(stream)?;
    stream.expect(&Token::Semi)?;

    let step_var = stream.expect_ident()?;
    if step_var != var {
        return Err(stream.error(format!(
            "loop step updates `{step_var}`, loop variable is `{var}`"
        )));
    }
    stream.expect(&Token::PlusAssign)?;
    let step = stream.expect_int()?;
    if step != 1 {
        return Err(stream.error(format!("unsupported loop step {step}")));
    }
    stream.expect(&Token::RParen)?;

    stream.expect(&Token::LBrace)?;
    let body = parse_stmts(stream)?;
    stream.expect(&Token::RBrace)?;

    Ok(Stmt::Loop { var, lo, hi, body })
}

fn parse_decl(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    stream.expect(&Token::KwConst)?;
    stream.expect(&Token::KwLong)?;
    let name = stream.expect_ident()?;
    stream.expect(&Token::Assign)?;
    let expr = parse_expr(stream)?;
    stream.expect(&Token::Semi)?;
    Ok(Stmt::Let { name, expr })
}

fn parse_store(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let base = stream.expect_ident()?;
    stream.expect(&Token::LBracket)?;
    let index = parse_expr(stream)?;
    stream.expect(&Token::RBracket)?;
    stream.expect(&Token::Assign)?;
    let value = parse_expr(stream)?;
    stream.expect(&Token::Semi)?;
    Ok(Stmt::Store { base, index, value })
}

fn parse_expr(stream: &mut TokenStream) -> Result<Node, ParseError> {
    parse_additive(stream)
}

fn parse_additive(stream: &mut TokenStream) -> Result<Node, ParseError> {
    let mut lhs = parse_multiplicative(stream)?;
    loop {
        if stream.eat(&Token::Plus) {
            lhs = Node::add(lhs, parse_multiplicative(stream)?);
        } else if stream.eat(&Token::Minus) {
            lhs = Node::sub(lhs, parse_multiplicative(stream)?);
        } else {
            return Ok(lhs);
        }
    }
}

fn parse_multiplicative(stream: &mut TokenStream) -> Result<Node, ParseError> {
    let mut lhs = parse_unary(stream)?;
    loop {
        if stream.eat(&Token::Star) {
            lhs = Node::mul(lhs, parse_unary(stream)?);
        } else if stream.eat(&Token::Slash) {
            lhs = Node::int_div(lhs, parse_unary(stream)?);
        } else if stream.eat(&Token::Percent) {
            lhs = Node::modulo(lhs, parse_unary(stream)?);
        } else {
            return Ok(lhs);
        }
    }
}

fn parse_unary(stream: &mut TokenStream) -> Result<Node, ParseError> {
    if stream.eat(&Token::Minus) {
        Ok(Node::neg(parse_unary(stream)?))
    } else {
        parse_primary(stream)
    }
}

fn parse_primary(stream: &mut TokenStream) -> Result<Node, ParseError> {
    match stream.advance() {
        Some(Token::LParen) => {
            let inner = parse_expr(stream)?;
            stream.expect(&Token::RParen)?;
            Ok(inner)
        }
        Some(Token::Int(v)) => Ok(Node::Int(v)),
        Some(Token::Real(v)) => Ok(Node::Real(v)),
        Some(Token::Ident(name)) => {
            if stream.eat(&Token::LBracket) {
                let index = parse_expr(stream)?;
                stream.expect(&Token::RBracket)?;
                Ok(Node::indexed(name, index))
            } else {
                Ok(Node::sym(name))
            }
        }
        other => Err(stream.error(format!("expected expression, found {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::lex;
    use super::*;
    use mantle_symbolics::render;

    fn parse_source(source: &str) -> Result<KernelProgram, ParseError> {
        parse(&lex(source).unwrap())
    }

    #[test]
    fn parses_a_minimal_kernel() {
        let program = parse_source(
            "int Kernel(float *restrict f, const long x_m, const long x_M)\n\
             {\n  for (long x = x_m; x <= x_M; x += 1)\n  {\n    f[x] = f[x] + 1.0;\n  }\n  return 0;\n}\n",
        )
        .unwrap();

        assert_eq!(program.name, "Kernel");
        assert_eq!(program.params.len(), 3);
        assert_eq!(program.params[0].kind, ParamKind::Buffer);
        assert_eq!(program.params[0].dtype, DType::F32);
        assert_eq!(program.body.len(), 1);
        match &program.body[0] {
            Stmt::Loop { var, body, .. } => {
                assert_eq!(var, "x");
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected stmt: {other:?}"),
        }
    }

    #[test]
    fn expression_precedence_matches_the_printer() {
        let program = parse_source(
            "int Kernel(float *restrict f, const long f_size1, const long t1)\n\
             {\n  f[t1*f_size1 + (x + 1)] = 2.0*f[x] + 1.0;\n  return 0;\n}\n",
        )
        .unwrap();
        match &program.body[0] {
            Stmt::Store { index, value, .. } => {
                assert_eq!(render(index), "t1*f_size1 + (x + 1)");
                assert_eq!(render(value), "2.0*f[x] + 1.0");
            }
            other => panic!("unexpected stmt: {other:?}"),
        }
    }

    #[test]
    fn slot_decls_parse_as_lets() {
        let program = parse_source(
            "int Kernel(const long time_m, const long time_M)\n\
             {\n  for (long time = time_m; time <= time_M; time += 1)\n  {\n    const long t0 = time%2;\n  }\n  return 0;\n}\n",
        )
        .unwrap();
        match &program.body[0] {
            Stmt::Loop { body, .. } => match &body[0] {
                Stmt::Let { name, expr } => {
                    assert_eq!(name, "t0");
                    assert_eq!(render(expr), "time%2");
                }
                other => panic!("unexpected stmt: {other:?}"),
            },
            other => panic!("unexpected stmt: {other:?}"),
        }
    }

    #[test]
    fn nonzero_return_is_rejected() {
        let err = parse_source("int Kernel(const long n)\n{\n  return 1;\n}\n").unwrap_err();
        assert!(err.message.contains("must return 0"));
    }

    #[test]
    fn mismatched_loop_variable_is_rejected() {
        let err = parse_source(
            "int Kernel(const long n)\n{\n  for (long x = 0; y <= n; x += 1)\n  {\n  }\n  return 0;\n}\n",
        )
        .unwrap_err();
        assert!(err.message.contains("loop condition"));
    }
}

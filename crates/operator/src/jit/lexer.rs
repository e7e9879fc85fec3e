//! Tokenizer for the generated kernel dialect.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub(crate) enum Token {
    #[token("int")]
    KwInt,
    #[token("long")]
    KwLong,
    #[token("float")]
    KwFloat,
    #[token("double")]
    KwDouble,
    #[token("unsigned")]
    KwUnsigned,
    #[token("char")]
    KwChar,
    #[token("const")]
    KwConst,
    #[token("restrict")]
    KwRestrict,
    #[token("for")]
    KwFor,
    #[token("return")]
    KwReturn,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,

    #[token("+=")]
    PlusAssign,
    #[token("<=")]
    Le,
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    // Must cover everything f64's shortest-roundtrip formatting emits,
    // exponent forms included.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Real(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized input at byte {at}")]
pub(crate) struct LexError {
    pub at: usize,
}

pub(crate) fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => return Err(LexError { at: span.start }),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_beat_identifiers() {
        let tokens = lex("for forward").unwrap();
        assert_eq!(tokens[0], Token::KwFor);
        assert_eq!(tokens[1], Token::Ident("forward".into()));
    }

    #[test]
    fn numeric_literals() {
        let tokens = lex("2 1.0 0.25 1e30 1.5e-3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Int(2),
                Token::Real(1.0),
                Token::Real(0.25),
                Token::Real(1e30),
                Token::Real(1.5e-3),
            ]
        );
    }

    #[test]
    fn compound_operators() {
        let tokens = lex("x += 1; x <= x_M").unwrap();
        assert!(tokens.contains(&Token::PlusAssign));
        assert!(tokens.contains(&Token::Le));
    }

    #[test]
    fn rejects_foreign_characters() {
        let err = lex("f[x] = @;").unwrap_err();
        assert_eq!(err.at, 7);
    }
}

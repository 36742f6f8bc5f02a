// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Ralph source files.
//!
//! Tokenization is logos-derived. Comments and whitespace are stripped
//! during lexing and never reach the parser. Identifiers may carry a
//! trailing `!`, which is how Ralph spells built-in function names
//! (`assert!`, `blake2b!`).

use logos::Logos;
use std::ops::Range;

/// A Ralph token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // Keywords
    #[token("Contract")]
    Contract,
    #[token("Interface")]
    Interface,
    #[token("TxScript")]
    TxScript,
    #[token("Abstract")]
    Abstract,
    #[token("struct")]
    Struct,
    #[token("extends")]
    Extends,
    #[token("implements")]
    Implements,
    #[token("import")]
    Import,
    #[token("fn")]
    Fn,
    #[token("pub")]
    Pub,
    #[token("let")]
    Let,
    #[token("mut")]
    Mut,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("emit")]
    Emit,
    #[token("event")]
    Event,
    #[token("const")]
    Const,
    #[token("enum")]
    Enum,
    #[token("mapping")]
    Mapping,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Literals
    #[regex(r"[0-9][0-9_]*(\.[0-9]+)?", |lex| lex.slice().to_owned())]
    #[regex(r"0x[0-9a-fA-F]+", |lex| lex.slice().to_owned())]
    Number(String),
    #[regex(r"#[0-9a-fA-F]*", |lex| lex.slice().to_owned())]
    Bytes(String),
    #[regex(r#""[^"\n]*""#, |lex| lex.slice().to_owned())]
    Str(String),

    /// Identifier, optionally with the built-in `!` suffix.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*!?", |lex| lex.slice().to_owned())]
    Ident(String),

    // Operators and punctuation
    #[token("->")]
    Arrow,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
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
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("!")]
    Bang,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
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
    #[token("@")]
    At,
}

/// A token plus its byte range in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// Tokenize `code`. Unlexable input is reported as `Err` carrying the byte
/// range of the offending character.
pub fn tokenize(code: &str) -> Result<Vec<Spanned>, Range<usize>> {
    let mut lexer = Token::lexer(code);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(Spanned { token, span: lexer.span() }),
            Err(()) => return Err(lexer.span()),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(code: &str) -> Vec<Token> {
        tokenize(code).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_contract_header() {
        let tokens = kinds("Contract Token(supply: U256)");
        assert_eq!(
            tokens,
            vec![
                Token::Contract,
                Token::Ident("Token".to_string()),
                Token::LParen,
                Token::Ident("supply".to_string()),
                Token::Colon,
                Token::Ident("U256".to_string()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_builtin_identifier_keeps_bang() {
        let tokens = kinds("assert!(x, 0)");
        assert_eq!(tokens[0], Token::Ident("assert!".to_string()));
        assert_eq!(tokens[1], Token::LParen);
    }

    #[test]
    fn test_comments_are_stripped() {
        let tokens = kinds("// header\nlet x = 1 // trailing\n");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0], Token::Let);
    }

    #[test]
    fn test_spans_are_byte_ranges() {
        let tokens = tokenize("fn main").unwrap();
        assert_eq!(tokens[0].span, 0..2);
        assert_eq!(tokens[1].span, 3..7);
    }

    #[test]
    fn test_bad_character_is_an_error() {
        assert!(tokenize("let x = `").is_err());
    }
}

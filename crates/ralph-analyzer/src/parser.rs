// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! Recursive-descent parser for Ralph.
//!
//! The parser is fail-fast: the first syntax error aborts the file and is
//! reported with the byte range it was detected at. `import` statements are
//! consumed and ignored here - the language server extracts them from the
//! raw text itself.

use crate::ast::*;
use crate::index::SourceIndex;
use crate::lexer::{self, Spanned, Token};
use std::ops::Range;
use url::Url;

/// A syntax error with the range it was detected at.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub index: SourceIndex,
}

/// Parse one Ralph source file.
pub fn parse(file: &Url, code: &str) -> Result<SourceAst, ParseError> {
    let tokens = lexer::tokenize(code).map_err(|span| ParseError {
        message: "unrecognised character".to_string(),
        index: SourceIndex::new(span.start, span.len(), file.clone()),
    })?;

    let mut parser = Parser { file, tokens, pos: 0, eof: code.len() };
    let mut definitions = Vec::new();

    while !parser.at_end() {
        match parser.peek() {
            Some(Token::Import) => parser.skip_import()?,
            Some(_) => definitions.push(parser.parse_type_def()?),
            None => break,
        }
    }

    Ok(SourceAst { file: file.clone(), definitions })
}

struct Parser<'a> {
    file: &'a Url,
    tokens: Vec<Spanned>,
    pos: usize,
    eof: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn current_span(&self) -> Range<usize> {
        self.tokens
            .get(self.pos)
            .map(|s| s.span.clone())
            .unwrap_or(self.eof..self.eof)
    }

    /// Span of the most recently consumed token.
    fn previous_span(&self) -> Range<usize> {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|s| s.span.clone())
            .unwrap_or(self.eof..self.eof)
    }

    fn index(&self, span: &Range<usize>) -> SourceIndex {
        SourceIndex::new(span.start, span.len(), self.file.clone())
    }

    fn index_from(&self, start: usize, end: usize) -> SourceIndex {
        SourceIndex::new(start, end.saturating_sub(start), self.file.clone())
    }

    fn err<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError {
            message: message.into(),
            index: self.index(&self.current_span()),
        })
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<Range<usize>, ParseError> {
        match self.peek() {
            Some(token) if std::mem::discriminant(token) == std::mem::discriminant(&expected) => {
                let span = self.current_span();
                self.pos += 1;
                Ok(span)
            }
            Some(token) => {
                let token = token.clone();
                self.err(format!("expected {what}, found {token:?}"))
            }
            None => self.err(format!("expected {what}, found end of file")),
        }
    }

    fn eat(&mut self, expected: &Token) -> bool {
        match self.peek() {
            Some(token) if std::mem::discriminant(token) == std::mem::discriminant(expected) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn parse_ident(&mut self, what: &str) -> Result<Ident, ParseError> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                let span = self.current_span();
                self.pos += 1;
                Ok(Ident { name, index: self.index(&span) })
            }
            Some(token) => self.err(format!("expected {what}, found {token:?}")),
            None => self.err(format!("expected {what}, found end of file")),
        }
    }

    fn parse_type_id(&mut self, what: &str) -> Result<TypeId, ParseError> {
        let ident = self.parse_ident(what)?;
        Ok(TypeId { name: ident.name, index: ident.index })
    }

    /// `import "folder/file"` - consumed and discarded.
    fn skip_import(&mut self) -> Result<(), ParseError> {
        self.expect(Token::Import, "`import`")?;
        match self.peek() {
            Some(Token::Str(_)) => {
                self.pos += 1;
                Ok(())
            }
            _ => self.err("expected a string literal after `import`"),
        }
    }

    // --- Top-level definitions ---

    fn parse_type_def(&mut self) -> Result<TypeDef, ParseError> {
        let start = self.current_span().start;

        let kind = match self.peek() {
            Some(Token::Abstract) => {
                self.pos += 1;
                self.expect(Token::Contract, "`Contract` after `Abstract`")?;
                TypeDefKind::Contract { is_abstract: true }
            }
            Some(Token::Contract) => {
                self.pos += 1;
                TypeDefKind::Contract { is_abstract: false }
            }
            Some(Token::Interface) => {
                self.pos += 1;
                TypeDefKind::Interface
            }
            Some(Token::TxScript) => {
                self.pos += 1;
                TypeDefKind::TxScript
            }
            Some(Token::Struct) => {
                self.pos += 1;
                TypeDefKind::Struct
            }
            Some(token) => {
                let token = token.clone();
                return self.err(format!("expected a definition, found {token:?}"));
            }
            None => return self.err("expected a definition, found end of file"),
        };

        let id = self.parse_type_id("a definition name")?;

        let mut fields = if matches!(self.peek(), Some(Token::LParen)) {
            self.parse_argument_list()?
        } else {
            Vec::new()
        };

        let mut inheritance = Vec::new();
        loop {
            let kind = match self.peek() {
                Some(Token::Extends) => InheritanceKind::Extends,
                Some(Token::Implements) => InheritanceKind::Implements,
                _ => break,
            };
            self.pos += 1;
            loop {
                let parent = self.parse_type_id("a parent name")?;
                let args = if matches!(self.peek(), Some(Token::LParen)) {
                    self.parse_expr_list()?
                } else {
                    Vec::new()
                };
                inheritance.push(InheritanceRef { kind, parent, args });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }

        let mut functions = Vec::new();
        let mut events = Vec::new();
        let mut constants = Vec::new();
        let mut enums = Vec::new();

        if kind == TypeDefKind::Struct {
            fields = self.parse_struct_fields()?;
        } else {
            self.expect(Token::LBrace, "`{`")?;
            // Annotations attach to the next function; other members drop
            // them.
            let mut pending_annotations = Vec::new();
            while !self.eat(&Token::RBrace) {
                match self.peek() {
                    Some(Token::At) => pending_annotations.push(self.parse_annotation()?),
                    Some(Token::Pub) | Some(Token::Fn) => {
                        let annotations = std::mem::take(&mut pending_annotations);
                        functions.push(self.parse_func_def(annotations)?);
                    }
                    Some(Token::Event) => {
                        pending_annotations.clear();
                        events.push(self.parse_event_def()?);
                    }
                    Some(Token::Const) => {
                        pending_annotations.clear();
                        constants.push(self.parse_constant_def()?);
                    }
                    Some(Token::Enum) => {
                        pending_annotations.clear();
                        enums.push(self.parse_enum_def()?);
                    }
                    Some(token) => {
                        let token = token.clone();
                        return self.err(format!("expected a member, found {token:?}"));
                    }
                    None => return self.err("unclosed definition body"),
                }
            }
        }

        let end = self.previous_span().end;
        Ok(TypeDef {
            kind,
            id,
            fields,
            inheritance,
            functions,
            events,
            constants,
            enums,
            index: self.index_from(start, end),
        })
    }

    /// Struct bodies hold only fields.
    fn parse_struct_fields(&mut self) -> Result<Vec<Argument>, ParseError> {
        self.expect(Token::LBrace, "`{`")?;
        let mut fields = Vec::new();
        while !self.eat(&Token::RBrace) {
            let start = self.current_span().start;
            let is_mut = self.eat(&Token::Mut);
            let ident = self.parse_ident("a field name")?;
            self.expect(Token::Colon, "`:`")?;
            let tpe = self.parse_type_ref()?;
            let end = self.previous_span().end;
            fields.push(Argument {
                ident,
                tpe,
                is_mut,
                index: self.index_from(start, end),
            });
            let _ = self.eat(&Token::Comma) || self.eat(&Token::Semi);
        }
        Ok(fields)
    }

    /// `@using(updateFields = true)` and friends.
    fn parse_annotation(&mut self) -> Result<Annotation, ParseError> {
        let start = self.expect(Token::At, "`@`")?.start;
        let id = self.parse_ident("an annotation name")?;

        let mut fields = Vec::new();
        if self.eat(&Token::LParen) {
            while !self.eat(&Token::RParen) {
                let field_start = self.current_span().start;
                let ident = self.parse_ident("an annotation field")?;
                self.expect(Token::Eq, "`=`")?;
                let value = match self.parse_expr()? {
                    Expr::BoolLit { value, .. } => Some(value),
                    _ => None,
                };
                let field_end = self.previous_span().end;
                fields.push(AnnotationField {
                    ident,
                    value,
                    index: self.index_from(field_start, field_end),
                });
                if !self.eat(&Token::Comma) && !matches!(self.peek(), Some(Token::RParen)) {
                    return self.err("expected `,` or `)` in annotation fields");
                }
            }
        }

        let end = self.previous_span().end;
        Ok(Annotation { id, fields, index: self.index_from(start, end) })
    }

    fn parse_func_def(&mut self, annotations: Vec<Annotation>) -> Result<FuncDef, ParseError> {
        let start = self.current_span().start;
        let is_pub = self.eat(&Token::Pub);
        self.expect(Token::Fn, "`fn`")?;

        let name = self.parse_ident("a function name")?;
        let id = FuncId { name: name.name, index: name.index };

        let args = self.parse_argument_list()?;

        let mut returns = Vec::new();
        if self.eat(&Token::Arrow) {
            if self.eat(&Token::LParen) {
                while !self.eat(&Token::RParen) {
                    returns.push(self.parse_type_ref()?);
                    if !self.eat(&Token::Comma) && !matches!(self.peek(), Some(Token::RParen)) {
                        return self.err("expected `,` or `)` in return types");
                    }
                }
            } else {
                returns.push(self.parse_type_ref()?);
            }
        }

        let signature_end = self.previous_span().end;
        let signature = self.index_from(start, signature_end);

        let body = if matches!(self.peek(), Some(Token::LBrace)) {
            Some(self.parse_block()?)
        } else {
            None
        };

        let end = self.previous_span().end;
        Ok(FuncDef {
            id,
            is_pub,
            annotations,
            args,
            returns,
            body,
            signature,
            index: self.index_from(start, end),
        })
    }

    fn parse_event_def(&mut self) -> Result<EventDef, ParseError> {
        let start = self.current_span().start;
        self.expect(Token::Event, "`event`")?;
        let id = self.parse_type_id("an event name")?;
        let fields = self.parse_argument_list()?;
        let end = self.previous_span().end;
        Ok(EventDef { id, fields, index: self.index_from(start, end) })
    }

    fn parse_constant_def(&mut self) -> Result<ConstantDef, ParseError> {
        let start = self.current_span().start;
        self.expect(Token::Const, "`const`")?;
        let ident = self.parse_ident("a constant name")?;
        self.expect(Token::Eq, "`=`")?;
        let value = self.parse_expr()?;
        let end = self.previous_span().end;
        Ok(ConstantDef { ident, value, index: self.index_from(start, end) })
    }

    fn parse_enum_def(&mut self) -> Result<EnumDef, ParseError> {
        let start = self.current_span().start;
        self.expect(Token::Enum, "`enum`")?;
        let id = self.parse_type_id("an enum name")?;
        self.expect(Token::LBrace, "`{`")?;

        let mut fields = Vec::new();
        while !self.eat(&Token::RBrace) {
            let field_start = self.current_span().start;
            let ident = self.parse_ident("an enum field name")?;
            self.expect(Token::Eq, "`=`")?;
            let value = self.parse_expr()?;
            let field_end = self.previous_span().end;
            fields.push(EnumField {
                ident,
                value,
                index: self.index_from(field_start, field_end),
            });
        }

        let end = self.previous_span().end;
        Ok(EnumDef { id, fields, index: self.index_from(start, end) })
    }

    fn parse_argument_list(&mut self) -> Result<Vec<Argument>, ParseError> {
        self.expect(Token::LParen, "`(`")?;
        let mut args = Vec::new();
        while !self.eat(&Token::RParen) {
            let start = self.current_span().start;
            let is_mut = self.eat(&Token::Mut);
            let ident = self.parse_ident("an argument name")?;
            self.expect(Token::Colon, "`:`")?;
            let tpe = self.parse_type_ref()?;
            let end = self.previous_span().end;
            args.push(Argument {
                ident,
                tpe,
                is_mut,
                index: self.index_from(start, end),
            });
            if !self.eat(&Token::Comma) && !matches!(self.peek(), Some(Token::RParen)) {
                return self.err("expected `,` or `)` in argument list");
            }
        }
        Ok(args)
    }

    fn parse_type_ref(&mut self) -> Result<TypeRef, ParseError> {
        // Array annotation: `[U256; 4]` collapses to the element type.
        if self.eat(&Token::LBracket) {
            let inner = self.parse_type_ref()?;
            self.expect(Token::Semi, "`;`")?;
            match self.peek() {
                Some(Token::Number(_)) => {
                    self.pos += 1;
                }
                _ => return self.err("expected an array size"),
            }
            self.expect(Token::RBracket, "`]`")?;
            return Ok(inner);
        }
        let id = self.parse_type_id("a type name")?;
        Ok(TypeRef { id })
    }

    // --- Statements ---

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.expect(Token::LBrace, "`{`")?.start;
        let mut statements = Vec::new();
        while !self.eat(&Token::RBrace) {
            if self.at_end() {
                return self.err("unclosed block");
            }
            statements.push(self.parse_stmt()?);
        }
        let end = self.previous_span().end;
        Ok(Block { statements, index: self.index_from(start, end) })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Some(Token::Let) => self.parse_let(),
            Some(Token::Return) => self.parse_return(),
            Some(Token::If) => self.parse_if(),
            Some(Token::While) => self.parse_while(),
            Some(Token::For) => self.parse_for(),
            Some(Token::Emit) => self.parse_emit(),
            _ => {
                let start = self.current_span().start;
                let expr = self.parse_expr()?;
                if self.eat(&Token::Eq) {
                    let value = self.parse_expr()?;
                    let end = self.previous_span().end;
                    Ok(Stmt::Assign {
                        target: expr,
                        value,
                        index: self.index_from(start, end),
                    })
                } else {
                    Ok(Stmt::Expr(expr))
                }
            }
        }
    }

    fn parse_let(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(Token::Let, "`let`")?.start;
        let is_mut = self.eat(&Token::Mut);
        let ident = self.parse_ident("a binding name")?;
        self.expect(Token::Eq, "`=`")?;
        let value = self.parse_expr()?;
        let end = self.previous_span().end;
        Ok(Stmt::Let { ident, is_mut, value, index: self.index_from(start, end) })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(Token::Return, "`return`")?.start;
        let mut values = Vec::new();
        // `return` may stand alone at the end of a block.
        if !matches!(self.peek(), Some(Token::RBrace) | None) {
            values.push(self.parse_expr()?);
            while self.eat(&Token::Comma) {
                values.push(self.parse_expr()?);
            }
        }
        let end = self.previous_span().end;
        Ok(Stmt::Return { values, index: self.index_from(start, end) })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(Token::If, "`if`")?.start;
        self.expect(Token::LParen, "`(`")?;
        let condition = self.parse_expr()?;
        self.expect(Token::RParen, "`)`")?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat(&Token::Else) {
            if matches!(self.peek(), Some(Token::If)) {
                // `else if` re-enters as a one-statement block.
                let stmt = self.parse_if()?;
                let index = stmt.index().clone();
                Some(Block { statements: vec![stmt], index })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        let end = self.previous_span().end;
        Ok(Stmt::If {
            condition,
            then_block,
            else_block,
            index: self.index_from(start, end),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(Token::While, "`while`")?.start;
        self.expect(Token::LParen, "`(`")?;
        let condition = self.parse_expr()?;
        self.expect(Token::RParen, "`)`")?;
        let body = self.parse_block()?;
        let end = self.previous_span().end;
        Ok(Stmt::While { condition, body, index: self.index_from(start, end) })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(Token::For, "`for`")?.start;
        self.expect(Token::LParen, "`(`")?;
        let init = Box::new(self.parse_stmt()?);
        self.expect(Token::Semi, "`;`")?;
        let condition = self.parse_expr()?;
        self.expect(Token::Semi, "`;`")?;
        let update = Box::new(self.parse_stmt()?);
        self.expect(Token::RParen, "`)`")?;
        let body = self.parse_block()?;
        let end = self.previous_span().end;
        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
            index: self.index_from(start, end),
        })
    }

    fn parse_emit(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(Token::Emit, "`emit`")?.start;
        let event = self.parse_type_id("an event name")?;
        let args = self.parse_expr_list()?;
        let end = self.previous_span().end;
        Ok(Stmt::Emit { event, args, index: self.index_from(start, end) })
    }

    // --- Expressions ---

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(Token::LParen, "`(`")?;
        let mut exprs = Vec::new();
        while !self.eat(&Token::RParen) {
            exprs.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) && !matches!(self.peek(), Some(Token::RParen)) {
                return self.err("expected `,` or `)` in call arguments");
            }
        }
        Ok(exprs)
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(0)
    }

    fn binary_op(&self) -> Option<(&'static str, u8)> {
        let (op, precedence) = match self.peek()? {
            Token::OrOr => ("||", 1),
            Token::AndAnd => ("&&", 2),
            Token::EqEq => ("==", 3),
            Token::NotEq => ("!=", 3),
            Token::Lt => ("<", 4),
            Token::LtEq => ("<=", 4),
            Token::Gt => (">", 4),
            Token::GtEq => (">=", 4),
            Token::Plus => ("+", 5),
            Token::Minus => ("-", 5),
            Token::Star => ("*", 6),
            Token::Slash => ("/", 6),
            Token::Percent => ("%", 6),
            _ => return None,
        };
        Some((op, precedence))
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some((op, precedence)) = self.binary_op() {
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let right = self.parse_binary(precedence + 1)?;
            let index = self.index_from(left.index().offset, right.index().end());
            left = Expr::Binary {
                op: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
                index,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Bang) => Some("!"),
            Some(Token::Minus) => Some("-"),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.current_span().start;
            self.pos += 1;
            let expr = self.parse_unary()?;
            let index = self.index_from(start, expr.index().end());
            return Ok(Expr::Unary { op: op.to_string(), expr: Box::new(expr), index });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        while matches!(self.peek(), Some(Token::Dot)) {
            self.pos += 1;
            let member = self.parse_ident("a member name")?;
            if matches!(self.peek(), Some(Token::LParen)) {
                let args = self.parse_expr_list()?;
                let index = self.index_from(expr.index().offset, self.previous_span().end);
                expr = Expr::ContractCall(ContractCallExpr {
                    receiver: Box::new(expr),
                    call_id: FuncId { name: member.name, index: member.index },
                    args,
                    index,
                });
            } else if let Expr::Variable(base) = expr {
                let index = self.index_from(base.index.offset, member.index.end());
                expr = Expr::Select { base, field: member, index };
            } else {
                return self.err("expected a call after `.`");
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.current_span();
        match self.peek().cloned() {
            Some(Token::Number(raw)) => {
                self.pos += 1;
                // `1 alph` style amounts keep the unit with the literal.
                if matches!(self.peek(), Some(Token::Ident(unit)) if unit == "alph") {
                    let end = self.current_span().end;
                    self.pos += 1;
                    return Ok(Expr::NumberLit {
                        raw: format!("{raw} alph"),
                        index: self.index_from(span.start, end),
                    });
                }
                Ok(Expr::NumberLit { raw, index: self.index(&span) })
            }
            Some(Token::Bytes(raw)) => {
                self.pos += 1;
                Ok(Expr::BytesLit { raw, index: self.index(&span) })
            }
            Some(Token::Str(raw)) => {
                self.pos += 1;
                Ok(Expr::StringLit { raw, index: self.index(&span) })
            }
            Some(Token::True) => {
                self.pos += 1;
                Ok(Expr::BoolLit { value: true, index: self.index(&span) })
            }
            Some(Token::False) => {
                self.pos += 1;
                Ok(Expr::BoolLit { value: false, index: self.index(&span) })
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let expr = self.parse_expr()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(expr)
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                if matches!(self.peek(), Some(Token::LParen)) {
                    let id = FuncId { name, index: self.index(&span) };
                    let args = self.parse_expr_list()?;
                    let index = self.index_from(span.start, self.previous_span().end);
                    Ok(Expr::Call(CallExpr { id, args, index }))
                } else {
                    Ok(Expr::Variable(Ident { name, index: self.index(&span) }))
                }
            }
            Some(token) => self.err(format!("expected an expression, found {token:?}")),
            None => self.err("expected an expression, found end of file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///w/contracts/test.ral").unwrap()
    }

    fn parse_ok(code: &str) -> SourceAst {
        parse(&uri(), code).expect("source should parse")
    }

    #[test]
    fn test_parse_contract_with_field_and_function() {
        let code = "Contract A(id: U256) { pub fn f() -> U256 { return id } }";
        let ast = parse_ok(code);
        assert_eq!(ast.definitions.len(), 1);

        let def = &ast.definitions[0];
        assert_eq!(def.id.name, "A");
        assert_eq!(def.kind, TypeDefKind::Contract { is_abstract: false });
        assert_eq!(def.fields.len(), 1);
        assert_eq!(def.fields[0].ident.name, "id");
        assert_eq!(def.fields[0].tpe.id.name, "U256");

        let func = &def.functions[0];
        assert!(func.is_pub);
        assert_eq!(func.id.name, "f");
        assert_eq!(func.returns[0].id.name, "U256");
        assert!(func.body.is_some());
    }

    #[test]
    fn test_function_signature_covers_header_only() {
        let code = "Contract A() {\n  pub fn f(x: U256) -> U256 {\n    return x\n  }\n}";
        let ast = parse_ok(code);
        let func = &ast.definitions[0].functions[0];
        let header = &code[func.signature.offset..func.signature.end()];
        assert_eq!(header, "pub fn f(x: U256) -> U256");
    }

    #[test]
    fn test_parse_inheritance_clauses() {
        let code = "Contract C(x: U256) extends P(x), Q() implements I { }";
        let ast = parse_ok(code);
        let parents: Vec<&str> = ast.definitions[0]
            .inheritance
            .iter()
            .map(|i| i.parent.name.as_str())
            .collect();
        assert_eq!(parents, vec!["P", "Q", "I"]);
        assert_eq!(ast.definitions[0].inheritance[2].kind, InheritanceKind::Implements);
    }

    #[test]
    fn test_parse_interface_signatures_without_bodies() {
        let code = "Interface IToken { pub fn getSupply() -> U256 pub fn transfer(to: Address, amount: U256) -> () }";
        let ast = parse_ok(code);
        let def = &ast.definitions[0];
        assert!(def.is_interface());
        assert_eq!(def.functions.len(), 2);
        assert!(def.functions[0].body.is_none());
        assert!(def.functions[1].body.is_none());
    }

    #[test]
    fn test_parse_contract_call() {
        let code = "Contract B(a: A) { pub fn g() -> U256 { return a.f() } }";
        let ast = parse_ok(code);
        let body = ast.definitions[0].functions[0].body.as_ref().unwrap();
        match &body.statements[0] {
            Stmt::Return { values, .. } => match &values[0] {
                Expr::ContractCall(call) => {
                    assert_eq!(call.call_id.name, "f");
                    assert!(matches!(&*call.receiver, Expr::Variable(v) if v.name == "a"));
                }
                other => panic!("expected a contract call, got {other:?}"),
            },
            other => panic!("expected a return, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_builtin_call() {
        let code = "Contract A() { fn f() -> () { assert!(true, 0) } }";
        let ast = parse_ok(code);
        let body = ast.definitions[0].functions[0].body.as_ref().unwrap();
        match &body.statements[0] {
            Stmt::Expr(Expr::Call(call)) => {
                assert_eq!(call.id.name, "assert!");
                assert!(call.id.is_builtin());
                assert_eq!(call.args.len(), 2);
            }
            other => panic!("expected a builtin call, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_imports_are_skipped() {
        let code = "import \"std/nft_interface\"\n// comment\nimport \"A\"\nContract A() { }";
        let ast = parse_ok(code);
        assert_eq!(ast.definitions.len(), 1);
    }

    #[test]
    fn test_parse_events_constants_enums() {
        let code = r#"
Contract Token(mut total: U256) {
    event Transfer(to: Address, amount: U256)
    const Version = 1
    enum ErrorCodes {
        InvalidCaller = 0
    }

    @using(updateFields = true)
    pub fn mint(amount: U256) -> () {
        total = total + amount
        emit Transfer(callerAddress!(), amount)
    }
}
"#;
        let ast = parse_ok(code);
        let def = &ast.definitions[0];
        assert_eq!(def.events[0].id.name, "Transfer");
        assert_eq!(def.constants[0].ident.name, "Version");
        assert_eq!(def.enums[0].fields[0].ident.name, "InvalidCaller");
        assert_eq!(def.functions.len(), 1);

        let mint = &def.functions[0];
        assert_eq!(mint.annotations.len(), 1);
        assert_eq!(mint.annotations[0].id.name, "using");
        assert_eq!(mint.annotation_flag("updateFields"), Some(true));
        assert_eq!(mint.annotation_flag("checkExternalCaller"), None);
    }

    #[test]
    fn test_annotation_with_multiple_fields() {
        let code = r#"
Contract A(mut total: U256) {
    @using(updateFields = true, checkExternalCaller = false)
    pub fn set(v: U256) -> () {
        total = v
    }
}
"#;
        let ast = parse_ok(code);
        let func = &ast.definitions[0].functions[0];
        assert_eq!(func.annotation_flag("updateFields"), Some(true));
        assert_eq!(func.annotation_flag("checkExternalCaller"), Some(false));
    }

    #[test]
    fn test_parse_control_flow() {
        let code = r#"
Contract A() {
    fn f(n: U256) -> U256 {
        let mut acc = 0
        for (let mut i = 0; i < n; i = i + 1) {
            if (i % 2 == 0) {
                acc = acc + i
            } else {
                acc = acc + 1
            }
        }
        while (acc > 100) {
            acc = acc - 100
        }
        return acc
    }
}
"#;
        let ast = parse_ok(code);
        let body = ast.definitions[0].functions[0].body.as_ref().unwrap();
        assert_eq!(body.statements.len(), 4);
    }

    #[test]
    fn test_parse_error_carries_position() {
        let code = "Contract A( { }";
        let err = parse(&uri(), code).unwrap_err();
        assert_eq!(err.index.offset, 12);
        assert!(err.message.contains("argument name"));
    }

    #[test]
    fn test_parse_error_at_end_of_file() {
        let code = "Contract A() {";
        let err = parse(&uri(), code).unwrap_err();
        assert_eq!(err.index.offset, code.len());
    }

    #[test]
    fn test_txscript_and_abstract() {
        let code = "Abstract Contract Base(v: U256) { }\nTxScript Main { pub fn main() -> () { } }";
        let ast = parse_ok(code);
        assert_eq!(ast.definitions[0].kind, TypeDefKind::Contract { is_abstract: true });
        assert_eq!(ast.definitions[1].kind, TypeDefKind::TxScript);
    }
}

//! Token cursor with brace-scoped helpers
//!
//! Every block helper consumes exactly through the brace that closes the
//! block it was called for. Running out of tokens inside a block is
//! `UnexpectedEof`; hitting a `}` where more content was required is
//! `UnexpectedEndOfBlock`.

use std::iter::Peekable;

use crate::error::{EggError, Result};
use crate::tokenizer::{Token, Tokenizer};

pub(crate) struct Cursor<'a> {
    tokens: Peekable<Tokenizer<'a>>,
    line: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            tokens: Tokenizer::new(source).peekable(),
            line: 1,
        }
    }

    /// Line of the most recently consumed token
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.next()?;
        self.line = token.line;
        Some(token)
    }

    pub(crate) fn peek(&mut self) -> Option<&Token<'a>> {
        self.tokens.peek()
    }

    pub(crate) fn expect_token(&mut self, context: &'static str) -> Result<Token<'a>> {
        self.next().ok_or(EggError::UnexpectedEof { context })
    }

    pub(crate) fn expect_open(&mut self, context: &'static str) -> Result<()> {
        let token = self.expect_token(context)?;
        if token.is_open() {
            Ok(())
        } else {
            Err(unexpected(token, "`{`"))
        }
    }

    pub(crate) fn expect_close(&mut self, context: &'static str) -> Result<()> {
        let token = self.expect_token(context)?;
        if token.is_close() {
            Ok(())
        } else {
            Err(unexpected(token, "`}`"))
        }
    }

    /// Skip an optional name (any non-brace tokens) up to and including `{`
    pub(crate) fn skip_to_open(&mut self, context: &'static str) -> Result<()> {
        loop {
            let token = self.expect_token(context)?;
            if token.is_open() {
                return Ok(());
            }
            if token.is_close() {
                return Err(EggError::UnexpectedEndOfBlock {
                    line: token.line,
                    context,
                });
            }
        }
    }

    /// Consume the rest of an already opened block, nested blocks included
    pub(crate) fn skip_block(&mut self, context: &'static str) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.expect_token(context)?;
            if token.is_open() {
                depth += 1;
            } else if token.is_close() {
                depth -= 1;
            }
        }
        Ok(())
    }

    /// Skip a `<Tag> name { ... }` construct whose tag was already consumed
    pub(crate) fn skip_tagged_block(&mut self, context: &'static str) -> Result<()> {
        self.skip_to_open(context)?;
        self.skip_block(context)
    }

    pub(crate) fn expect_f32(&mut self, context: &'static str) -> Result<f32> {
        let token = self.expect_token(context)?;
        if token.is_close() {
            return Err(EggError::UnexpectedEndOfBlock {
                line: token.line,
                context,
            });
        }
        parse_f32(token)
    }

    /// Read the numbers of an already opened block through its `}`
    ///
    /// Nested tagged blocks (`<Tangent> { ... }` inside `<UV>`, say) are
    /// skipped.
    pub(crate) fn read_numbers(&mut self, context: &'static str) -> Result<Vec<f32>> {
        let mut values = Vec::new();
        loop {
            let token = self.expect_token(context)?;
            if token.is_close() {
                return Ok(values);
            }
            if token.is_open() {
                self.skip_block(context)?;
            } else if token.is_tag() {
                self.skip_tagged_block(context)?;
            } else {
                values.push(parse_f32(token)?);
            }
        }
    }

    /// Read an already opened block that must hold at least `N` numbers
    pub(crate) fn read_fixed<const N: usize>(&mut self, context: &'static str) -> Result<[f32; N]> {
        let values = self.read_numbers(context)?;
        if values.len() < N {
            return Err(EggError::UnexpectedEndOfBlock {
                line: self.line,
                context,
            });
        }
        let mut out = [0.0; N];
        out.copy_from_slice(&values[..N]);
        Ok(out)
    }
}

pub(crate) fn parse_f32(token: Token<'_>) -> Result<f32> {
    token
        .unquoted()
        .parse()
        .map_err(|_| EggError::InvalidNumber {
            line: token.line,
            token: token.text.to_string(),
        })
}

pub(crate) fn parse_index(token: Token<'_>) -> Result<i64> {
    token
        .unquoted()
        .parse()
        .map_err(|_| EggError::InvalidNumber {
            line: token.line,
            token: token.text.to_string(),
        })
}

pub(crate) fn unexpected(token: Token<'_>, expected: &'static str) -> EggError {
    EggError::UnexpectedToken {
        line: token.line,
        expected,
        found: token.text.to_string(),
    }
}

//! EGG tokenizer
//!
//! Splits EGG text into whitespace-delimited tokens. Braces are always tokens
//! of their own, so `{Z-Up}` and `{ Z-Up }` tokenize identically. A token that
//! starts with `"` runs to the next `"` (quotes included); there are no escape
//! sequences. `//` line comments and `/* */` block comments are skipped.

/// A single token with the 1-based line it starts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub line: usize,
}

impl<'a> Token<'a> {
    pub fn is_open(&self) -> bool {
        self.text == "{"
    }

    pub fn is_close(&self) -> bool {
        self.text == "}"
    }

    /// `<Tag>` style token (quoted strings never count as tags)
    pub fn is_tag(&self) -> bool {
        self.text.len() > 2 && self.text.starts_with('<') && self.text.ends_with('>')
    }

    /// Token text with one pair of surrounding quotes removed
    pub fn unquoted(&self) -> &'a str {
        let text = self.text;
        text.strip_prefix('"')
            .map(|rest| rest.strip_suffix('"').unwrap_or(rest))
            .unwrap_or(text)
    }
}

/// Iterator over the tokens of an EGG source string
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
        }
    }

    /// Advance past whitespace and comments
    fn skip_trivia(&mut self) {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b if b.is_ascii_whitespace() => self.pos += 1,
                b'/' if bytes.get(self.pos + 1) == Some(&b'/') => {
                    while self.pos < bytes.len() && bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                b'/' if bytes.get(self.pos + 1) == Some(&b'*') => {
                    self.pos += 2;
                    while self.pos < bytes.len()
                        && !(bytes[self.pos] == b'*' && bytes.get(self.pos + 1) == Some(&b'/'))
                    {
                        if bytes[self.pos] == b'\n' {
                            self.line += 1;
                        }
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(bytes.len());
                }
                _ => break,
            }
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        self.skip_trivia();

        let bytes = self.src.as_bytes();
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        let line = self.line;

        match bytes[start] {
            b'{' | b'}' => self.pos += 1,
            b'"' => {
                self.pos += 1;
                while self.pos < bytes.len() && bytes[self.pos] != b'"' {
                    if bytes[self.pos] == b'\n' {
                        self.line += 1;
                    }
                    self.pos += 1;
                }
                // Closing quote (an unterminated string runs to the end)
                self.pos = (self.pos + 1).min(bytes.len());
            }
            _ => {
                while self.pos < bytes.len()
                    && !bytes[self.pos].is_ascii_whitespace()
                    && bytes[self.pos] != b'{'
                    && bytes[self.pos] != b'}'
                {
                    self.pos += 1;
                }
            }
        }

        Some(Token {
            text: &self.src[start..self.pos],
            line,
        })
    }
}

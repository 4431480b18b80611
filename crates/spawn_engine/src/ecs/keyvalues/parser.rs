//! Entity lump parser
//!
//! Parses the textual entity list stored in maps:
//!
//! ```text
//! {
//! "classname" "worldspawn"
//! "wad" "halflife.wad"
//! }
//! // comments run to the end of the line
//! {
//! "classname" "info_target"
//! "origin" "0 0 64"
//! }
//! ```
//!
//! Tokens are either quoted strings or runs of non-whitespace characters.

use thiserror::Error;

use super::KeyValues;

/// Entity lump syntax errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Expected the start of an entity block
    #[error("line {line}: expected '{{', found \"{found}\"")]
    ExpectedOpenBrace {
        /// Line of the offending token
        line: usize,
        /// The token found instead
        found: String,
    },

    /// Input ended inside an entity block
    #[error("line {line}: unexpected end of input inside entity block")]
    UnexpectedEof {
        /// Last line read
        line: usize,
    },

    /// A quoted string was never closed
    #[error("line {line}: unterminated string")]
    UnterminatedString {
        /// Line the string started on
        line: usize,
    },

    /// A key had no value before the block ended
    #[error("line {line}: key \"{key}\" has no value")]
    MissingValue {
        /// The key
        key: String,
        /// Line of the key
        line: usize,
    },

    /// A character that can't start any token
    #[error("line {line}: unexpected character {found:?}")]
    UnexpectedCharacter {
        /// Line of the character
        line: usize,
        /// The character
        found: char,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Text(&'a str),
}

struct Tokenizer<'a> {
    source: &'a str,
    position: usize,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    const fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.source.as_bytes().get(self.position).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    /// Skips every character the bare token arm treats as a separator
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                if c == '\n' {
                    self.line += 1;
                }
                self.position += c.len_utf8();
            } else if self.source[self.position..].starts_with("//") {
                let rest = &self.source[self.position..];
                self.position += rest.find('\n').unwrap_or(rest.len());
            } else {
                break;
            }
        }
    }

    /// Next token and the line it starts on
    fn next_token(&mut self) -> Result<Option<(Token<'a>, usize)>, ParseError> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let Some(byte) = self.peek_byte() else {
            return Ok(None);
        };

        let token = match byte {
            b'{' => {
                self.position += 1;
                Token::Open
            }
            b'}' => {
                self.position += 1;
                Token::Close
            }
            b'"' => {
                let start = self.position + 1;
                let length = self.source[start..]
                    .find('"')
                    .ok_or(ParseError::UnterminatedString { line })?;
                let text = &self.source[start..start + length];

                self.line += text.matches('\n').count();
                self.position = start + length + 1;
                Token::Text(text)
            }
            _ => {
                let start = self.position;
                let rest = &self.source[start..];
                let length = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, '{' | '}' | '"'))
                    .unwrap_or(rest.len());

                if length == 0 {
                    return Err(ParseError::UnexpectedCharacter {
                        line,
                        found: rest.chars().next().unwrap_or_default(),
                    });
                }

                self.position = start + length;
                Token::Text(&rest[..length])
            }
        };

        Ok(Some((token, line)))
    }
}

/// Parse an entity lump into one key-value list per entity
///
/// Keys are kept in file order, including duplicates.
pub fn parse_entities(source: &str) -> Result<Vec<KeyValues>, ParseError> {
    let mut tokenizer = Tokenizer::new(source);
    let mut entities = Vec::new();

    while let Some((token, line)) = tokenizer.next_token()? {
        match token {
            Token::Open => {}
            Token::Close => {
                return Err(ParseError::ExpectedOpenBrace {
                    line,
                    found: "}".to_string(),
                })
            }
            Token::Text(text) => {
                return Err(ParseError::ExpectedOpenBrace {
                    line,
                    found: text.to_string(),
                })
            }
        }

        entities.push(parse_block(&mut tokenizer)?);
    }

    Ok(entities)
}

fn parse_block(tokenizer: &mut Tokenizer<'_>) -> Result<KeyValues, ParseError> {
    let mut keyvalues = KeyValues::new();

    loop {
        let (key, key_line) = match tokenizer.next_token()? {
            None => return Err(ParseError::UnexpectedEof { line: tokenizer.line }),
            Some((Token::Close, _)) => return Ok(keyvalues),
            Some((Token::Open, line)) => {
                return Err(ParseError::MissingValue {
                    key: "{".to_string(),
                    line,
                })
            }
            Some((Token::Text(key), line)) => (key, line),
        };

        match tokenizer.next_token()? {
            Some((Token::Text(value), _)) => keyvalues.push(key, value),
            Some(_) => {
                return Err(ParseError::MissingValue {
                    key: key.to_string(),
                    line: key_line,
                })
            }
            None => return Err(ParseError::UnexpectedEof { line: tokenizer.line }),
        }
    }
}

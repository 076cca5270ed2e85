//! The hand-written lexer.
//!
//! One token per call, dispatching on the first byte. Whitespace is not
//! skipped: a run of non-newline whitespace becomes a single space token and
//! every newline becomes a newline token, so the preprocessor can drop them
//! while later phases still see accurate line numbers. Block comments are
//! reduced to a single space token.

use crate::cursor::Cursor;
use crate::error::LexError;
use crate::token::{Token, TokenKind};

/// Lexer state over one source string.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Lexes the next token.
    ///
    /// Returns the end-of-file token (with an empty spelling) once the input
    /// is exhausted, and keeps returning it on further calls.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let line = self.cursor.line();
        let start = self.cursor.position();
        let c = self.cursor.advance();

        let kind = match c {
            0 => TokenKind::Eof,
            b'\n' => TokenKind::Newline,

            _ if c.is_ascii_whitespace() => {
                while self.cursor.current().is_ascii_whitespace()
                    && self.cursor.current() != b'\n'
                {
                    self.cursor.advance();
                }
                TokenKind::Space
            }

            b'/' if self.cursor.current() == b'*' => {
                self.cursor.advance();
                loop {
                    let b = self.cursor.advance();
                    if b == b'*' && self.cursor.current() == b'/' {
                        break;
                    }
                    if b == 0 {
                        return Err(LexError::UnterminatedComment { line });
                    }
                }
                self.cursor.advance();
                // The comment collapses to a single space token.
                return Ok(Token::new(TokenKind::Space, " ", line));
            }

            _ if c.is_ascii_digit() => {
                while self.cursor.current().is_ascii_digit() {
                    self.cursor.advance();
                }
                TokenKind::Number
            }

            b'\'' => {
                let b = self.literal_char()?;
                if self.cursor.advance() != b'\'' {
                    return Err(LexError::UnterminatedCharacter { line });
                }
                return Ok(Token::with_bytes(
                    TokenKind::Character,
                    self.cursor.slice_from(start),
                    line,
                    vec![b],
                ));
            }

            b'"' => {
                let mut bytes = Vec::new();
                while self.cursor.current() != b'"' {
                    bytes.push(self.literal_char()?);
                }
                self.cursor.advance();
                return Ok(Token::with_bytes(
                    TokenKind::String,
                    self.cursor.slice_from(start),
                    line,
                    bytes,
                ));
            }

            _ if c.is_ascii_alphabetic() || c == b'_' => {
                while self.cursor.current().is_ascii_alphanumeric()
                    || self.cursor.current() == b'_'
                {
                    self.cursor.advance();
                }
                let text = self.cursor.slice_from(start);
                TokenKind::keyword(text).unwrap_or(TokenKind::Identifier)
            }

            b'<' if self.cursor.match_byte(b'=') => TokenKind::LtEq,
            b'>' if self.cursor.match_byte(b'=') => TokenKind::GtEq,
            b'=' if self.cursor.match_byte(b'=') => TokenKind::EqEq,
            b'!' if self.cursor.match_byte(b'=') => TokenKind::NotEq,
            b'+' if self.cursor.match_byte(b'+') => TokenKind::PlusPlus,
            b'-' if self.cursor.match_byte(b'-') => TokenKind::MinusMinus,
            b'&' if self.cursor.match_byte(b'&') => TokenKind::AndAnd,
            b'|' if self.cursor.match_byte(b'|') => TokenKind::OrOr,
            b'-' if self.cursor.match_byte(b'>') => TokenKind::Arrow,

            b'.' if self.cursor.current() == b'.' => {
                self.cursor.advance();
                if self.cursor.current() != b'.' {
                    return Err(LexError::InvalidToken { line });
                }
                self.cursor.advance();
                TokenKind::DotDotDot
            }

            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'.' => TokenKind::Dot,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'<' => TokenKind::Lt,
            b'>' => TokenKind::Gt,
            b'=' => TokenKind::Eq,
            b'!' => TokenKind::Bang,
            b'&' => TokenKind::Ampersand,
            b'|' => TokenKind::Pipe,
            b'^' => TokenKind::Caret,
            b'~' => TokenKind::Tilde,

            other => TokenKind::Unknown(other),
        };

        Ok(Token::new(kind, self.cursor.slice_from(start), line))
    }

    /// Decodes one literal character, applying escape sequences.
    ///
    /// The recognized escapes are `\0 \' \" \n \\`; anything else is fatal.
    /// Reaching a newline or the end of input inside a literal is fatal.
    fn literal_char(&mut self) -> Result<u8, LexError> {
        match self.cursor.current() {
            0 => Err(LexError::EofInLiteral {
                line: self.cursor.line(),
            }),

            b'\n' => Err(LexError::UnterminatedLiteral {
                line: self.cursor.line(),
            }),

            b'\\' => {
                self.cursor.advance();
                let b = match self.cursor.current() {
                    b'0' => 0,
                    b'\'' => b'\'',
                    b'"' => b'"',
                    b'n' => b'\n',
                    b'\\' => b'\\',
                    other => {
                        return Err(LexError::UnknownEscape {
                            escape: other as char,
                            line: self.cursor.line(),
                        })
                    }
                };
                self.cursor.advance();
                Ok(b)
            }

            _ => Ok(self.cursor.advance()),
        }
    }
}

/// Lexes a whole source string into a token vector terminated by the
/// end-of-file token.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        let tokens = lex("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].text, "");
    }

    #[test]
    fn test_punctuation_kinds() {
        let expected = [
            ("(", TokenKind::LParen),
            (")", TokenKind::RParen),
            ("{", TokenKind::LBrace),
            ("}", TokenKind::RBrace),
            ("[", TokenKind::LBracket),
            ("]", TokenKind::RBracket),
            (",", TokenKind::Comma),
            (";", TokenKind::Semicolon),
            (".", TokenKind::Dot),
            ("+", TokenKind::Plus),
            ("-", TokenKind::Minus),
            ("*", TokenKind::Star),
            ("/", TokenKind::Slash),
            ("%", TokenKind::Percent),
            ("<", TokenKind::Lt),
            (">", TokenKind::Gt),
            ("=", TokenKind::Eq),
            ("!", TokenKind::Bang),
            ("&", TokenKind::Ampersand),
            ("|", TokenKind::Pipe),
            ("^", TokenKind::Caret),
            ("~", TokenKind::Tilde),
        ];

        for (src, kind) in expected {
            assert_eq!(kinds(src), vec![kind, TokenKind::Eof], "source {:?}", src);
        }
    }

    #[test]
    fn test_multi_character_operators() {
        assert_eq!(
            kinds("<= >= == != ++ -- && || -> ..."),
            vec![
                TokenKind::LtEq,
                TokenKind::Space,
                TokenKind::GtEq,
                TokenKind::Space,
                TokenKind::EqEq,
                TokenKind::Space,
                TokenKind::NotEq,
                TokenKind::Space,
                TokenKind::PlusPlus,
                TokenKind::Space,
                TokenKind::MinusMinus,
                TokenKind::Space,
                TokenKind::AndAnd,
                TokenKind::Space,
                TokenKind::OrOr,
                TokenKind::Space,
                TokenKind::Arrow,
                TokenKind::Space,
                TokenKind::DotDotDot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = lex("int main while0 _x return").unwrap();
        let filtered: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Space)
            .map(|t| (t.kind, t.text.as_str()))
            .collect();

        assert_eq!(
            filtered,
            vec![
                (TokenKind::Int, "int"),
                (TokenKind::Identifier, "main"),
                (TokenKind::Identifier, "while0"),
                (TokenKind::Identifier, "_x"),
                (TokenKind::Return, "return"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_number_spelling() {
        let tokens = lex("42").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "42");
    }

    #[test]
    fn test_whitespace_runs_collapse_to_one_space_token() {
        assert_eq!(
            kinds("a  \t  b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Space,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_newline_is_its_own_token() {
        let tokens = lex("a\nb").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[1].line, 1);
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_line_numbers() {
        let tokens = lex("a\n\nb").unwrap();
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!(b.line, 3);
    }

    #[test]
    fn test_block_comment_becomes_space() {
        let tokens = lex("a/* comment\nstill */b").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Space);
        assert_eq!(tokens[1].text, " ");
        // The comment consumed a newline, so 'b' is on line 2.
        assert_eq!(tokens[2].text, "b");
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(
            lex("/* no end"),
            Err(LexError::UnterminatedComment { line: 1 })
        );
    }

    #[test]
    fn test_character_literal() {
        let tokens = lex("'a'").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Character);
        assert_eq!(tokens[0].text, "'a'");
        assert_eq!(tokens[0].bytes, Some(vec![b'a']));
    }

    #[test]
    fn test_character_escapes() {
        for (src, byte) in [
            ("'\\0'", 0u8),
            ("'\\''", b'\''),
            ("'\\\"'", b'"'),
            ("'\\n'", b'\n'),
            ("'\\\\'", b'\\'),
        ] {
            let tokens = lex(src).unwrap();
            assert_eq!(tokens[0].bytes, Some(vec![byte]), "source {:?}", src);
        }
    }

    #[test]
    fn test_unknown_escape_is_rejected() {
        assert_eq!(
            lex("'\\t'"),
            Err(LexError::UnknownEscape {
                escape: 't',
                line: 1
            })
        );
        assert_eq!(
            lex("\"a\\r\""),
            Err(LexError::UnknownEscape {
                escape: 'r',
                line: 1
            })
        );
    }

    #[test]
    fn test_unterminated_character_literal() {
        assert_eq!(
            lex("'ab'"),
            Err(LexError::UnterminatedCharacter { line: 1 })
        );
    }

    #[test]
    fn test_string_literal_spelling_and_payload() {
        let tokens = lex("\"hi\\n\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "\"hi\\n\"");
        assert_eq!(tokens[0].bytes, Some(vec![b'h', b'i', b'\n']));
    }

    #[test]
    fn test_string_with_embedded_nul() {
        let tokens = lex("\"a\\0b\"").unwrap();
        let bytes = tokens[0].bytes.as_ref().unwrap();
        assert_eq!(bytes, &vec![b'a', 0, b'b']);
        assert_eq!(bytes.len(), 3);
    }

    #[test]
    fn test_string_hitting_newline_is_rejected() {
        assert_eq!(
            lex("\"abc\ndef\""),
            Err(LexError::UnterminatedLiteral { line: 1 })
        );
    }

    #[test]
    fn test_string_hitting_eof_is_rejected() {
        assert_eq!(lex("\"abc"), Err(LexError::EofInLiteral { line: 1 }));
    }

    #[test]
    fn test_stray_double_dot_is_rejected() {
        assert_eq!(lex("a..b"), Err(LexError::InvalidToken { line: 1 }));
    }

    #[test]
    fn test_unknown_byte_becomes_unknown_token() {
        let tokens = lex("@").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Unknown(b'@'));
        assert_eq!(tokens[0].text, "@");
    }

    #[test]
    fn test_small_program_token_stream() {
        let tokens = lex("int main(void) { return 42; }").unwrap();
        let kinds: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Space)
            .map(|t| t.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::Void,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }
}

//! The preprocessor: a lexical normalizer.
//!
//! Not a macro processor. It drops whitespace and newline tokens and folds
//! every maximal run of adjacent string literals into a single string token,
//! preserving the relative order of everything else and the end-of-file
//! token. Directives are outside the supported language.

use crate::token::{Token, TokenKind};

/// Normalizes a lexed token stream for the parser.
pub fn preprocess(tokens: Vec<Token>) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::Space | TokenKind::Newline => {}

            TokenKind::String
                if result.last().map(|t| t.kind) == Some(TokenKind::String) =>
            {
                concat_string(result.last_mut().unwrap(), token);
            }

            _ => result.push(token),
        }
    }

    result
}

/// Folds `next` into the preceding string token.
///
/// The spelling keeps one pair of surrounding quotes; the decoded payloads
/// are concatenated byte-wise so embedded NULs and the summed length are
/// preserved.
fn concat_string(prev: &mut Token, next: Token) {
    debug_assert_eq!(prev.kind, TokenKind::String);
    debug_assert_eq!(next.kind, TokenKind::String);

    prev.text.pop();
    prev.text.push_str(&next.text[1..]);

    let bytes = next.bytes.unwrap_or_default();
    prev.bytes
        .get_or_insert_with(Vec::new)
        .extend_from_slice(&bytes);
}

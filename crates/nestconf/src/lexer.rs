//! tokenizer
//!
//! [Lexer] is a lazy iterator over positioned [Token]s. It stops after yielding
//! [TokenKind::End] or the first error.
//!
//! Runs of newlines (with the blank lines and comments between them) collapse into a single
//! [TokenKind::Newline] token since newlines only matter as statement separators.
use crate::error::{ParseError, ParseIssue};
use crate::literal::{parse_number, Literal};
use crate::position::Position;
use std::iter::Peekable;
use std::str::CharIndices;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    String,
    Number,
    Boolean,
    LeftBrace,
    RightBrace,
    Assign,
    Comma,
    Semicolon,
    Newline,
    End,
}

#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Token {
    pub kind: TokenKind,
    /// source text as written (quotes and escapes included)
    pub text: String,
    pub position: Position,
    /// value of string, number and boolean tokens
    pub literal: Option<Literal>,
}

impl Token {
    /// Short description for syntax errors
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::End => "end of input".to_string(),
            _ => format!("{:?}", self.text),
        }
    }
}

pub struct Lexer<'s> {
    source: Arc<str>,
    input: &'s str,
    chars: Peekable<CharIndices<'s>>,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'s> Lexer<'s> {
    pub fn new(input: &'s str, source: Arc<str>) -> Self {
        Self {
            source,
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
            finished: false,
        }
    }

    fn current_position(&self) -> Position {
        Position::new(self.source.clone(), self.line, self.column)
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(offset, _)| *offset)
            .unwrap_or(self.input.len())
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, accept: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&accept) {
            self.bump();
        }
    }

    /// skips blanks and comments, but not newlines
    fn skip_insignificant(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('#') => self.bump_while(|c| c != '\n'),
                _ => return,
            }
        }
    }

    fn scan(&mut self) -> Result<Token, ParseError> {
        self.skip_insignificant();

        let position = self.current_position();
        let start = self.offset();
        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::End, String::new(), position, None));
        };

        let punctuation = match c {
            '{' => Some(TokenKind::LeftBrace),
            '}' => Some(TokenKind::RightBrace),
            '=' => Some(TokenKind::Assign),
            ',' => Some(TokenKind::Comma),
            ';' => Some(TokenKind::Semicolon),
            _ => None,
        };
        if let Some(kind) = punctuation {
            self.bump();
            return Ok(Token::new(kind, c.to_string(), position, None));
        }

        match c {
            '\n' => {
                while self.peek() == Some('\n') {
                    self.bump();
                    self.skip_insignificant();
                }
                Ok(Token::new(TokenKind::Newline, "\n".to_string(), position, None))
            }
            '"' | '\'' => {
                let value = self.scan_string(position.clone())?;
                let text = self.input[start..self.offset()].to_string();
                Ok(Token::new(
                    TokenKind::String,
                    text,
                    position,
                    Some(Literal::String(value)),
                ))
            }
            '0'..='9' | '+' | '-' => {
                self.bump();
                self.bump_while(|c| c.is_ascii_alphanumeric() || c == '.');
                let text = &self.input[start..self.offset()];
                let number =
                    parse_number(text).map_err(|err| ParseError::new(err.into(), position.clone()))?;
                Ok(Token::new(
                    TokenKind::Number,
                    text.to_string(),
                    position,
                    Some(number),
                ))
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                self.bump_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
                let text = &self.input[start..self.offset()];
                match Literal::word(text) {
                    literal @ Literal::Boolean { .. } => Ok(Token::new(
                        TokenKind::Boolean,
                        text.to_string(),
                        position,
                        Some(literal),
                    )),
                    _ => Ok(Token::new(TokenKind::Ident, text.to_string(), position, None)),
                }
            }
            c => Err(ParseError::new(ParseIssue::IllegalCharacter(c), position)),
        }
    }

    /// Scans a quoted string (the opening quote is the next char) and returns its unescaped content
    fn scan_string(&mut self, start: Position) -> Result<String, ParseError> {
        let quote = self.bump().ok_or_else(|| {
            ParseError::new(ParseIssue::UnterminatedString, start.clone())
        })?;

        let mut value = String::new();
        loop {
            let escape_position = self.current_position();
            match self.bump() {
                None => return Err(ParseError::new(ParseIssue::UnterminatedString, start)),
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    let escaped = match self.bump() {
                        None => {
                            return Err(ParseError::new(ParseIssue::UnterminatedString, start))
                        }
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some(c @ ('\\' | '\'' | '"')) => c,
                        Some(c) => {
                            return Err(ParseError::new(
                                ParseIssue::InvalidEscape(c),
                                escape_position,
                            ))
                        }
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
    }
}

impl<'s> Iterator for Lexer<'s> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.scan();
        match &result {
            Ok(token) => {
                tracing::trace!(kind = ?token.kind, text = %token.text, position = %token.position, "token");
                self.finished = token.kind == TokenKind::End;
            }
            Err(_) => self.finished = true,
        }
        Some(result)
    }
}

/// Tokenize a whole text eagerly, mostly useful for debugging and tests
pub fn tokenize(input: &str, source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(input, source.into()).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input, "test")
            .expect("must tokenize")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn single(input: &str) -> Token {
        let mut tokens = tokenize(input, "test").expect("must tokenize");
        assert_eq!(tokens.len(), 2, "{tokens:?}");
        tokens.remove(0)
    }

    fn error(input: &str) -> ParseError {
        tokenize(input, "test").expect_err("must fail")
    }

    #[test]
    fn single_tokens() {
        use TokenKind::*;

        let cases = [
            ("name", Ident, None),
            ("with-dash_9", Ident, None),
            ("\"test\"", String, Some(Literal::from("test"))),
            ("'test'", String, Some(Literal::from("test"))),
            (r"'te\'st'", String, Some(Literal::from("te'st"))),
            (r#""a\"b\\c\nd""#, String, Some(Literal::from("a\"b\\c\nd"))),
            ("42", Number, Some(Literal::Integer(42))),
            ("42.1", Number, Some(Literal::Float(42.1))),
            ("+42", Number, Some(Literal::Integer(42))),
            ("-42.1", Number, Some(Literal::Float(-42.1))),
            ("42k", Number, Some(Literal::Integer(42_000))),
            ("yes", Boolean, Some(Literal::word("yes"))),
            ("OFF", Boolean, Some(Literal::word("OFF"))),
            ("{", LeftBrace, None),
            ("}", RightBrace, None),
            ("=", Assign, None),
            (",", Comma, None),
            (";", Semicolon, None),
        ];

        for (input, kind, literal) in cases {
            let token = single(input);
            assert_eq!(token.kind, kind, "{input}");
            assert_eq!(token.literal, literal, "{input}");
            assert_eq!(token.text, input);
        }
    }

    #[test]
    fn newlines_and_comments_collapse() {
        use TokenKind::*;

        let input = "a = 1 # trailing comment\n\n   # whole line\n\nb = 2";
        assert_eq!(
            kinds(input),
            vec![Ident, Assign, Number, Newline, Ident, Assign, Number, End]
        );
    }

    #[test]
    fn positions() {
        let tokens = tokenize("a {\n  key = 'x\ny'\n  other = 1\n}", "pos.conf").unwrap();
        let at = |index: usize| (tokens[index].position.line, tokens[index].position.column);

        assert_eq!(&*tokens[0].position.source, "pos.conf");
        assert_eq!(at(0), (1, 1));
        assert_eq!(at(1), (1, 3));
        assert_eq!(at(3), (2, 3));
        assert_eq!(at(5), (2, 9));
        // the string spans a line, so `other` is on line 4
        assert_eq!(at(7), (4, 3));
    }

    #[test]
    fn lexical_errors() {
        let err = error("key = 'open");
        assert!(matches!(err.issue, ParseIssue::UnterminatedString));
        assert_eq!(err.position.map(|p| (p.line, p.column)), Some((1, 7)));

        let err = error(r"key = 'bad \q escape'");
        assert!(matches!(err.issue, ParseIssue::InvalidEscape('q')));
        assert_eq!(err.position.map(|p| p.column), Some(12));

        let err = error("key = @");
        assert!(matches!(err.issue, ParseIssue::IllegalCharacter('@')));

        let err = error("size = 12parsecs");
        assert!(matches!(err.issue, ParseIssue::Number(_)));
    }

    #[test]
    fn stops_after_end() {
        let mut lexer = Lexer::new("", "empty".into());
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::End);
        assert!(lexer.next().is_none());
    }
}

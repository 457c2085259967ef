//! recursive descent parser building the [RawSection] tree
//!
//! ```text
//! document   := statement*
//! statement  := assignment | section | include
//! assignment := NAME '=' value_list
//! section    := NAME (value (',' value)*)? '{' statement* '}'
//! value_list := value (',' value)* ','?
//! value      := STRING | NUMBER | BOOL | IDENT
//! include    := 'include' STRING
//! ```
//!
//! Statements are separated by a newline, `;`, the closing `}` of their section or the end of input.
//! A comma continues a value list on the next line.
//!
//! `include` splices the statements of every matching file into the current section. Included
//! files are parsed by a nested [Parser] which shares the options and the resolver, the include
//! depth is tracked to catch include cycles.
use crate::error::{ParseError, ParseIssue};
use crate::include::{EmptyIncludePolicy, IncludeResolver};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::literal::Literal;
use crate::position::Position;
use crate::raw::{Assignment, RawSection};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

/// Limits and policies applied while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// how deep includes may nest (an included file including another file is depth 2)
    pub max_include_depth: usize,
    /// how deep sections may nest
    pub max_nesting: usize,
    pub empty_include: EmptyIncludePolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_include_depth: 32,
            max_nesting: 128,
            empty_include: EmptyIncludePolicy::default(),
        }
    }
}

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Token>,
    /// replayed once the lexer is exhausted
    end: Option<Token>,
    source: Arc<str>,
    options: &'a ParseOptions,
    resolver: &'a dyn IncludeResolver,
    base_dir: &'a Path,
    include_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(
        input: &'a str,
        source: Arc<str>,
        options: &'a ParseOptions,
        resolver: &'a dyn IncludeResolver,
        base_dir: &'a Path,
    ) -> Self {
        Self {
            lexer: Lexer::new(input, source.clone()),
            lookahead: VecDeque::new(),
            end: None,
            source,
            options,
            resolver,
            base_dir,
            include_depth: 0,
        }
    }

    /// Parse the whole input as the (unnamed) root section
    pub fn parse_document(mut self) -> Result<RawSection, ParseError> {
        let mut root = RawSection::root(Position::start_of(self.source.clone()));
        self.parse_body(&mut root, 0)?;
        self.expect_end()?;
        Ok(root)
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::End => Ok(()),
            _ => Err(unexpected(&token, "a statement")),
        }
    }

    fn scan(&mut self) -> Result<Token, ParseError> {
        let token = match (self.lexer.next(), &self.end) {
            (Some(token), _) => token?,
            (None, Some(end)) => end.clone(),
            (None, None) => Token::new(
                TokenKind::End,
                String::new(),
                Position::start_of(self.source.clone()),
                None,
            ),
        };
        if token.kind == TokenKind::End {
            self.end = Some(token.clone());
        }
        Ok(token)
    }

    fn peek_kind(&mut self, offset: usize) -> Result<TokenKind, ParseError> {
        while self.lookahead.len() <= offset {
            let token = self.scan()?;
            self.lookahead.push_back(token);
        }
        Ok(self.lookahead[offset].kind)
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        match self.lookahead.pop_front() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(section = %section.name))]
    fn parse_body(&mut self, section: &mut RawSection, depth: usize) -> Result<(), ParseError> {
        loop {
            match self.peek_kind(0)? {
                TokenKind::Newline | TokenKind::Semicolon => {
                    self.next()?;
                }
                TokenKind::RightBrace | TokenKind::End => return Ok(()),
                TokenKind::Ident | TokenKind::Boolean => {
                    self.parse_statement(section, depth)?;
                    self.expect_separator()?;
                }
                _ => {
                    let token = self.next()?;
                    return Err(unexpected(&token, "a statement"));
                }
            }
        }
    }

    fn expect_separator(&mut self) -> Result<(), ParseError> {
        match self.peek_kind(0)? {
            TokenKind::Newline | TokenKind::Semicolon => {
                self.next()?;
                Ok(())
            }
            TokenKind::RightBrace | TokenKind::End => Ok(()),
            _ => {
                let token = self.next()?;
                Err(ParseError::new(
                    ParseIssue::MissingSeparator {
                        found: token.describe(),
                    },
                    token.position,
                ))
            }
        }
    }

    fn parse_statement(&mut self, section: &mut RawSection, depth: usize) -> Result<(), ParseError> {
        let name = self.next()?;

        if name.kind == TokenKind::Ident
            && name.text == "include"
            && self.peek_kind(0)? == TokenKind::String
        {
            let pattern = self.parse_value()?;
            let pattern = pattern.as_str().unwrap_or_default();
            return self.include(section, pattern, name.position, depth);
        }

        match self.peek_kind(0)? {
            TokenKind::Assign => {
                self.next()?;
                let value = self.parse_value_list()?;
                tracing::trace!(key = %name.text, %value, "assignment");
                section
                    .assignments
                    .push(Assignment::new(name.text, value, name.position));
                Ok(())
            }
            TokenKind::LeftBrace
            | TokenKind::String
            | TokenKind::Number
            | TokenKind::Boolean
            | TokenKind::Ident => {
                let child = self.parse_section(name, depth + 1)?;
                section.children.push(child);
                Ok(())
            }
            _ => {
                let token = self.next()?;
                Err(unexpected(&token, "'=' or '{'"))
            }
        }
    }

    fn parse_section(&mut self, name: Token, depth: usize) -> Result<RawSection, ParseError> {
        let mut args = vec![];
        if self.peek_kind(0)? != TokenKind::LeftBrace {
            args.push(self.parse_value()?);
            while self.peek_kind(0)? == TokenKind::Comma {
                self.next()?;
                args.push(self.parse_value()?);
            }
        }

        let open = self.next()?;
        if open.kind != TokenKind::LeftBrace {
            return Err(unexpected(&open, "'{'"));
        }
        if depth > self.options.max_nesting {
            return Err(ParseError::new(
                ParseIssue::NestingTooDeep {
                    limit: self.options.max_nesting,
                },
                name.position,
            ));
        }

        let mut section = RawSection::new(name.text, args, name.position);
        self.parse_body(&mut section, depth)?;

        let close = self.next()?;
        match close.kind {
            TokenKind::RightBrace => Ok(section),
            TokenKind::End => Err(ParseError::new(
                ParseIssue::UnclosedSection { name: section.name },
                section.position,
            )),
            _ => Err(unexpected(&close, "'}'")),
        }
    }

    fn parse_value(&mut self) -> Result<Literal, ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Ident => Ok(Literal::String(token.text)),
            TokenKind::String | TokenKind::Number | TokenKind::Boolean => token
                .literal
                .clone()
                .ok_or_else(|| unexpected(&token, "a value")),
            _ => Err(unexpected(&token, "a value")),
        }
    }

    /// A single value, or a list when a comma follows
    fn parse_value_list(&mut self) -> Result<Literal, ParseError> {
        let first = self.parse_value()?;
        if self.peek_kind(0)? != TokenKind::Comma {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.peek_kind(0)? == TokenKind::Comma {
            self.next()?;

            // the list may continue on the next line
            let skip = usize::from(self.peek_kind(0)? == TokenKind::Newline);
            if !self.is_list_item(skip)? {
                break;
            }
            for _ in 0..skip {
                self.next()?;
            }
            items.push(self.parse_value()?);
        }

        Ok(Literal::List(items))
    }

    /// Whether the token at `offset` continues a list after a comma
    ///
    /// Words are ambiguous: `a = 1,` followed by `b = 2` on the next line ends the list.
    fn is_list_item(&mut self, offset: usize) -> Result<bool, ParseError> {
        Ok(match self.peek_kind(offset)? {
            TokenKind::String | TokenKind::Number => true,
            TokenKind::Ident | TokenKind::Boolean => matches!(
                self.peek_kind(offset + 1)?,
                TokenKind::Comma
                    | TokenKind::Newline
                    | TokenKind::Semicolon
                    | TokenKind::RightBrace
                    | TokenKind::End
            ),
            _ => false,
        })
    }

    fn include(
        &mut self,
        section: &mut RawSection,
        pattern: &str,
        position: Position,
        depth: usize,
    ) -> Result<(), ParseError> {
        if self.include_depth >= self.options.max_include_depth {
            return Err(ParseError::new(
                ParseIssue::IncludeTooDeep {
                    limit: self.options.max_include_depth,
                },
                position,
            ));
        }

        let files = self
            .resolver
            .resolve(pattern, self.base_dir)
            .map_err(|issue| ParseError::new(issue, position.clone()))?;

        if files.is_empty() {
            match self.options.empty_include {
                EmptyIncludePolicy::Ignore => {
                    tracing::debug!(%pattern, %position, "include matches no file");
                }
                EmptyIncludePolicy::Error => {
                    return Err(ParseError::new(
                        ParseIssue::IncludeNoMatch {
                            pattern: pattern.to_string(),
                        },
                        position,
                    ));
                }
            }
        }

        for path in files {
            tracing::debug!(path = %path.display(), %position, "including file");
            let text = self.resolver.read(&path).map_err(|source| {
                ParseError::new(
                    ParseIssue::Io {
                        path: path.clone(),
                        source,
                    },
                    position.clone(),
                )
            })?;

            let base_dir = path.parent().unwrap_or(Path::new(""));
            let mut parser = Parser::new(
                &text,
                path.display().to_string().into(),
                self.options,
                self.resolver,
                base_dir,
            );
            parser.include_depth = self.include_depth + 1;

            let mut included = RawSection::root(Position::start_of(parser.source.clone()));
            parser.parse_body(&mut included, depth)?;
            parser.expect_end()?;

            section.splice(included);
        }

        Ok(())
    }
}

fn unexpected(token: &Token, expected: &'static str) -> ParseError {
    ParseError::new(
        ParseIssue::UnexpectedToken {
            found: token.describe(),
            expected,
        },
        token.position.clone(),
    )
}

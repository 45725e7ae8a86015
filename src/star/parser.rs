//! Generic STAR parser
//!
//! Consumes the token stream and builds a [`DataExtent`]. The parser is a small
//! state machine: outside any block, inside a data block, inside a save frame,
//! and inside a loop (header, then body). Loops are read in one go by
//! [`ParseState::parse_loop`]; the other states are the `block` and `frame`
//! slots of [`ParseState`].
//!
//! Irregularities are routed through [`ParseState::irregular`], which fails in
//! strict mode, warns and records a [`Diagnostic`] in standard mode, and only
//! emits a debug event in lenient mode. Recovery then continues as follows:
//!
//! | irregularity                         | recovery                              |
//! |--------------------------------------|---------------------------------------|
//! | bad token / bad construct            | skipped                               |
//! | save frame header inside a frame     | previous frame closed                 |
//! | data block header inside a frame     | frame closed, new block opened        |
//! | `save_` / `stop_` with nothing open  | ignored                               |
//! | data name without a value            | tag dropped                           |
//! | value without a data name            | value dropped                         |
//! | `loop_` without columns              | loop dropped                          |
//! | repeated column in a loop header     | column and its values dropped         |
//! | loop values not a multiple of width  | trailing partial row dropped          |
//! | duplicate tag, frame or block name   | first one kept                        |
//! | save frame open at end of input      | frame closed                          |
//!
//! Content before the first data block is only accepted in lenient mode, where
//! it goes into a synthesized `data_` block. Exceeding `max_tokens` is always
//! fatal.

pub mod error;
pub mod options;

pub use error::{ParseError, ParseIssue};
pub use options::{ParseMode, ParserOptions, UnknownParseMode};

use crate::star::ast::{
    DataBlock, DataExtent, Diagnostic, Loop, SaveFrame, SourceLocation, StarValue,
};
use crate::star::ast::Container;
use crate::star::lexer::{StarToken, TokenType, Tokenizer};
use std::ops::Range;
use tracing::{debug, warn};

/// Name of the block synthesized for content before any data block header
pub const SYNTHETIC_BLOCK_NAME: &str = "data_";

/// Parsed tree plus the irregularities recovered from
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub extent: DataExtent,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Reusable parser holding its options
#[derive(Debug, Clone, Default)]
pub struct StarParser {
    options: ParserOptions,
}

impl StarParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn parse(&self, text: &str) -> Result<ParseOutcome, ParseError> {
        self.parse_named("", text)
    }

    /// Parse `text` into an extent called `name`
    pub fn parse_named(&self, name: &str, text: &str) -> Result<ParseOutcome, ParseError> {
        let _span = tracing::debug_span!("star_parse", mode = %self.options.mode).entered();

        let mut state = ParseState::new(&self.options, name, text);
        state.run()?;

        debug!(
            blocks = state.extent.len(),
            tokens = state.consumed,
            diagnostics = state.diagnostics.len(),
            "parsed STAR text"
        );
        Ok(ParseOutcome {
            extent: state.extent,
            diagnostics: state.diagnostics,
        })
    }
}

/// Parse with default options in the given mode
pub fn parse(text: &str, mode: ParseMode) -> Result<ParseOutcome, ParseError> {
    StarParser::new(ParserOptions::new(mode)).parse(text)
}

fn to_value(token: &StarToken<'_>) -> StarValue {
    if token.kind.is_quoted() {
        StarValue::quoted(token.value)
    } else {
        StarValue::unquoted(token.value)
    }
}

struct ParseState<'a> {
    options: &'a ParserOptions,
    tokens: Tokenizer<'a>,
    pending: Option<StarToken<'a>>,
    location: SourceLocation<'a>,
    consumed: usize,
    extent: DataExtent,
    block: Option<DataBlock>,
    frame: Option<SaveFrame>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ParseState<'a> {
    fn new(options: &'a ParserOptions, name: &str, text: &'a str) -> Self {
        Self {
            options,
            tokens: Tokenizer::new(text),
            pending: None,
            location: SourceLocation::new(text),
            consumed: 0,
            extent: DataExtent::new(name),
            block: None,
            frame: None,
            diagnostics: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<(), ParseError> {
        while let Some(token) = self.next_token()? {
            self.dispatch(token)?;
        }

        let end = self.tokens.source().len();
        if let Some(frame) = self.frame.take() {
            self.irregular(
                ParseIssue::UnterminatedSaveFrame,
                &(end..end),
                format!("save frame '{}' is not terminated by 'save_'", frame.name),
            )?;
            self.store_frame(frame);
        }
        self.close_block();
        Ok(())
    }

    /// Next non-comment token, counting every token against the limit
    fn next_token(&mut self) -> Result<Option<StarToken<'a>>, ParseError> {
        if let Some(token) = self.pending.take() {
            return Ok(Some(token));
        }

        for token in self.tokens.by_ref() {
            self.consumed += 1;
            if let Some(limit) = self.options.max_tokens {
                if self.consumed > limit {
                    return Err(ParseError::new(
                        ParseIssue::TokenLimit,
                        self.location.position(token.span.start),
                        format!("token limit of {} exceeded", limit),
                    ));
                }
            }
            if token.kind != TokenType::Comment {
                return Ok(Some(token));
            }
        }
        Ok(None)
    }

    fn push_back(&mut self, token: StarToken<'a>) {
        self.pending = Some(token);
    }

    fn irregular(
        &mut self,
        issue: ParseIssue,
        span: &Range<usize>,
        message: impl Into<String>,
    ) -> Result<(), ParseError> {
        let message = message.into();
        let range = self.location.range(span);

        match self.options.mode {
            ParseMode::Strict => Err(ParseError::new(issue, range.start, message)),
            ParseMode::Standard => {
                warn!(code = issue.code(), at = %range.start, "{}", message);
                let mut diagnostic =
                    Diagnostic::new(range, issue.severity(), message).with_code(issue.code());
                if !self.extent.name.is_empty() {
                    diagnostic = diagnostic.with_source(self.extent.name.as_str());
                }
                self.diagnostics.push(diagnostic);
                Ok(())
            }
            ParseMode::Lenient => {
                debug!(code = issue.code(), at = %range.start, "{}", message);
                Ok(())
            }
        }
    }

    fn normalize(&self, name: &str) -> String {
        if self.options.lowercase_tags {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    fn dispatch(&mut self, token: StarToken<'a>) -> Result<(), ParseError> {
        match token.kind {
            TokenType::DataBlock | TokenType::Global => self.open_block(&token),
            TokenType::SaveFrame => self.save_frame(&token),
            TokenType::Loop => self.parse_loop(&token),
            TokenType::DataName => self.parse_item(&token),
            TokenType::LoopStop => self.irregular(
                ParseIssue::StrayLoopStop,
                &token.span,
                "'stop_' outside a loop",
            ),
            TokenType::BadConstruct | TokenType::BadToken => self.bad_token(&token),
            TokenType::Comment => Ok(()),
            _ => self.irregular(
                ParseIssue::StrayValue,
                &token.span,
                format!("value '{}' has no data name", token.value),
            ),
        }
    }

    fn bad_token(&mut self, token: &StarToken<'a>) -> Result<(), ParseError> {
        if token.kind == TokenType::BadConstruct {
            self.irregular(
                ParseIssue::BadConstruct,
                &token.span,
                format!("invalid use of reserved word: '{}'", token.value),
            )
        } else {
            self.irregular(
                ParseIssue::BadToken,
                &token.span,
                format!("malformed token: '{}'", token.value),
            )
        }
    }

    /// Make sure there is a block to put content into
    fn ensure_block(&mut self, span: &Range<usize>) -> Result<(), ParseError> {
        if self.block.is_some() {
            return Ok(());
        }
        if self.options.mode != ParseMode::Lenient {
            return Err(ParseError::new(
                ParseIssue::OutsideDataBlock,
                self.location.position(span.start),
                "content found before any data block header",
            ));
        }
        debug!("content before the first data block, opening '{}'", SYNTHETIC_BLOCK_NAME);
        self.block = Some(DataBlock::new(SYNTHETIC_BLOCK_NAME));
        Ok(())
    }

    fn open_block(&mut self, token: &StarToken<'a>) -> Result<(), ParseError> {
        let name = self.normalize(token.value);

        if let Some(frame) = self.frame.take() {
            self.irregular(
                ParseIssue::UnterminatedSaveFrame,
                &token.span,
                format!(
                    "save frame '{}' is not terminated before '{}'",
                    frame.name, token.value
                ),
            )?;
            self.store_frame(frame);
        }
        self.close_block();

        if self.extent.contains_key(&name) {
            self.irregular(
                ParseIssue::DuplicateDataBlock,
                &token.span,
                format!("duplicate data block '{}' ignored", name),
            )?;
        }
        self.block = Some(DataBlock::new(name));
        Ok(())
    }

    fn close_block(&mut self) {
        if let Some(block) = self.block.take() {
            // duplicates were reported when the block was opened
            self.extent.add_block(block);
        }
    }

    fn save_frame(&mut self, token: &StarToken<'a>) -> Result<(), ParseError> {
        // `save_` alone terminates, `save_name` opens
        if token.value.len() == "save_".len() {
            return match self.frame.take() {
                Some(frame) => {
                    self.store_frame(frame);
                    Ok(())
                }
                None => self.irregular(
                    ParseIssue::StraySaveFrameEnd,
                    &token.span,
                    "'save_' without an open save frame",
                ),
            };
        }

        self.ensure_block(&token.span)?;
        let name = self.normalize(token.value);

        if let Some(open) = self.frame.take() {
            self.irregular(
                ParseIssue::NestedSaveFrame,
                &token.span,
                format!("save frame '{}' opened inside '{}'", name, open.name),
            )?;
            self.store_frame(open);
        }

        let taken = self
            .block
            .as_ref()
            .is_some_and(|block| block.contains_key(&name));
        if taken {
            self.irregular(
                ParseIssue::DuplicateSaveFrame,
                &token.span,
                format!("duplicate save frame '{}' ignored", name),
            )?;
        }
        self.frame = Some(SaveFrame::new(name));
        Ok(())
    }

    fn store_frame(&mut self, frame: SaveFrame) {
        if let Some(block) = self.block.as_mut() {
            // duplicates were reported when the frame was opened
            block.add_save_frame(frame);
        }
    }

    fn add_item(&mut self, tag: String, value: StarValue) -> bool {
        match (self.frame.as_mut(), self.block.as_mut()) {
            (Some(frame), _) => frame.add_item(tag, value),
            (None, Some(block)) => block.add_item(tag, value),
            (None, None) => false,
        }
    }

    fn add_loop(&mut self, table: Loop) -> Vec<String> {
        match (self.frame.as_mut(), self.block.as_mut()) {
            (Some(frame), _) => frame.add_loop(table),
            (None, Some(block)) => block.add_loop(table),
            (None, None) => Vec::new(),
        }
    }

    fn parse_item(&mut self, token: &StarToken<'a>) -> Result<(), ParseError> {
        self.ensure_block(&token.span)?;
        let tag = self.normalize(token.value);

        match self.next_token()? {
            Some(next) if next.kind.is_value() => {
                if !self.add_item(tag.clone(), to_value(&next)) {
                    self.irregular(
                        ParseIssue::DuplicateTag,
                        &token.span,
                        format!("duplicate tag '{}' ignored", tag),
                    )?;
                }
                Ok(())
            }
            other => {
                self.irregular(
                    ParseIssue::MissingValue,
                    &token.span,
                    format!("data name '{}' has no value", tag),
                )?;
                if let Some(next) = other {
                    self.push_back(next);
                }
                Ok(())
            }
        }
    }

    fn parse_loop(&mut self, token: &StarToken<'a>) -> Result<(), ParseError> {
        self.ensure_block(&token.span)?;

        // Header: consecutive data names. `keep` marks which value positions survive.
        let mut columns: Vec<String> = Vec::new();
        let mut keep: Vec<bool> = Vec::new();
        let mut next = loop {
            match self.next_token()? {
                Some(column) if column.kind == TokenType::DataName => {
                    let name = self.normalize(column.value);
                    if columns.contains(&name) {
                        self.irregular(
                            ParseIssue::DuplicateColumn,
                            &column.span,
                            format!("repeated loop column '{}' dropped", name),
                        )?;
                        keep.push(false);
                    } else {
                        columns.push(name);
                        keep.push(true);
                    }
                }
                other => break other,
            }
        };

        if columns.is_empty() {
            self.irregular(
                ParseIssue::EmptyLoop,
                &token.span,
                "'loop_' is not followed by any column name",
            )?;
            if let Some(next) = next {
                self.push_back(next);
            }
            return Ok(());
        }

        // Body: values until a terminator
        let mut values: Vec<StarValue> = Vec::new();
        let mut last_span = token.span.clone();
        while let Some(current) = next {
            if current.kind.is_value() {
                values.push(to_value(&current));
                last_span = current.span.clone();
            } else if current.kind.is_bad() {
                self.bad_token(&current)?;
            } else {
                if current.kind != TokenType::LoopStop {
                    self.push_back(current);
                }
                break;
            }
            next = self.next_token()?;
        }

        let width = keep.len();
        let remainder = values.len() % width;
        if remainder != 0 {
            self.irregular(
                ParseIssue::RowRemainder,
                &last_span,
                format!(
                    "loop '{}' has {} values, which is not a multiple of its {} columns",
                    columns[0],
                    values.len(),
                    width
                ),
            )?;
            values.truncate(values.len() - remainder);
        }

        let mut table = Loop::new(columns);
        let mut row = Vec::with_capacity(width);
        for (position, value) in values.into_iter().enumerate() {
            if keep[position % width] {
                row.push(value);
            }
            if position % width == width - 1 {
                table.add_row(row.drain(..));
            }
        }

        for clash in self.add_loop(table) {
            self.irregular(
                ParseIssue::DuplicateTag,
                &token.span,
                format!("loop column '{}' clashes with an existing tag", clash),
            )?;
        }
        Ok(())
    }
}

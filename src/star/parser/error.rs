//! Parser errors

use crate::star::ast::{DiagnosticSeverity, Position};
use std::fmt;

/// Kinds of structural or lexical irregularity found by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseIssue {
    BadToken,
    BadConstruct,
    OutsideDataBlock,
    NestedSaveFrame,
    StraySaveFrameEnd,
    UnterminatedSaveFrame,
    StrayLoopStop,
    StrayValue,
    MissingValue,
    EmptyLoop,
    DuplicateColumn,
    RowRemainder,
    DuplicateTag,
    DuplicateSaveFrame,
    DuplicateDataBlock,
    TokenLimit,
}

impl ParseIssue {
    /// Stable kebab-case code used in diagnostics
    pub fn code(self) -> &'static str {
        match self {
            ParseIssue::BadToken => "bad-token",
            ParseIssue::BadConstruct => "bad-construct",
            ParseIssue::OutsideDataBlock => "outside-data-block",
            ParseIssue::NestedSaveFrame => "nested-save-frame",
            ParseIssue::StraySaveFrameEnd => "stray-save-frame-end",
            ParseIssue::UnterminatedSaveFrame => "unterminated-save-frame",
            ParseIssue::StrayLoopStop => "stray-loop-stop",
            ParseIssue::StrayValue => "stray-value",
            ParseIssue::MissingValue => "missing-value",
            ParseIssue::EmptyLoop => "empty-loop",
            ParseIssue::DuplicateColumn => "duplicate-column",
            ParseIssue::RowRemainder => "row-remainder",
            ParseIssue::DuplicateTag => "duplicate-tag",
            ParseIssue::DuplicateSaveFrame => "duplicate-save-frame",
            ParseIssue::DuplicateDataBlock => "duplicate-data-block",
            ParseIssue::TokenLimit => "token-limit",
        }
    }

    /// Malformed tokens are errors; structural recoveries are warnings
    pub fn severity(self) -> DiagnosticSeverity {
        match self {
            ParseIssue::BadToken | ParseIssue::BadConstruct => DiagnosticSeverity::Error,
            _ => DiagnosticSeverity::Warning,
        }
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Fatal parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{position}: {message}")]
pub struct ParseError {
    pub issue: ParseIssue,
    pub position: Position,
    pub message: String,
}

impl ParseError {
    pub fn new(issue: ParseIssue, position: Position, message: impl Into<String>) -> Self {
        Self {
            issue,
            position,
            message: message.into(),
        }
    }
}

//! The ZAX assembly language: tokenizer, parser and the two-pass
//! translation into a program document.

mod parser;
mod program;
mod token;

pub use program::{CodeLine, DataLine, DataValue, Operand, SourceProgram};

use std::fmt;

use crate::isa::{AddressMode, Opcode, Word};

/// Errors produced while parsing or translating an assembly source.
///
/// Every variant carries the 1-based source line it was detected on.
#[derive(Debug, Clone, PartialEq)]
pub enum AsmError {
    /// A mnemonic that names no operation. Carries the closest known
    /// mnemonic when one is close enough to be worth suggesting.
    UnknownMnemonic {
        line: usize,
        name: String,
        suggestion: Option<&'static str>,
    },

    /// The same label defined twice within one label space.
    DuplicateLabel { line: usize, label: String },

    /// An operand referring to a label that is never defined.
    UnknownLabel { line: usize, label: String },

    /// An operand form the opcode does not accept.
    IllegalAddressing {
        line: usize,
        opcode: Opcode,
        mode: AddressMode,
    },

    /// `inp`/`outp` with a port number other than 1 or 2.
    InvalidPort { line: usize, port: Word },

    /// The source has no `section .code` marker.
    MissingCodeSection,

    /// Anything else that does not form a valid line.
    Malformed { line: usize, expected: &'static str },
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AsmError::UnknownMnemonic {
                line,
                name,
                suggestion,
            } => {
                write!(f, "line {}: unknown mnemonic '{}'", line, name)?;
                if let Some(suggestion) = suggestion {
                    write!(f, " (did you mean '{}'?)", suggestion)?;
                }
                Ok(())
            }
            AsmError::DuplicateLabel { line, label } => {
                write!(f, "line {}: label '{}' is already defined", line, label)
            }
            AsmError::UnknownLabel { line, label } => {
                write!(f, "line {}: no such label '{}'", line, label)
            }
            AsmError::IllegalAddressing { line, opcode, mode } => write!(
                f,
                "line {}: {} does not take a {} operand",
                line, opcode, mode
            ),
            AsmError::InvalidPort { line, port } => {
                write!(f, "line {}: no such port {}", line, port)
            }
            AsmError::MissingCodeSection => write!(f, "no 'section .code' in the source"),
            AsmError::Malformed { line, expected } => {
                write!(f, "line {}: expected {}", line, expected)
            }
        }
    }
}

impl std::error::Error for AsmError {}

//! The parsed assembly program and its two-pass translation into a program
//! document.

use std::collections::HashMap;

use super::{parser, AsmError};
use crate::document::{DataEntry, Program};
use crate::isa::{self, AddressMode, Instruction, Opcode, Word};

/// One line of the data section.
#[derive(Debug, Clone, PartialEq)]
pub struct DataLine {
    pub label: Option<String>,
    pub value: DataValue,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// A string, one cell per character.
    Str(String),

    /// A single-cell numeric literal.
    Literal(Word),

    /// `buf(n)`: n zeroed cells.
    Reserve(Word),
}

/// One line of the code section.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeLine {
    pub label: Option<String>,
    pub opcode: Opcode,
    pub operand: Operand,
    pub line: usize,
}

/// An operand as written, before labels are resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Direct(Word),
    LabelAddr(String),
    LabelVal(String),
    Indirect(String),
}

/// A parsed assembly program, not yet translated.
///
/// Data and code labels live in separate spaces: jump targets resolve
/// against code labels, every other operand against data labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceProgram {
    pub data: Vec<DataLine>,
    pub code: Vec<CodeLine>,
}

impl SourceProgram {
    pub fn parse(source: &str) -> Result<SourceProgram, AsmError> {
        parser::parse_source(source)
    }

    /// Translates the program: places the data section, then resolves every
    /// operand against the label spaces and the addressing legality table.
    pub fn translate(&self) -> Result<Program, AsmError> {
        let (entries, data_labels) = self.place_data()?;
        let code_labels = self.place_code()?;

        let mut code = Vec::with_capacity(self.code.len());

        for line in &self.code {
            let (mode, arg) = self.resolve(line, &data_labels, &code_labels)?;

            if !isa::is_legal(line.opcode, mode) {
                return Err(AsmError::IllegalAddressing {
                    line: line.line,
                    opcode: line.opcode,
                    mode,
                });
            }

            code.push(Instruction::new(line.opcode, mode, arg));
        }

        Ok(Program {
            data: entries,
            code,
        })
    }

    /// Pass one over the data section: builds the document entries and
    /// records each label's address in the memory image. A label points at
    /// the entry's first image cell, which for strings and buffers is the
    /// length prefix.
    fn place_data(&self) -> Result<(Vec<DataEntry>, HashMap<&str, Word>), AsmError> {
        let mut entries = Vec::with_capacity(self.data.len());
        let mut labels = HashMap::new();
        let mut place: Word = 0;

        for line in &self.data {
            if let Some(label) = &line.label {
                if labels.insert(label.as_str(), place).is_some() {
                    return Err(AsmError::DuplicateLabel {
                        line: line.line,
                        label: label.clone(),
                    });
                }
            }

            let entry = match &line.value {
                DataValue::Str(text) => {
                    let init: Vec<Word> = text.chars().map(|c| c as Word).collect();
                    DataEntry {
                        size: init.len() as Word,
                        init,
                    }
                }
                DataValue::Reserve(cells) => DataEntry {
                    size: *cells,
                    init: vec![0; *cells as usize],
                },
                DataValue::Literal(value) => DataEntry {
                    size: 1,
                    init: vec![*value],
                },
            };

            place += if entry.size == 1 { 1 } else { entry.size + 1 };
            entries.push(entry);
        }

        Ok((entries, labels))
    }

    /// Pass one over the code section: each label names its instruction's
    /// address.
    fn place_code(&self) -> Result<HashMap<&str, Word>, AsmError> {
        let mut labels = HashMap::new();

        for (address, line) in self.code.iter().enumerate() {
            if let Some(label) = &line.label {
                if labels.insert(label.as_str(), address as Word).is_some() {
                    return Err(AsmError::DuplicateLabel {
                        line: line.line,
                        label: label.clone(),
                    });
                }
            }
        }

        Ok(labels)
    }

    fn resolve(
        &self,
        line: &CodeLine,
        data_labels: &HashMap<&str, Word>,
        code_labels: &HashMap<&str, Word>,
    ) -> Result<(AddressMode, Word), AsmError> {
        let jump = line.opcode == Opcode::Jmp || line.opcode == Opcode::Jmpz;

        let lookup = |label: &str| {
            let space = if jump { code_labels } else { data_labels };

            space
                .get(label)
                .copied()
                .ok_or_else(|| AsmError::UnknownLabel {
                    line: line.line,
                    label: label.to_string(),
                })
        };

        Ok(match &line.operand {
            Operand::None => (AddressMode::NoOperand, 0),
            Operand::Direct(value) => (AddressMode::Direct, *value),
            Operand::LabelAddr(label) => (AddressMode::LabelAddr, lookup(label)?),
            Operand::LabelVal(label) => (AddressMode::LabelVal, lookup(label)?),
            Operand::Indirect(label) => (AddressMode::Indirect, lookup(label)?),
        })
    }
}

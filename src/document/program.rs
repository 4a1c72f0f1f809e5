use std::fmt;

use itertools::Itertools;

use crate::error::ParseError;
use crate::isa::{Instruction, Word};

/// One entry of the data segment: a declared size and the initial values.
#[derive(Debug, Clone, PartialEq)]
pub struct DataEntry {
    pub size: Word,
    pub init: Vec<Word>,
}

/// A translated program: the data segment and the code segment, with every
/// label already resolved to an address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub data: Vec<DataEntry>,
    pub code: Vec<Instruction>,
}

impl Program {
    pub fn parse(document: &str) -> Result<Program, ParseError> {
        parser::parse_document(document)
    }

    /// Builds the data-memory image the data path loads: entries of size
    /// other than one are preceded by their size, so strings and buffers
    /// carry a length prefix while plain literals occupy a single cell.
    pub fn memory_image(&self) -> Vec<Word> {
        let mut image = Vec::new();

        for entry in &self.data {
            if entry.size != 1 {
                image.push(entry.size);
            }
            image.extend(&entry.init);
        }

        image
    }
}

use super::parser;

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "___data___")?;

        for entry in &self.data {
            writeln!(f, "{} {}", entry.size, entry.init.iter().join(" "))?;
        }

        writeln!(f, "___code___")?;

        for instruction in &self.code {
            writeln!(f, "{}", instruction)?;
        }

        writeln!(f, "___end___")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::{AddressMode, Opcode};

    fn sample() -> Program {
        Program {
            data: vec![
                DataEntry {
                    size: 3,
                    init: vec![104, 105, 33],
                },
                DataEntry {
                    size: 1,
                    init: vec![-7],
                },
            ],
            code: vec![
                Instruction::new(Opcode::Load, AddressMode::LabelVal, 4),
                Instruction::new(Opcode::Output, AddressMode::NoOperand, 0),
                Instruction::new(Opcode::Hlt, AddressMode::NoOperand, 0),
            ],
        }
    }

    #[test]
    fn document_roundtrips() {
        let program = sample();
        let document = program.to_string();

        assert_eq!(Program::parse(&document).unwrap(), program);
    }

    #[test]
    fn memory_image_prefixes_multiword_entries() {
        assert_eq!(sample().memory_image(), vec![3, 104, 105, 33, -7]);
    }

    #[test]
    fn image_of_a_reservation_counts_its_cells() {
        let program = Program {
            data: vec![DataEntry {
                size: 2,
                init: vec![0, 0],
            }],
            code: Vec::new(),
        };

        assert_eq!(program.memory_image(), vec![2, 0, 0]);
    }
}

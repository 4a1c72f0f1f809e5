//! Line parser over the token stream.

use logos::Logos;

use edit_distance::edit_distance;

use super::program::{CodeLine, DataLine, DataValue, Operand, SourceProgram};
use super::token::Token;
use super::AsmError;
use crate::isa::{Opcode, OPCODE_ORDER};

/// Mnemonics that are sugar rather than opcodes of their own.
const PORT_SUGAR: [&str; 2] = ["inp", "outp"];

enum Section {
    Data,
    Code,
}

pub(super) fn parse_source(source: &str) -> Result<SourceProgram, AsmError> {
    let mut program = SourceProgram::default();
    let mut section = Section::Data;
    let mut saw_code_marker = false;

    for (number, tokens) in lines(source)? {
        match tokens.as_slice() {
            [] => continue,
            [Token::Section, Token::SectionName("data")] => section = Section::Data,
            [Token::Section, Token::SectionName("code")] => {
                section = Section::Code;
                saw_code_marker = true;
            }
            [Token::Section, ..] => {
                return Err(AsmError::Malformed {
                    line: number,
                    expected: "'.data' or '.code' after 'section'",
                })
            }
            _ => match section {
                Section::Data => program.data.push(data_line(number, &tokens)?),
                Section::Code => program.code.push(code_line(number, &tokens)?),
            },
        }
    }

    if !saw_code_marker {
        return Err(AsmError::MissingCodeSection);
    }

    Ok(program)
}

/// Tokenizes the source into one token list per line.
fn lines(source: &str) -> Result<Vec<(usize, Vec<Token>)>, AsmError> {
    let mut result = Vec::new();
    let mut current = Vec::new();
    let mut number = 1;

    for token in Token::lexer(source) {
        match token {
            Token::Error => {
                return Err(AsmError::Malformed {
                    line: number,
                    expected: "a valid token",
                })
            }
            Token::Newline => {
                result.push((number, std::mem::replace(&mut current, Vec::new())));
                number += 1;
            }
            token => current.push(token),
        }
    }

    if !current.is_empty() {
        result.push((number, current));
    }

    Ok(result)
}

fn data_line(number: usize, tokens: &[Token]) -> Result<DataLine, AsmError> {
    let (label, rest) = take_label(tokens);

    let value = match rest {
        [Token::Str(text)] => DataValue::Str(text.to_string()),
        [Token::Number(value)] => DataValue::Literal(*value),
        [Token::Ident("buf"), Token::GroupBegin, Token::Number(cells), Token::GroupEnd] => {
            if *cells <= 0 {
                return Err(AsmError::Malformed {
                    line: number,
                    expected: "a positive buffer size",
                });
            }
            DataValue::Reserve(*cells)
        }
        _ => {
            return Err(AsmError::Malformed {
                line: number,
                expected: "a string, a number or buf(n)",
            })
        }
    };

    Ok(DataLine {
        label,
        value,
        line: number,
    })
}

fn code_line(number: usize, tokens: &[Token]) -> Result<CodeLine, AsmError> {
    let (label, rest) = take_label(tokens);

    let (mnemonic, rest) = match rest {
        [Token::Ident(name), rest @ ..] => (*name, rest),
        _ => {
            return Err(AsmError::Malformed {
                line: number,
                expected: "a mnemonic",
            })
        }
    };

    let operand = match rest {
        [] => Operand::None,
        [Token::Number(value)] => Operand::Direct(*value),
        [Token::AddrModifier, Token::Ident(name)] => Operand::LabelAddr(name.to_string()),
        [Token::GroupBegin, Token::Ident(name), Token::GroupEnd] => {
            Operand::Indirect(name.to_string())
        }
        [Token::Ident(name)] => Operand::LabelVal(name.to_string()),
        _ => {
            return Err(AsmError::Malformed {
                line: number,
                expected: "at most one operand",
            })
        }
    };

    let (opcode, operand) = resolve_mnemonic(number, mnemonic, operand)?;

    Ok(CodeLine {
        label,
        opcode,
        operand,
        line: number,
    })
}

fn take_label<'t, 'a>(tokens: &'t [Token<'a>]) -> (Option<String>, &'t [Token<'a>]) {
    match tokens {
        [Token::Label(label), rest @ ..] => (Some(label.to_string()), rest),
        rest => (None, rest),
    }
}

/// `inp N`/`outp N` are spellings of the port opcodes and carry no operand
/// of their own; everything else resolves through the opcode vocabulary.
fn resolve_mnemonic(
    number: usize,
    mnemonic: &str,
    operand: Operand,
) -> Result<(Opcode, Operand), AsmError> {
    if PORT_SUGAR.contains(&mnemonic) {
        let port = match operand {
            Operand::Direct(port) => port,
            _ => {
                return Err(AsmError::Malformed {
                    line: number,
                    expected: "a port number after 'inp'/'outp'",
                })
            }
        };

        let opcode = match (mnemonic, port) {
            ("inp", 1) => Opcode::Port1In,
            ("inp", 2) => Opcode::Port2In,
            ("outp", 1) => Opcode::Port1Out,
            ("outp", 2) => Opcode::Port2Out,
            _ => return Err(AsmError::InvalidPort { line: number, port }),
        };

        return Ok((opcode, Operand::None));
    }

    match Opcode::from_mnemonic(mnemonic) {
        Some(opcode) => Ok((opcode, operand)),
        None => Err(AsmError::UnknownMnemonic {
            line: number,
            name: mnemonic.to_string(),
            suggestion: suggest(mnemonic),
        }),
    }
}

fn suggest(name: &str) -> Option<&'static str> {
    OPCODE_ORDER
        .iter()
        .map(|opcode| opcode.mnemonic())
        .chain(PORT_SUGAR.iter().copied())
        .map(|mnemonic| (edit_distance(name, mnemonic), mnemonic))
        .min_by_key(|(distance, _)| *distance)
        .filter(|(distance, _)| *distance <= 2)
        .map(|(_, mnemonic)| mnemonic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_sections() {
        let program = parse_source(
            r#"
            section .data
            greeting: "hi"
            x: 0x41
            scratch: buf(4)

            section .code
            start: load x
                   output
                   hlt
            "#,
        )
        .unwrap();

        assert_eq!(program.data.len(), 3);
        assert_eq!(program.code.len(), 3);
        assert_eq!(program.data[0].value, DataValue::Str("hi".to_string()));
        assert_eq!(program.data[1].value, DataValue::Literal(65));
        assert_eq!(program.data[2].value, DataValue::Reserve(4));
        assert_eq!(program.code[0].label.as_deref(), Some("start"));
        assert_eq!(program.code[0].operand, Operand::LabelVal("x".to_string()));
    }

    #[test]
    fn operand_syntax_selects_the_addressing_mode() {
        let program = parse_source(
            "section .code\nload 0x5\nload v\nload &v\nload (v)\ninc\n",
        )
        .unwrap();

        let operands: Vec<_> = program.code.iter().map(|line| &line.operand).collect();

        assert_eq!(
            operands,
            vec![
                &Operand::Direct(5),
                &Operand::LabelVal("v".to_string()),
                &Operand::LabelAddr("v".to_string()),
                &Operand::Indirect("v".to_string()),
                &Operand::None,
            ],
        );
    }

    #[test]
    fn port_sugar_resolves_to_port_opcodes() {
        let program = parse_source("section .code\ninp 0x1\noutp 2\nport2_in\n").unwrap();

        let opcodes: Vec<_> = program.code.iter().map(|line| line.opcode).collect();

        assert_eq!(opcodes, vec![Opcode::Port1In, Opcode::Port2Out, Opcode::Port2In]);
        assert!(program.code.iter().all(|line| line.operand == Operand::None));
    }

    #[test]
    fn bad_port_number_is_reported() {
        let error = parse_source("section .code\ninp 3\n").unwrap_err();

        assert_eq!(error, AsmError::InvalidPort { line: 2, port: 3 });
    }

    #[test]
    fn unknown_mnemonic_comes_with_a_suggestion() {
        let error = parse_source("section .code\nlaod x\n").unwrap_err();

        match error {
            AsmError::UnknownMnemonic {
                line,
                name,
                suggestion,
            } => {
                assert_eq!(line, 2);
                assert_eq!(name, "laod");
                assert_eq!(suggestion, Some("load"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn source_without_a_code_section_is_rejected() {
        assert_eq!(
            parse_source("x: 0x1\n"),
            Err(AsmError::MissingCodeSection),
        );
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let program = parse_source(
            "// a program\nsection .code\n\nhlt // stop\n",
        )
        .unwrap();

        assert_eq!(program.code.len(), 1);
    }
}

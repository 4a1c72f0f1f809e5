use std::result::Result as StdResult;

use nom::{
    bytes::complete::{tag, take_while, take_while1},
    combinator::{map, map_res, opt},
    multi::many0,
    sequence::{preceded, tuple},
    IResult,
};

use super::program::{DataEntry, Program};
use crate::error::ParseError;
use crate::isa::{self, AddressMode, Instruction, Opcode, Word};

type Result<'a, T> = IResult<&'a str, T>;

const SPACE_CHARACTERS: &str = " \t";
const NEWLINE_CHARACTERS: &str = "\r\n";

fn sp(input: &str) -> Result<&str> {
    take_while(|c| SPACE_CHARACTERS.contains(c))(input)
}

/// At least one line break, optionally preceded by trailing spaces. Blank
/// lines collapse into the same break.
fn eol(input: &str) -> Result<&str> {
    preceded(sp, take_while1(|c| NEWLINE_CHARACTERS.contains(c)))(input)
}

fn number(input: &str) -> Result<Word> {
    map_res(
        tuple((opt(tag("-")), take_while1(|c: char| c.is_digit(10)))),
        |(sign, digits): (Option<&str>, &str)| {
            digits
                .parse::<Word>()
                .map(|value| if sign.is_some() { -value } else { value })
        },
    )(input)
}

fn word_token(input: &str) -> Result<&str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn opcode(input: &str) -> Result<Opcode> {
    map_res(word_token, |name| Opcode::from_mnemonic(name).ok_or(()))(input)
}

fn address_mode(input: &str) -> Result<AddressMode> {
    map_res(word_token, |name| AddressMode::from_name(name).ok_or(()))(input)
}

fn data_entry(input: &str) -> Result<DataEntry> {
    map(
        tuple((preceded(sp, number), many0(preceded(sp, number)), eol)),
        |(size, init, _)| DataEntry { size, init },
    )(input)
}

fn code_entry(input: &str) -> Result<Instruction> {
    map_res(
        tuple((
            preceded(sp, opcode),
            preceded(sp, address_mode),
            preceded(sp, number),
            eol,
        )),
        |(opcode, mode, arg, _)| {
            if isa::is_legal(opcode, mode) {
                Ok(Instruction::new(opcode, mode, arg))
            } else {
                Err(())
            }
        },
    )(input)
}

fn header(name: &'static str) -> impl for<'a> Fn(&'a str) -> Result<'a, &'a str> {
    move |input| preceded(sp, tag(name))(input)
}

fn parse_program(input: &str) -> Result<Program> {
    let (input, _) = take_while(char::is_whitespace)(input)?;
    let (input, _) = header("___data___")(input)?;
    let (input, _) = eol(input)?;
    let (input, data) = many0(data_entry)(input)?;
    let (input, _) = header("___code___")(input)?;
    let (input, _) = eol(input)?;
    let (input, code) = many0(code_entry)(input)?;
    let (input, _) = header("___end___")(input)?;
    let (input, _) = take_while(char::is_whitespace)(input)?;

    Ok((input, Program { data, code }))
}

pub(crate) fn parse_document(input: &str) -> StdResult<Program, ParseError> {
    match parse_program(input) {
        Ok(("", program)) => Ok(program),
        Ok((rest, _)) => Err(ParseError::new(input, rest, "unexpected trailing input")),
        Err(nom::Err::Error((rest, _))) | Err(nom::Err::Failure((rest, _))) => {
            Err(ParseError::new(input, rest, "malformed program document"))
        }
        Err(nom::Err::Incomplete(_)) => Err(ParseError::new(input, "", "unexpected end of input")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_document() {
        let document = "___data___\n___code___\nhlt no_op 0\n___end___\n";

        let program = parse_document(document).unwrap();

        assert!(program.data.is_empty());
        assert_eq!(program.code, vec![Instruction::new(Opcode::Hlt, AddressMode::NoOperand, 0)]);
    }

    #[test]
    fn parses_data_entries_with_negative_words() {
        let document = "___data___\n3 10 -20 30\n1 -1\n___code___\n___end___";

        let program = parse_document(document).unwrap();

        assert_eq!(program.data.len(), 2);
        assert_eq!(program.data[0].init, vec![10, -20, 30]);
        assert_eq!(program.data[1].init, vec![-1]);
    }

    #[test]
    fn unknown_opcode_is_located() {
        let document = "___data___\n___code___\nfrobnicate no_op 0\n___end___\n";

        let error = parse_document(document).unwrap_err();

        assert_eq!(error.line, 3);
    }

    #[test]
    fn illegal_addressing_pair_is_rejected() {
        let document = "___data___\n___code___\ninc label_val 3\n___end___\n";

        assert!(parse_document(document).is_err());
    }

    #[test]
    fn vocabulary_must_match_exactly() {
        // The symbolic vocabulary is lower case; "LOAD" is not in it.
        let document = "___data___\n___code___\nLOAD direct_addr 1\n___end___\n";

        assert!(parse_document(document).is_err());
    }
}

//! Tokens and a tokenizer for the assembly source format.

use logos::{Lexer, Logos};

use std::fmt;

use crate::isa::Word;

/// Enumeration of all tokens of the assembly format.
///
/// The format is line-oriented, so line breaks are tokens of their own
/// while all other whitespace and `//` comments are skipped.
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Errorneous token that could not be interpreted as any of the other
    /// variants.
    #[error]
    #[regex(r"[ \t\r\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    Error,

    #[token("\n")]
    Newline,

    /// The `section` keyword introducing a segment marker line.
    #[token("section")]
    Section,

    /// A segment name, `.data` or `.code`.
    #[regex(r"\.[a-z]+", section_callback)]
    SectionName(&'a str),

    /// A label definition, `name:`.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*:", label_callback)]
    Label(&'a str),

    /// An identifier: a mnemonic or a label reference.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", Lexer::slice)]
    Ident(&'a str),

    /// A numeric literal, decimal or `0x` hexadecimal.
    #[regex(r"0x[0-9a-fA-F]+", hex_callback)]
    #[regex(r"-?[0-9]+", literal_callback)]
    Number(Word),

    /// A string literal in double or single quotes.
    #[regex(r#""[^"\n]*""#, string_callback)]
    #[regex(r"'[^'\n]*'", string_callback)]
    Str(&'a str),

    /// Token (`&`) marking a label-as-address operand.
    #[token("&")]
    AddrModifier,

    /// Tokens (`(`, `)`) wrapping an indirect operand or a `buf(n)`
    /// reservation.
    #[token("(")]
    GroupBegin,

    #[token(")")]
    GroupEnd,
}

fn section_callback<'a>(lex: &mut Lexer<'a, Token<'a>>) -> &'a str {
    &lex.slice()[1..]
}

fn label_callback<'a>(lex: &mut Lexer<'a, Token<'a>>) -> &'a str {
    let slice = lex.slice();
    &slice[..slice.len() - 1]
}

fn string_callback<'a>(lex: &mut Lexer<'a, Token<'a>>) -> &'a str {
    let slice = lex.slice();
    &slice[1..slice.len() - 1]
}

fn hex_callback<'a>(
    lex: &mut Lexer<'a, Token<'a>>,
) -> std::result::Result<Word, std::num::ParseIntError> {
    Word::from_str_radix(&lex.slice()[2..], 16)
}

fn literal_callback<'a>(
    lex: &mut Lexer<'a, Token<'a>>,
) -> std::result::Result<Word, std::num::ParseIntError> {
    lex.slice().parse()
}

impl<'t> fmt::Display for Token<'t> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Error => write!(f, "<error>"),
            Token::Newline => write!(f, "<newline>"),
            Token::Section => write!(f, "section"),
            Token::SectionName(name) => write!(f, ".{}", name),
            Token::Label(label) => write!(f, "{}:", label),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Number(num) => write!(f, "{}", num),
            Token::Str(text) => write!(f, "\"{}\"", text),
            Token::AddrModifier => write!(f, "&"),
            Token::GroupBegin => write!(f, "("),
            Token::GroupEnd => write!(f, ")"),
        }
    }
}

use std::collections::VecDeque;

use zax::{
    control::{ControlUnit, TICKS_EXCEEDED},
    datapath::DataPath,
    document,
    error::ParseError,
    isa::Word,
    symbolic::{AsmError, SourceProgram},
};

use clap::{App, Arg, ArgMatches};
use slog::{o, Drain, Logger};

enum Error {
    Asm(AsmError),
    Document(ParseError),
    BadArgument(String),
    IO(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IO(e)
    }
}

impl From<AsmError> for Error {
    fn from(e: AsmError) -> Error {
        Error::Asm(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Error {
        Error::Document(e)
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("zaxrun")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Mitja Karhusaari <mitja@karhusaari.me>")
        .about("Utility for assembling and executing ZAX programs")
        .arg(
            Arg::with_name("source")
                .help("File containing assembly source (.zax) or a program document")
                .value_name("SOURCE")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("input")
                .help("File whose characters feed the primary input stream")
                .value_name("INPUT")
                .index(2),
        )
        .arg(
            Arg::with_name("data-size")
                .help("Data memory capacity in words")
                .long("data-size")
                .default_value("128"),
        )
        .arg(
            Arg::with_name("code-size")
                .help("Code memory capacity in instructions")
                .long("code-size")
                .default_value("128"),
        )
        .arg(
            Arg::with_name("port1")
                .help("Comma-separated integers preset on port 1's incoming queue")
                .long("port1")
                .value_name("VALUES"),
        )
        .arg(
            Arg::with_name("port2")
                .help("Comma-separated integers preset on port 2's incoming queue")
                .long("port2")
                .value_name("VALUES"),
        )
        .arg(
            Arg::with_name("verbose")
                .help("Trace every instruction boundary and I/O transfer")
                .short("v")
                .long("verbose"),
        )
        .get_matches()
}

fn main() {
    let args = parse_arguments();

    match run(&args) {
        Ok(()) => (),
        Err(Error::IO(io)) => eprintln!("IO error: {}", io),
        Err(Error::Asm(asm)) => eprintln!("{}", asm),
        Err(Error::Document(parse)) => eprintln!("{}", parse),
        Err(Error::BadArgument(what)) => eprintln!("{}", what),
    }
}

fn run(args: &ArgMatches) -> Result<(), Error> {
    let source_path = args.value_of("source").unwrap();
    let source = std::fs::read_to_string(source_path)?;

    let program = if source_path.ends_with(".zax") {
        SourceProgram::parse(&source)?.translate()?
    } else {
        document::Program::parse(&source)?
    };

    let input = match args.value_of("input") {
        Some(path) => input_list(&std::fs::read_to_string(path)?),
        None => Vec::new(),
    };

    let data_size = capacity(args, "data-size")?;
    let code_size = capacity(args, "code-size")?;

    let log = logger(args.is_present("verbose"));

    let mut datapath = DataPath::with_logger(data_size, code_size, input, log.clone());
    datapath.load_program(&program);
    datapath.ports[0].incoming = port_values(args.value_of("port1"))?;
    datapath.ports[1].incoming = port_values(args.value_of("port2"))?;

    let mut control = ControlUnit::with_logger(datapath, log);
    let result = control.run();

    print!("{}", render(&control.dp.output));

    if result.ticks == TICKS_EXCEEDED {
        println!("\n\nTick limit exceeded, Command count: {}", result.instructions);
    } else {
        println!(
            "\n\nTick count: {}, Command count: {}",
            result.ticks, result.instructions
        );
    }

    Ok(())
}

fn logger(verbose: bool) -> Option<Logger> {
    if !verbose {
        return None;
    }

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Some(Logger::root(drain, o!()))
}

/// Builds the input queue from a file's characters: digits become their
/// numeric value, everything else its code point.
fn input_list(text: &str) -> Vec<Word> {
    text.chars()
        .map(|c| match c.to_digit(10) {
            Some(digit) => digit as Word,
            None => c as Word,
        })
        .collect()
}

fn capacity(args: &ArgMatches, name: &str) -> Result<usize, Error> {
    args.value_of(name)
        .unwrap()
        .parse()
        .map_err(|_| Error::BadArgument(format!("--{} expects a number of words", name)))
}

fn port_values(arg: Option<&str>) -> Result<VecDeque<Word>, Error> {
    let values = match arg {
        Some(values) => values,
        None => return Ok(VecDeque::new()),
    };

    values
        .split(',')
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| Error::BadArgument(format!("invalid port value '{}'", value)))
        })
        .collect()
}

/// Integers in the printable range (space through 'z') and newline render
/// as characters, anything else as a number on its own line.
fn render(output: &[Word]) -> String {
    let mut text = String::new();

    for value in output.iter() {
        match std::char::from_u32(*value as u32) {
            Some(c) if (' ' <= c && c <= 'z') || c == '\n' => text.push(c),
            _ => text.push_str(&format!("{}\n", value)),
        }
    }

    text
}

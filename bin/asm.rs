use zax::symbolic::{AsmError, SourceProgram};

use clap::{App, Arg, ArgMatches};

enum Error {
    Asm(AsmError),
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

fn parse_arguments() -> ArgMatches<'static> {
    App::new("zaxasm")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Mitja Karhusaari <mitja@karhusaari.me>")
        .about("Utility for translating ZAX assembly into program documents")
        .arg(
            Arg::with_name("source")
                .help("File containing assembly source")
                .value_name("SOURCE")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("target")
                .help("File to write the program document to")
                .value_name("TARGET")
                .required(true)
                .index(2),
        )
        .get_matches()
}

fn main() {
    let args = parse_arguments();

    let source = args.value_of("source").unwrap();
    let target = args.value_of("target").unwrap();

    match run(source, target) {
        Ok(()) => (),
        Err(Error::IO(io)) => eprintln!("IO error: {}", io),
        Err(Error::Asm(asm)) => eprintln!("{}", asm),
    }
}

fn run(source_path: &str, target_path: &str) -> Result<(), Error> {
    let source = std::fs::read_to_string(source_path)?;

    let program = SourceProgram::parse(&source)?.translate()?;

    std::fs::write(target_path, program.to_string())?;

    Ok(())
}

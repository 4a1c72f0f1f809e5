//! A crate for doing anything related to the ZAX accumulator architecture:
//! a small microprogrammed machine with two I/O ports, used for teaching
//! how a real control unit drives a data path one clock tick at a time.
//!
//! Currently this crate provides the functionality to:
//! - Parse `.zax` symbolic assembly and translate it into a program document.
//! - Read and write `.za` program documents.
//! - Compile the symbolic microcode templates into the binary control-word
//!   table.
//! - Execute program documents tick by tick on a data path / control unit
//!   pair, down to individual mux-select and latch signals.
//!
//! # Future plans
//!
//! - A `zaxdbg` single-stepper over [`ControlUnit::step`](control::ControlUnit::step)
//! - Memory-mapped port configuration
//!
//! # Example
//! ```
//! use zax::{
//!     symbolic::SourceProgram,
//!     datapath::DataPath,
//!     control::ControlUnit,
//! };
//!
//! fn main() {
//!     // Load the character stored at `x`, bump it and print it.
//!     let source = r#"
//!         section .data
//!         x: 0x41
//!
//!         section .code
//!         load x
//!         inc
//!         output
//!         hlt
//!     "#;
//!
//!     // Parse the assembly and resolve it into a program document.
//!     let program = SourceProgram::parse(source)
//!         .expect("could not parse the source")
//!         .translate()
//!         .expect("could not translate the source");
//!
//!     // Load the document into a fresh machine and run it to completion.
//!     let mut datapath = DataPath::new(128, 128, Vec::new());
//!     datapath.load_program(&program);
//!
//!     let mut control = ControlUnit::new(datapath);
//!     let result = control.run();
//!
//!     assert_eq!(control.dp.output, vec![66]);
//!     println!("{} ticks, {} instructions", result.ticks, result.instructions);
//! }
//! ```
//!
//! # Executables
//!
//! ## `zaxasm`
//!
//! Translates a `.zax` assembly source into a `.za` program document.
//!
//! ## `zaxrun`
//!
//! Assembles and/or executes a program with an optional input file, then
//! prints the rendered output and the tick/instruction counters.

pub mod control;
pub mod datapath;
pub mod document;
pub mod error;
pub mod isa;
pub mod microcode;
pub mod symbolic;

pub mod args;

use clap::Parser;
use clap::error::ErrorKind;
pub use args::Arguments;

/// Parses process arguments. Usage errors exit with code 1.
pub fn parse() -> Arguments {
    match Arguments::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                std::process::exit(1);
            }
        },
    }
}

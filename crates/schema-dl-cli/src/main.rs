#![warn(rust_2018_idioms)]

use schema_dl_cli::Options;
use structopt::StructOpt;

fn main() {
    if let Err(error) = schema_dl_cli::run(Options::from_args()) {
        eprintln!("error: {}", error);
        std::process::exit(1);
    }
}

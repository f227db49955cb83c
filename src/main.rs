//! gfakit CLI
//!
//! Convert, sort, merge and inspect GFA assembly graphs.

use gfakit::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

//! Clinical intake CLI
//!
//! # Usage
//!
//! ```bash
//! # Process every pending file in the drop
//! clinical-intake --config intake.toml process
//!
//! # Process named files and print Prometheus metrics
//! clinical-intake process CLINICALDATA_20250115120000.csv --metrics
//!
//! # Dry-run validation; nothing is moved
//! clinical-intake validate CLINICALDATA_20250115120000.csv
//!
//! # Directory statistics as JSON
//! clinical-intake stats --format json
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: One or more files rejected
//! - 3: Invalid input or configuration
//! - 4: File or file drop error
//! - 10: Internal error

use clap::Parser;
use clinical_intake::{run_cli, telemetry, IntakeCli};

fn main() {
    let cli = IntakeCli::parse();

    telemetry::init_tracing(cli.verbose, cli.quiet);

    let exit_code = run_cli(cli);
    std::process::exit(exit_code.into());
}

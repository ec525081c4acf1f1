use clap::Parser;
use std::process;
use vdf_converter::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(_stats) => {
            // Success - the summary has already been reported by the command
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("VDF Converter - Battery Test Data Standardizer");
    println!("==============================================");
    println!();
    println!("Convert vendor battery-test data files (CSV, RTF, Excel) into");
    println!("standardized tab-delimited VDF files using a YAML mapping document.");
    println!();
    println!("USAGE:");
    println!("    vdf-converter <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    convert     Convert data files to VDF format (main command)");
    println!("    units       List the canonical units accepted in VDF output");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Convert a single cycler export:");
    println!("    vdf-converter convert cell_007.csv --config arbin_mapping.yaml");
    println!();
    println!("    # Convert a batch of files with a custom unit table:");
    println!("    vdf-converter convert runs/*.csv --config mapping.yaml --units units.csv");
    println!();
    println!("    # List the built-in unit table:");
    println!("    vdf-converter units");
    println!();
    println!("For detailed help on any command, use:");
    println!("    vdf-converter <COMMAND> --help");
}

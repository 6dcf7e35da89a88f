use clap::Parser;
use std::path::PathBuf;

use crate::utils::parse_key_value;

/// Generate mock implementations of Go interfaces
#[derive(Parser, Debug, Default)]
#[command(name = "gomockgen")]
#[command(version, about, long_about = None)]
#[command(after_help = "CONFIGURATION:\n    .gomockgen.json files between the working directory and the module root\n    provide defaults for every option.\n\nENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    /// Package to mock: import path, relative directory (./x) or pattern
    pub package: String,

    /// Interfaces to mock (all interfaces of the package if omitted)
    pub interfaces: Vec<String>,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Package name of the generated file
    #[arg(short = 'p', long = "package", value_name = "NAME")]
    pub mock_package: Option<String>,

    /// Mock names, e.g. Reader=MockReader
    #[arg(short, long, value_name = "NAME=MOCK", value_delimiter = ',', value_parser = parse_key_value)]
    pub names: Vec<(String, String)>,

    /// Template substitutions, e.g. ReaderReceiver=r
    #[arg(short, long, value_name = "KEY=VALUE", value_delimiter = ',', value_parser = parse_key_value)]
    pub substitutions: Vec<(String, String)>,

    /// Template file (the built-in testify template if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Formatter command line run on the output ("none" to skip)
    #[arg(long, value_name = "COMMAND")]
    pub formatter: Option<String>,

    /// Working directory
    #[arg(short = 'C', long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

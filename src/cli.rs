use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scansheet")]
#[command(version = "0.3.0")]
#[command(about = "Turns nmap text reports into styled two-view XLSX spreadsheets", long_about = None)]
pub struct Cli {
    #[arg(help = "Path to an existing nmap text report (-oN output)")]
    pub input_file: Option<PathBuf>,

    #[arg(long, help = "Directory for the generated spreadsheet")]
    pub output_dir: Option<PathBuf>,

    #[arg(short, long, help = "Scan target (IP, hostname or CIDR) to scan before converting")]
    pub target: Option<String>,

    #[arg(short, long, help = "Scan profile name from the configured profile table")]
    pub profile: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

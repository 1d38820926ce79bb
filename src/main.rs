use clap::Parser;
use subsweep::cli::{Cli, run_cli};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = ctrlc::set_handler(|| {
        println!("Exiting - Interrupted");
        std::process::exit(130);
    }) {
        eprintln!("Warning: could not install interrupt handler: {}", e);
    }

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("Error: cannot determine current directory: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_cli(cli, &cwd) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

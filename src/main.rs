use clap::error::ErrorKind;
use clap::Parser;

use pbtpflash::cli::Cli;
use pbtpflash::commands;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Usage problems exit 1 like every other failure, so bypass clap's
    // default exit code
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    println!("Request size is {}", cli.request_size);

    if let Some(output) = cli.read.as_deref() {
        commands::run_read(output, cli.request_size)
    } else if let Some(input) = cli.write.as_deref() {
        commands::run_write(input, cli.request_size)
    } else {
        // clap's mode group guarantees one of the two is present
        Err("neither read nor write specified".into())
    }
}

use clap::Parser;

use docpack::cli::Cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(error) = Cli::parse().execute() {
        log::error!("{error}");
        let mut source = error.source();
        while let Some(cause) = source {
            log::error!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

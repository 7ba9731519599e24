use clap::Parser;

use beanctl::cli::{self, Cli};
use beanctl::init_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli::run(cli).await {
        Ok(()) => println!("\nCommand completed successfully"),
        Err(err) => {
            eprintln!("\n{}", err);
            std::process::exit(1);
        },
    }
}

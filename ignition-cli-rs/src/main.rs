use clap::{Parser, Subcommand};

mod solutions;
mod test;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(name = "ignition")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a test report to Flare
    Test(test::TestArgs),
    /// Show the solutions suggested for an error
    Solutions(solutions::SolutionsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Test(test) => test.run().await,
        Commands::Solutions(solutions) => solutions.run(),
    }
}

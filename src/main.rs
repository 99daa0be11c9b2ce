use clap::Parser;
use miette::Result;
use pxbake::cli::{Cli, Commands};
use pxbake::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new();

    match cli.command {
        Commands::Bake(args) => pxbake::cli::bake::run(args, &printer)?,
        Commands::Tile(args) => pxbake::cli::tile::run(args, &printer)?,
        Commands::Flatten(args) => pxbake::cli::flatten::run(args, &printer)?,
        Commands::Scale(args) => pxbake::cli::scale::run(args, &printer)?,
        Commands::Completions(args) => pxbake::cli::completions::run(args)?,
    }

    Ok(())
}

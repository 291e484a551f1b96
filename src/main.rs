use clap::{Parser, Subcommand};

use termdeck::{config, session};

#[derive(Parser)]
#[command(name = "termdeck", about = "A paged terminal layout manager")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List pages in the saved layout
    Ls,
    /// Print the config and state file locations
    Paths,
    /// Delete the saved layout state
    Clear,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Ls) {
        Commands::Ls => {
            if let Some(snap) = session::store::load() {
                for page in &snap.pages {
                    let terminal_count: usize =
                        page.groups.iter().map(|g| g.terminals.len()).sum();
                    println!(
                        "{}: {} groups, {} terminals",
                        page.label,
                        page.groups.len(),
                        terminal_count
                    );
                }
                println!("saved {}", snap.updated_at.format("%Y-%m-%d %H:%M:%S"));
            } else {
                println!("no saved layout state");
            }
        }
        Commands::Paths => {
            println!("config: {}", config::config_file_path().display());
            println!("state:  {}", session::store::state_file_path().display());
        }
        Commands::Clear => {
            session::store::clear()?;
            println!("cleared saved layout state");
        }
    }

    Ok(())
}

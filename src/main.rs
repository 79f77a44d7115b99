#![allow(missing_docs)]

use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "mafiadoc", about = "Mafia .4ds model and scene2.bin/cache.bin world inspection tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Decode a .4ds model.
	Model(cmd::model::Args),
	/// Decode a scene2.bin or cache.bin world file.
	World(cmd::world::Args),
	/// Import a world file with its models into a scene graph.
	Scene(cmd::scene::Args),
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> mafiadoc::mafia::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Model(args) => cmd::model::run(args),
		Commands::World(args) => cmd::world::run(args),
		Commands::Scene(args) => cmd::scene::run(args),
	}
}

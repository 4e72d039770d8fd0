use std::path::PathBuf;

use palc::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "loxer", after_long_help = "Set RUST_LOG (e.g. RUST_LOG=loxer=trace) to log each pipeline stage.")]
pub struct Cli {
	#[command(subcommand)]
	pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
	/// Run a script file
	File {
		path: PathBuf,
		/// Print the value of every top-level expression statement
		#[arg(long)]
		echo: bool,
	},
	/// Start the interactive prompt
	Repl,
}

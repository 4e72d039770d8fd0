use palc::Parser;
use loxer::{Loxer, cli::*};

fn main() {
	loxer::init_tracing();

	match Cli::parse().mode {
		Mode::File { path, echo } => {
			if let Err(e) = Loxer::new().echo(echo).run_file(&path) {
				eprintln!("Failed run file: {e}");
				std::process::exit(e.exit_code());
			}
		}
		Mode::Repl => Loxer::new().run_prompt(),
	}
}

//! # From source text to a running program
//!
//! User's source code: `let average = (min + max) / 2;`

//! ## Scanning
//!
//! Turns characters into tokens: `["let", "average", "=", "(", "min", "+",
//! "max", ")", "/", "2", ";"]`. Whitespace and comments are dropped. See
//! [`Scanner`].

//! ## Parsing
//!
//! Builds statements out of tokens and reports syntax errors. See [`Parser`].
//!
//! ``` markdown
//! average (Statement::Let)
//! └── / (Expression::Binary)
//!     ├── (group) (Expression::Grouping)
//!     │   └── + (Expression::Binary)
//!     │       ├── min (Expression::Variable)
//!     │       └── max (Expression::Variable)
//!     └── 2 (Expression::Literal)
//! ```

//! ## Resolution
//!
//! One static pass that decides, for every name, whether it is a local and
//! where that local lives at run time. It also rejects misplaced `return`,
//! `break`, `continue`, `this` and `super`. See [`Resolver`].

//! ## Interpretation
//!
//! A tree-walker executes the statements against a chain of environments and a
//! table of globals. Classes support single inheritance, static members and
//! `public`/`protected`/`private` access. See [`Interpreter`].

pub mod cli;
mod environment;
mod error;
mod interpreter;
mod loxer;
mod parser;
mod resolver;
mod scanner;
mod statement;
mod utils;

use std::sync::Once;

pub use error::{
	EX_DATAERR, EX_IOERR, EX_SOFTWARE, LoxError,
	interpreter::{RuntimeError, RuntimeErrorKind},
	reporter::{Diagnostic, ErrorSink, Reporter},
	scanner::{ScanError, ScanErrorType, ScannerError},
};
pub use interpreter::{Interpreter, value::Value};
pub use loxer::Loxer;
pub use parser::{Parser, expression::Expression};
pub use resolver::{Address, Resolutions, Resolver};
pub use scanner::Scanner;
pub use statement::Statement;
pub use utils::RcCell;

static TRACING_INIT: Once = Once::new();

/// Install the stderr log subscriber, once, and only when `RUST_LOG` is set.
pub fn init_tracing() {
	TRACING_INIT.call_once(|| {
		use tracing_subscriber::{EnvFilter, fmt, prelude::*};

		if std::env::var("RUST_LOG").is_ok() {
			tracing_subscriber::registry()
				.with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
				.with(EnvFilter::from_default_env())
				.init();
		}
	});
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use loxer::{LoxError, Loxer, RcCell, Reporter, RuntimeErrorKind, Value};
	use pretty_assertions::assert_eq;

	fn loxer() -> (Loxer, RcCell<Vec<u8>>) {
		let output = RcCell::new(Vec::new());
		(Loxer::with_output(Box::new(output.clone()), Reporter::silent()), output)
	}

	fn printed(output: &RcCell<Vec<u8>>) -> String { String::from_utf8(output.borrow().clone()).unwrap() }

	#[test]
	fn test_lox_file() {
		let (mut loxer, output) = loxer();
		let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("test.lox");
		let result = loxer.run_file(&path);
		assert!(result.is_ok(), "{result:?} {:?}", loxer.reporter().diagnostics());
		assert_eq!(printed(&output), "\"all checks passed\"\n");
	}

	#[test]
	fn test_dog_speaks_with_animal_sound() {
		let (mut loxer, _) = loxer();
		let source = r#"
			class Animal {
				protected:
				let sound = "generic";
				public:
				speak() { return this.sound; }
			}
			class Dog < Animal {
				public:
				init() { super(); }
			}
			Dog().speak();
		"#;
		assert_eq!(loxer.run_source(source).unwrap(), Some(Value::from("generic")));
	}

	#[test]
	fn test_protected_and_private_access() {
		let (mut loxer, _) = loxer();
		let classes = r#"
			class Base {
				protected:
				let shared = 1;
				private:
				let hidden = 2;
			}
			class Derived < Base {
				public:
				init() { super(); }
				shared_via_super() { return super.shared; }
				hidden_via_super() { return super.hidden; }
			}
		"#;
		loxer.run_source(classes).unwrap();
		assert_eq!(loxer.run_source("Derived().shared_via_super();").unwrap(), Some(Value::Number(1.0)));

		let Err(LoxError::RuntimeError(error)) = loxer.run_source("Derived().hidden_via_super();") else {
			panic!("private member read from a subclass");
		};
		assert_eq!(error.to_string(), "\"hidden\" is a private member of Base.");

		let Err(LoxError::RuntimeError(error)) = loxer.run_source("Base().shared;") else {
			panic!("protected member read from outside");
		};
		assert!(matches!(error.kind, RuntimeErrorKind::IllegalAccess { .. }));
	}

	#[test]
	fn test_diagnostics_are_rendered_with_lines() {
		let (mut loxer, _) = loxer();
		let result = loxer.run_source("fun f() {\n  { let x = x; }\n}\nbreak;");
		assert!(matches!(result, Err(LoxError::ResolverErrors(2))));
		let rendered: Vec<String> = loxer.reporter().diagnostics().iter().map(ToString::to_string).collect();
		assert_eq!(rendered, vec![
			"[line 2] Error at \"x\": Can't read local variable in its own initializer".to_string(),
			"[line 4] Error at \"break\": Cannot use \"break\" outside of a loop".to_string(),
		]);
		assert_eq!(result.unwrap_err().exit_code(), 65);
	}

	#[test]
	fn test_runtime_fault_exit_code() {
		let (mut loxer, output) = loxer();
		let error = loxer.run_source("print(\"before\");\nlet xs = [];\nxs[0];").unwrap_err();
		assert_eq!(error.exit_code(), 70);
		assert_eq!(printed(&output), "\"before\"\n");
		assert_eq!(loxer.reporter().diagnostics()[0].to_string(), "Array index out of bounds\n[line 3]");
	}
}

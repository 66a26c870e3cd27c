use rox as lox;

use lox::error::{ErrorReporter, LoxError};
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::scan_tokens;

fn resolve_source(source: &str) -> Vec<LoxError> {
    let mut reporter = ErrorReporter::new();
    let tokens = scan_tokens(source, &mut reporter);
    let statements = Parser::new(tokens, &mut reporter).parse();

    assert!(!reporter.has_errors(), "scan/parse errors in {:?}", source);

    let mut interpreter = Interpreter::with_writer(Vec::new());
    Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);

    reporter.drain()
}

#[test]
fn reading_local_in_its_own_initializer_is_an_error() {
    let errors = resolve_source("var a = 1; { var a = a; }");

    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .to_string()
        .contains("Can't read local variable in its own initializer"));
}

#[test]
fn duplicate_declaration_in_local_scope_is_an_error() {
    let errors = resolve_source("{ var a = 1; var a = 2; }");

    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .to_string()
        .contains("Variable already declared in this scope"));
}

#[test]
fn global_redeclaration_is_allowed() {
    let errors = resolve_source("var a = 1; var a = 2;");

    assert!(errors.is_empty(), "got: {:?}", errors);
}

#[test]
fn top_level_return_is_an_error() {
    let errors = resolve_source("return 1;");

    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .to_string()
        .contains("'return' used outside of function"));
}

#[test]
fn return_inside_function_is_fine() {
    let errors = resolve_source("fun f() { return 1; } fun g() { return; }");

    assert!(errors.is_empty(), "got: {:?}", errors);
}

#[test]
fn errors_do_not_stop_the_walk() {
    // Both statements are bad; both get diagnosed in one pass.
    let errors = resolve_source("return 1; { var a = 1; var a = 2; }");

    assert_eq!(errors.len(), 2);
}

#[test]
fn resolving_twice_leaves_bindings_stable() {
    // A closure must keep seeing the binding that was lexically in scope at
    // its declaration, even after the table is rebuilt by a second pass.
    let source = "\
var a = \"global\";
{
  fun show() { print a; }
  show();
  var a = \"block\";
  show();
}
";

    let mut reporter = ErrorReporter::new();
    let tokens = scan_tokens(source, &mut reporter);
    let statements = Parser::new(tokens, &mut reporter).parse();

    assert!(!reporter.has_errors());

    let mut interpreter = Interpreter::with_writer(Vec::new());
    Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);
    Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);

    assert!(!reporter.has_errors());

    interpreter.interpret(&statements).expect("runtime error");

    let output = String::from_utf8(interpreter.into_writer()).expect("utf8 output");
    assert_eq!(output, "global\nglobal\n");
}

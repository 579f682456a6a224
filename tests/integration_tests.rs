//! Integration tests for the whole front end.
//!
//! These tests run source text through tokenization, parsing and type
//! checking, and look at the accepted program or the reported diagnostics.

use kyra::{
    errors::{diagnostics::Diagnostics, errors::ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    render_error,
    type_checker::type_checker::{type_check, CheckedProgram, CheckerConfig},
};
use std::rc::Rc;

fn check(source: &str) -> Result<CheckedProgram, Diagnostics> {
    let tokens = tokenize(source.to_string(), Some("test.ky".to_string())).unwrap();
    let (_, program) = parse(tokens, Rc::new("test.ky".to_string()));
    type_check(&program.unwrap(), CheckerConfig::default())
}

fn diagnostics(source: &str) -> Diagnostics {
    match check(source) {
        Ok(_) => panic!("expected the program to be rejected"),
        Err(diagnostics) => diagnostics,
    }
}

fn kinds(diagnostics: &Diagnostics) -> Vec<ErrorImpl> {
    diagnostics.iter().map(|error| error.internal().clone()).collect()
}

#[test]
fn test_immutable_value_into_mutable_variable() {
    let source = "val x: Int = 1;\nvar y: Int = x;";
    let diagnostics = diagnostics(source);

    assert_eq!(
        kinds(&diagnostics),
        vec![ErrorImpl::WrongType {
            expected: "var Int".to_string(),
            provided: "val Int".to_string(),
        }]
    );

    let position = diagnostics.errors()[0].get_position();
    assert_eq!((position.line, position.column), (2, 14));
}

#[test]
fn test_duplicate_variable_in_same_block() {
    let diagnostics = diagnostics("var x: Int;\nvar x: Int;");

    assert_eq!(
        kinds(&diagnostics),
        vec![ErrorImpl::AlreadyDefinedVariable { name: "x".to_string() }]
    );
    assert_eq!(diagnostics.errors()[0].get_position().line, 2);
}

#[test]
fn test_call_with_too_many_arguments() {
    let diagnostics = diagnostics("fun f(a: Int): Int { return a + 1; }\nval r: Int = f(1, 2);");

    assert_eq!(
        kinds(&diagnostics),
        vec![ErrorImpl::Arity {
            callee: "f".to_string(),
            expected: 1,
            provided: 2,
        }]
    );
    assert_eq!(
        diagnostics.errors()[0].message(),
        "The function f requires 1 arguments, but you provided 2"
    );
}

#[test]
fn test_class_member_initialized_from_constructor() {
    let checked = check("class P(val x: Int) { val y: Int = x + 1; }\nval p = new P(5);\nval z: Int = p.y;").unwrap();

    assert_eq!(checked.statements.len(), 3);
    let names = checked
        .registry
        .iter()
        .map(|declaration| declaration.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["x", "y", "p", "z"]);
}

#[test]
fn test_assignment_to_immutable() {
    let diagnostics = diagnostics("val a: Int = 1;\na = 2;");

    assert_eq!(
        kinds(&diagnostics),
        vec![ErrorImpl::AssignmentToConst { name: "a".to_string() }]
    );
}

#[test]
fn test_call_to_undeclared_name() {
    assert_eq!(
        kinds(&diagnostics("g();")),
        vec![ErrorImpl::UndefinedVariable { name: "g".to_string() }]
    );
    assert_eq!(
        kinds(&diagnostics("class C { val v: Int = g(); }")),
        vec![ErrorImpl::UndefinedMember {
            owner: "C".to_string(),
            member: "g".to_string(),
        }]
    );
}

#[test]
fn test_unrelated_errors_are_all_reported() {
    let source = "val a: Int = \"one\";\nval b: Int = 2;\nb = 3;\nfun f(): Int { }\nval c: Bool = b;";
    let diagnostics = diagnostics(source);

    assert_eq!(diagnostics.len(), 4);
    assert_eq!(
        diagnostics
            .iter()
            .map(|error| error.get_error_name())
            .collect::<Vec<_>>(),
        vec!["WrongType", "AssignmentToConst", "TypingError", "WrongType"]
    );
    assert_eq!(
        diagnostics
            .iter()
            .map(|error| error.get_position().line)
            .collect::<Vec<_>>(),
        vec![1, 3, 4, 5]
    );
}

#[test]
fn test_scope_shadowing_restores_outer_binding() {
    let checked = check("val x: Int = 1;\n{ val x: String = \"inner\"; print x; }\nval y: Int = x;").unwrap();
    assert_eq!(checked.registry.len(), 3);
}

#[test]
fn test_syntactic_return_check() {
    assert!(check("fun f(a: Bool): Int { if (a) { return 1; } }").is_ok());
    assert_eq!(
        kinds(&diagnostics("fun f(a: Bool): Int { if (a) { } }")),
        vec![ErrorImpl::Typing {
            message: "Missing return statement in function f".to_string()
        }]
    );
}

#[test]
fn test_rechecking_is_deterministic() {
    let source = "val x: Int = 1;\nfun f(a: Int): Int { return a; }\nfun f(a: Bool): Int { return 0; }\nclass P(val v: Int) { var w: Int = v + 0; }\nval p = new P(f(x));";
    let tokens = tokenize(source.to_string(), Some("test.ky".to_string())).unwrap();
    let (_, program) = parse(tokens, Rc::new("test.ky".to_string()));
    let program = program.unwrap();

    let first = type_check(&program, CheckerConfig::default()).unwrap();
    let second = type_check(&program, CheckerConfig::default()).unwrap();

    let ids = |checked: &CheckedProgram| {
        checked
            .registry
            .iter()
            .map(|declaration| (declaration.id, declaration.name.clone()))
            .collect::<Vec<_>>()
    };

    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.registry.len(), 8);
}

#[test]
fn test_closures_and_higher_order_functions() {
    let source = "
fun apply(f: Function(Int) -> Int, value: Int): Int {
    return f(value);
}

val offset: Int = 10;
val add = fun(a: Int): Int { return a + offset; };
print apply(add, 1);
print apply(fun(a: Int): Int { return a * 2; }, 3);
";
    assert!(check(source).is_ok(), "{:?}", check(source).err());
}

#[test]
fn test_program_with_classes_and_loops() {
    let source = "
class Counter(var count: Int) {
    val step: Int = 1;
    fun next(): Int {
        count = count + step;
        return count;
    }
}

var counter = new Counter(0);
var total: Int = 0;
while (total < 10) {
    total = total + counter.next();
}
if (total == 10) {
    print \"done\";
} else {
    print total;
}
";
    assert!(check(source).is_ok(), "{:?}", check(source).err());
}

#[test]
fn test_rendered_diagnostic() {
    let source = "val x: Int = 1;\nval y: Int = g(1);";
    let diagnostics = diagnostics(source);
    let rendered = render_error(&diagnostics.errors()[0], source);

    assert_eq!(
        rendered,
        "Error: UndefinedVariable (Undefined variable g)\n-> test.ky:2:14\n  |\n2 | val y: Int = g(1);\n  | -------------^\n"
    );
    assert_eq!(diagnostics.to_string(), "test.ky:2:14: Undefined variable g\n");
}

#[test]
fn test_nesting_limit_is_reported() {
    let tokens = tokenize("val x: Int = -(-(-(-(1))));".to_string(), Some("test.ky".to_string())).unwrap();
    let (_, program) = parse(tokens, Rc::new("test.ky".to_string()));
    let result = type_check(&program.unwrap(), CheckerConfig { max_depth: 3 });

    let diagnostics = result.err().unwrap();
    assert_eq!(
        kinds(&diagnostics),
        vec![ErrorImpl::NestingTooDeep { limit: 3 }]
    );
}

#[test]
fn test_long_operator_chain_is_accepted() {
    let terms = vec!["1"; 300].join(" + ");
    let source = format!("val x: Int = {};\nvar y: Int = 0;\ny = {};", terms, terms);

    assert!(check(&source).is_ok(), "{:?}", check(&source).err());
}

#[test]
fn test_overload_on_parameter_mutability() {
    let source = "fun f(var a: Int): Int { return a; }\nfun f(a: Int): Int { return a; }\nval v: Int = 1;\nval r: Int = f(v);";
    assert!(check(source).is_ok(), "{:?}", check(source).err());

    assert_eq!(
        kinds(&diagnostics("fun f(a: Int): Int { return a; }\nfun f(var a: Int): Int { return a; }")),
        vec![ErrorImpl::AlreadyDefinedVariable { name: "f".to_string() }]
    );
}

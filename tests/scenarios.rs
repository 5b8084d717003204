use rsmonkey::automata::{Classification, Dfa};
use rsmonkey::scanner::ScannerTable;
use rsmonkey::token::{Token, TokenKind};
use rsmonkey::vm::{Value, VmError};
use rsmonkey::{run, Error};

#[test]
fn test_scan_let_statement() {
    let table = ScannerTable::standard().expect("standard table builds");
    let tokens: Vec<_> = table.scanner("let fiveTen = 55;").collect();
    let expected = vec![
        Token::new(TokenKind::Let, "let"),
        Token::new(TokenKind::Ident, "fiveTen"),
        Token::new(TokenKind::Assign, "="),
        Token::new(TokenKind::Int, "55"),
        Token::new(TokenKind::Semicolon, ";"),
        Token::new(TokenKind::Eof, ""),
    ];
    assert_eq!(tokens, expected);
    let labels: Vec<_> = tokens.iter().map(|t| t.to_string()).collect();
    assert_eq!(labels[0], "LET \"let\"");
    assert_eq!(labels[5], "EOF \"\"");
}

#[test]
fn test_scan_precedence_conflict() {
    let table = ScannerTable::new(&[
        Classification::new("a", "FIRST", 2),
        Classification::new("aa*", "SECOND", 1),
    ])
    .expect("valid regexes");
    assert_eq!(table.scanner("a").next_token(), Token::new("FIRST", "a"));
    assert_eq!(table.scanner("aa").next_token(), Token::new("SECOND", "aa"));
}

#[test]
fn test_run_expressions() {
    let cases = [
        ("1 + 2", Value::Integer(3)),
        ("\"str\" + \"ing\"", Value::from("string")),
        ("10 <= 10", Value::Boolean(true)),
        ("10 < 10", Value::Boolean(false)),
        ("if (true) { 10 } else { 20 }", Value::Integer(10)),
        ("if (false) { 10 } else { 20 }", Value::Integer(20)),
        ("if (false) { 10 }", Value::Null),
        ("[1,2,3][0]", Value::Integer(1)),
        ("(5 + 10 * 2 + 15 / 3) * 2 + -10", Value::Integer(50)),
        ("!(1 > 2) == true", Value::Boolean(true)),
        ("let x = 4; let y = x * x; {\"k\": y}[\"k\"]", Value::Integer(16)),
        ("1; 2; 3", Value::Integer(3)),
    ];
    for (source, expected) in cases {
        assert_eq!(run(source), Ok(expected), "running {:?}", source);
    }
}

#[test]
fn test_index_out_of_range() {
    let err = run("[1,2,3][5]").unwrap_err();
    assert_eq!(
        err,
        Error::Runtime(VmError::IndexOutOfRange {
            index: 5,
            length: 3
        })
    );
    assert_eq!(
        err.to_string(),
        "runtime error: index 5 out of range for array of length 3"
    );
}

#[test]
fn test_minimize_union_of_two_letters() {
    let mut dfa = Dfa::new(3, 0);
    dfa.add_transition(0, b'a', 1);
    dfa.add_transition(0, b'b', 2);
    dfa.set_accepting(1, Some("test"));
    dfa.set_accepting(2, Some("test"));

    let minimized = dfa.minimize();
    assert_eq!(minimized.num_states(), 2);
    assert_eq!(minimized.num_transitions(), 2);
    assert_eq!(minimized.accepting().len(), 1);
    assert_eq!(minimized.classify(b"a"), Some(&"test"));
    assert_eq!(minimized.classify(b"b"), Some(&"test"));
    assert!(!minimized.accepts(b"ab"));
}

#[test]
fn test_less_than_errors_name_swapped_operator() {
    // `a < b` runs as `b > a`, so the error reports the swapped form.
    let err = run("\"a\" < 1").unwrap_err();
    assert_eq!(
        err,
        Error::Runtime(VmError::TypeMismatch {
            operator: ">",
            left: "INTEGER",
            right: "STRING"
        })
    );
    assert_eq!(
        err.to_string(),
        "runtime error: unsupported types for >: INTEGER and STRING"
    );
    assert_eq!(
        run("true <= 1").unwrap_err().to_string(),
        "runtime error: unsupported types for >=: INTEGER and BOOLEAN"
    );
}

#[test]
fn test_deep_nesting_is_a_syntax_error() {
    let source = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));
    assert_eq!(
        run(&source).unwrap_err().to_string(),
        "syntax error: expression nested deeper than 256 levels"
    );
}

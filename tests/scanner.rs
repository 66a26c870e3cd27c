use rox as lox;

use lox::error::ErrorReporter;
use lox::scanner::{scan_tokens, Scanner};
use lox::token::TokenType;

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source);
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    assert_eq!(
        tokens.len(),
        expected.len(),
        "token count for {:?}: {:?}",
        source,
        tokens
    );

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn symbols() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn one_and_two_char_operators() {
    assert_token_sequence(
        "! != = == < <= > >= / ;",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::SLASH, "/"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn keywords_and_identifiers() {
    assert_token_sequence(
        "and andy var x while_",
        &[
            (TokenType::AND, "and"),
            (TokenType::IDENTIFIER, "andy"),
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "x"),
            (TokenType::IDENTIFIER, "while_"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn line_comment_is_skipped() {
    let tokens: Vec<_> = Scanner::new("1 // comment\n2")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].token_type, TokenType::NUMBER(0.0));
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].token_type, TokenType::NUMBER(0.0));
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[2].token_type, TokenType::EOF);
}

#[test]
fn block_comment_spans_lines() {
    let tokens: Vec<_> = Scanner::new("1 /* stuff\nmore */ 2")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[1].lexeme, "2");
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn unterminated_block_comment_reports_opening_position() {
    let results: Vec<_> = Scanner::new("\n/* never closed").collect();

    let errors: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .map(|e| e.to_string())
        .collect();

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Unterminated multi-line comment"));
    assert!(errors[0].contains("[line 2 pos 1]"), "got: {}", errors[0]);

    // EOF is still the last emitted token.
    let last = results.last().unwrap().as_ref().unwrap();
    assert_eq!(last.token_type, TokenType::EOF);
}

#[test]
fn string_literal_payload_is_unquoted() {
    let tokens: Vec<_> = Scanner::new("\"hi there\"").filter_map(Result::ok).collect();

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hi there"),
        other => panic!("expected string token, got {:?}", other),
    }

    assert_eq!(tokens[0].lexeme, "\"hi there\"");
}

#[test]
fn multi_line_string_advances_line_counter() {
    let tokens: Vec<_> = Scanner::new("\"a\nb\"").filter_map(Result::ok).collect();

    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].token_type, TokenType::EOF);
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn unterminated_string_reports_opening_position() {
    let results: Vec<_> = Scanner::new("  \"abc").collect();

    let error = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("expected a scan error")
        .to_string();

    assert!(error.contains("Unterminated string."));
    assert!(error.contains("[line 1 pos 3]"), "got: {}", error);
}

#[test]
fn number_literals() {
    let tokens: Vec<_> = Scanner::new("123 45.67 8.").filter_map(Result::ok).collect();

    let numbers: Vec<f64> = tokens
        .iter()
        .filter_map(|t| match t.token_type {
            TokenType::NUMBER(n) => Some(n),
            _ => None,
        })
        .collect();

    assert_eq!(numbers, vec![123.0, 45.67, 8.0]);

    // The trailing dot is not part of the number.
    assert!(tokens.iter().any(|t| t.token_type == TokenType::DOT));
}

#[test]
fn unexpected_characters_do_not_stop_scanning() {
    let results: Vec<_> = Scanner::new(",.$(#").collect();

    // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF.
    assert_eq!(results.len(), 6);

    let error_count = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(error_count, 2);

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            err.to_string().contains("Unexpected character"),
            "got: {}",
            err
        );
    }

    let last = results.last().unwrap().as_ref().unwrap();
    assert_eq!(last.token_type, TokenType::EOF);
}

#[test]
fn token_stream_ends_with_exactly_one_eof() {
    let tokens: Vec<_> = Scanner::new("var x = 1;").filter_map(Result::ok).collect();

    let eof_count = tokens
        .iter()
        .filter(|t| t.token_type == TokenType::EOF)
        .count();

    assert_eq!(eof_count, 1);
    assert_eq!(tokens.last().unwrap().token_type, TokenType::EOF);
}

#[test]
fn token_positions() {
    let tokens: Vec<_> = Scanner::new("var x\n  yes").filter_map(Result::ok).collect();

    assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
    assert_eq!((tokens[1].line, tokens[1].col), (1, 5));
    assert_eq!((tokens[2].line, tokens[2].col), (2, 3));
}

#[test]
fn scan_tokens_routes_errors_to_reporter() {
    let mut reporter = ErrorReporter::new();
    let tokens = scan_tokens("var $ = 1;", &mut reporter);

    assert!(reporter.has_errors());
    assert_eq!(tokens.last().unwrap().token_type, TokenType::EOF);
    assert!(tokens.iter().any(|t| t.token_type == TokenType::VAR));
}

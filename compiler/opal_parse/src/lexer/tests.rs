use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_parens_and_quote_split_without_spaces() {
    let tokens = tokenize("(f'x)").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::LParen,
            Token::Word("f"),
            Token::Quote,
            Token::Word("x"),
            Token::RParen,
        ]
    );
}

#[test]
fn test_newlines_and_tabs_are_whitespace() {
    let tokens = tokenize("(a\n\tb)").unwrap();
    assert_eq!(
        tokens,
        vec![Token::LParen, Token::Word("a"), Token::Word("b"), Token::RParen]
    );
}

#[test]
fn test_classify_numbers() {
    assert_eq!(classify("42"), Ok(Atom::Int(42)));
    assert_eq!(classify("-7"), Ok(Atom::Int(-7)));
    assert_eq!(classify("0.5"), Ok(Atom::Float(0.5)));
    assert_eq!(classify(".25"), Ok(Atom::Float(0.25)));
    assert_eq!(classify("-.5"), Ok(Atom::Float(-0.5)));
}

#[test]
fn test_classify_non_numbers_are_symbols() {
    for word in ["-", "5.", "1.2.3", "--1", "1e5", "+"] {
        assert_eq!(classify(word), Ok(Atom::Symbol(Symbol::new(word))), "{word}");
    }
}

#[test]
fn test_classify_booleans() {
    assert_eq!(classify("#t"), Ok(Atom::Bool(true)));
    assert_eq!(classify("#f"), Ok(Atom::Bool(false)));
    assert_eq!(classify("#x"), Ok(Atom::Symbol(Symbol::new("#x"))));
}

#[test]
fn test_integer_overflow_is_an_error() {
    assert_eq!(
        classify("99999999999999999999"),
        Err(ParseError::IntegerOutOfRange {
            literal: "99999999999999999999".to_string()
        })
    );
}

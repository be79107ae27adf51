#[cfg(test)]
mod scanner_tests {
    use rlox::scanner::Scanner;
    use rlox::token::TokenType;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
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
    fn test_scanner_02_operators() {
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class Foo < Bar { fun method() } var x; superb thisis",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "Foo"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "Bar"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "method"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                // Keyword prefixes must not be mis-lexed as keywords.
                (TokenType::IDENTIFIER, "superb"),
                (TokenType::IDENTIFIER, "thisis"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_number_literals() {
        assert_token_sequence(
            "1 12.5 0.25",
            &[
                (TokenType::NUMBER(1.0), "1"),
                (TokenType::NUMBER(12.5), "12.5"),
                (TokenType::NUMBER(0.25), "0.25"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_dot_after_number_is_property_access() {
        assert_token_sequence(
            "123.sqrt",
            &[
                (TokenType::NUMBER(123.0), "123"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "sqrt"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_06_string_literal() {
        assert_token_sequence(
            "\"hello world\"",
            &[
                (
                    TokenType::STRING("hello world".to_string()),
                    "\"hello world\"",
                ),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_07_comments_are_skipped() {
        assert_token_sequence(
            "var x; // the rest of this line vanishes ()*\nprint x;",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::PRINT, "print"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_08_line_numbers() {
        let scanner = Scanner::new(b"var a;\nvar b;\n\nvar c;");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 1, 2, 2, 2, 4, 4, 4, 4]);
    }

    #[test]
    fn test_scanner_09_unexpected_characters_keep_scanning() {
        let scanner = Scanner::new(b",.$(#");
        let results: Vec<_> = scanner.collect();

        // 2 tokens, 2 errors, 1 token, EOF.
        assert_eq!(results.len(), 6);

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected token"),
                "unexpected message: {}",
                err
            );
        }
    }

    #[test]
    fn test_scanner_10_unterminated_string() {
        let scanner = Scanner::new(b"\"never closed");
        let results: Vec<_> = scanner.collect();

        let err = results
            .iter()
            .find_map(|r| r.as_ref().err())
            .expect("expected an error");
        assert!(err.to_string().contains("Unterminated string."));
    }
}

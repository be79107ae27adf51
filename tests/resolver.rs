#[cfg(test)]
mod resolver_tests {
    use rlox::error::LoxError;
    use rlox::interpreter::Interpreter;
    use rlox::parser::Parser;
    use rlox::resolver::Resolver;
    use rlox::scanner::Scanner;
    use rlox::token::Token;

    /// Scan + parse + resolve, returning the resolver's accumulated static
    /// errors.  Panics on lex/parse errors: these tests feed valid syntax.
    fn resolve_errors(source: &str) -> Vec<LoxError> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .expect("source should lex");

        let statements = Parser::new(tokens)
            .parse()
            .expect("source should parse");

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve(&statements)
    }

    fn assert_single_error(source: &str, expected_fragment: &str) {
        let errors = resolve_errors(source);

        assert_eq!(errors.len(), 1, "expected exactly one error, got {:?}", errors);
        assert!(
            errors[0].to_string().contains(expected_fragment),
            "expected '{}' in: {}",
            expected_fragment,
            errors[0]
        );
    }

    #[test]
    fn test_resolver_01_clean_program_has_no_errors() {
        let errors = resolve_errors(
            r#"
            var a = 1;
            {
                var b = a + 1;
                fun inner() { return b; }
                print inner();
            }
            "#,
        );
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_02_self_referential_initializer() {
        assert_single_error(
            "{ var a = a; }",
            "Cannot read local variable in its own initializer",
        );
    }

    #[test]
    fn test_resolver_03_duplicate_declaration_in_scope() {
        assert_single_error(
            "{ var a = 1; var a = 2; }",
            "Variable already declared in this scope",
        );
    }

    #[test]
    fn test_resolver_04_duplicate_globals_are_permitted() {
        // The global scope is implicit and unchecked; redeclaration there is
        // legal.
        let errors = resolve_errors("var a = 1; var a = 2;");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_05_return_at_top_level() {
        assert_single_error("return 1;", "'return' used outside of function");
    }

    #[test]
    fn test_resolver_06_this_outside_class() {
        assert_single_error("print this;", "Cannot use 'this' outside of a class");
    }

    #[test]
    fn test_resolver_07_this_in_standalone_function() {
        assert_single_error(
            "fun notAMethod() { print this; }",
            "Cannot use 'this' outside of a class",
        );
    }

    #[test]
    fn test_resolver_08_super_outside_class() {
        assert_single_error("super.cook();", "Cannot use 'super' outside of a class");
    }

    #[test]
    fn test_resolver_09_super_without_superclass() {
        assert_single_error(
            "class Orphan { method() { super.method(); } }",
            "Cannot use 'super' in a class with no superclass",
        );
    }

    #[test]
    fn test_resolver_10_class_inheriting_from_itself() {
        assert_single_error("class Ouroboros < Ouroboros {}", "cannot inherit from itself");
    }

    #[test]
    fn test_resolver_11_errors_accumulate_across_the_pass() {
        let errors = resolve_errors(
            r#"
            return 1;
            { var a = a; }
            print this;
            "#,
        );

        assert_eq!(errors.len(), 3, "expected three errors, got {:?}", errors);
    }

    #[test]
    fn test_resolver_12_undeclared_name_is_not_a_static_error() {
        // An unresolved name defers to global lookup at run time; the
        // resolver stays silent about it.
        let errors = resolve_errors("fun show() { print definedLater; }");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_13_function_may_recurse_into_itself() {
        let errors = resolve_errors(
            r#"
            {
                fun countdown(n) {
                    if (n > 0) countdown(n - 1);
                }
                countdown(3);
            }
            "#,
        );
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_14_return_inside_method_is_valid() {
        let errors = resolve_errors(
            r#"
            class Calculator {
                add(a, b) { return a + b; }
            }
            "#,
        );
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_15_initializer_may_return_a_value() {
        // The constructor discards it at run time, but statically it is
        // allowed.
        let errors = resolve_errors("class Foo { init() { return 5; } }");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }
}

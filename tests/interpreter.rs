#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use rlox::interpreter::Interpreter;
    use rlox::parser::Parser;
    use rlox::resolver::Resolver;
    use rlox::scanner::Scanner;
    use rlox::token::Token;

    /// `Write` sink sharing one buffer, so a test can hand the interpreter
    /// its output stream and read it back afterwards.
    #[derive(Clone, Default)]
    struct SharedOutput(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Full pipeline over `source`: scan → parse → resolve → interpret.
    /// Returns captured output on success, or the first error's display form.
    fn run(source: &str) -> Result<String, String> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;

        let statements = Parser::new(tokens)
            .parse()
            .map_err(|errors| errors[0].to_string())?;

        let sink = SharedOutput::default();
        let mut interpreter = Interpreter::with_output(Box::new(sink.clone()));

        let static_errors = Resolver::new(&mut interpreter).resolve(&statements);
        if let Some(first) = static_errors.first() {
            return Err(first.to_string());
        }

        interpreter.interpret(&statements).map_err(|e| e.to_string())?;

        let bytes: Vec<u8> = sink.0.borrow().clone();
        Ok(String::from_utf8(bytes).expect("interpreter output should be UTF-8"))
    }

    fn assert_output(source: &str, expected: &str) {
        match run(source) {
            Ok(output) => assert_eq!(output, expected),
            Err(e) => panic!("program failed: {}", e),
        }
    }

    fn assert_runtime_error(source: &str, expected_fragment: &str) {
        match run(source) {
            Ok(output) => panic!("expected an error, got output: {:?}", output),
            Err(e) => assert!(
                e.contains(expected_fragment),
                "expected '{}' in: {}",
                expected_fragment,
                e
            ),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions, types, printing
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_interpreter_01_arithmetic_precedence() {
        assert_output("print (1 + 2) * 3;", "9\n");
        assert_output("print 1 + 2 * 3;", "7\n");
    }

    #[test]
    fn test_interpreter_02_string_concatenation() {
        assert_output("print \"a\" + \"b\";", "ab\n");
    }

    #[test]
    fn test_interpreter_03_mixed_plus_is_a_type_error() {
        assert_runtime_error(
            "print 1 + \"a\";",
            "Operands must be two numbers or two strings.",
        );
    }

    #[test]
    fn test_interpreter_04_unary_minus_requires_number() {
        assert_runtime_error("print -\"muffin\";", "Operand must be a number");
    }

    #[test]
    fn test_interpreter_05_number_formatting() {
        assert_output("print 4 / 2;", "2\n");
        assert_output("print 2.5 + 0.25;", "2.75\n");
        assert_output("print -0.5;", "-0.5\n");
    }

    #[test]
    fn test_interpreter_06_nil_and_booleans_print_canonically() {
        assert_output("print nil; print true; print false;", "nil\ntrue\nfalse\n");
    }

    #[test]
    fn test_interpreter_07_truthiness_zero_is_truthy() {
        assert_output("if (0) print \"truthy\"; else print \"falsy\";", "truthy\n");
        assert_output("print !nil; print !false; print !0;", "true\ntrue\nfalse\n");
    }

    #[test]
    fn test_interpreter_08_equality_never_coerces() {
        assert_output("print 1 == \"1\";", "false\n");
        assert_output("print nil == nil;", "true\n");
        assert_output("print \"x\" != \"y\";", "true\n");
    }

    #[test]
    fn test_interpreter_09_logical_operators_short_circuit_and_yield_operands() {
        assert_output("print \"hi\" or 2;", "hi\n");
        assert_output("print nil or \"fallback\";", "fallback\n");
        assert_output("print nil and \"never\";", "nil\n");
        // The right side must not run when short-circuited.
        assert_output(
            "var touched = false; fun touch() { touched = true; } true or touch(); print touched;",
            "false\n",
        );
    }

    #[test]
    fn test_interpreter_10_division_by_zero() {
        assert_runtime_error("print 1 / 0;", "Division by zero.");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Variables, scoping, control flow
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_interpreter_11_undefined_variable() {
        assert_runtime_error("print nope;", "Undefined variable 'nope'.");
    }

    #[test]
    fn test_interpreter_12_block_scoping_and_shadowing() {
        assert_output(
            r#"
            var a = "outer";
            {
                var a = "inner";
                print a;
            }
            print a;
            "#,
            "inner\nouter\n",
        );
    }

    #[test]
    fn test_interpreter_13_reference_binds_to_scope_at_resolution_time() {
        // The closure keeps seeing the global even after the block declares
        // a shadowing local, because the binding was fixed statically.
        assert_output(
            r#"
            var a = "global";
            {
                fun showA() { print a; }
                showA();
                var a = "block";
                showA();
            }
            "#,
            "global\nglobal\n",
        );
    }

    #[test]
    fn test_interpreter_14_global_forward_reference_from_function_body() {
        assert_output(
            r#"
            fun show() { print definedLater; }
            var definedLater = "present";
            show();
            "#,
            "present\n",
        );
    }

    #[test]
    fn test_interpreter_15_while_loop() {
        assert_output(
            "var i = 0; while (i < 3) { print i; i = i + 1; }",
            "0\n1\n2\n",
        );
    }

    #[test]
    fn test_interpreter_16_for_loop_desugars_to_while() {
        assert_output("for (var i = 0; i < 3; i = i + 1) print i;", "0\n1\n2\n");
    }

    #[test]
    fn test_interpreter_17_fibonacci_recursion() {
        assert_output(
            r#"
            fun fib(n) {
                if (n <= 1) return n;
                return fib(n - 2) + fib(n - 1);
            }
            print fib(10);
            "#,
            "55\n",
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Functions and closures
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_interpreter_18_call_without_return_yields_nil() {
        assert_output("fun noop() {} print noop();", "nil\n");
    }

    #[test]
    fn test_interpreter_19_arity_mismatch() {
        assert_runtime_error(
            "fun pair(a, b) {} pair(1);",
            "Expected 2 arguments but got 1.",
        );
    }

    #[test]
    fn test_interpreter_20_calling_a_non_callable() {
        assert_runtime_error("\"not a function\"();", "Can only call functions and classes.");
    }

    #[test]
    fn test_interpreter_21_closure_counter_keeps_state() {
        assert_output(
            r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    print i;
                }
                return count;
            }
            var counter = makeCounter();
            counter();
            counter();
            "#,
            "1\n2\n",
        );
    }

    #[test]
    fn test_interpreter_22_closures_capture_by_reference_not_value() {
        assert_output(
            r#"
            var f;
            {
                var i = 0;
                fun g() { print i; }
                f = g;
                i = 10;
            }
            f();
            "#,
            "10\n",
        );
    }

    #[test]
    fn test_interpreter_23_sibling_closures_share_one_environment() {
        assert_output(
            r#"
            var set;
            var get;
            fun main() {
                var a = "initial";
                fun doSet() { a = "updated"; }
                fun doGet() { print a; }
                set = doSet;
                get = doGet;
            }
            main();
            set();
            get();
            "#,
            "updated\n",
        );
    }

    #[test]
    fn test_interpreter_24_return_unwinds_nested_blocks() {
        assert_output(
            r#"
            fun find() {
                var i = 0;
                while (true) {
                    if (i == 2) {
                        return i;
                    }
                    i = i + 1;
                }
            }
            print find();
            "#,
            "2\n",
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Classes, instances, inheritance
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_interpreter_25_fields_and_methods() {
        assert_output(
            r#"
            class Counter {
                init(start) { this.n = start; }
                bump() {
                    this.n = this.n + 1;
                    return this.n;
                }
            }
            var c = Counter(41);
            print c.bump();
            print c.n;
            "#,
            "42\n42\n",
        );
    }

    #[test]
    fn test_interpreter_26_instance_display_and_identity() {
        assert_output(
            r#"
            class Bagel {}
            var a = Bagel();
            print a;
            print a == a;
            print a == Bagel();
            "#,
            "<Bagel instance>\ntrue\nfalse\n",
        );
    }

    #[test]
    fn test_interpreter_27_undefined_property() {
        assert_runtime_error(
            "class Empty {} print Empty().missing;",
            "Undefined property 'missing'.",
        );
    }

    #[test]
    fn test_interpreter_28_property_access_on_non_instance() {
        assert_runtime_error("print (1 + 2).field;", "Only instances have properties.");
        assert_runtime_error("true.field = 1;", "Only instances have fields.");
    }

    #[test]
    fn test_interpreter_29_field_shadows_method() {
        assert_output(
            r#"
            class Thing {
                label() { return "method"; }
            }
            var t = Thing();
            t.label = "field";
            print t.label;
            "#,
            "field\n",
        );
    }

    #[test]
    fn test_interpreter_30_set_writes_only_the_instance() {
        assert_output(
            r#"
            class Widget {}
            var a = Widget();
            var b = Widget();
            a.color = "red";
            print a.color;
            print b == a;
            "#,
            "red\nfalse\n",
        );
    }

    #[test]
    fn test_interpreter_31_detached_method_stays_bound() {
        assert_output(
            r#"
            class Person {
                init(name) { this.name = name; }
                sayName() { print this.name; }
            }
            var jane = Person("Jane");
            var method = jane.sayName;
            method();
            "#,
            "Jane\n",
        );
    }

    #[test]
    fn test_interpreter_32_initializer_return_value_is_discarded() {
        assert_output(
            r#"
            class Foo {
                init() {
                    this.x = 1;
                    return 5;
                }
            }
            var f = Foo();
            print f.x;
            print f;
            "#,
            "1\n<Foo instance>\n",
        );
    }

    #[test]
    fn test_interpreter_33_constructor_arity_follows_init() {
        assert_runtime_error(
            r#"
            class Pair { init(a, b) {} }
            Pair(1);
            "#,
            "Expected 2 arguments but got 1.",
        );
    }

    #[test]
    fn test_interpreter_34_method_inheritance() {
        assert_output(
            r#"
            class Doughnut {
                cook() { print "Fry until golden brown."; }
            }
            class BostonCream < Doughnut {}
            BostonCream().cook();
            "#,
            "Fry until golden brown.\n",
        );
    }

    #[test]
    fn test_interpreter_35_override_and_super_call() {
        assert_output(
            r#"
            class Doughnut {
                cook() { print "Fry until golden brown."; }
            }
            class BostonCream < Doughnut {
                cook() {
                    super.cook();
                    print "Pipe full of custard.";
                }
            }
            BostonCream().cook();
            "#,
            "Fry until golden brown.\nPipe full of custard.\n",
        );
    }

    #[test]
    fn test_interpreter_36_super_is_lexical_not_dynamic() {
        // `super.method()` inside B dispatches to A even when the receiver's
        // runtime class is C.
        assert_output(
            r#"
            class A {
                method() { print "A method"; }
            }
            class B < A {
                method() { print "B method"; }
                test() { super.method(); }
            }
            class C < B {}
            C().test();
            "#,
            "A method\n",
        );
    }

    #[test]
    fn test_interpreter_37_superclass_must_be_a_class() {
        assert_runtime_error(
            "var NotAClass = \"so not\"; class Sub < NotAClass {}",
            "Superclass must be a class.",
        );
    }

    #[test]
    fn test_interpreter_38_constructor_chaining_through_super_init() {
        assert_output(
            r#"
            class Base {
                init(name) { this.name = name; }
            }
            class Derived < Base {
                init(name, tag) {
                    super.init(name);
                    this.tag = tag;
                }
            }
            var d = Derived("widget", 7);
            print d.name;
            print d.tag;
            "#,
            "widget\n7\n",
        );
    }

    #[test]
    fn test_interpreter_39_runtime_error_reports_line() {
        let err = run("var a = 1;\nprint a + \"x\";").unwrap_err();
        assert!(err.contains("[line 2]"), "missing line info: {}", err);
    }

    #[test]
    fn test_interpreter_40_runtime_error_aborts_the_run() {
        // Nothing after the failing statement executes.
        let source = "print \"before\";\nprint 1 + \"a\";\nprint \"after\";";

        let err = run(source).unwrap_err();
        assert!(err.contains("Operands must be two numbers or two strings."));
    }
}

#[cfg(test)]
mod parser_tests {
    use treelox as lox;

    use lox::ast_printer::AstPrinter;
    use lox::parser::Parser;
    use lox::scanner::Scanner;

    fn run_parse(expression: &str, expected: &str) {
        let (tokens, errors) = Scanner::new(expression.as_bytes()).scan_tokens();
        assert!(errors.is_empty(), "scanner error: {:?}", errors);

        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expr().expect("expression should parse");
        assert!(!parser.has_error(), "parser error: {:?}", parser.errors());

        assert_eq!(AstPrinter::print(&expr), expected);
    }

    fn run_parse_stmt(source: &str, expected: &str) {
        let (tokens, errors) = Scanner::new(source.as_bytes()).scan_tokens();
        assert!(errors.is_empty(), "scanner error: {:?}", errors);

        let mut parser = Parser::new(tokens);
        let program = parser.parse();
        assert!(!parser.has_error(), "parser error: {:?}", parser.errors());

        assert_eq!(AstPrinter::print_program(&program), expected);
    }

    fn run_parse_errors(source: &str, expected_errors: usize, expected_stmts: usize) {
        let (tokens, errors) = Scanner::new(source.as_bytes()).scan_tokens();
        assert!(errors.is_empty(), "scanner error: {:?}", errors);

        let mut parser = Parser::new(tokens);
        let program = parser.parse();

        assert_eq!(
            parser.errors().len(),
            expected_errors,
            "errors for {:?}: {:?}",
            source,
            parser.errors()
        );
        assert_eq!(program.len(), expected_stmts, "statements for {:?}", source);
    }

    #[test]
    fn test_parse_expressions() {
        let tests: &[(&str, &str)] = &[
            ("1 == 1 ? 4 + 4 * 3 : false", "(?: (== 1 1) (+ 4 (* 4 3)) false)"),
            ("3 + 4 + 5 * 6 * 7 + 1", "(+ (+ (+ 3 4) (* (* 5 6) 7)) 1)"),
            ("5 * (3 + 1)", "(* 5 (group (+ 3 1)))"),
            ("--4", "(- (- 4))"),
            (
                "true ? 1 : true ? 2 : true ? 3 : 4",
                "(?: true 1 (?: true 2 (?: true 3 4)))",
            ),
            ("a == b", "(== (var a) (var b))"),
            ("a = 1", "(= (var a) 1)"),
            ("a = b = c = 1", "(= (var a) (= (var b) (= (var c) 1)))"),
            ("false or true", "(or false true)"),
            ("false and true", "(and false true)"),
            (
                "false or false or false and true",
                "(or (or false false) (and false true))",
            ),
        ];

        for (expression, expected) in tests {
            run_parse(expression, expected);
        }
    }

    #[test]
    fn test_parse_calls_and_properties() {
        let tests: &[(&str, &str)] = &[
            ("f()", "(call (var f))"),
            ("f(1, 2)", "(call (var f) 1 2)"),
            ("f(1)(2)", "(call (call (var f) 1) 2)"),
            ("a.b", "(get (var a) b)"),
            ("a.b.c", "(get (get (var a) b) c)"),
            ("a.b = 1", "(= (get (var a) b) 1)"),
            ("a.b().c", "(get (call (get (var a) b)) c)"),
            ("this.x", "(get (var this) x)"),
            ("super.m()", "(call (super m))"),
        ];

        for (expression, expected) in tests {
            run_parse(expression, expected);
        }
    }

    #[test]
    fn test_parse_lambda() {
        run_parse("fun (a, b) { return a; }", "(fun (a b) (scope (return (var a))))");
    }

    #[test]
    fn test_parse_statements() {
        let tests: &[(&str, &str)] = &[
            ("1;1 != 2;", "(scope 1 (!= 1 2))"),
            ("print 1;", "(scope (print 1))"),
            ("var a;", "(scope (def a))"),
            ("var a = \"test\";", "(scope (def a \"test\"))"),
            ("{ 1; {2 ;}}", "(scope (scope 1 (scope 2)))"),
        ];

        for (source, expected) in tests {
            run_parse_stmt(source, expected);
        }
    }

    #[test]
    fn test_parse_control_flow_statements() {
        let tests: &[(&str, &str)] = &[
            ("if (true) 1; else 2;", "(scope (if true 1 2))"),
            (
                "if (3 + 3 > 1) {1; 2;} else {1; 2;}",
                "(scope (if (> (+ 3 3) 1) (scope 1 2) (scope 1 2)))",
            ),
            ("while (true) {1; 2;}", "(scope (while true (scope 1 2)))"),
            ("while (true) 1;", "(scope (while true 1))"),
            ("for (;;) 1;", "(scope (while true 1))"),
            ("for (;;) {1;}", "(scope (while true (scope 1)))"),
            (
                "for (var i = 0; i < 10; i = i + 1) print i;",
                "(scope (scope (def i 0) (while (< (var i) 10) (scope (print (var i)) (= (var i) (+ (var i) 1))))))",
            ),
            (
                "for (var i = 0; i < 10;) print i;",
                "(scope (scope (def i 0) (while (< (var i) 10) (print (var i)))))",
            ),
        ];

        for (source, expected) in tests {
            run_parse_stmt(source, expected);
        }
    }

    #[test]
    fn test_parse_function_declarations() {
        let tests: &[(&str, &str)] = &[
            ("fun f() { }", "(scope (fun f () (scope)))"),
            (
                "fun add(a, b) { return a + b; }",
                "(scope (fun add (a b) (scope (return (+ (var a) (var b))))))",
            ),
        ];

        for (source, expected) in tests {
            run_parse_stmt(source, expected);
        }
    }

    #[test]
    fn test_parse_class_declarations() {
        let tests: &[(&str, &str)] = &[
            ("class A { }", "(scope (class A))"),
            (
                "class A { fun m() { return 1; } }",
                "(scope (class A (fun m () (scope (return 1)))))",
            ),
            (
                "class B < A { fun init() { this.x = 1; } }",
                "(scope (class B (< A) (fun init () (scope (= (get (var this) x) 1)))))",
            ),
        ];

        for (source, expected) in tests {
            run_parse_stmt(source, expected);
        }
    }

    #[test]
    fn test_parse_errors() {
        let tests: &[(&str, usize, usize)] = &[
            ("1;1 != 2;", 0, 2),
            ("=;1 != 2;", 1, 1),
            ("a=b; < != 2;print 3;", 1, 2),
            // A missing ';' is reported but the statement is kept.
            ("print 1", 1, 1),
        ];

        for (source, expected_errors, expected_stmts) in tests {
            run_parse_errors(source, *expected_errors, *expected_stmts);
        }
    }

    #[test]
    fn test_parse_invalid_assignment_target_keeps_going() {
        let (tokens, errors) = Scanner::new(b"1 = 2;print 3;").scan_tokens();
        assert!(errors.is_empty());

        let mut parser = Parser::new(tokens);
        let program = parser.parse();

        // Reported without consuming further: both statements survive.
        assert_eq!(parser.errors().len(), 1);
        assert!(parser.errors()[0]
            .to_string()
            .contains("Invalid assignment target."));
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_parse_too_many_arguments_reported_not_fatal() {
        let args: Vec<String> = (0..=255).map(|n| n.to_string()).collect();
        let source: String = format!("f({});", args.join(", "));

        let (tokens, errors) = Scanner::new(source.as_bytes()).scan_tokens();
        assert!(errors.is_empty());

        let mut parser = Parser::new(tokens);
        let program = parser.parse();

        // 256 arguments: one report, but the call node is still produced.
        assert_eq!(parser.errors().len(), 1);
        assert!(parser.errors()[0]
            .to_string()
            .contains("Can't have more than 255 arguments."));
        assert_eq!(program.len(), 1);
    }
}

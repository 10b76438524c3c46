#[cfg(test)]
mod resolver_tests {
    use treelox as lox;

    use std::collections::HashMap;

    use lox::error::{ErrorKind, LoxError};
    use lox::interpreter::InterpreterConfig;
    use lox::runner::run_program;

    fn silent_config() -> InterpreterConfig {
        InterpreterConfig {
            print: Box::new(|_| {}),
            global_overrides: HashMap::new(),
        }
    }

    fn run_static(source: &str) -> Vec<LoxError> {
        run_program(silent_config(), source)
    }

    #[test]
    fn test_duplicate_local_declaration() {
        let errors = run_static("fun f() { var a = 1; var a = 2; }");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::VAR_ALREADY_DEFINED);
    }

    #[test]
    fn test_duplicate_declarations_all_reported() {
        let errors = run_static("fun f() { var a = 1; var a = 2; var a = 3; }");

        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind() == ErrorKind::VAR_ALREADY_DEFINED));
    }

    #[test]
    fn test_global_redeclaration_is_allowed() {
        let errors = run_static("var a = 1; var a = 2;");

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_duplicate_parameter() {
        let errors = run_static("fun f(a, a) { }");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::VAR_ALREADY_DEFINED);
    }

    #[test]
    fn test_return_at_top_level() {
        let errors = run_static("return 1;");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::UNEXPECTED_RETURN);
    }

    #[test]
    fn test_return_value_from_initializer() {
        let errors = run_static("class A { fun init() { return 1; } }");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::UNEXPECTED_RETURN);
    }

    #[test]
    fn test_bare_return_from_initializer_is_allowed() {
        let errors = run_static("class A { fun init() { return; } } A();");

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_return_this_from_initializer_is_allowed() {
        let errors = run_static("class A { fun init() { return this; } } A();");

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_this_outside_method() {
        let errors = run_static("fun t() { this.x = 1; }");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::UNDEFINED_VARIABLE);
    }

    #[test]
    fn test_this_inside_lambda_inside_method_is_rejected() {
        let errors = run_static(
            "class A { fun m() { var f = fun () { return this; }; return f; } }",
        );

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::UNDEFINED_VARIABLE);
    }

    #[test]
    fn test_read_local_in_its_own_initializer() {
        let errors = run_static("{ var a = a; }");

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("Can't read local variable in its own initializer"));
    }

    #[test]
    fn test_super_outside_class() {
        let errors = run_static("fun f() { return super.m(); }");

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("Cannot use 'super' outside of a class."));
    }

    #[test]
    fn test_super_without_superclass() {
        let errors = run_static("class A { fun m() { return super.m(); } }");

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("Cannot use 'super' in a class with no superclass."));
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        let errors = run_static("class A < A { }");

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("A class can't inherit from itself."));
    }

    #[test]
    fn test_shadowing_in_inner_scope_is_allowed() {
        let errors = run_static("var a = 1; { var a = 2; { var a = 3; } }");

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }
}

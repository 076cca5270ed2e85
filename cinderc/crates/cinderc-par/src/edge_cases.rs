//! Rejection tests: every boundary behavior ends in the right error kind.

use crate::error::ParseError;

fn err(src: &str) -> ParseError {
    crate::parse("test", src).expect_err("program should be rejected")
}

fn ok(src: &str) {
    crate::parse("test", src).expect("program should be accepted");
}

// ----------------------------------------------------------------------
// Control flow
// ----------------------------------------------------------------------

#[test]
fn test_break_outside_loop() {
    assert!(matches!(
        err("int f(void) { break; return 0; }"),
        ParseError::OutsideLoop {
            keyword: "break",
            ..
        }
    ));
}

#[test]
fn test_continue_outside_loop() {
    assert!(matches!(
        err("int f(void) { continue; return 0; }"),
        ParseError::OutsideLoop {
            keyword: "continue",
            ..
        }
    ));
}

#[test]
fn test_break_inside_if_outside_loop() {
    assert!(matches!(
        err("int f(int n) { if (n) break; return 0; }"),
        ParseError::OutsideLoop { .. }
    ));
}

#[test]
fn test_break_inside_if_inside_loop_is_inherited() {
    // The loop's permissions are ORed into every nested context.
    ok("int f(int n) { while (n) { if (n) break; n = 0; } return n; }");
    ok("int f(int n) { for (;;) { if (n) continue; break; } return n; }");
    ok("int f(int n) { do { if (n) break; } while (n); return n; }");
}

#[test]
fn test_break_no_longer_permitted_after_loop() {
    assert!(matches!(
        err("int f(int n) { while (n) { n = 0; } break; return n; }"),
        ParseError::OutsideLoop { .. }
    ));
}

// ----------------------------------------------------------------------
// Redefinition
// ----------------------------------------------------------------------

#[test]
fn test_redeclaration_in_same_scope() {
    assert!(matches!(
        err("int f(void) { int a; int a; return 0; }"),
        ParseError::Redefinition { .. }
    ));
}

#[test]
fn test_shadowing_in_inner_scope_is_fine() {
    ok("int f(int a) { { int a; a = 1; } return a; }");
}

#[test]
fn test_duplicate_parameter_names() {
    assert!(matches!(
        err("int f(int a, int a);"),
        ParseError::Redefinition { .. }
    ));
}

#[test]
fn test_function_redefinition_with_body() {
    assert!(matches!(
        err("int f(void) { return 1; } int f(void) { return 2; }"),
        ParseError::Redefinition { .. }
    ));
}

#[test]
fn test_prototype_signature_mismatch() {
    assert!(matches!(
        err("int f(void); int f(int a) { return a; }"),
        ParseError::Redefinition { .. }
    ));
}

#[test]
fn test_repeated_prototype_is_accepted() {
    ok("int f(void); int f(void); int f(void) { return 1; }");
}

#[test]
fn test_prototype_after_definition_is_accepted() {
    ok("int f(void) { return 1; } int f(void);");
}

#[test]
fn test_struct_redefinition() {
    assert!(matches!(
        err("struct t { int x; }; struct t { int y; };"),
        ParseError::Redefinition { .. }
    ));
}

#[test]
fn test_struct_tag_shadowing_in_inner_scope() {
    ok(
        "struct t { int x; };\n\
         int f(void) { struct t { int y; } a; a.y = 1; return a.y; }",
    );
}

#[test]
fn test_duplicate_struct_member() {
    assert!(matches!(
        err("struct t { int x; int x; };"),
        ParseError::Redefinition { .. }
    ));
}

#[test]
fn test_typedef_redeclaration() {
    assert!(matches!(
        err("typedef int a; typedef int a;"),
        ParseError::Redefinition { .. }
    ));
}

// ----------------------------------------------------------------------
// Lvalues
// ----------------------------------------------------------------------

#[test]
fn test_assignment_to_rvalue() {
    assert!(matches!(
        err("int f(int n) { n + 1 = 2; return n; }"),
        ParseError::NotLvalue { .. }
    ));
}

#[test]
fn test_assignment_to_literal() {
    assert!(matches!(
        err("int f(void) { 1 = 2; return 0; }"),
        ParseError::NotLvalue { .. }
    ));
}

#[test]
fn test_address_of_rvalue() {
    assert!(matches!(
        err("int f(int n) { int *p; p = &(n + 1); return n; }"),
        ParseError::NotLvalue { .. }
    ));
}

#[test]
fn test_address_of_function_identifier() {
    // Function designators are not lvalues; there are no function pointers.
    assert!(matches!(
        err("int g(void); int f(void) { &g; return 0; }"),
        ParseError::NotLvalue { .. }
    ));
}

// ----------------------------------------------------------------------
// Types
// ----------------------------------------------------------------------

#[test]
fn test_dereference_of_incomplete_pointer() {
    assert!(matches!(
        err("int f(void *p) { *p; return 0; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_dereference_of_incomplete_struct_pointer() {
    assert!(matches!(
        err("struct t; int f(struct t *p) { *p; return 0; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_dereference_of_non_pointer() {
    assert!(matches!(
        err("int f(int n) { return *n; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_empty_struct_body() {
    assert!(matches!(
        err("struct t {};"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_member_of_incomplete_type() {
    assert!(matches!(
        err("struct t { struct t inner; };"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_variable_of_incomplete_struct() {
    assert!(matches!(
        err("struct t; int f(void) { struct t a; return 0; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_variable_of_void_type() {
    assert!(matches!(
        err("int f(void) { void v; return 0; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_mixed_type_assignment_requires_cast() {
    // int8 <- int32 is not implicitly converted.
    assert!(matches!(
        err("int f(int n) { char c; c = n; return 0; }"),
        ParseError::TypeMismatch { .. }
    ));
    // With an explicit cast it is identity again.
    ok("int f(int n) { char c; c = (char)n; return 0; }");
}

#[test]
fn test_pointer_assignment_requires_matching_type() {
    assert!(matches!(
        err("int f(int *p) { char *q; q = p; return 0; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_literal_zero_is_not_a_null_pointer() {
    assert!(matches!(
        err("int f(void) { int *p; p = 0; return 0; }"),
        ParseError::TypeMismatch { .. }
    ));
    ok("int f(void) { int *p; p = (int *)0; return 0; }");
}

#[test]
fn test_pointer_equality_is_accepted() {
    ok("int f(int *p) { return p == (int *)0; }");
    ok("int f(int *p, int *q) { return p != q; }");
}

#[test]
fn test_pointer_equality_requires_identical_pointer_types() {
    assert!(matches!(
        err("int f(int *p, char *q) { return p == q; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_pointer_relational_is_rejected() {
    assert!(matches!(
        err("int f(int *p, int *q) { return p < q; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_arithmetic_on_pointers_is_rejected() {
    assert!(matches!(
        err("int f(int *p) { return p + 1; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_condition_must_be_int32() {
    assert!(matches!(
        err("int f(int *p) { while (p) { } return 0; }"),
        ParseError::TypeMismatch { .. }
    ));
    assert!(matches!(
        err("int f(int *p) { if (p) { } return 0; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_member_access_on_non_struct() {
    assert!(matches!(
        err("int f(int n) { return n.x; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_unknown_member() {
    assert!(matches!(
        err("struct t { int x; }; int f(void) { struct t a; return a.y; }"),
        ParseError::UndefinedMember { .. }
    ));
}

// ----------------------------------------------------------------------
// Returns and calls
// ----------------------------------------------------------------------

#[test]
fn test_void_function_returning_a_value() {
    assert!(matches!(
        err("void f(void) { return 1; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_non_void_function_returning_nothing() {
    assert!(matches!(
        err("int f(void) { return; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_return_type_mismatch() {
    assert!(matches!(
        err("int *f(int n) { return n; }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_call_argument_count_mismatch() {
    assert!(matches!(
        err("int g(int a, int b); int f(void) { return g(1); }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_call_argument_type_mismatch() {
    assert!(matches!(
        err("int g(int *p); int f(int n) { return g(n); }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_call_of_non_function() {
    assert!(matches!(
        err("int f(int n) { return n(); }"),
        ParseError::TypeMismatch { .. }
    ));
}

#[test]
fn test_var_args_call_arity() {
    let decl = "int sprintf(char *p, const char *f, ...);\n";

    // At least the declared parameters are required.
    assert!(matches!(
        err(&format!("{}int f(char *p) {{ return sprintf(p); }}", decl)),
        ParseError::TypeMismatch { .. }
    ));

    // Extra arguments beyond the declared ones are unchecked.
    ok(&format!(
        "{}int f(char *p) {{ return sprintf(p, \"%d%d\", 1, 2); }}",
        decl
    ));
}

// ----------------------------------------------------------------------
// Lookup and literals
// ----------------------------------------------------------------------

#[test]
fn test_undeclared_symbol() {
    assert!(matches!(
        err("int f(void) { return missing; }"),
        ParseError::UndeclaredSymbol { .. }
    ));
}

#[test]
fn test_symbol_not_visible_after_scope_exit() {
    assert!(matches!(
        err("int f(int n) { { int a; a = n; } return a; }"),
        ParseError::UndeclaredSymbol { .. }
    ));
}

#[test]
fn test_integer_literal_max_is_accepted() {
    ok("int f(void) { return 2147483647; }");
}

#[test]
fn test_integer_literal_overflow() {
    assert!(matches!(
        err("int f(void) { return 2147483648; }"),
        ParseError::IntegerOverflow { .. }
    ));
    assert!(matches!(
        err("int f(void) { return 99999999999999999999; }"),
        ParseError::IntegerOverflow { .. }
    ));
}

// ----------------------------------------------------------------------
// Unimplemented operators are ordinary parse errors
// ----------------------------------------------------------------------

#[test]
fn test_increment_operator_is_not_parsed() {
    assert!(matches!(
        err("int f(int n) { ++n; return n; }"),
        ParseError::UnexpectedToken { .. }
    ));
}

#[test]
fn test_decrement_operator_is_not_parsed() {
    assert!(matches!(
        err("int f(int n) { n--; return n; }"),
        ParseError::UnexpectedToken { .. }
    ));
}

#[test]
fn test_subscript_operator_is_not_parsed() {
    assert!(matches!(
        err("int f(int n) { return \"test\"[n]; }"),
        ParseError::UnexpectedToken { .. }
    ));
}

#[test]
fn test_sizeof_is_not_parsed() {
    assert!(matches!(
        err("int f(void) { return sizeof(int); }"),
        ParseError::UnexpectedToken { .. }
    ));
}

#[test]
fn test_empty_parameter_list_requires_void() {
    assert!(matches!(
        err("int f() { return 0; }"),
        ParseError::UnexpectedToken { .. }
    ));
}

#[test]
fn test_error_message_wording() {
    let e = err("int f(void) { return 0 }");
    assert_eq!(e.to_string(), "expected ;, but got }");

    let e = err("int f(void) { return missing; }");
    assert_eq!(e.to_string(), "undeclared symbol missing");

    let e = err("int f(void) { break; }");
    assert_eq!(e.to_string(), "break outside of loop");
}

#[test]
fn test_lex_errors_surface_through_parse() {
    assert!(matches!(
        err("int f(void) { return '\\t'; }"),
        ParseError::Lex(_)
    ));
}

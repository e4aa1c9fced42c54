//! Evaluator semantics: coercions, control flow, scoping, procedures,
//! and the error model, driven through parsed scripts.

mod helpers;

use amiscript::{Outcome, Value};
use helpers::{num_of, run_script, text_of, with_script};
use rstest::rstest;

// ============================================================================
// LITERALS AND COERCION
// ============================================================================

#[rstest]
#[case("42", 42)]
#[case("-7", -7)]
#[case("$ff", 255)]
#[case("0x10", 16)]
#[case("%101", 5)]
#[case("0b11", 3)]
fn test_literal_round_trip(#[case] source: &str, #[case] expected: i32) {
    assert_eq!(num_of(source), expected);
}

#[test]
fn test_string_round_trip() {
    assert_eq!(text_of("\"hello world\""), "hello world");
    assert_eq!(text_of("\"\""), "");
}

#[test]
fn test_string_to_number_coercion() {
    assert_eq!(num_of("(+ \"0x10\" \"$10\" \"%10\")"), 16 + 16 + 2);
    assert_eq!(num_of("(+ \"junk\" 1)"), 1);
}

#[test]
fn test_number_to_string_coercion() {
    assert_eq!(text_of("(cat \"v\" 42)"), "v42");
    assert_eq!(text_of("(cat (- 0 5))"), "-5");
}

// ============================================================================
// ARITHMETIC PROPERTIES
// ============================================================================

#[rstest]
#[case(3, 4)]
#[case(-17, 99)]
#[case(0, 0)]
fn test_arithmetic_identities(#[case] a: i32, #[case] b: i32) {
    assert_eq!(num_of(&format!("(= (+ {a} {b}) (+ {b} {a}))")), 1);
    assert_eq!(num_of(&format!("(- {a} {a})")), 0);
    assert_eq!(num_of(&format!("(/ {a} 1)")), a);
}

#[test]
fn test_and_does_not_short_circuit() {
    // Source semantics: every argument is resolved, side effects and
    // all.
    with_script("(set seen 0) (and 0 (set seen 1))", |ev, root| {
        ev.run(root);
        assert_eq!(ev.lookup("seen"), Some(&Value::Number(1)));
    });
}

#[test]
fn test_or_resolves_all_arguments() {
    with_script("(set seen 0) (or 1 (set seen 1))", |ev, root| {
        ev.run(root);
        assert_eq!(ev.lookup("seen"), Some(&Value::Number(1)));
    });
}

// ============================================================================
// VARIABLES AND SCOPING
// ============================================================================

#[test]
fn test_set_and_reference() {
    // (set x 5) (set y (+ x 3)) y => 8, with both globals visible.
    with_script("(set x 5) (set y (+ x 3)) y", |ev, root| {
        let mut last = Value::Dangle;
        for stmt in ev.tree().children(root) {
            last = ev.invoke(*stmt);
        }
        assert_eq!(last, Value::Number(8));
        assert_eq!(ev.lookup("x"), Some(&Value::Number(5)));
        assert_eq!(ev.lookup("y"), Some(&Value::Number(8)));
    });
}

#[test]
fn test_set_returns_last_value_and_is_case_insensitive() {
    assert_eq!(num_of("(set a 1 b 2)"), 2);
    assert_eq!(num_of("(set Total 9) TOTAL"), 9);
}

#[test]
fn test_symbolset_and_symbolval() {
    assert_eq!(num_of("(symbolset (cat \"co\" \"unt\") 7) (symbolval \"count\")"), 7);
}

#[test]
fn test_procedure_call_and_shadowing() {
    // (procedure inc x (+ x 1)) (inc 41) => 42, and the formal never
    // leaks into the global environment.
    with_script("(procedure inc x (+ x 1)) (inc 41)", |ev, root| {
        let stmts: Vec<_> = ev.tree().children(root).to_vec();
        ev.invoke(stmts[0]);
        assert_eq!(ev.invoke(stmts[1]), Value::Number(42));
        assert!(ev.lookup("x").is_none());
    });
}

#[test]
fn test_assigning_to_formal_stays_local() {
    let src = "(set x 5) (procedure p x (set x 99) x) (p 1)";
    with_script(src, |ev, root| {
        let stmts: Vec<_> = ev.tree().children(root).to_vec();
        ev.invoke(stmts[0]);
        ev.invoke(stmts[1]);
        assert_eq!(ev.invoke(stmts[2]), Value::Number(99));
        assert_eq!(ev.lookup("x"), Some(&Value::Number(5)));
    });
}

#[test]
fn test_procedure_missing_arguments_dangle() {
    assert_eq!(num_of("(procedure two a b (+ a b)) (two 5)"), 5);
}

// ============================================================================
// CONTROL FLOW
// ============================================================================

#[test]
fn test_if_branches() {
    assert_eq!(text_of("(if (< 2 3) \"yes\" \"no\")"), "yes");
    assert_eq!(text_of("(if (> 2 3) \"yes\" \"no\")"), "no");
    assert_eq!(num_of("(if 0 1)"), 0);
}

#[test]
fn test_while_loop() {
    let src = "(set i 0 sum 0) (while (< i 5) (set sum (+ sum i) i (+ i 1))) sum";
    assert_eq!(num_of(src), 10);
}

#[test]
fn test_until_runs_body_at_least_once() {
    let src = "(set i 0) (until 1 (set i (+ i 1))) i";
    assert_eq!(num_of(src), 1);
}

#[test]
fn test_select() {
    assert_eq!(text_of("(select 1 \"a\" \"b\" \"c\")"), "b");
    assert_eq!(num_of("(select 9 10 20)"), 0);
    assert_eq!(num_of("(select (- 0 1) 10 20)"), 0);
}

// ============================================================================
// COMPARISON
// ============================================================================

#[test]
fn test_string_vs_numeric_comparison() {
    assert_eq!(num_of("(= \"abc\" \"abc\")"), 1);
    assert_eq!(num_of("(< \"10\" \"9\")"), 1);
    assert_eq!(num_of("(< 10 9)"), 0);
    assert_eq!(num_of("(= \"5\" 5)"), 1);
}

// ============================================================================
// STRING OPERATORS
// ============================================================================

#[test]
fn test_string_family() {
    assert_eq!(num_of("(strlen \"four\")"), 4);
    assert_eq!(text_of("(substr \"installer\" 2 4)"), "stal");
    assert_eq!(text_of("(substr \"abc\" 1)"), "bc");
    assert_eq!(text_of("(tackon \"sys:utils\" \"more\")"), "sys:utils/more");
    assert_eq!(text_of("(pathonly \"sys:dir/file\")"), "sys:dir");
    assert_eq!(text_of("(fileonly \"sys:dir/file\")"), "file");
    assert_eq!(num_of("(patmatch \"#?.info\" \"disk.info\")"), 1);
    assert_eq!(num_of("(patmatch \"#?.info\" \"readme\")"), 0);
}

#[test]
fn test_fmt() {
    assert_eq!(text_of("(fmt \"%s=%ld\" \"n\" 42)"), "n=42");
    assert_eq!(text_of("(fmt \"%d%%\" 50)"), "50%");
    assert_eq!(text_of("(fmt \"%x\" 255)"), "ff");
}

// ============================================================================
// ERROR MODEL
// ============================================================================

#[test]
fn test_onerror_handles_and_run_exits_cleanly() {
    // The handler runs, binds err, and the run still completes.
    with_script(
        "(onerror (set err 1)) (delete \"no/such/path\") (set after 1)",
        |ev, root| {
            let outcome = ev.run(root);
            assert_eq!(outcome, Outcome::Complete);
            assert_eq!(ev.lookup("err"), Some(&Value::Number(1)));
            // After the handler the run ends; later statements never
            // execute.
            assert!(ev.lookup("after").is_none());
        },
    );
}

#[test]
fn test_onerror_receives_error_message() {
    with_script(
        "(onerror (set msg @error-msg)) (delete \"no/such/path\")",
        |ev, root| {
            ev.run(root);
            match ev.lookup("msg") {
                Some(Value::Text(s)) => assert!(s.contains("no such file")),
                other => panic!("expected message, got {other:?}"),
            }
        },
    );
}

#[test]
fn test_trap_downgrades_matching_error() {
    // NoSuchFileOrDir owns bit 11; the trap turns the error into the
    // mask value and leaves the fault slot clean.
    let mask = 1 << 11;
    with_script(
        &format!("(set r (trap {mask} (delete \"no/such/path\")))"),
        |ev, root| {
            assert_eq!(ev.run(root), Outcome::Complete);
            assert_eq!(ev.lookup("r"), Some(&Value::Number(mask)));
            assert!(ev.fault().is_none());
        },
    );
}

#[test]
fn test_trap_passes_unmatched_errors_to_onerror() {
    with_script(
        "(onerror (set handled 1)) (trap 1 (delete \"no/such/path\"))",
        |ev, root| {
            assert_eq!(ev.run(root), Outcome::Complete);
            assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
        },
    );
}

#[test]
fn test_abort_unwinds() {
    with_script("(set a 1) (abort \"stop\") (set b 1)", |ev, root| {
        assert_eq!(ev.run(root), Outcome::Aborted);
        assert_eq!(ev.lookup("a"), Some(&Value::Number(1)));
        assert!(ev.lookup("b").is_none());
    });
}

#[test]
fn test_exit_completes_early() {
    with_script("(set a 1) (exit (quiet)) (set b 1)", |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert!(ev.lookup("b").is_none());
    });
}

#[test]
fn test_strict_mode_reports_unbound_symbol() {
    with_script("(set y nope)", |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete); // default handler
        // The binding never happened.
        assert!(ev.lookup("y").is_none());
    });
}

#[test]
fn test_non_strict_mode_dangles_unbound_symbol() {
    // With @strict off the reference resolves to a dangle that reads
    // as 0 / "".
    with_script("(set @strict 0) (set y (+ nope 1)) y", |ev, root| {
        let mut last = Value::Dangle;
        for stmt in ev.tree().children(root) {
            last = ev.invoke(*stmt);
        }
        assert!(ev.fault().is_none());
        assert_eq!(last, Value::Number(1));
    });
}

#[test]
fn test_division_by_zero_is_an_error() {
    with_script("(onerror (set handled 1)) (/ 1 0)", |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
    });
}

// ============================================================================
// INFORMATION AND PROMPTS (headless dialog)
// ============================================================================

#[test]
fn test_user_returns_previous_level() {
    assert_eq!(num_of("(user 2)"), 1);
    assert_eq!(num_of("(user 2) (user 0)"), 2);
}

#[test]
fn test_welcome_proceeds() {
    assert_eq!(run_script("(welcome \"hi\") (set done 1)"), Outcome::Complete);
}

#[test]
fn test_message_novice_is_silent() {
    assert_eq!(num_of("(user 0) (message \"hello\")"), 0);
    assert_eq!(num_of("(message \"hello\")"), 1);
}

#[test]
fn test_debug_tolerates_unbound_symbols() {
    // `<NIL>` is printed instead of raising, even in strict mode.
    assert_eq!(num_of("(debug \"value:\" missing)"), 1);
}

#[test]
fn test_prompts_use_default_in_novice_mode() {
    let src = "(user 0) (asknumber (prompt \"n?\") (help \"h\") (default 33))";
    assert_eq!(num_of(src), 33);

    let src = "(user 0) (askstring (prompt \"s?\") (help \"h\") (default \"dflt\"))";
    assert_eq!(text_of(src), "dflt");
}

#[test]
fn test_askbool_and_choice_defaults() {
    // The headless dialog answers yes / keeps the default selection.
    assert_eq!(num_of("(askbool (prompt \"p\") (help \"h\"))"), 1);
    let src = "(askchoice (prompt \"p\") (help \"h\") (choices \"a\" \"b\" \"c\") (default 2))";
    assert_eq!(num_of(src), 2);
}

#[test]
fn test_askchoice_rejects_out_of_range_default() {
    with_script(
        "(onerror (set handled 1)) \
         (askchoice (prompt \"p\") (help \"h\") (choices \"a\") (default 5))",
        |ev, root| {
            assert_eq!(ev.run(root), Outcome::Complete);
            assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
        },
    );
}

#[test]
fn test_askoptions_default_mask() {
    let src = "(askoptions (prompt \"p\") (help \"h\") (choices \"a\" \"b\"))";
    assert_eq!(num_of(src), -1);
}

#[test]
fn test_missing_prompt_is_error_in_strict_mode() {
    with_script("(onerror (set handled 1)) (askbool (help \"h\"))", |ev, root| {
        assert_eq!(ev.run(root), Outcome::Complete);
        assert_eq!(ev.lookup("handled"), Some(&Value::Number(1)));
    });
}

#[test]
fn test_missing_prompt_tolerated_in_non_strict_mode() {
    let src = "(set @strict 0) (askbool (help \"h\"))";
    assert_eq!(num_of(src), 1);
}

// ============================================================================
// PROBES THAT NEED NO FILE SYSTEM
// ============================================================================

#[test]
fn test_database() {
    assert_eq!(text_of("(database \"total-mem\")"), "524288");
    assert_eq!(text_of("(database \"total-mem\" \"524288\")"), "1");
    assert_eq!(text_of("(database \"bogus-key\")"), "Unknown");
}

#[test]
fn test_getdiskspace_unknown_volume() {
    assert_eq!(num_of("(getdiskspace \"nowhere:\")"), -1);
}

#[test]
fn test_getversion_without_target() {
    assert_eq!(num_of("(getversion)"), 0);
}

#[test]
fn test_reserved_variables_are_seeded() {
    assert_eq!(num_of("@user-level"), 1);
    assert_eq!(num_of("@pretend"), 0);
    assert_eq!(text_of("@app-name"), "Test App");
    assert_eq!(text_of("fail"), "fail");
}

use std::io::Write;

use ot_learner::format::sibling_constraints_path;
use ot_learner::{
    load_constraint_types, load_tableau, parse_constraint_types, parse_tableau, FormatError,
    TableauError, WinnerPolicy,
};
use tempfile::tempdir;

const SASHI: &str = "\t\t\tNoCoda\tMax(C)\tDep(V)\n\
                     \t\t\tNoC\tMax\tDep\n\
                     pat\tpat\t\t1\t\t\n\
                     \tpa\t7\t\t1\t\n\
                     \tpa.ti\t\t\t\t1\n\
                     \n\
                     ta\tta\t3\t0\t0\t0\n";

#[test]
fn parses_headers_inputs_and_continuation_rows() {
    let t = parse_tableau(SASHI, WinnerPolicy::SingleWinner).unwrap();

    assert_eq!(t.constraint_names(), vec!["NoCoda", "Max(C)", "Dep(V)"]);
    assert_eq!(t.constraints()[1].short_name, "Max");
    assert_eq!(t.inputs().len(), 2);

    let pat = &t.inputs()[0];
    assert_eq!(pat.form, "pat");
    assert_eq!(pat.candidates.len(), 3);
    assert_eq!(pat.candidates[0].frequency, 0);
    assert_eq!(pat.candidates[0].violations, vec![1, 0, 0]);
    assert_eq!(pat.candidates[1].frequency, 7);
    assert_eq!(pat.candidates[2].violations, vec![0, 0, 1]);

    assert_eq!(t.candidates(1)[0].form, "ta");
    assert_eq!(t.constraint_index("Dep(V)"), Some(2));
}

#[test]
fn short_name_mismatch_falls_back_to_full_names() {
    let text = "\t\t\tNoCoda\tMax\n\t\t\tNoC\n x\ty\t1\t0\t0\n";
    let t = parse_tableau(text, WinnerPolicy::FreeVariation).unwrap();
    assert_eq!(t.constraints()[0].short_name, "NoC");
    assert_eq!(t.constraints()[1].short_name, "Max");
}

#[test]
fn wrong_column_count_reports_the_line() {
    let text = "\t\t\tA\tB\n\t\t\tA\tB\nx\ty\t1\t0\n";
    match parse_tableau(text, WinnerPolicy::FreeVariation) {
        Err(TableauError::Format(FormatError::Line { line, .. })) => assert_eq!(line, 3),
        other => panic!("expected a line error, got {other:?}"),
    }
}

#[test]
fn negative_and_fractional_cells_are_rejected() {
    for bad in ["-1", "0.5", "two"] {
        let text = format!("\t\t\tA\n\t\t\tA\nx\ty\t1\t{bad}\n");
        match parse_tableau(&text, WinnerPolicy::FreeVariation) {
            Err(TableauError::Format(FormatError::NotACount {
                line,
                column,
                token,
            })) => {
                assert_eq!((line, column), (3, 4));
                assert_eq!(token, bad);
            }
            other => panic!("expected NotACount for {bad:?}, got {other:?}"),
        }
    }
}

#[test]
fn continuation_before_any_input_is_an_error() {
    let text = "\t\t\tA\n\t\t\tA\n\ty\t1\t0\n";
    assert!(matches!(
        parse_tableau(text, WinnerPolicy::FreeVariation),
        Err(TableauError::Format(FormatError::Line { line: 3, .. }))
    ));
}

#[test]
fn empty_text_has_no_header() {
    assert!(matches!(
        parse_tableau("", WinnerPolicy::FreeVariation),
        Err(TableauError::Format(FormatError::MissingHeader))
    ));
}

#[test]
fn duplicate_constraint_names_are_rejected() {
    let text = "\t\t\tA\tA\n\t\t\tA\tA\nx\ty\t1\t0\t0\n";
    assert!(matches!(
        parse_tableau(text, WinnerPolicy::FreeVariation),
        Err(TableauError::Format(FormatError::DuplicateConstraint(_)))
    ));
}

#[test]
fn single_winner_policy_rejects_free_variation() {
    let text = "\t\t\tA\n\t\t\tA\nx\ty\t1\t0\n\tz\t2\t1\n";
    assert!(parse_tableau(text, WinnerPolicy::FreeVariation).is_ok());
    assert!(matches!(
        parse_tableau(text, WinnerPolicy::SingleWinner),
        Err(TableauError::MultipleWinners { index: 1, .. })
    ));
}

#[test]
fn constraint_type_lines() {
    let entries = parse_constraint_types("NoCoda\tM\n\nMax(C)\tF\textra\n").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].name, "Max(C)");
    assert_eq!(entries[1].token, "F");

    assert!(matches!(
        parse_constraint_types("NoCoda\n"),
        Err(FormatError::Line { line: 1, .. })
    ));
}

#[test]
fn loads_tableau_and_sibling_constraint_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sashi.txt");
    std::fs::write(&path, SASHI).unwrap();

    let types = sibling_constraints_path(&path);
    let mut f = std::fs::File::create(&types).unwrap();
    writeln!(f, "NoCoda\tM").unwrap();
    writeln!(f, "Max(C)\tF").unwrap();
    drop(f);

    let t = load_tableau(&path, WinnerPolicy::SingleWinner).unwrap();
    let entries = load_constraint_types(&types).unwrap();
    let (t, warnings) = t.with_constraint_types(&entries);
    assert!(warnings.is_empty());
    assert_eq!(
        t.constraints()[0].ctype,
        ot_learner::ConstraintType::Markedness
    );

    assert!(matches!(
        load_tableau(dir.path().join("missing.txt"), WinnerPolicy::SingleWinner),
        Err(TableauError::Io(_))
    ));
}

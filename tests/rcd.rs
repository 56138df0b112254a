use ot_learner::rcd::{mark_data_pairs, order_explains, MarkDataPair, Preference};
use ot_learner::{
    rank, recursive_constraint_demotion, Candidate, Constraint, Input, Stratum, Tableau,
    TableauError, WinnerPolicy,
};

fn constraints(names: &[&str]) -> Vec<Constraint> {
    names.iter().map(|n| Constraint::new(*n, *n)).collect()
}

fn tableau(names: &[&str], inputs: Vec<Input>) -> Tableau {
    Tableau::new(constraints(names), inputs, WinnerPolicy::FreeVariation).unwrap()
}

/// *Coda, Max, Dep over /pat/ -> [pa] and /ta/ -> [ta].
fn deletion_tableau() -> Tableau {
    tableau(
        &["*Coda", "Max", "Dep"],
        vec![
            Input::new(
                "pat",
                vec![
                    Candidate::new("pat", 0, vec![1, 0, 0]),
                    Candidate::new("pa", 1, vec![0, 1, 0]),
                    Candidate::new("pa.ti", 0, vec![0, 0, 1]),
                ],
            ),
            Input::new(
                "ta",
                vec![
                    Candidate::new("ta", 1, vec![0, 0, 0]),
                    Candidate::new("t", 0, vec![0, 1, 0]),
                ],
            ),
        ],
    )
}

#[test]
fn mark_data_pairs_compare_winner_against_each_loser() {
    let t = deletion_tableau();
    let mdps = mark_data_pairs(&t).unwrap();
    assert_eq!(mdps.len(), 3);

    use Preference::{E, L, W};
    assert_eq!(mdps[0].signs, vec![W, L, E]);
    assert_eq!(mdps[1].signs, vec![E, L, W]);
    assert_eq!(mdps[2].signs, vec![E, W, E]);
    assert_eq!((mdps[0].input, mdps[0].winner, mdps[0].loser), (0, 1, 0));
}

#[test]
fn consistent_data_yields_explaining_hierarchy() {
    let t = deletion_tableau();
    let result = rank(&t).unwrap();

    assert!(result.hierarchy.is_consistent());
    assert_eq!(
        result.hierarchy.strata,
        vec![Stratum::Ranked(vec![0, 2]), Stratum::Ranked(vec![1])]
    );
    assert!(order_explains(&result.hierarchy.flatten(), &result.mdps));
}

#[test]
fn contradictory_pairs_end_in_paradox() {
    let t = tableau(
        &["C1", "C2"],
        vec![
            Input::new(
                "a",
                vec![
                    Candidate::new("a1", 1, vec![0, 1]),
                    Candidate::new("a2", 0, vec![1, 0]),
                ],
            ),
            Input::new(
                "b",
                vec![
                    Candidate::new("b1", 1, vec![1, 0]),
                    Candidate::new("b2", 0, vec![0, 1]),
                ],
            ),
        ],
    );
    let result = rank(&t).unwrap();
    assert!(!result.hierarchy.is_consistent());
    assert_eq!(result.hierarchy.paradox(), Some(&[0, 1][..]));
    assert_eq!(result.hierarchy.strata.len(), 1);
}

#[test]
fn paradox_keeps_strata_installed_before_it() {
    use Preference::{E, L, W};
    let mdps = vec![
        MarkDataPair::from_signs(vec![W, L, E]),
        MarkDataPair::from_signs(vec![E, W, L]),
        MarkDataPair::from_signs(vec![E, L, W]),
    ];
    let h = recursive_constraint_demotion(&mdps, 3);
    assert_eq!(h.strata[0], Stratum::Ranked(vec![0]));
    assert_eq!(h.strata[1], Stratum::Paradox(vec![1, 2]));
    assert_eq!(h.paradox(), Some(&[1, 2][..]));
}

#[test]
fn multiple_winners_are_rejected() {
    let t = tableau(
        &["C1"],
        vec![
            Input::new("a", vec![Candidate::new("x", 1, vec![0])]),
            Input::new(
                "b",
                vec![Candidate::new("y", 2, vec![0]), Candidate::new("z", 1, vec![1])],
            ),
        ],
    );
    match rank(&t) {
        Err(TableauError::MultipleWinners { input, index }) => {
            assert_eq!(input, "b");
            assert_eq!(index, 2);
        }
        other => panic!("expected MultipleWinners, got {other:?}"),
    }
}

#[test]
fn inputs_without_a_winner_contribute_no_pairs() {
    let t = tableau(
        &["C1", "C2"],
        vec![
            Input::new(
                "wug",
                vec![
                    Candidate::new("w1", 0, vec![0, 1]),
                    Candidate::new("w2", 0, vec![1, 0]),
                ],
            ),
            Input::new(
                "a",
                vec![
                    Candidate::new("a1", 1, vec![1, 0]),
                    Candidate::new("a2", 0, vec![0, 1]),
                ],
            ),
        ],
    );
    let result = rank(&t).unwrap();
    assert_eq!(result.mdps.len(), 1);
    assert_eq!(
        result.hierarchy.strata,
        vec![Stratum::Ranked(vec![1]), Stratum::Ranked(vec![0])]
    );
}

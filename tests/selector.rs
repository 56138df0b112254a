use rand::rngs::StdRng;
use rand::SeedableRng;

use ot_learner::selector::{
    categorical_select, harmonic_select, maxent_scores, maxent_select, resolve_order,
};
use ot_learner::{Candidate, Input, Selection};

fn two_by_two() -> Input {
    Input::new(
        "in",
        vec![
            Candidate::new("a", 1, vec![0, 1]),
            Candidate::new("b", 0, vec![1, 0]),
        ],
    )
}

#[test]
fn higher_ranked_constraint_decides() {
    let input = two_by_two();
    let mut rng = StdRng::seed_from_u64(0);
    for _ in 0..20 {
        assert_eq!(
            categorical_select(&input, &[10.0, 0.0], &mut rng),
            Selection::Unique(0)
        );
        assert_eq!(
            categorical_select(&input, &[0.0, 10.0], &mut rng),
            Selection::Unique(1)
        );
    }
}

#[test]
fn tied_values_resolve_both_ways() {
    let input = two_by_two();
    let mut rng = StdRng::seed_from_u64(7);
    let mut seen = [0usize; 2];
    for _ in 0..200 {
        let winner = categorical_select(&input, &[3.0, 3.0], &mut rng)
            .winner()
            .unwrap();
        seen[winner] += 1;
    }
    assert!(seen[0] > 0 && seen[1] > 0, "seen {seen:?}");
}

#[test]
fn resolve_order_only_shuffles_equal_blocks() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        let order = resolve_order(&[1.0, 5.0, 5.0, 0.5], &mut rng);
        assert_eq!(order.len(), 4);
        let mut head = order[..2].to_vec();
        head.sort_unstable();
        assert_eq!(head, vec![1, 2]);
        assert_eq!(&order[2..], &[0, 3]);
    }
}

#[test]
fn identical_candidates_tie() {
    let input = Input::new(
        "in",
        vec![
            Candidate::new("a", 1, vec![0, 1]),
            Candidate::new("a'", 0, vec![0, 1]),
            Candidate::new("b", 0, vec![1, 0]),
        ],
    );
    let mut rng = StdRng::seed_from_u64(1);
    match harmonic_select(&input, &[0, 1], &mut rng) {
        Selection::Tied { chosen, survivors } => {
            assert_eq!(survivors, vec![0, 1]);
            assert!(survivors.contains(&chosen));
        }
        other => panic!("expected a tie, got {other:?}"),
    }
}

#[test]
fn single_candidate_wins_without_constraints() {
    let input = Input::new("in", vec![Candidate::new("a", 1, vec![])]);
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(harmonic_select(&input, &[], &mut rng), Selection::Unique(0));
}

#[test]
fn maxent_probabilities_sum_to_one() {
    let input = Input::new(
        "in",
        vec![
            Candidate::new("a", 1, vec![0, 1]),
            Candidate::new("b", 0, vec![1, 0]),
            Candidate::new("c", 0, vec![2, 3]),
        ],
    );
    let scores = maxent_scores(&input, &[1.5, 0.25]);
    let total: f64 = scores.probabilities.iter().sum();
    assert!((total - 1.0).abs() < 1e-12);
    assert!((scores.harmonies[2] - 3.75).abs() < 1e-12);
    assert!((scores.scores[0] - (-0.25f64).exp()).abs() < 1e-12);
    assert!(scores.probabilities[0] > scores.probabilities[1]);
    assert!(scores.probabilities[1] > scores.probabilities[2]);
}

#[test]
fn zero_weights_give_uniform_distribution() {
    let scores = maxent_scores(&two_by_two(), &[0.0, 0.0]);
    assert_eq!(scores.probabilities, vec![0.5, 0.5]);
}

#[test]
fn huge_weights_still_normalize() {
    let scores = maxent_scores(&two_by_two(), &[2000.0, 1000.0]);
    assert_eq!(scores.scores, vec![0.0, 0.0]);
    assert!((scores.probabilities[0] - 1.0).abs() < 1e-12);
}

#[test]
fn maxent_sampling_follows_probabilities() {
    let input = two_by_two();
    let mut rng = StdRng::seed_from_u64(11);
    let weights = [0.0, 2.0f64.ln()];
    let mut hits = 0;
    let draws = 6000;
    for _ in 0..draws {
        if maxent_select(&input, &weights, &mut rng) == Selection::Unique(1) {
            hits += 1;
        }
    }
    // P(b) = 2/3 since a carries a violation of weight ln 2.
    let freq = hits as f64 / draws as f64;
    assert!((freq - 2.0 / 3.0).abs() < 0.03, "freq {freq}");
}

use proptest::prelude::*;
use sdgx::assessment::{compute_scores, AnswerValue, QuestionCatalog, QuestionId, ResponseStore};

const STANDARD_QUESTIONS: u32 = 24;

fn answers() -> impl Strategy<Value = Vec<(u32, u8)>> {
    prop::collection::vec((1..=STANDARD_QUESTIONS, 0u8..=4), 0..40)
}

fn store_from(pairs: &[(u32, u8)]) -> ResponseStore {
    pairs
        .iter()
        .map(|(id, raw)| {
            (
                QuestionId(*id),
                AnswerValue::new(*raw).expect("strategy stays on scale"),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn averages_stay_on_the_scale(pairs in answers()) {
        let catalog = QuestionCatalog::standard();
        let sheet = compute_scores(&catalog, &store_from(&pairs));

        for score in &sheet.indicator_scores {
            prop_assert!((1.0..=4.0).contains(&score.average));
            prop_assert!(score.sample_count > 0);
        }
        if let Some(global) = sheet.global_score {
            prop_assert!((1.0..=4.0).contains(&global));
        }
    }

    #[test]
    fn indicators_are_sorted_and_unique(pairs in answers()) {
        let catalog = QuestionCatalog::standard();
        let sheet = compute_scores(&catalog, &store_from(&pairs));

        let ids: Vec<u8> = sheet.indicator_scores.iter().map(|s| s.indicator.get()).collect();
        prop_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn recomputation_is_idempotent(pairs in answers()) {
        let catalog = QuestionCatalog::standard();
        let responses = store_from(&pairs);

        let first = compute_scores(&catalog, &responses);
        prop_assert_eq!(&first, &compute_scores(&catalog, &responses));
    }

    #[test]
    fn global_score_tracks_mean_of_indicators(pairs in answers()) {
        let catalog = QuestionCatalog::standard();
        let sheet = compute_scores(&catalog, &store_from(&pairs));

        match sheet.global_score {
            None => prop_assert!(sheet.indicator_scores.is_empty()),
            Some(global) => {
                let mean = sheet.indicator_scores.iter().map(|s| s.average).sum::<f64>()
                    / sheet.indicator_scores.len() as f64;
                prop_assert!((global - mean).abs() <= 0.0101);
            }
        }
    }

    #[test]
    fn catalog_order_does_not_change_scores(
        questions in Just(QuestionCatalog::standard().questions().to_vec()).prop_shuffle(),
        pairs in answers(),
    ) {
        let standard = QuestionCatalog::standard();
        let shuffled = QuestionCatalog::new(questions).expect("same questions stay valid");
        let responses = store_from(&pairs);

        prop_assert_eq!(
            compute_scores(&shuffled, &responses),
            compute_scores(&standard, &responses)
        );
    }

    #[test]
    fn not_applicable_only_yields_empty_sheet(ids in prop::collection::btree_set(1..=STANDARD_QUESTIONS, 0..24)) {
        let catalog = QuestionCatalog::standard();
        let responses: ResponseStore = ids
            .into_iter()
            .map(|id| (QuestionId(id), AnswerValue::NOT_APPLICABLE))
            .collect();

        let sheet = compute_scores(&catalog, &responses);
        prop_assert!(sheet.is_empty());
        prop_assert_eq!(sheet.global_score, None);
    }
}

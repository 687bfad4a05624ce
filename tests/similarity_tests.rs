// Similarity scoring and profile hashing tests
// Author: kelexine (https://github.com/kelexine)

use nutralingo::cache::{calculate_similarity, generate_hash, BucketConfig};
use nutralingo::models::{Extraction, NutrientValue, Nutrition};
use proptest::prelude::*;

fn extraction(ingredients: &[&str], nutrients: [f64; 5]) -> Extraction {
    let [calories, sodium, sugars, fat, protein] = nutrients;
    Extraction {
        ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        nutrition: Some(Nutrition {
            calories: Some(NutrientValue::Number(calories)),
            sodium: Some(NutrientValue::Number(sodium)),
            total_sugars: Some(NutrientValue::Number(sugars)),
            total_fat: Some(NutrientValue::Number(fat)),
            protein: Some(NutrientValue::Number(protein)),
            ..Default::default()
        }),
        additives: None,
    }
}

#[test]
fn test_same_product_rescanned_is_similar() {
    let a = extraction(&["wheat flour", "sugar", "palm oil"], [140.0, 200.0, 12.0, 7.0, 2.0]);
    let b = extraction(&["wheat flour", "sugar", "palm oil"], [145.0, 200.0, 12.0, 7.0, 2.0]);

    let score = calculate_similarity(&a, &b);
    assert!(score > 0.85, "score {}", score);
    assert!(score < 1.0);
}

#[test]
fn test_unrelated_products_are_dissimilar() {
    let cereal = extraction(&["oats", "sugar"], [100.0, 50.0, 2.0, 1.0, 10.0]);
    let curry = extraction(&["chicken", "cream", "spices"], [500.0, 900.0, 30.0, 20.0, 1.0]);

    let score = calculate_similarity(&cereal, &curry);
    assert!(score < 0.5, "score {}", score);
}

#[test]
fn test_all_zero_against_salty_sweet_is_dissimilar() {
    let water = extraction(&["water"], [0.0; 5]);
    let snack = extraction(&["corn", "salt", "sugar"], [0.0, 2000.0, 60.0, 0.0, 0.0]);

    // Three matching zero nutrients still leave the pair under the cutoff
    let score = calculate_similarity(&water, &snack);
    assert!((score - 0.36).abs() < 1e-9, "score {}", score);
    assert!(score < 0.5);

    let loaded = extraction(&["corn", "salt", "sugar"], [480.0, 2000.0, 60.0, 25.0, 6.0]);
    assert_eq!(calculate_similarity(&water, &loaded), 0.0);
}

#[test]
fn test_unit_strings_compare_like_numbers() {
    let numeric = extraction(&["salt"], [0.0, 480.0, 0.0, 0.0, 0.0]);
    let mut textual = numeric.clone();
    if let Some(n) = textual.nutrition.as_mut() {
        n.sodium = Some("480mg".into());
    }

    assert_eq!(calculate_similarity(&numeric, &textual), 1.0);
}

#[test]
fn test_missing_nutrition_reads_as_zero() {
    let bare = Extraction {
        ingredients: vec!["water".to_string()],
        nutrition: None,
        additives: None,
    };
    let zeros = extraction(&["water"], [0.0; 5]);
    assert_eq!(calculate_similarity(&bare, &zeros), 1.0);
}

#[test]
fn test_hash_ignores_order_case_and_whitespace() {
    let buckets = BucketConfig::default();
    let a = extraction(&["Sugar", "wheat flour", "salt"], [140.0, 200.0, 12.0, 7.0, 2.0]);
    let b = extraction(&["salt ", " WHEAT FLOUR", "sugar"], [140.0, 200.0, 12.0, 7.0, 2.0]);
    assert_eq!(generate_hash(&a, &buckets), generate_hash(&b, &buckets));

    let c = extraction(&["salt", "wheat flour", "sugar", "yeast"], [140.0, 200.0, 12.0, 7.0, 2.0]);
    assert_ne!(generate_hash(&a, &buckets), generate_hash(&c, &buckets));
}

#[test]
fn test_hash_changes_across_buckets() {
    let buckets = BucketConfig::default();
    let low = extraction(&["oats"], [100.0, 0.0, 0.0, 0.0, 0.0]);
    let high = extraction(&["oats"], [300.0, 0.0, 0.0, 0.0, 0.0]);
    assert_ne!(generate_hash(&low, &buckets), generate_hash(&high, &buckets));
}

fn arb_extraction() -> impl Strategy<Value = Extraction> {
    (
        prop::collection::vec("[a-z]{1,8}", 0..6),
        prop::array::uniform5(0.0f64..2000.0),
    )
        .prop_map(|(ingredients, nutrients)| {
            let refs: Vec<&str> = ingredients.iter().map(String::as_str).collect();
            extraction(&refs, nutrients)
        })
}

proptest! {
    #[test]
    fn prop_similarity_is_bounded_and_symmetric(a in arb_extraction(), b in arb_extraction()) {
        let ab = calculate_similarity(&a, &b);
        let ba = calculate_similarity(&b, &a);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn prop_hash_is_order_independent(a in arb_extraction()) {
        let buckets = BucketConfig::default();
        let mut reversed = a.clone();
        reversed.ingredients.reverse();
        prop_assert_eq!(generate_hash(&a, &buckets), generate_hash(&reversed, &buckets));
    }
}

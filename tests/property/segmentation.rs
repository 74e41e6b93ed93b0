//! Segmentation invariants over generated recipe trees

use parking_lot::Mutex;
use proptest::prelude::*;
use recipe::oven::Payload;
use recipe::{
    hook_fn, BackendOven, BaseIngredient, Cake, DirectDispatchOven, Ingredient, KeyedIngredient,
    Recipe,
};
use serde_json::Value;
use std::sync::Arc;

const DOMAINS: [&str; 3] = ["A", "B", "C"];
const LEAF_TYPES: [&str; 3] = ["T0", "T1", "T2"];
const KEYED_TYPE: &str = "K";

fn leaf() -> impl Strategy<Value = Ingredient> {
    (
        prop::sample::select(LEAF_TYPES.to_vec()),
        prop::option::weighted(0.9, prop::sample::select(DOMAINS.to_vec())),
    )
        .prop_map(|(ingredient_type, domain)| {
            match domain {
                Some(domain) => BaseIngredient::new(ingredient_type, domain),
                None => BaseIngredient::without_domain(ingredient_type),
            }
            .into()
        })
}

#[derive(Debug, Clone)]
enum ScopeChoice {
    None,
    Context(String),
    Keyed(&'static str, Option<String>),
}

fn scope() -> impl Strategy<Value = ScopeChoice> {
    prop_oneof![
        Just(ScopeChoice::None),
        "[a-z]{1,3}".prop_map(ScopeChoice::Context),
        (
            prop::sample::select(DOMAINS.to_vec()),
            prop::option::of("[a-z]{1,3}")
        )
            .prop_map(|(domain, key)| ScopeChoice::Keyed(domain, key)),
    ]
}

fn tree() -> impl Strategy<Value = Recipe> {
    let ingredient = leaf().prop_recursive(4, 48, 5, |inner| {
        (prop::collection::vec(inner, 0..5), scope())
            .prop_map(|(children, scope)| Ingredient::from(scoped(children, scope)))
    });
    (prop::collection::vec(ingredient, 0..6), scope())
        .prop_map(|(children, scope)| scoped(children, scope))
}

fn scoped(children: Vec<Ingredient>, scope: ScopeChoice) -> Recipe {
    match scope {
        ScopeChoice::None => Recipe::prepare(children),
        ScopeChoice::Context(name) => Recipe::context(name, children),
        ScopeChoice::Keyed(domain, key) => {
            Recipe::context_ingredient(KeyedIngredient::new(KEYED_TYPE, domain).keyed(key), children)
        }
    }
}

type Trace = Arc<Mutex<Vec<(String, String)>>>;

/// Backend recording (ingredient type, namespace) for every hook call
fn tracing_backend() -> (BackendOven, Trace) {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let mut backend = BackendOven::new();
    for ingredient_type in LEAF_TYPES.iter().chain([KEYED_TYPE].iter()) {
        let trace = Arc::clone(&trace);
        let name = ingredient_type.to_string();
        backend.register_hook(hook_fn(*ingredient_type, move |_: Value, cake: &mut Cake| {
            trace.lock().push((name.clone(), cake.namespace()));
            Ok(())
        }));
    }
    (backend, trace)
}

proptest! {
    #[test]
    fn segments_preserve_leaf_order(recipe in tree()) {
        let segments = recipe.segment();
        let segmented: Vec<BaseIngredient> = segments
            .iter()
            .flat_map(|s| s.recipe.leaves().into_iter().cloned())
            .collect();
        let original: Vec<BaseIngredient> = recipe.leaves().into_iter().cloned().collect();
        prop_assert_eq!(segmented, original);
    }

    #[test]
    fn adjacent_segments_differ_in_domain(recipe in tree()) {
        let segments = recipe.segment();
        for pair in segments.windows(2) {
            prop_assert_ne!(pair[0].domain(), pair[1].domain());
        }
    }

    #[test]
    fn segments_are_single_domain_and_non_empty(recipe in tree()) {
        for segment in recipe.segment() {
            let leaves = segment.recipe.leaves();
            prop_assert!(!leaves.is_empty());
            for leaf in leaves {
                prop_assert_eq!(leaf.domain(), segment.domain());
            }
        }
    }

    #[test]
    fn segmented_bake_matches_local_walk(recipe in tree()) {
        let (local, local_trace) = tracing_backend();
        let payload = Payload::new(&recipe, &Cake::new()).to_json().unwrap();
        local.bake(&payload).unwrap();

        let (remote, remote_trace) = tracing_backend();
        DirectDispatchOven::new(remote).bake_blocking(&recipe).unwrap();

        prop_assert_eq!(remote_trace.lock().clone(), local_trace.lock().clone());
    }
}

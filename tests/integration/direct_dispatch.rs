//! DirectDispatchOven: every domain baked by one local backend

use super::test_utils::{call_types, recording_backend};
use recipe::{
    BaseIngredient, DirectDispatchOven, DispatcherRegistry, Ingredient, KeyedIngredient,
    OvenError, OvenSettings, Recipe,
};
use std::sync::Arc;

fn mixed_recipe() -> Recipe {
    let user = KeyedIngredient::new("User", "users").keyed("ann".to_string());
    Recipe::prepare(vec![
        Ingredient::from(Recipe::context_ingredient(
            user,
            vec![
                BaseIngredient::new("Charge", "billing"),
                BaseIngredient::new("Email", "mail"),
            ],
        )),
        Ingredient::from(BaseIngredient::new("Audit", "users")),
    ])
}

#[test]
fn test_context_ingredient_baked_once_across_segments() {
    let (backend, calls) = recording_backend(&["User", "Charge", "Email", "Audit"]);
    let oven = DirectDispatchOven::new(backend);

    let recipe = mixed_recipe();
    assert_eq!(recipe.segment().len(), 4);

    let cake = oven.bake_blocking(&recipe).unwrap();
    assert_eq!(call_types(&calls), vec!["User", "Charge", "Email", "Audit"]);

    let namespaces: Vec<_> = calls.lock().iter().map(|c| c.namespace.clone()).collect();
    assert_eq!(namespaces, vec!["", "ann", "ann", ""]);
    assert!(cake.contains_key("ann.Charge"));
    assert!(cake.contains_key("Audit"));
}

#[tokio::test]
async fn test_async_bake_with_payload_logging() {
    let (backend, calls) = recording_backend(&["User", "Charge", "Email", "Audit"]);
    let oven = DirectDispatchOven::with_settings(backend, OvenSettings { log_payloads: true });
    let cake = oven.bake(&mixed_recipe()).await.unwrap();
    assert_eq!(calls.lock().len(), 4);
    assert_eq!(cake.len(), 4);
}

#[test]
fn test_registration_is_rejected() {
    let (backend, _) = recording_backend(&[]);
    let (other, _) = recording_backend(&[]);
    let mut oven = DirectDispatchOven::new(backend);
    assert!(matches!(
        oven.add_dispatcher("users", Arc::new(other)),
        Err(OvenError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        oven.set_default_dispatcher(None),
        Err(OvenError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_missing_hook_surfaces_as_dispatch_error() {
    let (backend, _) = recording_backend(&["User"]);
    let oven = DirectDispatchOven::new(backend);
    let err = oven.bake_blocking(&mixed_recipe()).unwrap_err();
    assert!(matches!(err, OvenError::Dispatch { index: 1, .. }));
}

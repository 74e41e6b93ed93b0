//! Backend oven driven by raw wire payloads

use super::test_utils::{call_types, recording_backend};
use recipe::backend::{BackendPayload, IngredientHook};
use recipe::{BackendOven, BakeError, Cake};
use serde::Deserialize;
use serde_json::json;

#[test]
fn test_single_leaf_payload() {
    let (backend, calls) = recording_backend(&["X"]);
    let reply = backend
        .bake(r#"{"recipe":{"Recipe":{"ingredients":[{"X":{"n":5}}]}},"cake":{}}"#)
        .unwrap();

    let calls = calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].data, json!({"n": 5}));
    assert_eq!(serde_json::from_str::<Cake>(&reply).unwrap().get("X").unwrap(), &json!("X"));
}

#[test]
fn test_namespaces_follow_scopes() {
    let (backend, calls) = recording_backend(&["User", "Pet"]);
    let payload = json!({
        "recipe": {"Recipe": {"ingredients": [
            {"Recipe": {
                "contextIngredient": {"User": {"key": "ann"}},
                "ingredients": [
                    {"Pet": {"key": "rex"}},
                    {"Recipe": {"context": "toys", "ingredients": [{"Pet": {"key": "ball"}}]}}
                ]
            }},
            {"Pet": {"key": "stray"}}
        ]}},
        "cake": {"existing": 1}
    });

    let cake: Cake = serde_json::from_str(&backend.bake(&payload.to_string()).unwrap()).unwrap();

    let namespaces: Vec<_> = calls.lock().iter().map(|c| c.namespace.clone()).collect();
    assert_eq!(namespaces, vec!["", "ann", "ann.toys", ""]);
    assert_eq!(call_types(&calls), vec!["User", "Pet", "Pet", "Pet"]);
    for key in ["existing", "ann", "ann.rex", "ann.toys.ball", "stray"] {
        assert!(cake.contains_key(key), "missing {key}");
    }
}

#[derive(Deserialize)]
struct Deposit {
    account: String,
    cents: i64,
}

struct DepositHook;

impl IngredientHook for DepositHook {
    type Data = Deposit;

    fn ingredient_type(&self) -> &str {
        "Deposit"
    }

    fn bake(&self, data: Deposit, cake: &mut Cake) -> anyhow::Result<()> {
        let balance = cake.get_as::<i64>(&data.account).unwrap_or(0);
        if balance + data.cents < 0 {
            anyhow::bail!("overdrawn: {}", data.account);
        }
        cake.publish(&data.account, balance + data.cents)?;
        Ok(())
    }
}

#[test]
fn test_typed_hook() {
    let mut backend = BackendOven::new();
    backend.register_hook(DepositHook);

    let payload: BackendPayload = serde_json::from_value(json!({
        "recipe": {"Recipe": {"ingredients": [
            {"Deposit": {"account": "a", "cents": 100}},
            {"Deposit": {"account": "a", "cents": -30}}
        ]}}
    }))
    .unwrap();
    let cake = backend.bake_payload(payload).unwrap();
    assert_eq!(cake.get_as::<i64>("a").unwrap(), 70);

    let err = backend
        .bake(&json!({
            "recipe": {"Recipe": {"ingredients": [{"Deposit": {"account": "b", "cents": -1}}]}},
            "cake": {}
        })
        .to_string())
        .unwrap_err();
    assert!(matches!(err, BakeError::Hook { ref ingredient, .. } if ingredient == "Deposit"));

    let err = backend
        .bake(&json!({
            "recipe": {"Recipe": {"ingredients": [{"Deposit": {"account": "b"}}]}},
            "cake": {}
        })
        .to_string())
        .unwrap_err();
    assert!(matches!(err, BakeError::MalformedIngredient(_)));
}

#[test]
fn test_unknown_type_and_bad_payload() {
    let backend = BackendOven::new();
    assert!(matches!(
        backend.bake(r#"{"recipe":{"Recipe":{"ingredients":[{"Nope":{}}]}},"cake":{}}"#),
        Err(BakeError::UnknownIngredientType(t)) if t == "Nope"
    ));
    assert!(matches!(backend.bake("not json"), Err(BakeError::Payload(_))));
}

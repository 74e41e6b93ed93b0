//! Oven dispatch across several domains

use super::test_utils::{call_types, recording_backend};
use parking_lot::Mutex;
use recipe::oven::{BlockingDispatcher, FnDispatcher};
use recipe::{
    BaseIngredient, Cake, Dispatcher, DispatcherRegistry, Ingredient, KeyedIngredient, Oven,
    OvenError, Recipe,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_segments_alternate_domains() {
    let recipe = Recipe::prepare(vec![
        BaseIngredient::new("A1", "A"),
        BaseIngredient::new("B1", "B"),
        BaseIngredient::new("A2", "A"),
    ]);
    let segments = recipe.segment();
    let domains: Vec<_> = segments.iter().map(|s| s.domain()).collect();
    assert_eq!(domains, vec![Some("A"), Some("B"), Some("A")]);
    for segment in &segments {
        assert_eq!(segment.recipe.leaves().len(), 1);
    }
}

#[tokio::test]
async fn test_cake_threads_through_backends() {
    let (backend_a, calls_a) = recording_backend(&["A1", "A2"]);
    let (backend_b, calls_b) = recording_backend(&["B1"]);

    let mut oven = Oven::new();
    oven.add_dispatcher("A", Arc::new(backend_a)).unwrap();
    oven.add_dispatcher("B", Arc::new(backend_b)).unwrap();

    let recipe = Recipe::prepare(vec![
        BaseIngredient::new("A1", "A"),
        BaseIngredient::new("B1", "B"),
        BaseIngredient::new("A2", "A"),
    ]);
    let cake = oven.bake(&recipe).await.unwrap();

    assert_eq!(call_types(&calls_a), vec!["A1", "A2"]);
    assert_eq!(call_types(&calls_b), vec!["B1"]);
    assert_eq!(cake.len(), 3);
    assert_eq!(cake.get("B1").unwrap(), &json!("B1"));
}

#[test]
fn test_later_segments_see_earlier_output() {
    let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
    let record = Arc::clone(&seen);

    let mut oven = Oven::new();
    oven.add_dispatcher(
        "A",
        Arc::new(BlockingDispatcher::new(|payload: &str| {
            let payload: Value = serde_json::from_str(payload)?;
            let mut cake: Cake = serde_json::from_value(payload["cake"].clone())?;
            cake.publish("user.id", 42)?;
            Ok(serde_json::to_string(&cake)?)
        })),
    )
    .unwrap();
    oven.add_dispatcher(
        "B",
        Arc::new(BlockingDispatcher::new(move |payload: &str| {
            let payload: Value = serde_json::from_str(payload)?;
            record.lock().push(payload["cake"].clone());
            Ok(payload["cake"].to_string())
        })),
    )
    .unwrap();

    let recipe = Recipe::prepare(vec![
        BaseIngredient::new("CreateUser", "A"),
        BaseIngredient::new("Charge", "B"),
    ]);
    let cake = oven.bake_blocking(&recipe).unwrap();

    assert_eq!(seen.lock().as_slice(), &[json!({"user.id": 42})]);
    assert_eq!(cake.get_as::<u32>("id").unwrap(), 42);
}

#[test]
fn test_payload_wire_shape() {
    let payloads = Arc::new(Mutex::new(Vec::<Value>::new()));
    let record = Arc::clone(&payloads);
    let mut oven = Oven::new();
    oven.set_default_dispatcher(Some(Arc::new(BlockingDispatcher::new(
        move |payload: &str| {
            let payload: Value = serde_json::from_str(payload)?;
            let cake = payload["cake"].to_string();
            record.lock().push(payload);
            Ok(cake)
        },
    ))))
    .unwrap();

    let user = KeyedIngredient::new("CreateUser", "users")
        .keyed("ann".to_string())
        .with_property("name", "Ann");
    let recipe = Recipe::context_ingredient(
        user,
        vec![Ingredient::from(
            BaseIngredient::new("Charge", "billing").with_property("cents", 100),
        )],
    );
    oven.bake_blocking(&recipe).unwrap();

    let payloads = payloads.lock();
    assert_eq!(payloads.len(), 2);
    assert_eq!(
        payloads[0],
        json!({
            "recipe": {"Recipe": {
                "contextIngredient": {"CreateUser": {"name": "Ann", "key": "ann"}},
                "ingredients": []
            }},
            "cake": {}
        })
    );
    assert_eq!(
        payloads[1]["recipe"],
        json!({"Recipe": {
            "context": "ann",
            "ingredients": [{"Charge": {"cents": 100}}]
        }})
    );
}

#[tokio::test]
async fn test_async_dispatcher_error_is_wrapped() {
    let mut oven = Oven::new();
    let failing: Arc<dyn Dispatcher> = Arc::new(FnDispatcher::new(|_payload: String| async {
        Err::<String, _>(anyhow::anyhow!("service unavailable"))
    }));
    oven.add_dispatcher("A", failing).unwrap();

    let err = oven
        .bake(&Recipe::prepare(vec![BaseIngredient::new("A1", "A")]))
        .await
        .unwrap_err();
    match err {
        OvenError::Dispatch { domain, index, source } => {
            assert_eq!(domain.as_deref(), Some("A"));
            assert_eq!(index, 0);
            assert_eq!(source.to_string(), "service unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn timed_dispatcher(
    domain: &'static str,
    log: &Arc<Mutex<Vec<String>>>,
    fail: bool,
) -> Arc<dyn Dispatcher> {
    let log = Arc::clone(log);
    Arc::new(FnDispatcher::new(move |payload: String| {
        let log = Arc::clone(&log);
        async move {
            log.lock().push(format!("start {domain}"));
            tokio::time::sleep(Duration::from_millis(20)).await;
            log.lock().push(format!("end {domain}"));
            if fail {
                anyhow::bail!("{domain} failed");
            }
            let payload: Value = serde_json::from_str(&payload)?;
            Ok(payload["cake"].to_string())
        }
    }))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_segments_wait_for_previous_dispatch_and_stop_on_error() {
    let log = Arc::new(Mutex::new(Vec::<String>::new()));
    let mut oven = Oven::new();
    oven.add_dispatcher("A", timed_dispatcher("A", &log, false)).unwrap();
    oven.add_dispatcher("B", timed_dispatcher("B", &log, true)).unwrap();
    oven.add_dispatcher("C", timed_dispatcher("C", &log, false)).unwrap();

    let recipe = Recipe::prepare(vec![
        BaseIngredient::new("A1", "A"),
        BaseIngredient::new("B1", "B"),
        BaseIngredient::new("C1", "C"),
    ]);
    let err = oven.bake(&recipe).await.unwrap_err();

    assert!(matches!(
        err,
        OvenError::Dispatch { ref domain, index: 1, .. } if domain.as_deref() == Some("B")
    ));
    assert_eq!(log.lock().as_slice(), &["start A", "end A", "start B", "end B"]);
}

#[test]
fn test_domain_dispatcher_preferred_over_default() {
    let (backend, calls) = recording_backend(&["A1", "Z1"]);
    let backend = Arc::new(backend);
    let default_hits = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&default_hits);
    let fallback = Arc::clone(&backend);

    let mut oven = Oven::new();
    oven.add_dispatcher("A", backend).unwrap();
    oven.set_default_dispatcher(Some(Arc::new(BlockingDispatcher::new(
        move |payload: &str| {
            *counter.lock() += 1;
            Ok(fallback.bake(payload)?)
        },
    ))))
    .unwrap();

    let recipe = Recipe::prepare(vec![
        BaseIngredient::new("A1", "A"),
        BaseIngredient::new("Z1", "Z"),
    ]);
    oven.bake_blocking(&recipe).unwrap();

    assert_eq!(*default_hits.lock(), 1);
    assert_eq!(call_types(&calls), vec!["A1", "Z1"]);
}

//! Shared fixtures

use parking_lot::Mutex;
use recipe::{hook_fn, BackendOven, Cake};
use serde_json::Value;
use std::sync::Arc;

/// One hook invocation: ingredient type, data, namespace at call time
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub ingredient_type: String,
    pub data: Value,
    pub namespace: String,
}

pub type Calls = Arc<Mutex<Vec<Call>>>;

/// Backend whose hooks record every call and publish the ingredient type under
/// the ingredient's `key` (or under the type name when unkeyed)
pub fn recording_backend(types: &[&str]) -> (BackendOven, Calls) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let mut backend = BackendOven::new();
    for ingredient_type in types {
        let calls = Arc::clone(&calls);
        let name = ingredient_type.to_string();
        backend.register_hook(hook_fn(*ingredient_type, move |data: Value, cake: &mut Cake| {
            calls.lock().push(Call {
                ingredient_type: name.clone(),
                data: data.clone(),
                namespace: cake.namespace(),
            });
            let key = data
                .get("key")
                .and_then(Value::as_str)
                .unwrap_or(name.as_str())
                .to_string();
            cake.publish(&key, name.as_str())?;
            Ok(())
        }));
    }
    (backend, calls)
}

pub fn call_types(calls: &Calls) -> Vec<String> {
    calls
        .lock()
        .iter()
        .map(|call| call.ingredient_type.clone())
        .collect()
}

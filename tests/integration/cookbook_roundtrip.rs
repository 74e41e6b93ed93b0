//! Cookbook-built recipes baked end to end and decoded back from the wire

use super::test_utils::recording_backend;
use recipe::backend::hook_fn;
use recipe::{Cake, Catalog, Cookbook, DirectDispatchOven, Ingredient, Recipe, SchemaError};
use serde::Deserialize;
use serde_json::json;
use tempfile::TempDir;

const USERS: &str = r#"
domain = "users"

[[enums]]
name = "Role"
values = ["ADMIN", "MEMBER"]

[[ingredients]]
name = "CreateUser"
keyed = true
defaultKey = "user"
required = [{ name = "name", type = "string" }]
optionals = [
    { name = "role", type = "Role" },
    { name = "verified", type = "flag" },
]
"#;

const BILLING: &str = r#"{
    "domain": "billing",
    "ingredients": [
        {
            "name": "Charge",
            "required": [{"name": "cents", "type": "int"}],
            "optionals": [{"name": "items", "params": [
                {"name": "sku", "type": "string"},
                {"name": "qty", "type": "int"}
            ], "repeatable": true}]
        }
    ]
}"#;

fn catalog() -> Catalog {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("users.toml"), USERS).unwrap();
    std::fs::write(dir.path().join("billing.json"), BILLING).unwrap();

    let mut catalog = Catalog::new();
    catalog
        .add_cookbook(Cookbook::load(&dir.path().join("users.toml")).unwrap())
        .unwrap()
        .add_cookbook(Cookbook::load(&dir.path().join("billing.json")).unwrap())
        .unwrap();
    catalog
}

fn order(catalog: &Catalog) -> Recipe {
    let user = catalog
        .ingredient("CreateUser")
        .unwrap()
        .set("name", "Ann")
        .unwrap()
        .set("role", "ADMIN")
        .unwrap()
        .flag("verified")
        .unwrap()
        .build_keyed()
        .unwrap();
    let charge = catalog
        .ingredient("Charge")
        .unwrap()
        .set("cents", 1200)
        .unwrap()
        .compound("items", [("sku", json!("A-1")), ("qty", json!(2))])
        .unwrap()
        .build()
        .unwrap();
    Recipe::context_ingredient(user, vec![charge])
}

#[test]
fn test_wire_round_trip() {
    let catalog = catalog();
    let recipe = order(&catalog);

    let wire = serde_json::to_string(&recipe).unwrap();
    let decoded = catalog.recipe_from_json(&wire).unwrap();
    assert_eq!(decoded, recipe);

    let leaves = decoded.leaves();
    assert_eq!(leaves[0].domain(), Some("users"));
    assert_eq!(leaves[1].domain(), Some("billing"));
}

#[test]
fn test_decoding_validates_against_schema() {
    let catalog = catalog();
    let bad_role = json!({"Recipe": {"ingredients": [
        {"CreateUser": {"name": "Ann", "role": "OWNER"}}
    ]}});
    assert!(matches!(
        catalog.decode_recipe(&bad_role),
        Err(SchemaError::TypeMismatch { .. })
    ));

    let bad_item = json!({"Recipe": {"ingredients": [
        {"Charge": {"cents": 1, "items": [{"sku": "A", "colour": "red"}]}}
    ]}});
    assert!(matches!(
        catalog.decode_recipe(&bad_item),
        Err(SchemaError::UnknownProperty { .. })
    ));
}

#[derive(Deserialize)]
struct CreateUser {
    key: Option<String>,
    name: String,
}

#[test]
fn test_bake_built_recipe() {
    let catalog = catalog();
    let (mut backend, calls) = recording_backend(&["Charge"]);
    backend.register_hook(hook_fn("CreateUser", |user: CreateUser, cake: &mut Cake| {
        cake.publish(user.key.as_deref().unwrap_or("user"), user.name)?;
        Ok(())
    }));

    let oven = DirectDispatchOven::new(backend);
    let cake = oven.bake_blocking(&order(&catalog)).unwrap();

    assert_eq!(cake.get("user").unwrap(), &json!("Ann"));
    let calls = calls.lock();
    assert_eq!(calls[0].namespace, "user");
    assert_eq!(
        calls[0].data,
        json!({"cents": 1200, "items": [{"sku": "A-1", "qty": 2}]})
    );
}

#[test]
fn test_embedded_ingredient_property() {
    let catalog = catalog();
    let charge: Ingredient = catalog
        .ingredient("Charge")
        .unwrap()
        .set("cents", 5)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(charge.to_value().unwrap(), json!({"Charge": {"cents": 5}}));
}

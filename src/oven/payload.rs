use crate::cake::Cake;
use crate::recipe::Recipe;
use serde::Serialize;

/// Wire payload sent to a dispatcher: `{"recipe": RecipeJSON, "cake": CakeJSON}`
#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    pub recipe: &'a Recipe,
    pub cake: &'a Cake,
}

impl<'a> Payload<'a> {
    pub fn new(recipe: &'a Recipe, cake: &'a Cake) -> Self {
        Self { recipe, cake }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

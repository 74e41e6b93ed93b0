//! Recipe segmentation
//!
//! Splits a recipe into the fewest contiguous runs of same-domain leaves. Each run is
//! rebuilt as its own recipe that reopens every ancestor scope of its leaves, so baking
//! the segments in order is equivalent to baking the original tree.
//!
//! A context ingredient is emitted once, as `contextIngredient` of its recipe in the
//! segment of its own domain. Other segments reopen that scope as an explicit context
//! named by the ingredient's key.

use super::{Recipe, Scope};
use crate::ingredient::Ingredient;
use serde::Serialize;
use tracing::debug;

/// A single-domain slice of a recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub domain: Option<String>,
    pub recipe: Recipe,
}

impl Segment {
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }
}

/// Segment being filled. `stubs[i]` is the copy of the i-th ancestor frame;
/// the last stub receives leaves.
struct OpenSegment {
    domain: Option<String>,
    stubs: Vec<Recipe>,
}

struct Segmenter<'a> {
    /// Namespace each ancestor frame reopens in a foreign segment
    frames: Vec<Option<&'a str>>,
    open: Option<OpenSegment>,
    segments: Vec<Segment>,
}

pub(super) fn segment(recipe: &Recipe) -> Vec<Segment> {
    let mut segmenter = Segmenter {
        frames: Vec::new(),
        open: None,
        segments: Vec::new(),
    };
    segmenter.visit(recipe);
    segmenter.close();

    debug!(
        segments = segmenter.segments.len(),
        domains = ?segmenter
            .segments
            .iter()
            .map(|s| s.domain.as_deref().unwrap_or("<none>"))
            .collect::<Vec<_>>(),
        "Segmented recipe"
    );
    segmenter.segments
}

impl<'a> Segmenter<'a> {
    fn visit(&mut self, recipe: &'a Recipe) {
        match &recipe.scope {
            Some(Scope::Ingredient(ingredient)) => {
                // The context ingredient is a leaf at this frame's position
                self.route(ingredient.domain());
                if let Some(open) = self.open.as_mut() {
                    open.stubs.push(Recipe::stub(recipe.scope.clone()));
                }
            }
            scope => {
                if let Some(open) = self.open.as_mut() {
                    open.stubs.push(Recipe::stub(scope.clone()));
                }
            }
        }
        self.frames.push(recipe.namespace());

        for child in &recipe.ingredients {
            match child {
                Ingredient::Recipe(nested) => self.visit(nested),
                leaf => {
                    self.route(leaf.domain());
                    self.append(leaf.clone());
                }
            }
        }

        self.frames.pop();
        self.leave();
    }

    /// Pop the stub of the frame just left and attach it to its parent
    fn leave(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        if let Some(open) = self.open.as_mut() {
            if let Some(stub) = open.stubs.pop() {
                if let Some(parent) = open.stubs.last_mut() {
                    attach(parent, stub);
                }
            }
        }
    }

    /// Make sure the open segment accepts leaves of `domain`
    fn route(&mut self, domain: Option<&str>) {
        if let Some(open) = &self.open {
            if open.domain.as_deref() == domain {
                return;
            }
        }
        self.close();

        let stubs = self
            .frames
            .iter()
            .map(|namespace| Recipe::stub(namespace.map(|n| Scope::Context(n.to_string()))))
            .collect();
        self.open = Some(OpenSegment {
            domain: domain.map(str::to_string),
            stubs,
        });
    }

    fn append(&mut self, leaf: Ingredient) {
        if let Some(receptacle) = self.open.as_mut().and_then(|open| open.stubs.last_mut()) {
            receptacle.push(leaf);
        }
    }

    /// Collapse the open segment's stubs, innermost first, and emit it
    fn close(&mut self) {
        let Some(mut open) = self.open.take() else {
            return;
        };
        let mut recipe = match open.stubs.pop() {
            Some(stub) => stub,
            None => return,
        };
        while let Some(mut parent) = open.stubs.pop() {
            attach(&mut parent, recipe);
            recipe = parent;
        }
        self.segments.push(Segment {
            domain: open.domain,
            recipe,
        });
    }
}

/// Keep `child` only if it carries something to bake
fn attach(parent: &mut Recipe, child: Recipe) {
    if !child.ingredients.is_empty() || matches!(child.scope, Some(Scope::Ingredient(_))) {
        parent.push(Ingredient::Recipe(child));
    }
}

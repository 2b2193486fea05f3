use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Represents a single scope level in the environment.
type Scope = HashMap<Rc<str>, Value>;

struct Frame {
    scope: Scope,
    parent: Environment,
}

/// A chain of immutable scopes.
///
/// Every scope owns its bindings and shares its parent through an `Rc`, so a
/// closure that captures an environment keeps the whole chain alive without
/// copying it. Scopes are never modified after creation; new bindings always
/// produce a child environment.
#[derive(Clone, Default)]
pub struct Environment {
    frame: Option<Rc<Frame>>,
}

impl Environment {
    /// The empty root environment (program scope is resolved by the interpreter).
    pub fn new() -> Self {
        Self { frame: None }
    }

    /// Create a child scope holding `bindings`. Later entries shadow earlier
    /// ones with the same name.
    pub fn extend<I>(&self, bindings: I) -> Self
    where
        I: IntoIterator<Item = (Rc<str>, Value)>,
    {
        Self {
            frame: Some(Rc::new(Frame {
                scope: bindings.into_iter().collect(),
                parent: self.clone(),
            })),
        }
    }

    /// Get a variable, searching from innermost to outermost scope.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut current = self.frame.as_ref();
        while let Some(frame) = current {
            if let Some(value) = frame.scope.get(name) {
                return Some(value.clone());
            }
            current = frame.parent.frame.as_ref();
        }
        None
    }

    /// Number of scopes between this environment and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.frame.as_ref();
        while let Some(frame) = current {
            depth += 1;
            current = frame.parent.frame.as_ref();
        }
        depth
    }

    /// Names visible from this environment, innermost first, without duplicates.
    pub fn names(&self) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = Vec::new();
        let mut current = self.frame.as_ref();
        while let Some(frame) = current {
            let mut local: Vec<&Rc<str>> = frame.scope.keys().collect();
            local.sort();
            for name in local {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            current = frame.parent.frame.as_ref();
        }
        names
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("depth", &self.depth())
            .field("names", &self.names())
            .finish()
    }
}

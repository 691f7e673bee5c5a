use crate::error::EvalError;
use crate::node::Node;

// Trees roughly double with every derivative taken, so deeper requests are refused
pub const DEFAULT_MAX_ORDER: usize = 8;

// Settings a session evaluates under: the value bound to x, if any, and the highest derivative allowed.
#[derive(Clone, Debug, PartialEq)]
pub struct Env {
    pub binding: Option<f64>,
    pub max_order: usize
}

impl Default for Env {
    fn default() -> Self {
        Env { binding: None, max_order: DEFAULT_MAX_ORDER }
    }
}

impl Env {
    pub fn with_binding(&self, x: f64) -> Self {
        let mut new_env = self.clone();
        new_env.binding = Some(x);
        new_env
    }

    pub fn without_binding(&self) -> Self {
        let mut new_env = self.clone();
        new_env.binding = None;
        new_env
    }

    pub fn with_max_order(&self, max_order: usize) -> Self {
        let mut new_env = self.clone();
        new_env.max_order = max_order;
        new_env
    }

    // Evaluate at the bound point if there is one; otherwise the expression must not mention x
    pub fn evaluate(&self, node: &Node) -> Result<f64, EvalError> {
        match self.binding {
            Some(x) => Ok(node.value_at(x)),
            None => node.value()
        }
    }
}

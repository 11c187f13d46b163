//! Generic traversal and copy-on-transform utilities shared by logical
//! operators and expressions.

pub mod walk;

use quarry_error::{internal, Result};

/// Result of a transformation.
///
/// `changed` indicates if the rewrite produced something different from its
/// input, which is what drives rule batches to a fixpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<T> {
    pub node: T,
    pub changed: bool,
}

impl<T> Transformed<T> {
    pub fn yes(node: T) -> Self {
        Transformed {
            node,
            changed: true,
        }
    }

    pub fn no(node: T) -> Self {
        Transformed {
            node,
            changed: false,
        }
    }

    pub fn new(node: T, changed: bool) -> Self {
        Transformed { node, changed }
    }

    pub fn map<U, F>(self, f: F) -> Transformed<U>
    where
        F: FnOnce(T) -> U,
    {
        Transformed {
            node: f(self.node),
            changed: self.changed,
        }
    }

    pub fn into_inner(self) -> T {
        self.node
    }
}

/// Capabilities every node in a tree (plan operators, expressions) provides.
pub trait TreeNode: Sized {
    /// Direct children, in order.
    fn children(&self) -> Vec<&Self>;

    /// If this node, and everything beneath it, is fully resolved.
    fn resolved(&self) -> bool;

    /// Rebuild this node by passing each child through `f`.
    ///
    /// The returned node is marked as changed if any child changed.
    fn map_children<F>(self, f: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Self) -> Result<Transformed<Self>>;

    /// Rebuild this node with a new set of children.
    ///
    /// The number of children must match the current number of children.
    fn with_children(self, children: Vec<Self>) -> Result<Self> {
        let expected = self.children().len();
        if expected != children.len() {
            return Err(internal!(
                "expected {expected} children when rebuilding node, got {}",
                children.len()
            ));
        }

        let mut children = children.into_iter();
        let transformed = self.map_children(|_| match children.next() {
            Some(child) => Ok(Transformed::yes(child)),
            None => Err(internal!("ran out of children when rebuilding node")),
        })?;

        Ok(transformed.node)
    }

    /// Apply `f` to every node bottom-up, rebuilding parents from their
    /// transformed children.
    fn transform_up<F>(self, f: &mut F) -> Result<Transformed<Self>>
    where
        F: FnMut(Self) -> Result<Transformed<Self>>,
    {
        let children = self.map_children(|child| child.transform_up(&mut *f))?;
        let mut transformed = f(children.node)?;
        transformed.changed |= children.changed;
        Ok(transformed)
    }

    /// Apply `f` to every node top-down. Children of the node returned by `f`
    /// are visited afterwards.
    fn transform_down<F>(self, f: &mut F) -> Result<Transformed<Self>>
    where
        F: FnMut(Self) -> Result<Transformed<Self>>,
    {
        let parent = f(self)?;
        let changed = parent.changed;
        let mut transformed = parent
            .node
            .map_children(|child| child.transform_down(&mut *f))?;
        transformed.changed |= changed;
        Ok(transformed)
    }
}

use super::TreeNode;

/// A visitor for `walk`.
///
/// `visit` is called with `Some(node)` for every node reached, and with `None`
/// once all children of a node have been walked. The visitor returned from
/// visiting a node is used for that node's children; returning `None` prunes
/// the subtree, and no end-of-children visit is emitted for it.
pub trait Visitor<'a, N> {
    fn visit(&mut self, node: Option<&'a N>) -> Option<&mut dyn Visitor<'a, N>>;
}

/// Depth-first traversal of `node`.
pub fn walk<'a, N>(visitor: &mut dyn Visitor<'a, N>, node: &'a N)
where
    N: TreeNode,
{
    let Some(visitor) = visitor.visit(Some(node)) else {
        return;
    };

    for child in node.children() {
        walk(&mut *visitor, child);
    }

    visitor.visit(None);
}

struct Inspector<F>(F);

impl<'a, N: 'a, F> Visitor<'a, N> for Inspector<F>
where
    F: FnMut(Option<&'a N>) -> bool,
{
    fn visit(&mut self, node: Option<&'a N>) -> Option<&mut dyn Visitor<'a, N>> {
        let keep_going = (self.0)(node);
        if keep_going && node.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

/// Walk `node` calling `f` for every visit, including end-of-children visits.
///
/// Returning false prunes traversal below the visited node.
pub fn inspect<'a, N, F>(node: &'a N, f: F)
where
    N: TreeNode,
    F: FnMut(Option<&'a N>) -> bool,
{
    walk(&mut Inspector(f), node)
}

/// Check if any node in the tree satisfies `pred`.
///
/// Stops descending once a match is found.
pub fn any<'a, N, F>(node: &'a N, mut pred: F) -> bool
where
    N: TreeNode,
    F: FnMut(&'a N) -> bool,
{
    let mut found = false;
    inspect(node, |n| match n {
        Some(n) if !found => {
            found = pred(n);
            !found
        }
        _ => false,
    });
    found
}

/// Find the first node in pre-order that satisfies `pred`.
pub fn find<'a, N, F>(node: &'a N, mut pred: F) -> Option<&'a N>
where
    N: TreeNode,
    F: FnMut(&'a N) -> bool,
{
    let mut found = None;
    inspect(node, |n| match n {
        Some(n) if found.is_none() => {
            if pred(n) {
                found = Some(n);
                false
            } else {
                true
            }
        }
        _ => false,
    });
    found
}

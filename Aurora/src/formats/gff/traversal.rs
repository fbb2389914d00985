//! Struct numbering policies for the GFF writer
//!
//! The writer lays out sections in the order the strategy numbers structs:
//! each struct's field records, field data and list slots are emitted when
//! the struct is reached. The legacy toolset numbers structs depth-first in
//! preorder, which is what [`DepthFirstEntryFirst`] reproduces.

use std::collections::VecDeque;

use super::document::{GffStruct, GffValue};

/// Decides the on-disk index of every struct in a tree.
pub trait TraversalStrategy {
    /// Every struct reachable from `root`, each exactly once, root first.
    fn struct_order<'a>(&self, root: &'a GffStruct) -> Vec<&'a GffStruct>;
}

/// Preorder depth-first numbering, children in field order.
///
/// Output from this strategy is byte-identical to files written by the
/// legacy toolset, so `serialize(parse(bytes)) == bytes` holds for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthFirstEntryFirst;

impl TraversalStrategy for DepthFirstEntryFirst {
    fn struct_order<'a>(&self, root: &'a GffStruct) -> Vec<&'a GffStruct> {
        let mut order = Vec::with_capacity(root.struct_count());
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            order.push(current);
            // Reverse so the first child is popped next.
            let children: Vec<&GffStruct> = child_structs(current).collect();
            stack.extend(children.into_iter().rev());
        }
        order
    }
}

/// Level-order numbering.
///
/// Produces valid files that decode to the same tree, but not the legacy
/// byte layout. Useful for checking that readers do not depend on order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BreadthFirst;

impl TraversalStrategy for BreadthFirst {
    fn struct_order<'a>(&self, root: &'a GffStruct) -> Vec<&'a GffStruct> {
        let mut order = Vec::with_capacity(root.struct_count());
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            order.push(current);
            queue.extend(child_structs(current));
        }
        order
    }
}

/// Direct child structs in field order, list elements in list order.
fn child_structs(parent: &GffStruct) -> impl Iterator<Item = &GffStruct> {
    parent.fields.iter().flat_map(|field| {
        let children: &[GffStruct] = match &field.value {
            GffValue::Struct(s) => std::slice::from_ref(s),
            GffValue::List(items) => items,
            _ => &[],
        };
        children.iter()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> GffStruct {
        // root(0) -> A(1) { A1(2) }, List[B(3), C(4)]
        let a = GffStruct::new(1).with("A1", GffValue::Struct(GffStruct::new(2)));
        GffStruct::new(0)
            .with("A", GffValue::Struct(a))
            .with("L", GffValue::List(vec![GffStruct::new(3), GffStruct::new(4)]))
    }

    fn types(order: &[&GffStruct]) -> Vec<u32> {
        order.iter().map(|s| s.struct_type).collect()
    }

    #[test]
    fn test_depth_first_preorder() {
        let root = tree();
        assert_eq!(types(&DepthFirstEntryFirst.struct_order(&root)), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_breadth_first() {
        let root = tree();
        assert_eq!(types(&BreadthFirst.struct_order(&root)), vec![0, 1, 3, 4, 2]);
    }
}

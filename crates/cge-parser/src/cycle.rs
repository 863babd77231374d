//! Declaration-cycle detection over parsed `type` declarations.
//!
//! A `type` that transitively contains itself by value can never be
//! instantiated, so the graph of direct custom property references
//! between `type` declarations must stay acyclic. Container generics and
//! enums do not contribute edges: a `list<t>` property inside `t` is
//! legal, and enum members carry no structure.
//!
//! The search runs once per node with an explicit frame stack instead of
//! call-stack recursion; schema files can legitimately chain many types.

use std::collections::HashMap;

use cge_ast::{DataKind, Object, ObjectKind, Token};

/// One detected cycle, anchored at the name token of the re-entered node.
pub(crate) struct Cycle {
    pub token: Token,
    /// Node names from the first recurrence through the re-entered node.
    pub names: Vec<String>,
}

impl Cycle {
    pub fn message(&self) -> String {
        format!("declaration cycle: {}", self.names.join("->"))
    }
}

struct Node {
    name: Token,
    edges: Vec<usize>,
    reported: bool,
}

/// A suspended step of the depth-first search.
struct Frame {
    node: usize,
    next_edge: usize,
}

/// Find declaration cycles among the `type` objects in `objects`.
///
/// Cycles are reported in declaration order of their entry node, at most
/// once per re-entered node.
pub(crate) fn detect(objects: &[Object]) -> Vec<Cycle> {
    let mut nodes: Vec<Node> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for object in objects {
        if object.kind != ObjectKind::Type {
            continue;
        }
        let Some(name) = &object.name else { continue };
        index.insert(name.lexeme.as_str(), nodes.len());
        nodes.push(Node {
            name: name.clone(),
            edges: Vec::new(),
            reported: false,
        });
    }

    for object in objects {
        if object.kind != ObjectKind::Type {
            continue;
        }
        let Some(name) = &object.name else { continue };
        let from = index[name.lexeme.as_str()];
        for property in &object.properties {
            let Some(ty) = &property.ty else { continue };
            if ty.kind != DataKind::Custom {
                continue;
            }
            if let Some(&to) = index.get(ty.name.as_str()) {
                nodes[from].edges.push(to);
            }
        }
    }

    let mut cycles = Vec::new();
    let mut on_stack = vec![false; nodes.len()];
    let mut stack: Vec<Frame> = Vec::new();

    for entry in 0..nodes.len() {
        debug_assert!(stack.is_empty());
        stack.push(Frame {
            node: entry,
            next_edge: 0,
        });
        on_stack[entry] = true;

        while !stack.is_empty() {
            let top = stack.len() - 1;
            let node = stack[top].node;
            let edge = stack[top].next_edge;

            if edge >= nodes[node].edges.len() {
                on_stack[node] = false;
                stack.pop();
                continue;
            }
            stack[top].next_edge += 1;

            let target = nodes[node].edges[edge];
            if !on_stack[target] {
                stack.push(Frame {
                    node: target,
                    next_edge: 0,
                });
                on_stack[target] = true;
                continue;
            }

            if nodes[target].reported {
                continue;
            }
            nodes[target].reported = true;
            let first = stack
                .iter()
                .position(|frame| frame.node == target)
                .expect("BUG: on-stack node missing from DFS stack");
            let mut names: Vec<String> = stack[first..]
                .iter()
                .map(|frame| nodes[frame.node].name.lexeme.clone())
                .collect();
            names.push(nodes[target].name.lexeme.clone());
            cycles.push(Cycle {
                token: nodes[target].name.clone(),
                names,
            });
        }
    }

    cycles
}

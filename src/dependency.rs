//! Topological ordering over integer ids.
//!
//! Used by reference flattening: a declaration must be flattened after every
//! declaration it references. Ids are the dense handles handed out by the
//! schema index, so the graph never stores tree pointers.

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Directed dependency graph: `add(a, b)` means *a depends on b*.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    edges: Vec<Vec<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an id without dependencies.
    pub fn add_node(&mut self, id: usize) {
        if self.edges.len() <= id {
            self.edges.resize_with(id + 1, Vec::new);
        }
    }

    /// Registers the edge `from → to`.
    pub fn add(&mut self, from: usize, to: usize) {
        self.add_node(from.max(to));
        if !self.edges[from].contains(&to) {
            self.edges[from].push(to);
        }
    }

    /// Number of ids known to the graph.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Visits every id leaves-first, each exactly once.
    ///
    /// Ein Back-Edge auf eine noch offene Id (Zyklus) wird übersprungen; der
    /// Aufrufer erkennt echte Zyklen selbst an den Resten, die das Ergebnis
    /// hinterlässt. Iterativ, damit lange Ketten nicht den Stack sprengen.
    pub fn flatten(&self, mut visit: impl FnMut(usize) -> Result<()>) -> Result<()> {
        let mut marks = vec![Mark::Unvisited; self.edges.len()];
        for start in 0..self.edges.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            marks[start] = Mark::InProgress;
            let mut stack = vec![(start, 0usize)];
            while let Some((id, next)) = stack.last_mut() {
                let id = *id;
                if let Some(&dep) = self.edges[id].get(*next) {
                    *next += 1;
                    if marks[dep] == Mark::Unvisited {
                        marks[dep] = Mark::InProgress;
                        stack.push((dep, 0));
                    }
                } else {
                    stack.pop();
                    marks[id] = Mark::Done;
                    visit(id)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn order(graph: &Graph) -> Vec<usize> {
        let mut out = Vec::new();
        graph
            .flatten(|id| {
                out.push(id);
                Ok(())
            })
            .unwrap();
        out
    }

    fn position(order: &[usize], id: usize) -> usize {
        order.iter().position(|&x| x == id).unwrap()
    }

    #[test]
    fn leaves_first() {
        let mut g = Graph::new();
        g.add(0, 1);
        g.add(1, 2);
        g.add(3, 1);
        let o = order(&g);
        assert_eq!(o.len(), 4);
        assert!(position(&o, 2) < position(&o, 1));
        assert!(position(&o, 1) < position(&o, 0));
        assert!(position(&o, 1) < position(&o, 3));
    }

    #[test]
    fn each_id_once_even_with_cycles() {
        let mut g = Graph::new();
        g.add(0, 1);
        g.add(1, 0);
        g.add(2, 2);
        let mut o = order(&g);
        o.sort();
        assert_eq!(o, [0, 1, 2]);
    }

    #[test]
    fn isolated_nodes_are_visited() {
        let mut g = Graph::new();
        g.add_node(4);
        assert_eq!(order(&g), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn visit_error_stops_flatten() {
        let mut g = Graph::new();
        g.add(0, 1);
        let mut seen = Vec::new();
        let err = g
            .flatten(|id| {
                seen.push(id);
                Err(Error::NoSchema)
            })
            .unwrap_err();
        assert_eq!(err, Error::NoSchema);
        assert_eq!(seen, [1]);
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let mut g = Graph::new();
        for i in 0..100_000 {
            g.add(i, i + 1);
        }
        let o = order(&g);
        assert_eq!(o.first(), Some(&100_000));
        assert_eq!(o.last(), Some(&0));
    }
}

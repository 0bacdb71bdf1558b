use std::collections::{BTreeMap, BTreeSet};

use crate::error::GenerateError;
use crate::model::{EntityId, Screen, Snapshot, Widget};

/// One node of a screen's widget forest. Children are arena indices in
/// sibling order; the parent link stays an index so the tree never owns
/// itself in both directions.
#[derive(Debug)]
pub struct WidgetNode<'a> {
    pub widget: &'a Widget,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// A screen's widgets rebuilt from flat records into an ordered forest.
/// Arena-backed: nodes live in one `Vec`, addressed by index.
#[derive(Debug)]
pub struct WidgetForest<'a> {
    pub nodes: Vec<WidgetNode<'a>>,
    pub roots: Vec<usize>,
    screen: EntityId,
}

impl<'a> WidgetForest<'a> {
    pub fn node(&self, idx: usize) -> &WidgetNode<'a> {
        &self.nodes[idx]
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Emission requires exactly one visual root per screen. Zero roots and
    /// extra roots are both policy errors, reported explicitly.
    pub fn sole_root(&self) -> Result<&WidgetNode<'a>, GenerateError> {
        if self.roots.len() != 1 {
            return Err(GenerateError::MultipleRoots {
                screen: self.screen,
                count: self.roots.len(),
            });
        }
        Ok(&self.nodes[self.roots[0]])
    }

    /// Depth-first, pre-order walk; the order every emitter consumes.
    pub fn preorder(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            for child in self.nodes[idx].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }
}

/// Rebuild the widget forest of `screen` from its flat records.
///
/// Siblings are ordered by (order key, id); the id is the creation order, so
/// re-running on unchanged data always yields the same strict total order.
/// Parent cycles and parents on another screen fail instead of looping or
/// guessing.
pub fn resolve_tree<'a>(snap: &'a Snapshot, screen: &Screen) -> Result<WidgetForest<'a>, GenerateError> {
    let widgets = snap.widgets_of_screen(screen.id);

    let mut index: BTreeMap<EntityId, usize> = BTreeMap::new();
    for (i, w) in widgets.iter().enumerate() {
        index.insert(w.id, i);
    }

    // Walk the parent chain of every widget before wiring edges so a cycle
    // can never send the builder into an infinite loop.
    for w in &widgets {
        let mut seen: BTreeSet<EntityId> = BTreeSet::new();
        seen.insert(w.id);
        let mut cursor = w.parent;
        while let Some(pid) = cursor {
            if !seen.insert(pid) {
                return Err(GenerateError::CyclicHierarchy {
                    screen: screen.id,
                    widget: w.id,
                });
            }
            let parent = match index.get(&pid) {
                Some(i) => widgets[*i],
                None => break, // hazard reported below, per-widget
            };
            cursor = parent.parent;
        }
    }

    let mut nodes: Vec<WidgetNode<'a>> = widgets
        .iter()
        .map(|w| WidgetNode {
            widget: w,
            parent: None,
            children: Vec::new(),
        })
        .collect();
    let mut roots: Vec<usize> = Vec::new();

    for (i, w) in widgets.iter().enumerate() {
        match w.parent {
            None => roots.push(i),
            Some(pid) => match index.get(&pid) {
                Some(&pi) => {
                    nodes[i].parent = Some(pi);
                    // Iteration follows (order, id), so children land in
                    // sibling order without a second sort.
                    nodes[pi].children.push(i);
                }
                None => {
                    if snap.widget(pid).is_some() {
                        return Err(GenerateError::CrossScreenReference {
                            screen: screen.id,
                            widget: w.id,
                            parent: pid,
                        });
                    }
                    return Err(GenerateError::DanglingReference {
                        entity: format!("widget {}", w.id),
                        property: "parent".to_string(),
                        target: format!("widget {pid}"),
                    });
                }
            },
        }
    }

    Ok(WidgetForest {
        nodes,
        roots,
        screen: screen.id,
    })
}

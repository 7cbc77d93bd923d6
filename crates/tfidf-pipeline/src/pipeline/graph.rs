//! Stage dependency graph.

use std::collections::{BTreeSet, HashMap};

use super::StageId;
use crate::{PipelineError, channel::Channel, stages};

/// A stage and the channels it reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageNode {
    /// The stage.
    pub id: StageId,
    /// Channels streamed through the stage's map tasks.
    pub inputs: &'static [Channel],
    /// Channels loaded in full before processing starts.
    pub side_inputs: &'static [Channel],
    /// Channels the stage writes.
    pub produces: &'static [Channel],
}

impl StageNode {
    /// Every channel the stage depends on.
    pub fn consumes(&self) -> impl Iterator<Item = Channel> + '_ {
        self.inputs.iter().chain(self.side_inputs).copied()
    }
}

/// Directed acyclic graph of stages, with edges derived from channels.
#[derive(Debug, Clone)]
pub struct StageGraph {
    /// Nodes in declaration order.
    nodes: Vec<StageNode>,
}

impl StageGraph {
    /// Creates a graph over `nodes`.
    pub fn new(nodes: Vec<StageNode>) -> Self {
        Self { nodes }
    }

    /// The five-stage TF-IDF graph.
    pub fn standard() -> Self {
        Self::new(stages::NODES.to_vec())
    }

    /// Orders the stages so that every stage runs after the producers of all the
    /// channels it consumes.
    ///
    /// Stages that become runnable at the same time run in declaration order, so the
    /// result is deterministic.
    pub fn execution_order(&self) -> Result<Vec<StageId>, PipelineError> {
        let producers: HashMap<Channel, usize> = self
            .nodes
            .iter()
            .enumerate()
            .flat_map(|(i, node)| node.produces.iter().map(move |c| (*c, i)))
            .collect();

        let mut pending = vec![0_usize; self.nodes.len()];
        let mut dependents = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let mut upstream = BTreeSet::new();
            for channel in node.consumes().filter(|c| !c.is_external()) {
                let Some(&producer) = producers.get(&channel) else {
                    return Err(PipelineError::UnknownChannel {
                        stage: node.id,
                        channel,
                    });
                };
                upstream.insert(producer);
            }
            pending[i] = upstream.len();
            for producer in upstream {
                dependents[producer].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..self.nodes.len())
            .filter(|&i| pending[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(i) = ready.pop_first() {
            order.push(self.nodes[i].id);
            for &dependent in &dependents[i] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            Err(PipelineError::StageCycle)
        }
    }
}

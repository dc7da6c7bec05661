//! Fixed action sequence, replayed in a loop.

use super::trait_::TerrainPolicy;

/// Replays `actions` in order, wrapping around at the end.
///
/// An empty script always holds.
#[derive(Debug, Clone)]
pub struct ScriptedTerrainPolicy {
    actions: Vec<usize>,
    cursor: usize,
}

impl ScriptedTerrainPolicy {
    pub fn new(actions: Vec<usize>) -> Self {
        Self { actions, cursor: 0 }
    }

    /// Number of actions handed out so far.
    pub fn calls(&self) -> usize {
        self.cursor
    }
}

impl TerrainPolicy for ScriptedTerrainPolicy {
    fn select_action(&mut self, _observation: &[f64]) -> usize {
        let action = if self.actions.is_empty() {
            0
        } else {
            self.actions[self.cursor % self.actions.len()]
        };
        self.cursor += 1;
        action
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

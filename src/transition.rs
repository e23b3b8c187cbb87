use std::sync::Arc;

use log::trace;

use crate::{
    error::Error,
    search::{Edge, LinkedNode},
    world::World,
};

impl World {
    /// One edge per applicable ground action, in table order. Every action
    /// costs one.
    pub fn neighbors(&self) -> Result<Vec<Edge<World>>, Error> {
        let mut neighbors = Vec::new();
        for (name, action) in self.actions().iter() {
            if action.precondition.is_modeled_by(self)? {
                let node = self.apply_effect(&action.effect)?;
                neighbors.push(Edge { node, cost: 1, action: Arc::clone(name) });
            }
        }
        trace!("{} of {} actions applicable", neighbors.len(), self.actions().len());
        Ok(neighbors)
    }
}

impl LinkedNode for World {
    type Action = Arc<str>;
    type Error = Error;

    fn neighbors(&self) -> Result<Vec<Edge<Self>>, Error> {
        World::neighbors(self)
    }
}

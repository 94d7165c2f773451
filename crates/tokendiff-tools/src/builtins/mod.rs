//! Builtins - Built-in tools for TokenDiff
//!
//! - Lights tools: get_lights, get_state, change_state

mod lights;

pub use lights::{
    ChangeStateTool, GetLightsTool, GetStateTool, LightState, LightStore, LightUpdate,
};

use crate::registry::ToolRegistry;
use std::sync::Arc;

/// Register the three lights tools, all backed by `store`
pub fn register_lights(registry: &mut ToolRegistry, store: Arc<LightStore>) {
    registry.register(Arc::new(GetLightsTool::new(Arc::clone(&store))));
    registry.register(Arc::new(GetStateTool::new(Arc::clone(&store))));
    registry.register(Arc::new(ChangeStateTool::new(store)));
}

//! Lights Plugin
//!
//! A mock smart-home backend: three lights held in memory and the tools
//! that let a model list, inspect and switch them. Nothing here talks to
//! real hardware.

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::info;

/// State of one light
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    /// Light id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Whether the light is on
    pub is_on: Option<bool>,
    /// Brightness, 0-255
    pub brightness: Option<u8>,
    /// Colour as a hex string, e.g. `"FF0000"`
    pub hex: Option<String>,
}

impl LightState {
    fn new(id: i64, name: &str, is_on: bool, brightness: u8, hex: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            is_on: Some(is_on),
            brightness: Some(brightness),
            hex: Some(hex.to_string()),
        }
    }
}

/// New values for the mutable fields of a light.
///
/// Every field overwrites the stored one, so a `None` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LightUpdate {
    /// New on/off state
    #[serde(default)]
    pub is_on: Option<bool>,
    /// New brightness
    #[serde(default)]
    pub brightness: Option<u8>,
    /// New colour
    #[serde(default)]
    pub hex: Option<String>,
}

/// In-memory light collection, safe to share between tasks
#[derive(Debug)]
pub struct LightStore {
    lights: RwLock<Vec<LightState>>,
}

impl Default for LightStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LightStore {
    /// Store seeded with the three demo lights
    #[must_use]
    pub fn new() -> Self {
        Self::with_lights(vec![
            LightState::new(1, "Table Lamp", false, 100, "FF0000"),
            LightState::new(2, "Porch light", false, 50, "00FF00"),
            LightState::new(3, "Chandelier", true, 75, "0000FF"),
        ])
    }

    /// Store holding `lights`
    #[must_use]
    pub fn with_lights(lights: Vec<LightState>) -> Self {
        Self {
            lights: RwLock::new(lights),
        }
    }

    /// Snapshot of every light
    #[must_use]
    pub fn list(&self) -> Vec<LightState> {
        self.lights
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The light with `id`, if any
    #[must_use]
    pub fn get(&self, id: i64) -> Option<LightState> {
        self.lights
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|light| light.id == id)
            .cloned()
    }

    /// Overwrite the mutable fields of light `id` and return its new state.
    ///
    /// Returns `None` and changes nothing when no light has that id.
    pub fn set_state(&self, id: i64, update: LightUpdate) -> Option<LightState> {
        let mut lights = self.lights.write().unwrap_or_else(|e| e.into_inner());
        let light = lights.iter_mut().find(|light| light.id == id)?;
        light.is_on = update.is_on;
        light.brightness = update.brightness;
        light.hex = update.hex;
        Some(light.clone())
    }
}

fn to_output<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| Error::Execution(e.to_string()))
}

/// `get_lights`
pub struct GetLightsTool {
    definition: ToolDefinition,
    store: Arc<LightStore>,
}

impl GetLightsTool {
    /// Create the tool over `store`
    #[must_use]
    pub fn new(store: Arc<LightStore>) -> Self {
        let definition =
            ToolDefinition::new("get_lights", "Gets a list of lights and their current state");
        Self { definition, store }
    }
}

#[async_trait::async_trait]
impl Tool for GetLightsTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();
        let output = to_output(&self.store.list())?;
        Ok(ToolResult::success(
            output,
            start.elapsed().as_millis() as u64,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct GetStateInput {
    id: i64,
}

/// `get_state`
pub struct GetStateTool {
    definition: ToolDefinition,
    store: Arc<LightStore>,
}

impl GetStateTool {
    /// Create the tool over `store`
    #[must_use]
    pub fn new(store: Arc<LightStore>) -> Self {
        let definition = ToolDefinition::new("get_state", "Gets the state of a particular light")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "integer",
                        "description": "The ID of the light"
                    }
                },
                "required": ["id"]
            }));
        Self { definition, store }
    }
}

#[async_trait::async_trait]
impl Tool for GetStateTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();
        let params: GetStateInput = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(format!("Invalid get_state parameters: {}", e)))?;

        // Unknown ids answer with null
        let output = to_output(&self.store.get(params.id))?;
        Ok(ToolResult::success(
            output,
            start.elapsed().as_millis() as u64,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ChangeStateInput {
    id: i64,
    #[serde(flatten)]
    update: LightUpdate,
}

/// `change_state`
pub struct ChangeStateTool {
    definition: ToolDefinition,
    store: Arc<LightStore>,
}

impl ChangeStateTool {
    /// Create the tool over `store`
    #[must_use]
    pub fn new(store: Arc<LightStore>) -> Self {
        let definition = ToolDefinition::new("change_state", "Changes the state of the light")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "integer",
                        "description": "The ID of the light"
                    },
                    "is_on": {
                        "type": "boolean",
                        "description": "Whether the light should be on"
                    },
                    "brightness": {
                        "type": "integer",
                        "minimum": 0,
                        "maximum": 255,
                        "description": "Brightness from 0 to 255"
                    },
                    "hex": {
                        "type": "string",
                        "description": "Colour as a hex string such as FF0000"
                    }
                },
                "required": ["id"]
            }));
        Self { definition, store }
    }
}

#[async_trait::async_trait]
impl Tool for ChangeStateTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();
        let params: ChangeStateInput = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(format!("Invalid change_state parameters: {}", e)))?;

        let updated = self.store.set_state(params.id, params.update);
        if let Some(light) = &updated {
            info!(
                id = light.id,
                name = %light.name,
                is_on = ?light.is_on,
                brightness = ?light.brightness,
                "Light state changed"
            );
        }

        let output = to_output(&updated)?;
        Ok(ToolResult::success(
            output,
            start.elapsed().as_millis() as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seed_data() {
        let lights = LightStore::new().list();
        assert_eq!(lights.len(), 3);
        assert_eq!(lights[0], LightState::new(1, "Table Lamp", false, 100, "FF0000"));
        assert_eq!(lights[2].name, "Chandelier");
        assert_eq!(lights[2].is_on, Some(true));
    }

    #[test]
    fn test_json_field_names() {
        let value = serde_json::to_value(LightStore::new().get(1)).unwrap();
        assert_eq!(
            value,
            json!({"id": 1, "name": "Table Lamp", "is_on": false, "brightness": 100, "hex": "FF0000"})
        );
    }

    #[test]
    fn test_set_state_overwrites_all_mutable_fields() {
        let store = LightStore::new();
        let updated = store
            .set_state(
                3,
                LightUpdate {
                    is_on: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Chandelier");
        assert_eq!(updated.is_on, Some(false));
        assert_eq!(updated.brightness, None);
        assert_eq!(updated.hex, None);
    }

    #[tokio::test]
    async fn test_get_state_unknown_id_is_null() {
        let tool = GetStateTool::new(Arc::new(LightStore::new()));
        let result = tool.execute(json!({"id": 42})).await.unwrap();
        assert!(result.success);
        assert!(result.output.is_null());
    }

    #[tokio::test]
    async fn test_change_state_tool() {
        let store = Arc::new(LightStore::new());
        let tool = ChangeStateTool::new(Arc::clone(&store));

        let result = tool
            .execute(json!({"id": 1, "is_on": true, "brightness": 255, "hex": "FFFFFF"}))
            .await
            .unwrap();
        assert_eq!(result.output["is_on"], true);
        assert_eq!(store.get(1).unwrap().brightness, Some(255));
    }

    #[tokio::test]
    async fn test_change_state_rejects_out_of_range_brightness() {
        let store = Arc::new(LightStore::new());
        let tool = ChangeStateTool::new(Arc::clone(&store));

        let result = tool.execute(json!({"id": 1, "brightness": 300})).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(store.get(1).unwrap().brightness, Some(100));
    }
}

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::engine::assets::catalog::{DatasetCatalog, DatasetKey};
use crate::engine::loading::registry::DatasetRegistry;
use crate::engine::loading::systems::{DatasetStatus, handle_dataset_commands, poll_dataset_loads};
use crate::tools::dataset_controls::{CommandSource, DatasetCommand};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

/// Resource managing bidirectional RPC communication between the host page and Bevy.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host page without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing the postMessage RPC layer for iframe deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (process_incoming_messages, handle_rpc_messages)
                    .chain()
                    .before(handle_dataset_commands),
            )
            .add_systems(
                Update,
                (forward_status_notifications, send_outgoing_messages)
                    .chain()
                    .after(poll_dataset_loads),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    let Some(window) = window() else {
        error!("Window object not available, RPC listener not installed");
        return;
    };
    if let Err(e) =
        window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
    {
        error!("Failed to register message listener: {:?}", e);
        return;
    }

    // Ownership moves to JS for the lifetime of the page.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing incoming RPC message from the host page.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    catalog: Res<DatasetCatalog>,
    registry: Res<DatasetRegistry>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut dataset_commands: EventWriter<DatasetCommand>,
) {
    let mut commands = Vec::new();

    for event in events.read() {
        let response = match parse_rpc_message(&event.content) {
            Ok(request) => handle_rpc_request(&request, &catalog, &registry, &mut commands),
            Err(error_response) => Some(error_response),
        };
        if let Some(response) = response {
            rpc_interface.queue_response(response);
        }
    }

    dataset_commands.write_batch(commands);
}

/// Text that is not JSON is a parse error (-32700); JSON that is not a
/// request object is an invalid request (-32600).
fn parse_rpc_message(content: &str) -> Result<RpcRequest, RpcResponse> {
    let value = serde_json::from_str::<Value>(content).map_err(|parse_error| {
        warn!("Unparseable RPC message: {}", parse_error);
        create_error_response(
            Value::Null,
            -32700,
            "Parse error",
            Some(json!({ "reason": parse_error.to_string() })),
        )
    })?;
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value::<RpcRequest>(value).map_err(|shape_error| {
        warn!("Malformed RPC request: {}", shape_error);
        create_error_response(
            id,
            -32600,
            "Invalid request",
            Some(json!({ "reason": shape_error.to_string() })),
        )
    })
}

/// Handle one RPC request, collecting the dataset commands it produces.
///
/// Requests without an `id` are notifications: they are still applied but
/// get no response.
pub fn handle_rpc_request(
    request: &RpcRequest,
    catalog: &DatasetCatalog,
    registry: &DatasetRegistry,
    commands: &mut Vec<DatasetCommand>,
) -> Option<RpcResponse> {
    let result = if request.jsonrpc != "2.0" {
        Err(RpcError {
            code: -32600,
            message: "Invalid request".to_string(),
            data: Some(json!({ "jsonrpc": request.jsonrpc })),
        })
    } else {
        match request.method.as_str() {
            "load_dataset" => handle_load_dataset(&request.params, catalog, commands),
            "unload_dataset" => handle_unload_dataset(&request.params, catalog, commands),
            "set_point_budget" => handle_set_point_budget(&request.params, catalog, commands),
            "list_datasets" => Ok(list_datasets(catalog, registry)),
            _ => {
                warn!("Unknown RPC method: {}", request.method);
                Err(RpcError {
                    code: -32601,
                    message: "Method not found".to_string(),
                    data: Some(json!({ "method": request.method })),
                })
            }
        }
    };

    let id = request.id.clone()?;
    Some(match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    })
}

#[derive(Deserialize)]
struct KeyParams {
    key: DatasetKey,
}

#[derive(Deserialize)]
struct BudgetParams {
    key: DatasetKey,
    value: BudgetValue,
}

/// Budget as sent by the host page: any JSON number, or a slider's string form.
#[derive(Deserialize)]
#[serde(untagged)]
enum BudgetValue {
    Number(f64),
    Text(String),
}

impl BudgetValue {
    /// Rounded and saturated into `i64`; range clamping is left to the budget controller.
    fn requested(&self) -> Option<i64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        if value.is_nan() {
            return None;
        }
        Some(value.round() as i64)
    }
}

fn known_key(catalog: &DatasetCatalog, key: DatasetKey) -> Result<DatasetKey, RpcError> {
    if catalog.contains(&key) {
        Ok(key)
    } else {
        Err(RpcError::invalid_params(&format!("Unknown dataset: {key}")))
    }
}

fn handle_load_dataset(
    params: &Value,
    catalog: &DatasetCatalog,
    commands: &mut Vec<DatasetCommand>,
) -> Result<Value, RpcError> {
    let params = serde_json::from_value::<KeyParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'key' parameter"))?;
    let key = known_key(catalog, params.key)?;

    info!("Load of {} requested over RPC", key);
    commands.push(DatasetCommand::load(key.clone(), CommandSource::Rpc));
    Ok(json!({ "accepted": true, "key": key }))
}

fn handle_unload_dataset(
    params: &Value,
    catalog: &DatasetCatalog,
    commands: &mut Vec<DatasetCommand>,
) -> Result<Value, RpcError> {
    let params = serde_json::from_value::<KeyParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'key' parameter"))?;
    let key = known_key(catalog, params.key)?;

    info!("Unload of {} requested over RPC", key);
    commands.push(DatasetCommand::unload(key.clone(), CommandSource::Rpc));
    Ok(json!({ "accepted": true, "key": key }))
}

fn handle_set_point_budget(
    params: &Value,
    catalog: &DatasetCatalog,
    commands: &mut Vec<DatasetCommand>,
) -> Result<Value, RpcError> {
    let params = serde_json::from_value::<BudgetParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'key' and numeric 'value' parameters"))?;
    let value = params
        .value
        .requested()
        .ok_or_else(|| RpcError::invalid_params("'value' is not a number"))?;
    let key = known_key(catalog, params.key)?;

    commands.push(DatasetCommand::set_budget(key.clone(), value, CommandSource::Rpc));
    Ok(json!({ "accepted": true, "key": key }))
}

fn list_datasets(catalog: &DatasetCatalog, registry: &DatasetRegistry) -> Value {
    let datasets: Vec<Value> = catalog
        .entries()
        .iter()
        .map(|entry| {
            let installed = registry.get(&entry.key);
            json!({
                "key": entry.key,
                "format": entry.source.format,
                "state": registry.state(&entry.key).label(),
                "point_budget": installed.map(|dataset| dataset.point_budget),
                "point_count": installed.map(|dataset| dataset.metadata().point_count),
            })
        })
        .collect();
    json!({ "datasets": datasets })
}

/// Publish dataset status changes to the host page.
fn forward_status_notifications(
    mut events: EventReader<DatasetStatus>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        let (method, params) = match event {
            DatasetStatus::Loading { .. } => continue,
            DatasetStatus::Loaded { key, point_count } => (
                "dataset_loaded",
                json!({ "key": key, "point_count": point_count }),
            ),
            DatasetStatus::Unloaded { key } => ("dataset_unloaded", json!({ "key": key })),
            DatasetStatus::LoadFailed { key, reason } => (
                "dataset_load_failed",
                json!({ "key": key, "reason": reason }),
            ),
            DatasetStatus::BudgetChanged { key, budget } => (
                "point_budget_changed",
                json!({ "key": key, "point_budget": budget }),
            ),
        };
        rpc_interface.send_notification(method, params);
    }
}

/// Create standardized error response with optional data payload.
fn create_error_response(id: Value, code: i32, message: &str, data: Option<Value>) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the host page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    if rpc_interface.outgoing_notifications.is_empty() && rpc_interface.outgoing_responses.is_empty() {
        return;
    }

    // Notifications first, then responses, to keep ordering stable.
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        // No-op for non-WASM targets.
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }
}

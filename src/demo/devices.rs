//! Stubbed device endpoints.
//!
//! Devices live in an in-memory [`DeviceRegistry`] seeded with three boards.
//! A device shows up in a user's list once that user connects to it.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::demo::auth::require_user;
use crate::demo::DemoState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSpecs {
    pub cpu: String,
    pub memory: String,
    pub temperature: f64,
    pub usage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: DeviceStatus,
    pub ip: String,
    pub specs: Option<DeviceSpecs>,
    pub user_id: Option<Uuid>,
    pub last_seen: DateTime<Utc>,
}

impl Device {
    fn mock(id: &str, name: &str, kind: &str, ip: &str, specs: DeviceSpecs) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
            status: DeviceStatus::Disconnected,
            ip: ip.to_string(),
            specs: Some(specs),
            user_id: None,
            last_seen: Utc::now(),
        }
    }
}

fn specs(cpu: &str, memory: &str, temperature: f64, usage: f64) -> DeviceSpecs {
    DeviceSpecs {
        cpu: cpu.to_string(),
        memory: memory.to_string(),
        temperature,
        usage,
    }
}

/// In-memory devices keyed by id.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: DashMap<String, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the stock boards.
    pub fn with_mock_devices() -> Self {
        let registry = Self::new();
        registry.insert(Device::mock(
            "rpi-001",
            "Raspberry Pi 4B",
            "raspberry-pi",
            "192.168.1.100",
            specs("ARM Cortex-A72", "4GB RAM", 45.0, 23.0),
        ));
        registry.insert(Device::mock(
            "jetson-001",
            "NVIDIA Jetson Nano",
            "jetson",
            "192.168.1.101",
            specs("ARM Cortex-A57", "4GB RAM", 52.0, 67.0),
        ));
        registry.insert(Device::mock(
            "coral-001",
            "Google Coral Dev Board",
            "coral",
            "192.168.1.102",
            specs("ARM Cortex-A53", "1GB RAM", 38.0, 12.0),
        ));
        registry
    }

    pub fn insert(&self, device: Device) {
        self.devices.insert(device.id.clone(), device);
    }

    pub fn get(&self, id: &str) -> Option<Device> {
        self.devices.get(id).map(|entry| entry.value().clone())
    }

    /// Devices assigned to `user_id`, ordered by id.
    pub fn for_user(&self, user_id: &Uuid) -> Vec<Device> {
        let mut devices: Vec<Device> = self
            .devices
            .iter()
            .filter(|entry| entry.user_id.as_ref() == Some(user_id))
            .map(|entry| entry.value().clone())
            .collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    /// Mark the device connected and assign it to `user_id`.
    pub fn connect(&self, id: &str, user_id: Uuid) -> Option<Device> {
        let mut device = self.devices.get_mut(id)?;
        device.status = DeviceStatus::Connected;
        device.user_id = Some(user_id);
        device.last_seen = Utc::now();
        Some(device.clone())
    }

    /// Mark the device disconnected. The assignment is kept.
    pub fn disconnect(&self, id: &str) -> Option<Device> {
        let mut device = self.devices.get_mut(id)?;
        device.status = DeviceStatus::Disconnected;
        device.last_seen = Utc::now();
        Some(device.clone())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DeviceAction {
    pub success: bool,
    pub message: String,
}

impl DeviceAction {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }

    fn not_found() -> Json<Self> {
        Json(Self {
            success: false,
            message: "Device not found".to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ScanResult {
    pub success: bool,
    pub devices: usize,
    pub message: String,
}

pub async fn list(State(state): State<DemoState>, headers: HeaderMap) -> Response {
    match require_user(&state, &headers) {
        Ok(user) => Json(state.devices.for_user(&user.id)).into_response(),
        Err(rejection) => rejection,
    }
}

pub async fn connect(
    State(state): State<DemoState>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = match require_user(&state, &headers) {
        Ok(user) => user,
        Err(rejection) => return rejection,
    };

    match state.devices.connect(&device_id, user.id) {
        Some(_) => {
            tracing::info!(%device_id, user_id = %user.id, "Device connected");
            DeviceAction::ok("Device connected successfully").into_response()
        }
        None => DeviceAction::not_found().into_response(),
    }
}

pub async fn disconnect(
    State(state): State<DemoState>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = require_user(&state, &headers) {
        return rejection;
    }

    match state.devices.disconnect(&device_id) {
        Some(_) => DeviceAction::ok("Device disconnected").into_response(),
        None => DeviceAction::not_found().into_response(),
    }
}

pub async fn scan(State(state): State<DemoState>, headers: HeaderMap) -> Response {
    match require_user(&state, &headers) {
        Ok(user) => Json(ScanResult {
            success: true,
            devices: state.devices.for_user(&user.id).len(),
            message: "Scan completed".to_string(),
        })
        .into_response(),
        Err(rejection) => rejection,
    }
}

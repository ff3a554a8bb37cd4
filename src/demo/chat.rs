//! Stubbed chat endpoints.
//!
//! `POST /api/chat/message` takes a multipart form (text plus optional
//! images) and answers with a canned assistant reply. Images come back as
//! `data:` URLs on the stored user message.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use base64::Engine;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::demo::auth::{detail, require_user};
use crate::demo::DemoState;

/// Largest accepted image.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

const REPLIES: &[&str] = &[
    "I'm processing your request on the edge device. The model is analyzing your input...",
    "Based on the data processed locally, here's what I found...",
    "Running inference on the edge hardware. This keeps your data private and secure.",
    "The edge AI model has completed processing. Here are the results...",
    "Processing complete. The advantage of edge computing is the low latency you're experiencing.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub images: Vec<String>,
    pub debug: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub device_id: Option<String>,
}

impl ChatMessage {
    fn new(role: Role, content: String, device_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            images: Vec::new(),
            debug: None,
            created_at: Utc::now(),
            device_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub user_message: ChatMessage,
    pub ai_message: ChatMessage,
    pub success: bool,
}

/// Per-user message history, oldest first.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: DashMap<Uuid, Vec<ChatMessage>>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, user_id: Uuid, message: ChatMessage) {
        self.messages.entry(user_id).or_default().push(message);
    }

    /// Messages of `user_id`, restricted to `device_id` when given.
    pub fn history(&self, user_id: &Uuid, device_id: Option<&str>) -> Vec<ChatMessage> {
        self.messages
            .get(user_id)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|m| device_id.is_none() || m.device_id.as_deref() == device_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(TryFromMultipart)]
pub struct MessageForm {
    pub message: String,
    #[form_data(field_name = "deviceId")]
    pub device_id: Option<String>,
    pub debug: Option<String>,
    #[form_data(limit = "unlimited")]
    pub images: Vec<FieldData<Bytes>>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "deviceId")]
    pub device_id: Option<String>,
}

pub async fn messages(
    State(state): State<DemoState>,
    Query(query): Query<HistoryQuery>,
    headers: HeaderMap,
) -> Response {
    match require_user(&state, &headers) {
        Ok(user) => Json(state.chat.history(&user.id, query.device_id.as_deref())).into_response(),
        Err(rejection) => rejection,
    }
}

pub async fn send_message(
    State(state): State<DemoState>,
    headers: HeaderMap,
    TypedMultipart(form): TypedMultipart<MessageForm>,
) -> Response {
    let user = match require_user(&state, &headers) {
        Ok(user) => user,
        Err(rejection) => return rejection,
    };

    let images = match encode_images(&form.images) {
        Ok(images) => images,
        Err(rejection) => return rejection,
    };
    let debug = form.debug.as_deref() == Some("true");

    let mut user_message = ChatMessage::new(Role::User, form.message.clone(), form.device_id.clone());
    user_message.images = images;
    if debug {
        user_message.debug = Some(json!({
            "userInput": form.message,
            "timestamp": Uuid::new_v4().to_string(),
        }));
    }

    let mut ai_message = ChatMessage::new(
        Role::Assistant,
        reply(user_message.images.len()),
        form.device_id,
    );
    if debug {
        ai_message.debug = Some(debug_info(&user_message));
    }

    tracing::info!(
        user_id = %user.id,
        images = user_message.images.len(),
        "Chat message answered"
    );
    state.chat.append(user.id, user_message.clone());
    state.chat.append(user.id, ai_message.clone());

    Json(ChatResponse {
        user_message,
        ai_message,
        success: true,
    })
    .into_response()
}

/// Validate uploads and turn them into `data:` URLs.
fn encode_images(images: &[FieldData<Bytes>]) -> Result<Vec<String>, Response> {
    images
        .iter()
        .map(|image| {
            let file_name = image.metadata.file_name.as_deref().unwrap_or("upload");
            if image.contents.len() > MAX_IMAGE_BYTES {
                return Err(detail(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    &format!("Image too large: {file_name}"),
                ));
            }

            let content_type = image.metadata.content_type.as_deref().unwrap_or_default();
            if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
                return Err(detail(
                    StatusCode::BAD_REQUEST,
                    &format!("Invalid image type: {content_type}"),
                ));
            }

            let encoded = base64::engine::general_purpose::STANDARD.encode(&image.contents);
            Ok(format!("data:{content_type};base64,{encoded}"))
        })
        .collect()
}

fn reply(image_count: usize) -> String {
    let mut content = REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(REPLIES[0])
        .to_string();
    if image_count > 0 {
        content.push_str(&format!(" I can see you've shared {image_count} image(s) with me."));
    }
    content
}

fn debug_info(user_message: &ChatMessage) -> serde_json::Value {
    let mut rng = rand::thread_rng();
    json!({
        "systemPrompt": "You are a helpful AI assistant running on an edge device. Provide concise and accurate responses while highlighting the benefits of edge computing.",
        "modelInputs": {
            "temperature": 0.7,
            "max_tokens": 150,
            "prompt_tokens": user_message.content.chars().count(),
            "image_count": user_message.images.len(),
        },
        "modelOutputs": {
            "tokens_generated": rng.gen_range(20..=100),
            "confidence": 0.85 + rng.gen::<f64>() * 0.15,
        },
        "processingTime": rng.gen_range(200..=800),
        "device": {
            "gpu_usage": rng.gen_range(0..=80),
            "memory_usage": rng.gen_range(30..=70),
            "temperature": rng.gen_range(35..=55),
        },
    })
}

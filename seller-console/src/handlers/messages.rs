use super::forms::CallForm;
use super::upload::SubmittedForm;
use super::{fail, loaded, reject, seller_api, session_expired, Layout};
use crate::middleware::auth::{is_htmx, redirect};
use crate::models::{AuthUser, ChatSummary, ChatThread, SendOptions, UserProfile};
use crate::realtime::{
    CallPrompt, CallType, ChannelHandle, ChannelState, Decision, OutgoingCall,
};
use crate::session::store::CHANNEL_MOUNT;
use crate::session::{Notice, SessionStore};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

const MESSAGES_PATH: &str = "/dashboard/messages";

/// HTMX stops polling when a response carries this status.
const STOP_POLLING: u16 = 286;

#[derive(Template)]
#[template(path = "messages/page.html")]
pub struct MessagesTemplate {
    pub layout: Layout,
    pub chats: Vec<ChatSummary>,
    pub selected: Option<ChatThread>,
    pub selected_id: String,
    pub me: Option<String>,
    pub mount_id: String,
}

#[derive(Template)]
#[template(path = "messages/events.html")]
pub struct ChannelEventsFragment {
    pub mount_id: Uuid,
    pub state: ChannelState,
    pub prompts: Vec<CallPrompt>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    pub chat: Option<String>,
}

fn chat_path(chat_id: &str) -> String {
    format!("{MESSAGES_PATH}?chat={chat_id}")
}

/// Navigate back to the chat, or answer an HTMX request with no content.
fn done(headers: &HeaderMap, chat_id: &str) -> Response {
    if is_htmx(headers) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        redirect(headers, &chat_path(chat_id))
    }
}

pub async fn messages_page(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Query(query): Query<MessagesQuery>,
) -> Response {
    let mut layout = Layout::new(&user, "messages").await;
    let api = seller_api(&state, &user);

    let Some(chats) = loaded(
        api.my_customers().await,
        "Failed to load conversations",
        &mut layout,
    ) else {
        return session_expired(user.session.store(), &headers).await;
    };

    let selected_id = query.chat.unwrap_or_default();
    let selected = if selected_id.is_empty() {
        None
    } else {
        let Some(thread) = loaded(
            api.chat(&selected_id).await.map(Some),
            "Failed to load conversation",
            &mut layout,
        ) else {
            return session_expired(user.session.store(), &headers).await;
        };
        thread
    };

    let me = match api.profile().await {
        Ok(profile) => Some(profile.id).filter(|id| !id.is_empty()),
        Err(e) if e.is_session_expired() => {
            return session_expired(user.session.store(), &headers).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Profile unavailable, using the session's user id");
            None
        }
    }
    .or_else(|| user.user_id.clone());

    let channel = match state.channels.mount_for(user.session.store()).await {
        Ok(channel) => channel,
        Err(e) => {
            tracing::error!(error = %e, "Failed to mount realtime channel");
            return reject(&user, &headers, "Call connection not ready", "/dashboard").await;
        }
    };
    if let Some(id) = &me {
        if let Err(e) = channel.set_user_id(id.clone()) {
            tracing::warn!(error = %e, "Realtime channel stopped before join");
        }
    }
    tracing::debug!(mount_id = %channel.id(), "Messages page mounted a realtime channel");

    MessagesTemplate {
        layout,
        chats,
        selected,
        selected_id,
        me,
        mount_id: channel.id().to_string(),
    }
    .into_response()
}

pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let back = chat_path(&chat_id);
    let form = match SubmittedForm::read(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable message form");
            return reject(&user, &headers, "Failed to send message", &back).await;
        }
    };

    let text = form.text("message").unwrap_or_default().to_string();
    let files = form.files("files");
    if text.is_empty() && files.is_empty() {
        return redirect(&headers, &back);
    }

    let options = SendOptions {
        ask_price: form.text("askPrice").map(|_| form.flag("askPrice")),
        product_id: form.text("productId").map(str::to_string),
    };

    match seller_api(&state, &user)
        .send_message(&chat_id, &text, files, options)
        .await
    {
        Ok(_) => redirect(&headers, &back),
        Err(e) => fail(&user, &headers, e, "Failed to send message", &back).await,
    }
}

pub async fn place_call(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
    Form(form): Form<CallForm>,
) -> Response {
    let back = chat_path(&chat_id);
    let api = seller_api(&state, &user);

    let thread = match api.chat(&chat_id).await {
        Ok(thread) => thread,
        Err(e) => return fail(&user, &headers, e, "Select a customer to call", &back).await,
    };
    let Some(customer_id) = thread.customer_id() else {
        return reject(&user, &headers, "Select a customer to call", &back).await;
    };

    let channel = match state.channels.current_for(user.session.store()).await {
        Ok(Some(channel)) => channel,
        Ok(None) => return reject(&user, &headers, "Call connection not ready", &back).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to look up realtime channel");
            return reject(&user, &headers, "Call connection not ready", &back).await;
        }
    };

    let profile = api.profile().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Profile unavailable, calling as the session user");
        UserProfile::default()
    });
    let call = OutgoingCall {
        chat_id: thread.id.clone(),
        to_user_id: customer_id.to_string(),
        from_name: profile.caller_name(),
        call_type: match form.call_type.as_deref() {
            Some("video") => CallType::Video,
            _ => CallType::Audio,
        },
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    if let Err(e) = channel.place_call(call) {
        tracing::warn!(error = %e, "Realtime channel stopped before the call");
        return reject(&user, &headers, "Call connection not ready", &back).await;
    }
    done(&headers, &chat_id)
}

/// The channel `mount_id` if this session still owns it. A channel the
/// session has let go of is torn down.
async fn owned_channel(state: &AppState, session: &Session, mount_id: Uuid) -> Option<ChannelHandle> {
    let current = match SessionStore::get(session, CHANNEL_MOUNT).await {
        Ok(current) => current,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read channel mount");
            None
        }
    };

    if current.as_deref() == Some(mount_id.to_string().as_str()) {
        if let Some(channel) = state.channels.get(&mount_id) {
            state.channels.touch(&mount_id);
            return Some(channel);
        }
    }

    state.channels.unmount(&mount_id);
    None
}

/// Polled by the messages page: pending call prompts and channel notices.
pub async fn channel_events(
    State(state): State<AppState>,
    session: Session,
    Path(mount_id): Path<Uuid>,
) -> Response {
    let Some(channel) = owned_channel(&state, &session, mount_id).await else {
        return StatusCode::from_u16(STOP_POLLING)
            .unwrap_or(StatusCode::GONE)
            .into_response();
    };

    ChannelEventsFragment {
        mount_id,
        state: channel.state(),
        prompts: channel.pending_prompts(),
        notices: channel.drain_notices().await,
    }
    .into_response()
}

pub async fn decide_call(
    State(state): State<AppState>,
    session: Session,
    Path((mount_id, prompt_id, decision)): Path<(Uuid, u64, String)>,
) -> Response {
    let Ok(decision) = decision.parse::<Decision>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Some(channel) = owned_channel(&state, &session, mount_id).await else {
        return StatusCode::GONE.into_response();
    };

    match channel.decide(prompt_id, decision) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Call decision after the channel stopped");
            StatusCode::GONE.into_response()
        }
    }
}

/// Sent when the messages page goes away.
pub async fn unmount_channel(
    State(state): State<AppState>,
    session: Session,
    Path(mount_id): Path<Uuid>,
) -> StatusCode {
    if owned_channel(&state, &session, mount_id).await.is_some() {
        state.channels.unmount(&mount_id);
        if let Err(e) = SessionStore::remove(&session, CHANNEL_MOUNT).await {
            tracing::error!(error = %e, "Failed to clear channel mount");
        }
    }
    StatusCode::NO_CONTENT
}

//! Chat endpoints

use crate::api::ExtractSession;
use crate::api::chat::schemas::{CreateMessage, MessagesList, QuickReplyList, Typing};
use crate::core::traits::ChatService;
use async_stream::stream;
use axum::http::StatusCode;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;
use futures_util::Stream;
use log::debug;

pub fn router() -> Router {
    Router::new()
        .route(
            "/messages",
            get(list_messages).post(post_message).delete(reset_messages),
        )
        .route("/quick-replies", get(quick_replies))
}

async fn list_messages(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractSession(session_id): ExtractSession,
) -> (StatusCode, Json<MessagesList>) {
    let messages = chat_service.history(session_id).await;

    (StatusCode::OK, Json(MessagesList::from(messages)))
}

/// Runs one chat turn and streams it back as server-sent events.
///
/// The stream carries the stored user message, a `typing` marker while the answer is
/// produced, the bot message and a closing `typing` marker.
async fn post_message(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractSession(session_id): ExtractSession,
    Json(message): Json<CreateMessage>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, (StatusCode, &'static str)> {
    if message.text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message text is empty"));
    }

    let user_message = chat_service
        .post_user_message(session_id, message.text)
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "failed to store message"))?;

    debug!("chat turn started for session {session_id}");

    let stream = stream! {
        yield Event::default()
            .event("new_message")
            .json_data(schemas::Message::from(user_message.clone()));

        yield Event::default()
            .event("typing")
            .json_data(Typing { typing: true });

        let bot_message = chat_service.reply(session_id, &user_message.text).await;

        yield Event::default()
            .event("new_message")
            .json_data(schemas::Message::from(bot_message));

        yield Event::default()
            .event("typing")
            .json_data(Typing { typing: false });
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn reset_messages(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractSession(session_id): ExtractSession,
) -> (StatusCode, Json<MessagesList>) {
    match chat_service.reset(session_id).await {
        Ok(messages) => (StatusCode::OK, Json(MessagesList::from(messages))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessagesList::default()),
        ),
    }
}

async fn quick_replies(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractSession(session_id): ExtractSession,
) -> Json<QuickReplyList> {
    let quick_replies = chat_service.quick_replies(session_id).await;

    Json(QuickReplyList {
        visible: !quick_replies.is_empty(),
        quick_replies,
    })
}

pub mod schemas {
    use crate::core::session::{self, QuickReply, Sender};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct CreateMessage {
        pub text: String,
    }

    #[derive(Serialize, Debug)]
    pub struct Message {
        pub role: Sender,
        pub text: String,
        pub created_at: DateTime<Utc>,
    }

    impl From<session::ChatMessage> for Message {
        fn from(message: session::ChatMessage) -> Self {
            Message {
                role: message.sender,
                text: message.text,
                created_at: message.created_at,
            }
        }
    }

    #[derive(Serialize, Debug, Default)]
    pub struct MessagesList {
        pub messages: Vec<Message>,
    }

    impl From<Vec<session::ChatMessage>> for MessagesList {
        fn from(messages: Vec<session::ChatMessage>) -> Self {
            MessagesList {
                messages: messages.into_iter().map(Message::from).collect(),
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct Typing {
        pub typing: bool,
    }

    #[derive(Serialize, Debug)]
    pub struct QuickReplyList {
        pub visible: bool,
        pub quick_replies: Vec<QuickReply>,
    }
}

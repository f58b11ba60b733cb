//! Contact form endpoints

use crate::api::contact::schemas::{Acknowledgement, CreateContact};
use crate::core::traits::ContactService;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;
use log::error;

pub fn router() -> Router {
    Router::new().route("/", get(status).post(submit))
}

async fn status() -> Json<Acknowledgement> {
    Json(Acknowledgement::new("Contact API aktif ✅"))
}

async fn submit(
    Inject(contact_service): Inject<dyn ContactService>,
    Json(contact): Json<CreateContact>,
) -> (StatusCode, Json<Acknowledgement>) {
    match contact_service.submit(contact.into()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(Acknowledgement::new("Pesan berhasil dikirim ✅")),
        ),
        Err(_) => {
            error!("contact submission was not stored");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Acknowledgement::new("Gagal mengirim data ke server")),
            )
        }
    }
}

pub mod schemas {
    use crate::infrastructure::entities::NewContactMessage;
    use serde::{Deserialize, Serialize};

    /// Contact form body. The storefront client sends the Indonesian field names.
    #[derive(Deserialize, Debug)]
    pub struct CreateContact {
        #[serde(alias = "nama")]
        pub name: Option<String>,
        pub email: Option<String>,
        #[serde(alias = "subjek")]
        pub subject: Option<String>,
        #[serde(alias = "pesan")]
        pub message: Option<String>,
    }

    impl From<CreateContact> for NewContactMessage {
        fn from(contact: CreateContact) -> Self {
            NewContactMessage {
                name: contact.name,
                email: contact.email,
                subject: contact.subject,
                message: contact.message,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct Acknowledgement {
        pub message: String,
    }

    impl Acknowledgement {
        pub fn new(message: &str) -> Self {
            Acknowledgement {
                message: message.to_owned(),
            }
        }
    }
}

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

use api::websocket::NotificationHub;
use config::Config;
use services::{mailer::Mailer, tokens::TokenIssuer};
use storage::{s3::ObjectStorage, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub objects: ObjectStorage,
    pub tokens: TokenIssuer,
    pub mailer: Mailer,
    pub hub: Arc<NotificationHub>,
    pub config: Arc<Config>,
}

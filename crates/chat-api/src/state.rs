use std::sync::Arc;

use chat_crypto::SecretCipher;
use chat_db::Database;

use crate::services::{AuthService, ChatService, MessageService};
use crate::token::TokenService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub auth: AuthService,
    pub chats: ChatService,
    pub messages: MessageService,
}

impl AppStateInner {
    /// Wires every service to the same database handle.
    pub fn new(db: Arc<Database>, cipher: SecretCipher, tokens: TokenService) -> AppState {
        Arc::new(Self {
            auth: AuthService::new(db.clone(), cipher, tokens),
            chats: ChatService::new(db.clone()),
            messages: MessageService::new(db),
        })
    }
}

use std::sync::Arc;

use crate::application::ConversationalRetrievalChain;
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<ConversationalRetrievalChain>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(chain: ConversationalRetrievalChain, config: AppConfig) -> Self {
        Self {
            chain: Arc::new(chain),
            config: Arc::new(config),
        }
    }
}

use std::sync::Arc;

use crate::auth::TokenService;
use crate::cars::CarManager;
use crate::store::UserStore;

/// Shared application state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub cars: CarManager,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, cars: CarManager, tokens: TokenService) -> Self {
        Self {
            users,
            cars,
            tokens,
        }
    }
}

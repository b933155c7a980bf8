use std::sync::Arc;

use crate::application::contacts::ContactService;

#[derive(Clone)]
pub struct ApiState {
    pub contacts: Arc<ContactService>,
}

impl ApiState {
    pub fn new(contacts: ContactService) -> Self {
        Self {
            contacts: Arc::new(contacts),
        }
    }
}

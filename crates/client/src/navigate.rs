//! Route changes requested by the client (the post-401 redirect).

use std::sync::{Mutex, PoisonError};

pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect(&self, route: &str) {
        tracing::info!(route, "redirect requested");
    }
}

/// Records redirects instead of performing them.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    routes: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for MemoryNavigator {
    fn redirect(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

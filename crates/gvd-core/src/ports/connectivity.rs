//! Network reachability port.

use async_trait::async_trait;

/// Answers "is the network reachable right now?" before a job is spawned.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

#[async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn is_online(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_static_probe_as_trait_object() {
        let online: Arc<dyn ConnectivityProbe> = Arc::new(StaticProbe(true));
        let offline: Arc<dyn ConnectivityProbe> = Arc::new(StaticProbe(false));
        assert!(online.is_online().await);
        assert!(!offline.is_online().await);
    }
}

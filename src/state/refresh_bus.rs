use crate::types::{IpcErrorCode, IpcResult};
use tokio::sync::{mpsc, oneshot};

#[derive(Clone)]
pub struct RefreshBus {
    tx: mpsc::UnboundedSender<RefreshRequest>,
}

pub struct RefreshRequest {
    pub(crate) respond_to: Option<oneshot::Sender<IpcResult<()>>>,
}

impl RefreshBus {
    pub(crate) fn new(tx: mpsc::UnboundedSender<RefreshRequest>) -> Self {
        Self { tx }
    }

    /// Queues a refresh without waiting for it.
    pub fn trigger(&self) {
        let _ = self.tx.send(RefreshRequest { respond_to: None });
    }

    pub async fn refresh_now(&self) -> IpcResult<()> {
        let (tx, rx) = oneshot::channel();
        if self
            .tx
            .send(RefreshRequest {
                respond_to: Some(tx),
            })
            .is_err()
        {
            return IpcResult::err(IpcErrorCode::Unknown, "Refresh loop is not available.");
        }
        rx.await
            .unwrap_or_else(|_| IpcResult::err(IpcErrorCode::Unknown, "Refresh loop failed."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refresh_now_reports_closed_loop() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let bus = RefreshBus::new(tx);
        assert!(!bus.refresh_now().await.is_ok());
    }

    #[tokio::test]
    async fn refresh_now_returns_loop_response() {
        let (tx, mut rx) = mpsc::unbounded_channel::<RefreshRequest>();
        let bus = RefreshBus::new(tx);
        tokio::spawn(async move {
            if let Some(req) = rx.recv().await {
                if let Some(respond_to) = req.respond_to {
                    let _ = respond_to.send(IpcResult::ok(()));
                }
            }
        });
        assert!(bus.refresh_now().await.is_ok());
    }
}

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use super::AssetError;

/// Where an asynchronous load stands
#[derive(Debug)]
pub enum LoadStatus<T> {
    Pending,
    Ready(T),
    Failed(AssetError),
}

/// Receiving end of a background load.
///
/// The job reports exactly once through the paired [`Sender`]. Dropping the
/// sender without reporting surfaces as [`AssetError::Abandoned`].
#[derive(Debug)]
pub struct LoadHandle<T> {
    label: String,
    rx: Receiver<Result<T, AssetError>>,
    finished: bool,
}

impl<T> LoadHandle<T> {
    pub fn channel(label: impl Into<String>) -> (Sender<Result<T, AssetError>>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { label: label.into(), rx, finished: false })
    }

    /// Handle whose outcome is already known
    pub fn resolved(label: impl Into<String>, result: Result<T, AssetError>) -> Self {
        let (tx, handle) = Self::channel(label);
        // the receiver is alive in `handle`, so this cannot fail
        let _ = tx.send(result);
        handle
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Non-blocking check. Yields `Ready`/`Failed` once, then `Pending` forever.
    pub fn poll(&mut self) -> LoadStatus<T> {
        if self.finished {
            return LoadStatus::Pending;
        }
        match self.rx.try_recv() {
            Ok(Ok(value)) => {
                self.finished = true;
                LoadStatus::Ready(value)
            }
            Ok(Err(err)) => {
                self.finished = true;
                LoadStatus::Failed(err)
            }
            Err(TryRecvError::Empty) => LoadStatus::Pending,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                LoadStatus::Failed(AssetError::Abandoned { label: self.label.clone() })
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Block until the load completes
    #[cfg(not(target_arch = "wasm32"))]
    pub fn wait(self) -> Result<T, AssetError> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(AssetError::Abandoned { label: self.label.clone() }))
    }
}

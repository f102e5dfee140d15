//! Channel driver boundary
//!
//! The registry never produces media itself. When a channel is activated it
//! asks a [`ChannelDriver`] to start the external worker that pulls from the
//! source and feeds packets and metadata back through the registry API.

/// Spawner for channel workers
///
/// `start` is invoked while the registry holds its write lock, so
/// implementations must hand the ids to a freshly spawned task and return
/// promptly — typically `tokio::spawn` around the actual pull loop.
///
/// The spawned worker is expected to:
/// - fetch its mailbox via `channel_control` and watch it for signals,
/// - report progress via `set_status` and `update_codecs`,
/// - publish media via `broadcast` / `broadcast_raw`,
/// - on [`Signal::Stop`](crate::signal::Signal::Stop) exit and call
///   `unlock` so the channel can be activated again,
/// - on [`Signal::Restart`](crate::signal::Signal::Restart) recycle its
///   upstream connection without involving the registry.
pub trait ChannelDriver: Send + Sync + 'static {
    /// Start the worker for one channel
    fn start(&self, stream_id: &str, channel_id: &str);
}

impl<F> ChannelDriver for F
where
    F: Fn(&str, &str) + Send + Sync + 'static,
{
    fn start(&self, stream_id: &str, channel_id: &str) {
        self(stream_id, channel_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_closure_driver() {
        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);
        let driver: Arc<dyn ChannelDriver> = Arc::new(move |_: &str, _: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        driver.start("cam1", "ch0");
        driver.start("cam1", "ch1");

        assert_eq!(started.load(Ordering::SeqCst), 2);
    }
}

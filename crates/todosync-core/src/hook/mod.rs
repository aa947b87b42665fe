//! Callbacks the remote layer fires into the application layer.

/// Invoked by the transport after a request was answered with 401 and the
/// session manager has been asked to clear the session.
///
/// `cleared` is `true` only for the call that actually ended a session;
/// concurrent 401s for the same session see `false`.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self, cleared: bool);
}

/// Handler that does nothing, for transports used without an application
/// context.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUnauthorizedHandler;

impl UnauthorizedHandler for NoopUnauthorizedHandler {
    fn on_unauthorized(&self, cleared: bool) {
        tracing::debug!(cleared, "[UnauthorizedHandler] No handler installed");
    }
}

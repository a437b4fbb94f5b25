use crate::utils::error::Result;
use std::net::TcpListener;

/// Guard that keeps the process-wide single-instance lock alive. The lock is
/// a bound localhost port; dropping the guard releases it.
pub struct InstanceGuard {
    _listener: TcpListener,
    port: u16,
}

impl InstanceGuard {
    /// Binds the guard port. Returns `Ok(None)` if another instance already
    /// holds it.
    pub fn acquire(port: u16) -> Result<Option<Self>> {
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(listener) => {
                tracing::debug!("single-instance guard bound on port {}", port);
                Ok(Some(Self {
                    _listener: listener,
                    port,
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

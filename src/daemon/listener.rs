//! Unix socket listener for daemon connections.
//!
//! The socket file is created with mode 0600 (owner only) and removed
//! when the listener is dropped. Each accepted connection speaks the
//! length-delimited JSON protocol from [`super::protocol`].

use std::path::{Path, PathBuf};

use tokio::net::{UnixListener, UnixStream};

use crate::daemon::protocol::{Request, Response, read_request, write_response};
use crate::error::Result;

/// Unix socket listener accepting connections from clients.
pub struct IpcListener {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl IpcListener {
    /// Bind to a Unix domain socket at the given path.
    ///
    /// Creates the parent directory if needed, removes a stale socket
    /// file from a previous run, binds, and restricts permissions to the
    /// owner.
    pub async fn bind(socket_path: impl AsRef<Path>) -> Result<Self> {
        let socket_path = socket_path.as_ref().to_path_buf();

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)?;
        }

        let listener = UnixListener::bind(&socket_path)?;

        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept a new incoming connection.
    pub async fn accept(&self) -> Result<IpcConnection> {
        let (stream, _addr) = self.listener.accept().await?;
        Ok(IpcConnection::new(stream))
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcListener {
    fn drop(&mut self) {
        // Best effort; the next bind removes leftovers anyway
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// One client connection. Supports any number of request/response pairs
/// until the client hangs up.
pub struct IpcConnection {
    stream: UnixStream,
}

impl IpcConnection {
    pub fn new(stream: UnixStream) -> Self {
        Self { stream }
    }

    pub async fn recv_request(&mut self) -> Result<Request> {
        let request = read_request(&mut self.stream).await?;
        Ok(request)
    }

    pub async fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.stream, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::protocol::{Operation, write_request};
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::net::UnixStream;
    use tokio::time::timeout;

    fn temp_socket_path() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sock");
        (dir, path)
    }

    #[tokio::test]
    async fn test_bind_creates_socket() {
        let (_dir, socket_path) = temp_socket_path();
        let listener = IpcListener::bind(&socket_path).await.unwrap();
        assert!(socket_path.exists());
        assert_eq!(listener.socket_path(), socket_path);
    }

    #[tokio::test]
    async fn test_bind_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let socket_path = dir.path().join("nested").join("atelier.sock");
        let _listener = IpcListener::bind(&socket_path).await.unwrap();
        assert!(socket_path.exists());
    }

    #[tokio::test]
    async fn test_bind_removes_stale_socket() {
        let (_dir, socket_path) = temp_socket_path();
        std::fs::write(&socket_path, b"stale").unwrap();
        let _listener = IpcListener::bind(&socket_path).await.unwrap();
        assert!(socket_path.exists());
    }

    #[tokio::test]
    async fn test_drop_cleans_up_socket() {
        let (_dir, socket_path) = temp_socket_path();
        {
            let _listener = IpcListener::bind(&socket_path).await.unwrap();
            assert!(socket_path.exists());
        }
        assert!(!socket_path.exists());
    }

    #[tokio::test]
    async fn test_socket_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, socket_path) = temp_socket_path();
        let _listener = IpcListener::bind(&socket_path).await.unwrap();

        let metadata = std::fs::metadata(&socket_path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_request_response_roundtrip() {
        let (_dir, socket_path) = temp_socket_path();
        let socket_path_clone = socket_path.clone();

        let listener = IpcListener::bind(&socket_path).await.unwrap();

        let server = tokio::spawn(async move {
            let mut conn = listener.accept().await.unwrap();
            let request = conn.recv_request().await.unwrap();
            assert_eq!(request.id, 42);
            assert!(matches!(request.op, Operation::Ping));
            conn.send_response(&Response::ok_empty(request.id))
                .await
                .unwrap();
        });

        let client = tokio::spawn(async move {
            let mut stream = UnixStream::connect(&socket_path_clone).await.unwrap();
            let request = Request::new(42, None, Operation::Ping);
            write_request(&mut stream, &request).await.unwrap();
            let response = crate::daemon::protocol::read_response(&mut stream)
                .await
                .unwrap();
            assert_eq!(response.id, 42);
            assert!(response.ok);
        });

        timeout(Duration::from_secs(5), async {
            server.await.unwrap();
            client.await.unwrap();
        })
        .await
        .unwrap();
    }
}

//! Test server management.
//!
//! Spawns and manages slroomd instances for integration testing.

use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// A test server instance.
pub struct TestServer {
    child: Child,
    port: u16,
    metrics_port: Option<u16>,
    // Held so the config file outlives the process.
    _data_dir: TempDir,
}

impl TestServer {
    /// Spawn a server with no preloaded rooms.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(&[], "").await
    }

    /// Spawn a server with `preload` rooms and extra `[websocket]` settings.
    pub async fn spawn_with(preload: &[&str], websocket: &str) -> anyhow::Result<Self> {
        Self::launch(preload, websocket, None).await
    }

    /// Spawn a server that also serves the admin HTTP endpoint.
    #[allow(dead_code)]
    pub async fn spawn_with_metrics() -> anyhow::Result<Self> {
        Self::launch(&[], "", Some(free_port()?)).await
    }

    async fn launch(preload: &[&str], websocket: &str, metrics_port: Option<u16>) -> anyhow::Result<Self> {
        let port = loop {
            let port = free_port()?;
            if Some(port) != metrics_port {
                break port;
            }
        };
        let data_dir = tempfile::tempdir()?;
        let preload = preload
            .iter()
            .map(|r| format!("{r:?}"))
            .collect::<Vec<_>>()
            .join(", ");

        let admin_port = metrics_port.unwrap_or(0);
        let config_path = data_dir.path().join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "test.server"
metrics_port = {admin_port}

[listen]
address = "127.0.0.1:{port}"

[websocket]
pong_wait_secs = 5
write_wait_secs = 2
{websocket}

[rooms]
preload = [{preload}]
"#
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(env!("CARGO_BIN_EXE_slroomd"))
            .arg(&config_path)
            .env_remove("PORT")
            .env("RUST_LOG", "slroomd=debug")
            .stdout(Stdio::null())
            .spawn()?;

        let server = Self {
            child,
            port,
            metrics_port,
            _data_dir: data_dir,
        };

        // Wait for server to start listening
        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        let ports = std::iter::once(self.port).chain(self.metrics_port);
        for port in ports {
            wait_for_port(port).await?;
        }
        Ok(())
    }

    /// Fetch the Prometheus exposition from the admin endpoint.
    #[allow(dead_code)]
    pub async fn metrics(&self) -> anyhow::Result<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let port = self
            .metrics_port
            .ok_or_else(|| anyhow::anyhow!("server was spawned without metrics"))?;
        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await?;
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await?;
        let mut response = String::new();
        stream.read_to_string(&mut response).await?;
        Ok(response)
    }

    /// Read one unlabelled gauge or counter from the exposition.
    #[allow(dead_code)]
    pub async fn metric(&self, name: &str) -> anyhow::Result<f64> {
        let text = self.metrics().await?;
        let value = text
            .lines()
            .find_map(|line| line.strip_prefix(name)?.strip_prefix(' '))
            .ok_or_else(|| anyhow::anyhow!("metric {name} not exposed"))?;
        Ok(value.trim().parse::<f64>()?)
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Connect a WebSocket client with the given session id and initial room.
    pub async fn connect(&self, session_id: &str, room_id: &str) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address(), session_id, room_id).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Kill the server process
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn wait_for_port(port: u16) -> anyhow::Result<()> {
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return Ok(());
        }
        sleep(Duration::from_millis(100)).await;
    }
    anyhow::bail!("Server failed to listen on port {port} within 5 seconds")
}

/// Ask the OS for a port that is free right now.
fn free_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

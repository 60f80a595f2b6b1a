// ABOUTME: XML-RPC client for a supervisor domain reached over its unix socket.
// ABOUTME: Sends one HTTP/1.1 POST per call and maps faults through the fault table.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;

use super::error::SupervisorError;
use super::process::{BulkStatus, ProcessDescriptor};
use super::signal::Signal;
use super::traits::SupervisorOps;
use super::xmlrpc::{self, Response, Value};

const RPC_PATH: &str = "/RPC2";

/// Client bound to one supervisor control socket.
#[derive(Debug, Clone)]
pub struct XmlRpcClient {
    socket_path: PathBuf,
}

impl XmlRpcClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    fn endpoint(&self) -> String {
        self.socket_path.display().to_string()
    }

    /// Perform one method call and return its decoded result.
    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value, SupervisorError> {
        let body = xmlrpc::encode_call(method, params);
        tracing::debug!(endpoint = %self.endpoint(), method, "supervisor call");

        let raw = self.post(body).await?;
        let text = String::from_utf8_lossy(&raw);

        match xmlrpc::decode_response(&text)? {
            Response::Success(value) => Ok(value),
            Response::Fault { code, message } => {
                tracing::debug!(endpoint = %self.endpoint(), method, code, %message, "supervisor fault");
                Err(SupervisorError::from_fault(&self.endpoint(), code, &message))
            }
        }
    }

    async fn post(&self, body: String) -> Result<Bytes, SupervisorError> {
        let endpoint = self.endpoint();

        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| SupervisorError::connection(&endpoint, e))?;

        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| {
                SupervisorError::connection(&endpoint, format!("HTTP handshake failed: {e}"))
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("supervisor connection error: {}", e);
            }
        });

        let req = hyper::Request::builder()
            .method("POST")
            .uri(RPC_PATH)
            .header("Host", "localhost")
            .header("Content-Type", "text/xml")
            .header("Content-Length", body.len().to_string())
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| SupervisorError::OperationFailed(format!("failed to build request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| SupervisorError::connection(&endpoint, format!("request failed: {e}")))?;

        let status = resp.status();
        let collected = resp.into_body().collect().await.map_err(|e| {
            SupervisorError::connection(&endpoint, format!("failed to read response: {e}"))
        })?;
        let bytes = collected.to_bytes();

        if !status.is_success() {
            return Err(SupervisorError::OperationFailed(format!(
                "HTTP {status}: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }

        Ok(bytes)
    }

    async fn bulk(&self, method: &str, wait: bool) -> Result<Vec<BulkStatus>, SupervisorError> {
        let value = self.call(method, &[Value::Bool(wait)]).await?;
        value
            .as_array()?
            .iter()
            .map(|v| BulkStatus::from_value(v).map_err(SupervisorError::from))
            .collect()
    }
}

#[async_trait]
impl SupervisorOps for XmlRpcClient {
    async fn ping(&self) -> Result<(), SupervisorError> {
        self.call("supervisor.getState", &[]).await.map(|_| ())
    }

    async fn list_processes(&self) -> Result<Vec<ProcessDescriptor>, SupervisorError> {
        let value = self.call("supervisor.getAllProcessInfo", &[]).await?;
        value
            .as_array()?
            .iter()
            .map(|v| ProcessDescriptor::from_value(v).map_err(SupervisorError::from))
            .collect()
    }

    async fn get_process(&self, name: &str) -> Result<ProcessDescriptor, SupervisorError> {
        let value = self
            .call("supervisor.getProcessInfo", &[Value::from(name)])
            .await?;
        Ok(ProcessDescriptor::from_value(&value)?)
    }

    async fn start_process(&self, name: &str, wait: bool) -> Result<(), SupervisorError> {
        self.call(
            "supervisor.startProcess",
            &[Value::from(name), Value::Bool(wait)],
        )
        .await
        .map(|_| ())
    }

    async fn stop_process(&self, name: &str, wait: bool) -> Result<(), SupervisorError> {
        self.call(
            "supervisor.stopProcess",
            &[Value::from(name), Value::Bool(wait)],
        )
        .await
        .map(|_| ())
    }

    async fn signal_process(&self, name: &str, signal: &Signal) -> Result<(), SupervisorError> {
        self.call(
            "supervisor.signalProcess",
            &[Value::from(name), signal.to_value()],
        )
        .await
        .map(|_| ())
    }

    async fn start_all(&self, wait: bool) -> Result<Vec<BulkStatus>, SupervisorError> {
        self.bulk("supervisor.startAllProcesses", wait).await
    }

    async fn stop_all(&self, wait: bool) -> Result<Vec<BulkStatus>, SupervisorError> {
        self.bulk("supervisor.stopAllProcesses", wait).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixListener;
    use tokio::task::JoinHandle;

    const STATE_RUNNING: &str = "<?xml version='1.0'?>
<methodResponse><params><param><value><struct>
<member><name>statecode</name><value><int>1</int></value></member>
<member><name>statename</name><value><string>RUNNING</string></value></member>
</struct></value></param></params></methodResponse>";

    const NOT_RUNNING: &str = "<?xml version='1.0'?>
<methodResponse><fault><value><struct>
<member><name>faultCode</name><value><int>70</int></value></member>
<member><name>faultString</name><value><string>NOT_RUNNING: app:web</string></value></member>
</struct></value></fault></methodResponse>";

    /// Serve one canned HTTP response on a fresh socket and hand back the raw request.
    fn serve_once(status: &str, body: &str) -> (TempDir, XmlRpcClient, JoinHandle<String>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supervisor.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !String::from_utf8_lossy(&request).contains("</methodCall>") {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "client closed before sending the call");
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8(request).unwrap()
        });

        (dir, XmlRpcClient::new(path), server)
    }

    #[tokio::test]
    async fn posts_the_call_to_rpc2() {
        let (_dir, client, server) = serve_once("200 OK", STATE_RUNNING);

        client.ping().await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /RPC2 HTTP/1.1\r\n"), "{request}");
        assert!(request.to_lowercase().contains("content-type: text/xml"));
        assert!(request.contains("<methodName>supervisor.getState</methodName>"));
    }

    #[tokio::test]
    async fn fault_body_maps_through_the_fault_table() {
        let (_dir, client, server) = serve_once("200 OK", NOT_RUNNING);

        let err = client.stop_process("app:web", true).await.unwrap_err();

        assert!(matches!(err, SupervisorError::NotRunning(_)), "got {err:?}");
        let request = server.await.unwrap();
        assert!(request.contains("<methodName>supervisor.stopProcess</methodName>"));
        assert!(request.contains("app:web"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_operation_failure() {
        let (_dir, client, server) = serve_once("500 Internal Server Error", "boom");

        let err = client.ping().await.unwrap_err();

        match err {
            SupervisorError::OperationFailed(message) => {
                assert!(message.contains("500"), "{message}");
                assert!(message.contains("boom"), "{message}");
            }
            other => panic!("expected an operation failure, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn missing_socket_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = XmlRpcClient::new(dir.path().join("absent.sock"));

        let err = client.ping().await.unwrap_err();
        assert!(err.is_connection(), "got {err:?}");
    }
}

use crate::config::BankEndpoint;
use crate::domain::frame::{FRAME_LEN, ensure_frame_shape};
use crate::domain::ports::BankTransport;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Upper bound on what is read while looking for the response frame.
pub const MAX_RESPONSE_BYTES: usize = 4096;

/// Talks to the bank over plain TCP.
///
/// The frame is written as 63 ASCII digits followed by `\n`. The response
/// frame is the first run of exactly 63 digits terminated by a non-digit byte
/// or by the end of the stream; any surrounding text is ignored.
#[derive(Debug, Clone)]
pub struct TcpBankTransport {
    endpoint: BankEndpoint,
}

impl TcpBankTransport {
    pub fn new(endpoint: BankEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &BankEndpoint {
        &self.endpoint
    }

    async fn round_trip(&self, addr: &str, frame: &str, sent: &mut bool) -> Result<String> {
        let mut stream =
            TcpStream::connect(addr)
                .await
                .map_err(|source| PaymentError::TransportConnect {
                    addr: addr.to_string(),
                    source,
                })?;

        let mut payload = Vec::with_capacity(FRAME_LEN + 1);
        payload.extend_from_slice(frame.as_bytes());
        payload.push(b'\n');
        stream
            .write_all(&payload)
            .await
            .map_err(|e| write_failed(addr, e))?;
        *sent = true;
        debug!(%addr, "frame written, awaiting response");

        let mut received = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| PaymentError::Protocol(format!("read from {addr} failed: {e}")))?;
            let eof = n == 0;
            received.extend_from_slice(&chunk[..n]);

            if let Some(found) = find_frame(&received, eof) {
                return Ok(found.to_string());
            }
            if eof || received.len() >= MAX_RESPONSE_BYTES {
                let preview = String::from_utf8_lossy(&received[..received.len().min(200)])
                    .trim()
                    .to_string();
                return Err(PaymentError::Protocol(format!(
                    "no {FRAME_LEN}-digit frame in {} bytes from {addr}: {preview:?}",
                    received.len()
                )));
            }
        }
    }
}

#[async_trait]
impl BankTransport for TcpBankTransport {
    async fn exchange(&self, frame: &str) -> Result<String> {
        ensure_frame_shape(frame)?;

        let addr = self.endpoint.address();
        let timeout = self.endpoint.timeout;
        let started = Instant::now();
        let mut sent = false;

        let outcome = tokio::time::timeout(timeout, self.round_trip(&addr, frame, &mut sent)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(response)) => {
                debug!(%addr, elapsed_ms, "bank responded");
                Ok(response)
            }
            Ok(Err(e)) => {
                warn!(%addr, elapsed_ms, error = %e, "bank exchange failed");
                Err(e)
            }
            Err(_) => {
                warn!(%addr, elapsed_ms, frame_sent = sent, "bank exchange timed out");
                Err(PaymentError::TransportTimeout {
                    addr,
                    timeout,
                    frame_sent: sent,
                })
            }
        }
    }
}

/// The bank was reachable, so part of the frame may have arrived.
fn write_failed(addr: &str, e: std::io::Error) -> PaymentError {
    PaymentError::Protocol(format!("write to {addr} failed: {e}"))
}

/// Finds the first run of exactly [`FRAME_LEN`] digits. A run touching the end
/// of `buf` only counts once the stream is closed, since more digits may follow.
pub fn find_frame(buf: &[u8], eof: bool) -> Option<&str> {
    let mut start = None;
    for (i, byte) in buf.iter().enumerate() {
        match (byte.is_ascii_digit(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s == FRAME_LEN {
                    return std::str::from_utf8(&buf[s..i]).ok();
                }
                start = None;
            }
            _ => {}
        }
    }
    match start {
        Some(s) if eof && buf.len() - s == FRAME_LEN => std::str::from_utf8(&buf[s..]).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    const FRAME: &str = "202505140930150104000101019902314950100000010000012345678901200";

    fn approved() -> String {
        format!("{}01", &FRAME[..61])
    }

    #[test]
    fn test_find_frame_with_newline() {
        let buf = format!("{}\n", approved());
        assert_eq!(find_frame(buf.as_bytes(), false), Some(approved().as_str()));
    }

    #[test]
    fn test_find_frame_skips_diagnostics() {
        let buf = format!("Conectando 1234...\nRESPUESTA_BANCO:{}\n", approved());
        assert_eq!(find_frame(buf.as_bytes(), false), Some(approved().as_str()));
    }

    #[test]
    fn test_find_frame_waits_for_terminator() {
        let buf = approved();
        assert_eq!(find_frame(buf.as_bytes(), false), None);
        assert_eq!(find_frame(buf.as_bytes(), true), Some(approved().as_str()));
    }

    #[test]
    fn test_find_frame_ignores_longer_runs() {
        let buf = format!("{}9\n", approved());
        assert_eq!(find_frame(buf.as_bytes(), true), None);
        assert_eq!(find_frame(b"error: bank offline\n", true), None);
    }

    #[test]
    fn test_write_failure_is_not_retryable() {
        let err = write_failed(
            "127.0.0.1:5000",
            std::io::Error::from(std::io::ErrorKind::BrokenPipe),
        );
        assert!(matches!(err, PaymentError::Protocol(_)));
        assert!(err.is_transport());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_frame_fails_before_connecting() {
        // Nothing listens on port 9; validation must win anyway.
        let transport = TcpBankTransport::new(BankEndpoint::new(
            "127.0.0.1",
            9,
            Duration::from_millis(100),
        ));
        let result = transport.exchange("123").await;
        assert!(matches!(
            result,
            Err(PaymentError::Validation { field: "frame", .. })
        ));
    }

    #[tokio::test]
    async fn test_exchange_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut line = String::new();
            tokio::io::BufReader::new(read)
                .read_line(&mut line)
                .await
                .unwrap();
            let reply = format!("{}01\n", &line.trim()[..61]);
            write.write_all(reply.as_bytes()).await.unwrap();
            line
        });

        let transport = TcpBankTransport::new(BankEndpoint::new(
            "127.0.0.1",
            port,
            Duration::from_secs(2),
        ));
        let response = transport.exchange(FRAME).await.unwrap();

        assert_eq!(response, approved());
        assert_eq!(server.await.unwrap(), format!("{FRAME}\n"));
    }
}

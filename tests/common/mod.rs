#![allow(dead_code)]

use bank_trama::config::BankEndpoint;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

pub const FRAME: &str = "202505140930150104000101019902314950100000010000012345678901200";

/// Replaces the status slot of `frame` with `status`.
pub fn with_status(frame: &str, status: &str) -> String {
    format!("{}{status}", &frame[..61])
}

/// Starts a bank on `127.0.0.1:0`. `reply` gets each request line (without
/// the newline) and returns what to write back; `None` keeps the connection
/// open without answering.
pub fn spawn_bank<F>(reply: F) -> SocketAddr
where
    F: Fn(&str) -> Option<String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let mut held: Vec<TcpStream> = Vec::new();
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut line = String::new();
            let Ok(read) = stream.try_clone() else { continue };
            if BufReader::new(read).read_line(&mut line).is_err() {
                continue;
            }
            match reply(line.trim_end()) {
                Some(answer) => {
                    let _ = stream.write_all(answer.as_bytes());
                }
                None => held.push(stream),
            }
        }
    });
    addr
}

/// A bank that answers every frame with the given status.
pub fn spawn_status_bank(status: &'static str) -> SocketAddr {
    spawn_bank(move |frame| frame.get(..61).map(|head| format!("{head}{status}\n")))
}

/// A bank that answers the n-th request with `statuses[n]` (last one repeats).
pub fn spawn_scripted_bank(statuses: &'static [&'static str]) -> SocketAddr {
    let calls = Arc::new(AtomicUsize::new(0));
    spawn_bank(move |frame| {
        let n = calls.fetch_add(1, Ordering::SeqCst).min(statuses.len() - 1);
        frame
            .get(..61)
            .map(|head| format!("{head}{}\n", statuses[n]))
    })
}

/// A bank that reads the frame and never answers.
pub fn spawn_silent_bank() -> SocketAddr {
    spawn_bank(|_| None)
}

/// An address nothing listens on.
pub fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub fn endpoint(addr: SocketAddr, timeout: Duration) -> BankEndpoint {
    BankEndpoint::new(addr.ip().to_string(), addr.port(), timeout)
}

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};

pub mod api;
pub mod routes;

pub use api::AppState;
pub use routes::{route_request, HttpResponse};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const BIND_ENV: &str = "SHINSEN_BIND";

const MAX_REQUEST_BYTES: usize = 1 << 20;

/// Bind address from `SHINSEN_BIND`, or [DEFAULT_BIND_ADDR].
pub fn bind_addr_from_env() -> String {
    std::env::var(BIND_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

pub fn run_server(bind_addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr)?;
    tracing::info!(
        units = state.catalog.unit_count(),
        skills = state.catalog.skill_count(),
        "shinsen server listening on http://{bind_addr}"
    );

    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                if let Err(err) = handle_connection(&state, &mut stream) {
                    tracing::warn!(error = %err, "request error");
                }
            }
            Err(err) => tracing::warn!(error = %err, "connection failed"),
        }
    }

    Ok(())
}

fn handle_connection(state: &AppState, stream: &mut TcpStream) -> io::Result<()> {
    let raw = read_request(stream)?;
    if raw.is_empty() {
        return Ok(());
    }

    let request = String::from_utf8_lossy(&raw);
    let mut lines = request.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut request_parts = request_line.split_whitespace();
    let method = request_parts.next().unwrap_or("GET");
    let path = request_parts.next().unwrap_or("/");

    let body = request
        .split_once("\r\n\r\n")
        .or_else(|| request.split_once("\n\n"))
        .map_or("", |(_, body)| body);

    let response = routes::route_request(state, method, path, body);
    tracing::debug!(method, path, status = response.status_code, "handled request");
    stream.write_all(response.to_http_string().as_bytes())?;
    stream.flush()?;
    Ok(())
}

/// Read one request: headers, then exactly `Content-Length` body bytes, which
/// may arrive over several reads.
fn read_request<R: Read>(stream: &mut R) -> io::Result<Vec<u8>> {
    let mut request = Vec::new();
    let mut chunk = [0_u8; 16_384];
    let mut expected = None;
    loop {
        if expected.is_some_and(|total| request.len() >= total) {
            break;
        }
        let bytes_read = stream.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..bytes_read]);
        if request.len() > MAX_REQUEST_BYTES {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "request too large"));
        }
        if expected.is_none() {
            if let Some(end) = header_end(&request) {
                expected = Some(end + content_length(&request[..end]));
            }
        }
    }
    Ok(request)
}

/// Offset of the first body byte, if the header block is complete.
fn header_end(request: &[u8]) -> Option<usize> {
    find(request, b"\r\n\r\n")
        .map(|at| at + 4)
        .or_else(|| find(request, b"\n\n").map(|at| at + 2))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

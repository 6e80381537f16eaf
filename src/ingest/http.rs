use std::collections::HashMap;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::HttpError;

const MAX_REQUEST_BYTES: usize = 1024 * 1024;
const MAX_LINE_BYTES: usize = 4096;

#[derive(Debug)]
pub(super) struct HttpRequest {
    pub(super) method: String,
    pub(super) path: String,
    pub(super) headers: HashMap<String, String>,
    pub(super) body: Vec<u8>,
}

impl HttpRequest {
    /// Header lookup; names are stored lowercased.
    pub(super) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

pub(super) async fn read_http_request<S>(socket: &mut S) -> Result<HttpRequest, HttpError>
where
    S: AsyncRead + Unpin,
{
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let header_end = loop {
        read_more(socket, &mut buffer).await?;
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(HttpError::RequestTooLarge);
        }
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
    };

    let header_bytes = buffer.get(..header_end).ok_or(HttpError::MalformedHeaders)?;
    let header_text = std::str::from_utf8(header_bytes)
        .map_err(|err| HttpError::InvalidEncoding { source: err })?;
    let mut lines = header_text.split("\r\n");
    let request_line = lines.next().ok_or(HttpError::MissingRequestLine)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or(HttpError::MissingMethod)?;
    let path = parts.next().ok_or(HttpError::MissingPath)?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(HttpError::MalformedHeader);
        };
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    let body_start = header_end
        .checked_add(4)
        .ok_or(HttpError::MalformedHeaders)?;
    let pending = buffer.get(body_start..).unwrap_or_default().to_vec();
    let body = match headers.get("transfer-encoding") {
        Some(encoding) if is_chunked(encoding) => read_chunked_body(socket, pending).await?,
        Some(encoding) => {
            return Err(HttpError::UnsupportedTransferEncoding {
                encoding: encoding.clone(),
            });
        }
        None => read_sized_body(socket, pending, &headers).await?,
    };

    Ok(HttpRequest {
        method: method.to_owned(),
        path: path.to_owned(),
        headers,
        body,
    })
}

/// Appends the next read to `buffer`; a closed connection is an error.
async fn read_more<S>(socket: &mut S, buffer: &mut Vec<u8>) -> Result<(), HttpError>
where
    S: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 1024];
    let bytes = socket
        .read(&mut chunk)
        .await
        .map_err(|err| HttpError::ReadRequest { source: err })?;
    if bytes == 0 {
        return Err(if buffer.is_empty() {
            HttpError::EmptyRequest
        } else {
            HttpError::IncompleteRequest
        });
    }
    let read_slice = chunk.get(..bytes).ok_or(HttpError::MalformedHeaders)?;
    buffer.extend_from_slice(read_slice);
    Ok(())
}

async fn read_sized_body<S>(
    socket: &mut S,
    mut body: Vec<u8>,
    headers: &HashMap<String, String>,
) -> Result<Vec<u8>, HttpError>
where
    S: AsyncRead + Unpin,
{
    let content_length = headers
        .get("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    if content_length > MAX_REQUEST_BYTES {
        return Err(HttpError::RequestTooLarge);
    }
    while body.len() < content_length {
        if let Err(err) = read_more(socket, &mut body).await {
            if matches!(err, HttpError::EmptyRequest | HttpError::IncompleteRequest) {
                break;
            }
            return Err(err);
        }
    }
    body.truncate(content_length);
    Ok(body)
}

/// `chunked` must be the last transfer coding applied.
fn is_chunked(encoding: &str) -> bool {
    encoding
        .rsplit(',')
        .next()
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

/// Decodes a chunked body. `pending` holds bytes already read past the
/// header block. Chunk extensions and trailers are discarded.
async fn read_chunked_body<S>(socket: &mut S, mut pending: Vec<u8>) -> Result<Vec<u8>, HttpError>
where
    S: AsyncRead + Unpin,
{
    let mut body = Vec::new();
    loop {
        let size_line = read_line(socket, &mut pending).await?;
        let size_text = size_line
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        let size = usize::from_str_radix(size_text, 16)
            .map_err(|err| HttpError::InvalidChunkSize { source: err })?;

        if size == 0 {
            while !read_line(socket, &mut pending).await?.is_empty() {}
            return Ok(body);
        }
        if body.len().saturating_add(size) > MAX_REQUEST_BYTES {
            return Err(HttpError::RequestTooLarge);
        }

        let chunk_end = size.checked_add(2).ok_or(HttpError::RequestTooLarge)?;
        while pending.len() < chunk_end {
            read_more(socket, &mut pending).await?;
        }
        let data = pending.get(..size).ok_or(HttpError::MalformedChunk)?;
        body.extend_from_slice(data);
        if pending.get(size..chunk_end) != Some(b"\r\n".as_slice()) {
            return Err(HttpError::MalformedChunk);
        }
        pending.drain(..chunk_end);
    }
}

/// Removes one CRLF-terminated line from `pending`, reading more as needed.
async fn read_line<S>(socket: &mut S, pending: &mut Vec<u8>) -> Result<String, HttpError>
where
    S: AsyncRead + Unpin,
{
    loop {
        if let Some(pos) = pending.windows(2).position(|window| window == b"\r\n") {
            let line = pending.get(..pos).ok_or(HttpError::MalformedChunk)?;
            let text = std::str::from_utf8(line)
                .map_err(|err| HttpError::InvalidEncoding { source: err })?
                .to_owned();
            pending.drain(..pos.saturating_add(2));
            return Ok(text);
        }
        if pending.len() > MAX_LINE_BYTES {
            return Err(HttpError::MalformedChunk);
        }
        read_more(socket, pending).await?;
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

pub(super) const fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        501 => "Not Implemented",
        _ => "Internal Server Error",
    }
}

/// Writes a plain-text response whose body is the reason phrase.
pub(super) async fn write_response(socket: &mut TcpStream, status: u16) -> Result<(), HttpError> {
    let body = status_text(status);
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body,
        body.len(),
        body
    );
    socket
        .write_all(response.as_bytes())
        .await
        .map_err(|err| HttpError::Io {
            context: "write response",
            source: err,
        })?;
    socket.flush().await.map_err(|err| HttpError::Io {
        context: "flush response",
        source: err,
    })
}

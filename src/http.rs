//! Hand-rolled HTTP framing: request extraction and fixed-format responses
//!
//! Not a general HTTP implementation. Requests are framed by scanning a raw
//! byte queue for the header terminator and reading a single
//! `Content-Length` field; responses use one fixed status-line and header
//! layout. Chunked transfer, additional headers and TLS are out of scope.

pub const STATUS_OK: &str = "200 OK";
pub const STATUS_BAD_REQUEST: &str = "400 Bad Request";
pub const STATUS_NOT_FOUND: &str = "404 Not Found";
pub const STATUS_TEAPOT: &str = "418 I'm a teapot";

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const LINE_BREAK: &str = "\r\n";
const CONTENT_LENGTH_FIELD: &str = "Content-Length: ";

/// One parsed request head
///
/// After a successful parse the byte queue begins at the request body;
/// `content_length` says how many body bytes must arrive before the request
/// can be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub resource: String,
    pub content_length: usize,
}

/// Extracts one request head from the front of the byte queue
///
/// Returns `None` and leaves the queue untouched while the header terminator
/// has not arrived yet; the caller retries next tick once more bytes are in.
/// On success every header byte is drained and the queue starts at the body.
pub fn parse_request(queue: &mut Vec<u8>) -> Option<RequestHead> {
    let header_end = find(queue, HEADER_TERMINATOR)?;
    let body_start = header_end + HEADER_TERMINATOR.len();

    // Headers are ASCII in practice; lossy conversion keeps invalid bytes
    // from stalling the queue.
    let header = String::from_utf8_lossy(&queue[..header_end]);

    let start_line = header.lines().next().unwrap_or("");
    let mut fields = start_line.splitn(3, ' ');
    let method = fields.next().unwrap_or("").to_string();
    let resource = fields.next().unwrap_or("").to_string();

    // Only Content-Length is read, matched case-sensitively against the
    // header block after the start line. Absent or unparseable means zero.
    let header_block = match header.find(LINE_BREAK) {
        Some(pos) => &header[pos + LINE_BREAK.len()..],
        None => "",
    };
    let content_length = header_block
        .find(CONTENT_LENGTH_FIELD)
        .and_then(|start| {
            let value = &header_block[start + CONTENT_LENGTH_FIELD.len()..];
            let value = value.split(LINE_BREAK).next().unwrap_or("");
            value.trim().parse().ok()
        })
        .unwrap_or(0);

    queue.drain(..body_start);

    Some(RequestHead {
        method,
        resource,
        content_length,
    })
}

/// Builds a zero-length response with the given status
pub fn empty_response(status: &str) -> Vec<u8> {
    format!(
        "HTTP/1.0 {status}\r\n\
         Content-Length: 0\r\n\
         Connection: keep-alive\r\n\
         \r\n"
    )
    .into_bytes()
}

/// Builds the `200 OK` response carrying the bootstrap page
pub fn html_response(body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.0 {STATUS_OK}\r\n\
         Content-Length: {}\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Connection: keep-alive\r\n\
         \r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

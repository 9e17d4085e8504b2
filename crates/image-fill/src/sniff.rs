/// MIME type of `bytes` judged by their magic number.
///
/// Unknown content is reported as `application/octet-stream`.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

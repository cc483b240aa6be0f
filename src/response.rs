/// Transport-agnostic view over an HTTP response: a status code and the raw
/// body bytes. The wrappers in this crate never issue requests themselves,
/// they only consume a response some client already obtained; implement this
/// trait for that client's response type, or buffer the response into a
/// [`BufferedResponse`].
pub trait RawResponse {
    fn status_code(&self) -> u16;
    fn body(&self) -> &[u8];
}

/// A response held entirely in memory, decoupled from any HTTP client.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    status_code: u16,
    body: Vec<u8>,
}

impl BufferedResponse {
    pub fn new(status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        BufferedResponse {
            status_code,
            body: body.into(),
        }
    }
}

impl RawResponse for BufferedResponse {
    fn status_code(&self) -> u16 {
        self.status_code
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(feature = "reqwest")]
impl TryFrom<reqwest::blocking::Response> for BufferedResponse {
    type Error = reqwest::Error;

    fn try_from(response: reqwest::blocking::Response) -> Result<Self, Self::Error> {
        let status_code = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(BufferedResponse { status_code, body })
    }
}

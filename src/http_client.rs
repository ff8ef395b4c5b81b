use http::{Request, Response};

#[derive(thiserror::Error, Debug)]
pub enum HttpClientError {
    /// Represents an http transport crate error.
    #[error("HTTP Transport error: `{0}`")]
    TransportError(String),
    /// Represents an unexpected response.
    #[error("invalid http response: `{0}`")]
    InvalidResponse(String),
}

/// A synchronous trait for the outbound HTTP calls (token endpoint, spreadsheet API).
pub trait HttpClient {
    /// Sends a request. The method and url are defined inside the Request.
    fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError>;
}

// Accept closures as HttpClient implementations
impl<F> HttpClient for F
where
    F: Fn(Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError>,
{
    fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError> {
        self(req)
    }
}

#[cfg(test)]
pub(crate) mod tests {

    use super::*;

    use mockall::mock;

    mock! {
        pub HttpClient {}

        impl HttpClient for HttpClient {
            fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError>;
        }
    }

    /// Builds a response with the given status and body, as a mocked client would return it.
    pub(crate) fn response(status: u16, body: &str) -> Response<Vec<u8>> {
        Response::builder()
            .status(status)
            .body(body.as_bytes().to_vec())
            .unwrap()
    }

    #[test]
    fn closures_are_http_clients() {
        let client = |req: Request<Vec<u8>>| {
            assert_eq!(req.uri(), "https://example.com/");
            Ok::<_, HttpClientError>(response(204, ""))
        };

        let request = Request::get("https://example.com/").body(Vec::new()).unwrap();
        let res = client.send(request).unwrap();

        assert_eq!(res.status(), 204);
    }
}

//! In-memory transport that answers from a queue.

use std::cell::RefCell;
use std::collections::VecDeque;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode, Version};

use crate::{HttpError, Request, Response, Transport};

enum Reply {
    Answer {
        status: StatusCode,
        content_type: &'static str,
        body: Bytes,
    },
    Error(HttpError),
}

/// Answers requests with queued replies, in order, and records every
/// request it sees. An empty queue answers with a connection failure.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Reply>>,
    requests: RefCell<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON answer.
    pub fn push_json(&self, status: u16, body: impl Into<String>) -> &Self {
        self.push_body(status, "application/json", body)
    }

    /// Queue an answer with an arbitrary content type.
    pub fn push_body(
        &self,
        status: u16,
        content_type: &'static str,
        body: impl Into<String>,
    ) -> &Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.replies.borrow_mut().push_back(Reply::Answer {
            status,
            content_type,
            body: Bytes::from(body.into()),
        });
        self
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: HttpError) -> &Self {
        self.replies.borrow_mut().push_back(Reply::Error(error));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    async fn fetch(&self, request: Request) -> Result<Response, HttpError> {
        request.validate()?;
        let url = request.url.clone();
        self.requests.borrow_mut().push(request);

        let reply = self.replies.borrow_mut().pop_front();
        match reply {
            Some(Reply::Answer {
                status,
                content_type,
                body,
            }) => {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
                Ok(Response {
                    status,
                    version: Version::HTTP_11,
                    headers,
                    body,
                    url,
                })
            }
            Some(Reply::Error(error)) => Err(error),
            None => Err(HttpError::ConnectionFailed(format!(
                "no scripted reply for {}",
                url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use url::Url;

    fn post() -> Request {
        Request::new(
            Method::POST,
            Url::parse("https://api.example/entry").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_replies_in_order() {
        let transport = ScriptedTransport::new();
        transport
            .push_json(200, r#"{"success":true}"#)
            .push_error(HttpError::Timeout);

        let first = transport.fetch(post()).await.unwrap();
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.content_type(), Some("application/json"));

        assert!(matches!(
            transport.fetch(post()).await,
            Err(HttpError::Timeout)
        ));
        assert!(matches!(
            transport.fetch(post()).await,
            Err(HttpError::ConnectionFailed(_))
        ));
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(transport.remaining(), 0);
    }

    #[tokio::test]
    async fn test_refused_requests_are_not_recorded() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, "{}");

        let get_with_body = Request::new(Method::GET, Url::parse("https://api.example/").unwrap())
            .body("x");
        assert!(matches!(
            transport.fetch(get_with_body).await,
            Err(HttpError::InvalidRequest(_))
        ));
        assert!(transport.requests().is_empty());
        assert_eq!(transport.remaining(), 1);
    }
}

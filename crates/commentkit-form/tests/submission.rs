//! End-to-end submission flows against a scripted endpoint.

use std::rc::Rc;

use commentkit_common::config::DEFAULT_ERROR_MESSAGE;
use commentkit_common::FormConfig;
use commentkit_dom::{Document, DomEvent, RecordingDialogs};
use commentkit_form::{CountingCaptcha, SubmissionHandler, SubmitOutcome};
use commentkit_http::{HttpError, RequestMode, ScriptedTransport};
use http::Method;
use serde_json::json;

const PAGE: &str = r##"<!DOCTYPE html>
<html><head><title>Hello World</title></head><body>
<article>
  <div id="respond">
    <form id="new_comment" class="js-comment-form" method="post"
          action="https://api.staticman.example/v2/entry/owner/blog/main/comments">
      <input type="hidden" id="comment-replying-to" name="fields[replying_to]" value="">
      <input type="hidden" id="comment-post-slug" name="options[slug]" value="hello-world">
      <input type="text" id="comment-form-name" name="fields[name]" value="">
      <input type="email" id="comment-form-email" name="fields[email]" value="">
      <textarea id="comment-form-message" name="fields[message]"></textarea>
      <input type="checkbox" id="comment-form-notify" name="options[subscribe]" value="email">
      <input type="text" name="fields[nickname]" value="skip" disabled>
      <button type="submit" id="comment-form-submit">Submit</button>
    </form>
    <div id="success-message" class="notice hide">
      Thanks! Your comment is awaiting moderation.
      <a href="#" id="close-message">Close</a>
    </div>
  </div>
</article>
</body></html>"##;

struct Page {
    doc: Rc<Document>,
    transport: Rc<ScriptedTransport>,
    dialogs: Rc<RecordingDialogs>,
    captcha: Rc<CountingCaptcha>,
    handler: Rc<SubmissionHandler<Rc<ScriptedTransport>>>,
}

impl Page {
    fn load() -> Self {
        let doc = Rc::new(
            Document::parse_html_with_url(PAGE, "https://blog.example/2024/hello-world/")
                .unwrap(),
        );
        let transport = Rc::new(ScriptedTransport::new());
        let dialogs = Rc::new(RecordingDialogs::new());
        let captcha = Rc::new(CountingCaptcha::new());

        let handler = Rc::new(
            SubmissionHandler::bind(doc.clone(), FormConfig::default(), transport.clone())
                .unwrap()
                .with_dialogs(dialogs.clone())
                .with_captcha(captcha.clone()),
        );
        handler.install();

        Self {
            doc,
            transport,
            dialogs,
            captcha,
            handler,
        }
    }

    fn fill(&self, id: &str, value: &str) {
        self.doc.get_element_by_id(id).unwrap().set_value(value).unwrap();
    }

    fn fill_comment(&self) {
        self.fill("comment-form-name", "Ada");
        self.fill("comment-form-email", "ada@example.com");
        self.fill("comment-form-message", "Great post!");
    }

    fn value(&self, id: &str) -> String {
        self.doc.get_element_by_id(id).unwrap().value()
    }

    fn success_hidden(&self) -> bool {
        self.handler.ui().success_message.has_class("hide")
    }

    fn button_label(&self) -> String {
        self.handler.ui().submit_button.text_content()
    }
}

#[tokio::test]
async fn accepted_comment_shows_message_and_resets_form() {
    let page = Page::load();
    page.fill_comment();
    page.transport.push_json(200, r#"{"success":true}"#);

    let outcome = page.handler.submit().await.unwrap();

    assert!(outcome.is_accepted());
    assert!(!page.success_hidden());
    assert_eq!(page.value("comment-form-name"), "");
    assert_eq!(page.value("comment-form-message"), "");
    assert!(!page.handler.is_busy());
    assert_eq!(page.button_label(), "Submit");
    assert_eq!(page.captcha.resets(), 1);
    assert!(page.dialogs.alerts().is_empty());
}

#[tokio::test]
async fn request_is_nested_json_in_cors_mode() {
    let page = Page::load();
    page.fill_comment();
    page.doc
        .get_element_by_id("comment-form-notify")
        .unwrap()
        .set_checked(true);
    page.transport.push_json(200, r#"{"success":true}"#);

    page.handler.submit().await.unwrap();

    let requests = page.transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(
        request.url.as_str(),
        "https://api.staticman.example/v2/entry/owner/blog/main/comments"
    );
    assert_eq!(request.mode, RequestMode::Cors);
    assert_eq!(
        request.headers.get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(
        request.origin.as_ref().unwrap().ascii_serialization(),
        "https://blog.example"
    );

    let body: serde_json::Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
    assert_eq!(
        body,
        json!({
            "fields": {
                "replying_to": "",
                "name": "Ada",
                "email": "ada@example.com",
                "message": "Great post!"
            },
            "options": {"slug": "hello-world", "subscribe": "email"}
        })
    );
}

#[tokio::test]
async fn rejected_comment_alerts_and_keeps_input() {
    let page = Page::load();
    page.fill_comment();
    page.transport.push_json(
        500,
        r#"{"success":false,"errorCode":"GITHUB_CREATING_PR","message":"Bad credentials"}"#,
    );

    let outcome = page.handler.submit().await.unwrap();

    match outcome {
        SubmitOutcome::Rejected {
            error_code,
            message,
        } => {
            assert_eq!(error_code.as_deref(), Some("GITHUB_CREATING_PR"));
            assert_eq!(message.as_deref(), Some("Bad credentials"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(page.success_hidden());
    assert_eq!(page.value("comment-form-name"), "Ada");
    assert_eq!(page.dialogs.alerts(), vec![DEFAULT_ERROR_MESSAGE]);
    assert!(!page.handler.is_busy());
    assert_eq!(page.button_label(), "Submit");
    assert_eq!(page.captcha.resets(), 1);
}

#[tokio::test]
async fn success_field_is_judged_by_truthiness() {
    for (body, accepted) in [
        (r#"{"success":1}"#, true),
        (r#"{"success":"yes"}"#, true),
        (r#"{"success":0}"#, false),
        (r#"{"success":""}"#, false),
        (r#"{"success":null}"#, false),
        (r#"{}"#, false),
    ] {
        let page = Page::load();
        page.transport.push_json(200, body);
        let outcome = page.handler.submit().await.unwrap();
        assert_eq!(outcome.is_accepted(), accepted, "{body}");
        assert_eq!(page.dialogs.alerts().is_empty(), accepted, "{body}");
    }
}

#[tokio::test]
async fn network_failure_is_reported_like_a_rejection() {
    let page = Page::load();
    page.fill_comment();
    page.transport
        .push_error(HttpError::ConnectionFailed("connection refused".to_string()));

    let outcome = page.handler.submit().await.unwrap();

    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert_eq!(page.dialogs.alerts(), vec![DEFAULT_ERROR_MESSAGE]);
    assert!(page.success_hidden());
    assert!(!page.handler.is_busy());
    assert_eq!(page.captcha.resets(), 1);
}

#[tokio::test]
async fn html_error_page_is_a_failure() {
    let page = Page::load();
    page.transport
        .push_body(502, "text/html", "<h1>Bad Gateway</h1>");

    let outcome = page.handler.submit().await.unwrap();
    match outcome {
        SubmitOutcome::Failed(e) => assert_eq!(e.category(), "network"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(page.dialogs.alerts().len(), 1);
}

#[tokio::test]
async fn button_is_locked_while_request_is_pending() {
    let page = Page::load();
    page.transport.push_json(200, r#"{"success":true}"#);

    let form = page.handler.ui().form.clone();
    let mut event = DomEvent::submit();
    let allowed = page.doc.dispatch_event(&form, &mut event);

    assert!(!allowed, "navigation must be prevented");
    assert!(page.handler.is_busy());
    assert_eq!(page.button_label(), "Please wait...");
    // a second submit is refused while the first is pending
    assert!(page.handler.submit().await.is_none());
    assert!(!page.doc.click(&page.handler.ui().submit_button));

    let outcome = page.handler.send().await.unwrap();
    assert!(outcome.is_accepted());
    assert!(!page.handler.is_busy());
    assert_eq!(page.button_label(), "Submit");
    assert_eq!(page.transport.requests().len(), 1);

    // nothing left to send
    assert!(page.handler.send().await.is_none());
}

#[tokio::test]
async fn get_form_with_body_fails_before_sending() {
    let page = Page::load();
    page.handler
        .ui()
        .form
        .set_attribute("method", "get")
        .unwrap();
    page.transport.push_json(200, r#"{"success":true}"#);

    let outcome = page.handler.submit().await.unwrap();

    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert!(page.transport.requests().is_empty());
    assert_eq!(page.transport.remaining(), 1);
    assert_eq!(page.dialogs.alerts().len(), 1);
    assert!(!page.handler.is_busy());
}

#[tokio::test]
async fn close_button_hides_success_message() {
    let page = Page::load();
    page.transport.push_json(200, r#"{"success":true}"#);
    page.handler.submit().await.unwrap();
    assert!(!page.success_hidden());

    let close = page.doc.get_element_by_id("close-message").unwrap();
    page.doc.click(&close);

    assert!(page.success_hidden());
    // other classes survive
    assert!(page.handler.ui().success_message.has_class("notice"));
}

#[tokio::test]
async fn captcha_is_optional() {
    let doc = Rc::new(Document::parse_html_with_url(PAGE, "https://blog.example/").unwrap());
    let transport = Rc::new(ScriptedTransport::new());
    transport.push_json(200, r#"{"success":false}"#);
    let handler = Rc::new(
        SubmissionHandler::bind(doc, FormConfig::default(), transport)
            .unwrap()
            .with_dialogs(RecordingDialogs::new()),
    );
    handler.install();

    let outcome = handler.submit().await.unwrap();
    assert!(!outcome.is_accepted());
    assert!(!handler.has_captcha());
    assert!(!handler.is_busy());
}

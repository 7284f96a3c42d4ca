use std::io::Read;
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use reqwest::blocking::Client as HttpClient;
use tabnews_tui::tabnews::{Client, ClientConfig, SourceError, Strategy, Token};
use tiny_http::{Header, Method, Response, Server};

struct Recorded {
    method: String,
    url: String,
    authorization: Option<String>,
    body: String,
}

/// Serves `routes` (path+query -> (status, body)) and reports each request.
fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> (String, mpsc::Receiver<Recorded>) {
    let server = Server::http("127.0.0.1:0").expect("bind mock server");
    let port = server
        .server_addr()
        .to_ip()
        .expect("ip listener")
        .port();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let authorization = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Authorization"))
                .map(|header| header.value.to_string());
            let url = request.url().to_string();
            let method = match request.method() {
                Method::Get => "GET".to_string(),
                Method::Post => "POST".to_string(),
                other => other.to_string(),
            };
            let (status, payload) = routes
                .iter()
                .find(|(path, _, _)| *path == url)
                .map(|(_, status, payload)| (*status, *payload))
                .unwrap_or((404, r#"{"message":"not found"}"#));
            let _ = tx.send(Recorded {
                method,
                url,
                authorization,
                body,
            });
            let header = Header::from_bytes("Content-Type", "application/json").unwrap();
            let response = Response::from_string(payload)
                .with_status_code(status)
                .with_header(header);
            let _ = request.respond(response);
        }
    });
    (format!("http://127.0.0.1:{port}/api/v1"), rx)
}

fn client(base_url: String, token: Option<&str>) -> Client {
    Client::new(ClientConfig {
        user_agent: "tabnews-tui-test".into(),
        base_url: Some(base_url),
        token: token.map(str::to_string),
        timeout: None,
        http_client: Some(HttpClient::builder().no_proxy().build().unwrap()),
    })
    .unwrap()
}

#[test]
fn lists_contents_with_paging_query() {
    let (base, rx) = serve(vec![(
        "/api/v1/contents?page=2&per_page=5&strategy=new",
        200,
        r#"[{"title":"Hello","slug":"hello","owner_username":"joe","tabcoins":4}]"#,
    )]);
    let items = client(base, None)
        .list_contents(2, 5, Strategy::New)
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].slug, "hello");
    assert_eq!(items[0].tabcoins, 4);

    let recorded = rx.recv().unwrap();
    assert_eq!(recorded.method, "GET");
    assert!(recorded.authorization.is_none());
}

#[test]
fn lists_user_contents() {
    let (base, _rx) = serve(vec![(
        "/api/v1/contents/joe?page=1&per_page=10&strategy=relevant",
        200,
        r#"[{"title":"Mine","slug":"mine","owner_username":"joe"}]"#,
    )]);
    let items = client(base, None)
        .list_user_contents("joe", 1, 10, Strategy::Relevant)
        .unwrap();
    assert_eq!(items[0].title, "Mine");
}

#[test]
fn out_of_range_page_is_empty_list() {
    let (base, _rx) = serve(vec![(
        "/api/v1/contents?page=999&per_page=10&strategy=relevant",
        200,
        "[]",
    )]);
    let items = client(base, None)
        .list_contents(999, 10, Strategy::Relevant)
        .unwrap();
    assert!(items.is_empty());
}

#[test]
fn fetches_content_and_comments_with_token() {
    let (base, rx) = serve(vec![
        (
            "/api/v1/contents/joe/hello",
            200,
            r##"{"title":"Hello","body":"# Hi","owner_username":"joe","status":"published"}"##,
        ),
        (
            "/api/v1/contents/joe/hello/children",
            200,
            r#"[{"body":"nice","owner_username":"ann","children":[{"body":"thanks","owner_username":"joe"}]}]"#,
        ),
    ]);
    let client = client(base, Some("abc123"));
    let detail = client.get_content("joe", "hello").unwrap();
    assert_eq!(detail.title, "Hello");
    assert_eq!(detail.body, "# Hi");

    let comments = client.get_comments("joe", "hello").unwrap();
    assert_eq!(comments[0].owner_username, "ann");
    assert_eq!(comments[0].children[0].body, "thanks");

    for _ in 0..2 {
        let recorded = rx.recv().unwrap();
        assert_eq!(recorded.authorization.as_deref(), Some("Bearer abc123"));
    }
}

#[test]
fn non_success_status_is_http_error() {
    let (base, _rx) = serve(vec![]);
    let err = client(base, None).get_content("joe", "missing").unwrap_err();
    assert_eq!(err, SourceError::Http { status: 404 });
}

#[test]
fn malformed_payload_is_decode_error() {
    let (base, _rx) = serve(vec![("/api/v1/contents/joe/hello", 200, "not json")]);
    let err = client(base, None).get_content("joe", "hello").unwrap_err();
    assert!(matches!(err, SourceError::Decode(_)));
}

#[test]
fn unreachable_endpoint_is_network_error() {
    // Bind then drop to get a port with nothing listening.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = client(format!("http://127.0.0.1:{port}/api/v1"), None)
        .list_contents(1, 10, Strategy::Relevant)
        .unwrap_err();
    assert!(matches!(err, SourceError::Network(_)));
}

#[test]
fn login_posts_credentials_and_returns_token() {
    let (base, rx) = serve(vec![("/api/v1/sessions", 201, r#"{"token":"tok-1"}"#)]);
    let token = client(base, None).login("me@example.com", "hunter2").unwrap();
    assert_eq!(token, Token("tok-1".into()));

    let recorded = rx.recv().unwrap();
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.url, "/api/v1/sessions");
    let body: serde_json::Value = serde_json::from_str(&recorded.body).unwrap();
    assert_eq!(body["email"], "me@example.com");
    assert_eq!(body["password"], "hunter2");
}

#[test]
fn failed_login_leaves_client_unauthenticated() {
    let (base, _rx) = serve(vec![("/api/v1/sessions", 401, r#"{"message":"nope"}"#)]);
    let mut client = client(base, None);
    assert!(!tabnews_tui::app::try_login(&mut client, "me@example.com", "wrong"));
    assert!(!client.is_authenticated());
}

use std::collections::HashMap;

use tinyweb::http::request::Request;

fn request_with(version: &str, headers: &[(&str, &str)]) -> Request {
    Request {
        method: "GET".to_string(),
        path: "/index.html".to_string(),
        version: version.to_string(),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..Default::default()
    }
}

#[test]
fn test_request_header_retrieval() {
    let req = request_with("1.1", &[("Host", "example.com"), ("Accept", "*/*")]);

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("Accept"), Some("*/*"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_header_lookup_is_case_sensitive() {
    let req = request_with("1.1", &[("Content-Type", "text/html")]);

    assert_eq!(req.header("content-type"), None);
}

#[test]
fn test_request_keep_alive() {
    assert!(request_with("1.1", &[("Connection", "keep-alive")]).is_keep_alive());
    assert!(!request_with("1.1", &[("Connection", "close")]).is_keep_alive());
    assert!(!request_with("1.0", &[("Connection", "keep-alive")]).is_keep_alive());
    assert!(!request_with("1.1", &[]).is_keep_alive());
}

#[test]
fn test_request_form_value() {
    let mut form = HashMap::new();
    form.insert("username".to_string(), "alice".to_string());
    let req = Request {
        form,
        ..Default::default()
    };

    assert_eq!(req.form_value("username"), "alice");
    assert_eq!(req.form_value("password"), "");
}

use gatehouse::http::response::{Response, ResponseBuilder, StatusCode};
use gatehouse::http::writer::serialize_response;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::Created.as_u16(), 201);
    assert_eq!(StatusCode::NoContent.as_u16(), 204);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
    assert_eq!(StatusCode::Other(418).as_u16(), 418);
}

#[test]
fn test_status_code_from_u16() {
    for code in [101, 200, 204, 304, 400, 404, 431, 500, 502, 505] {
        assert_eq!(StatusCode::from_u16(code).as_u16(), code);
        assert!(!matches!(StatusCode::from_u16(code), StatusCode::Other(_)));
    }
    assert_eq!(StatusCode::from_u16(599), StatusCode::Other(599));
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        "Internal Server Error"
    );
    assert_eq!(StatusCode::Other(299).reason_phrase(), "Unknown");
}

#[test]
fn test_response_builder_with_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("content-type", "text/plain")
        .header("x-custom", "value")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(response.header("x-custom"), Some("value"));
    assert_eq!(response.headers.len(), 3); // 2 custom + content-length
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(body.clone())
        .build();

    assert_eq!(response.header("content-length"), Some(body.len().to_string().as_str()));
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("content-length", "999")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.header("content-length"), Some("999"));
}

#[test]
fn test_response_builder_no_length_for_bodyless_status() {
    let response = ResponseBuilder::new(StatusCode::NoContent).build();

    assert_eq!(response.body.len(), 0);
    assert_eq!(response.header("content-length"), None);
}

#[test]
fn test_response_error_page() {
    let response = Response::error(StatusCode::BadRequest);

    assert_eq!(response.status, StatusCode::BadRequest);
    assert_eq!(response.body, b"400 Bad Request".to_vec());
    assert_eq!(response.header("content-type"), Some("text/plain"));
}

#[test]
fn test_response_helpers() {
    assert_eq!(Response::ok(b"test content".to_vec()).status, StatusCode::Ok);
    assert_eq!(
        Response::error(StatusCode::InternalServerError).body,
        b"500 Internal Server Error".to_vec()
    );
    assert_eq!(
        Response::error(StatusCode::PayloadTooLarge).body,
        b"413 Payload Too Large".to_vec()
    );
}

#[test]
fn test_serialize_response() {
    let response = ResponseBuilder::new(StatusCode::NotFound)
        .body(b"gone".to_vec())
        .build();
    let bytes = serialize_response(&response);
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(text.contains("content-length: 4\r\n"));
    assert!(text.ends_with("\r\n\r\ngone"));
}

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use dnivault_core::config::{RegistryConfig, SecretString};
use dnivault_core::registry::{IdentitySource, RegistryClient};
use dnivault_core::VaultError;

fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
}

fn success_body() -> String {
    r#"{"success":true,"data":{"nombres":"ANA","apellido_paterno":"PEREZ","apellido_materno":"LOPEZ"}}"#
        .to_string()
}

/// Serve one canned response per connection, counting hits.
async fn spawn_server(responses: Vec<String>) -> (String, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            counter.fetch_add(1, Ordering::SeqCst);

            // Drain the request head before answering.
            let mut buf = vec![0u8; 4096];
            let mut filled = 0;
            loop {
                let n = socket.read(&mut buf[filled..]).await.unwrap();
                if n == 0 {
                    break;
                }
                filled += n;
                if buf[..filled].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    });

    (format!("http://{}", addr), hits)
}

fn client(base_url: &str) -> RegistryClient {
    let config = RegistryConfig::new(base_url, SecretString::from("test-token".to_string()))
        .unwrap()
        .with_retries(2)
        .with_base_delay(Duration::from_millis(1))
        .with_timeout(Duration::from_secs(2));
    RegistryClient::new(config).unwrap()
}

#[tokio::test]
async fn test_server_errors_retried_then_success() {
    let (base_url, hits) = spawn_server(vec![
        http_response("500 Internal Server Error", "{}"),
        http_response("500 Internal Server Error", "{}"),
        http_response("200 OK", &success_body()),
    ])
    .await;

    let identity = client(&base_url).fetch("12345678").await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(identity.full_name, "ANA PEREZ LOPEZ");
    assert_eq!(identity.dni, "12345678");
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let (base_url, hits) = spawn_server(vec![
        http_response("503 Service Unavailable", "{}"),
        http_response("503 Service Unavailable", "{}"),
        http_response("503 Service Unavailable", "{}"),
    ])
    .await;

    let result = client(&base_url).fetch("12345678").await;

    assert!(matches!(result, Err(VaultError::Upstream(_))));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_not_found_fails_without_retry() {
    let (base_url, hits) = spawn_server(vec![
        http_response("404 Not Found", r#"{"success":false,"message":"not found"}"#),
        http_response("200 OK", &success_body()),
    ])
    .await;

    let result = client(&base_url).fetch("12345678").await;

    assert!(matches!(result, Err(VaultError::DocumentNotFound(dni)) if dni == "12345678"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_credential_rejection_fails_without_retry() {
    let (base_url, hits) = spawn_server(vec![
        http_response("401 Unauthorized", "{}"),
        http_response("200 OK", &success_body()),
    ])
    .await;

    let result = client(&base_url).fetch("12345678").await;

    assert!(matches!(result, Err(VaultError::UpstreamAuth(401))));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_other_client_errors_fail_without_retry() {
    let (base_url, hits) = spawn_server(vec![
        http_response("422 Unprocessable Entity", "{}"),
        http_response("200 OK", &success_body()),
    ])
    .await;

    let result = client(&base_url).fetch("12345678").await;

    assert!(matches!(result, Err(VaultError::Upstream(_))));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_camel_case_response_normalized() {
    let body = r#"{"success":true,"data":{"nombres":"JUAN","apellidoPaterno":"QUISPE","apellidoMaterno":"MAMANI"}}"#;
    let (base_url, _) = spawn_server(vec![http_response("200 OK", body)]).await;

    let identity = client(&base_url).fetch("87654321").await.unwrap();

    assert_eq!(identity.paternal_surname, "QUISPE");
    assert_eq!(identity.full_name, "JUAN QUISPE MAMANI");
}

#[tokio::test]
async fn test_invalid_dni_never_reaches_the_network() {
    // Port 9 (discard) is never contacted: validation fails first.
    let client = client("http://127.0.0.1:9");

    for bad in ["123", "abcdefgh", ""] {
        let result = client.fetch(bad).await;
        assert!(matches!(result, Err(VaultError::Validation(_))), "input: {bad:?}");
    }
}

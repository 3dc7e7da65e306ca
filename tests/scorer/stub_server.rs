use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
    sync::oneshot,
};

#[derive(Debug)]
pub struct CapturedRequest {
    pub head: String,
    pub body: serde_json::Value,
}

/// Serves exactly one HTTP response and hands back the request it received.
pub async fn serve_once(
    status: u16,
    body: &'static str,
) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("stub listener binds");
    let endpoint = format!(
        "http://{}/models/kote",
        listener.local_addr().expect("local addr")
    );
    let (captured_tx, captured_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("client connects");
        let mut reader = BufReader::new(stream);

        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.expect("read header line");
            if let Some((name, value)) = line.split_once(':')
                && name.eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse().expect("numeric content-length");
            }
            if line == "\r\n" || line.is_empty() {
                break;
            }
            head.push_str(&line);
        }
        let mut body_bytes = vec![0u8; content_length];
        reader
            .read_exact(&mut body_bytes)
            .await
            .expect("read request body");

        let response = format!(
            "HTTP/1.1 {status} STUB\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = reader.into_inner();
        stream
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        let _ = stream.shutdown().await;

        let _ = captured_tx.send(CapturedRequest {
            head,
            body: serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null),
        });
    });

    (endpoint, captured_rx)
}

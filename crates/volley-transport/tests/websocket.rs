//! Integration tests for the WebSocket transport.
//!
//! Each test binds a real listener on an OS-assigned port and talks to
//! it with a plain `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;
    use volley_transport::{Connection, Transport, WebSocketTransport};

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn pair() -> (volley_transport::WebSocketConnection, Client) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address");

        let server =
            tokio::spawn(async move { transport.accept().await.expect("accept") });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let conn = server.await.expect("accept task");
        (conn, client)
    }

    #[tokio::test]
    async fn test_client_text_frame_is_received_as_bytes() {
        let (conn, mut client) = pair().await;

        client
            .send(Message::text("{\"type\":\"createRoom\"}".to_owned()))
            .await
            .unwrap();

        let data = conn.recv().await.unwrap().expect("a frame");
        assert_eq!(data, b"{\"type\":\"createRoom\"}");
    }

    #[tokio::test]
    async fn test_client_binary_frame_is_received() {
        let (conn, mut client) = pair().await;

        client.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
        assert_eq!(conn.recv().await.unwrap(), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_send_text_arrives_as_text_frame() {
        let (conn, mut client) = pair().await;

        conn.send_text("{\"type\":\"roomFull\"}").await.unwrap();

        match client.next().await.unwrap().unwrap() {
            Message::Text(text) => assert_eq!(text.as_str(), "{\"type\":\"roomFull\"}"),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_while_recv_is_pending() {
        let (conn, mut client) = pair().await;
        let conn = std::sync::Arc::new(conn);

        // A reader parked in recv must not block writers.
        let reader = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), conn.send_text("hello"))
            .await
            .expect("send should not wait on recv")
            .unwrap();
        match client.next().await.unwrap().unwrap() {
            Message::Text(text) => assert_eq!(text.as_str(), "hello"),
            other => panic!("expected text frame, got {other:?}"),
        }

        client.send(Message::text("bye".to_owned())).await.unwrap();
        let got = reader.await.unwrap().unwrap();
        assert_eq!(got, Some(b"bye".to_vec()));
    }

    #[tokio::test]
    async fn test_client_close_yields_none() {
        let (conn, mut client) = pair().await;

        client.close(None).await.unwrap();
        assert_eq!(conn.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (a, _ca) = pair().await;
        let (b, _cb) = pair().await;
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_accept_after_shutdown_fails() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        transport.shutdown().await.unwrap();
        assert!(matches!(
            transport.accept().await,
            Err(volley_transport::TransportError::Shutdown)
        ));
    }
}

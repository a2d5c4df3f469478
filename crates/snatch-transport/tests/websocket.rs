//! Integration tests for the WebSocket transport: a real server and client
//! on loopback.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use snatch_transport::{
        Connection, Transport, WebSocketConnection, WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on a free port, connects one client, and returns both ends.
    async fn connected_pair() -> (WebSocketConnection, Client) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have an address");

        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let url = format!("ws://{addr}");
        let (client, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("client should connect");
        let conn = server.await.expect("task should complete");
        (conn, client)
    }

    #[tokio::test]
    async fn test_websocket_send_and_receive_text() {
        let (conn, mut client) = connected_pair().await;
        assert!(conn.id().into_inner() > 0);

        conn.send("hello from server").await.expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg, Message::text("hello from server"));

        client.send(Message::text("hello from client")).await.unwrap();
        let received = conn.recv().await.expect("recv should succeed");
        assert_eq!(received.as_deref(), Some("hello from client"));

        conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_binary_frames_are_read_as_text() {
        let (conn, mut client) = connected_pair().await;

        client
            .send(Message::Binary(b"{\"seq\":1}".to_vec().into()))
            .await
            .unwrap();
        let received = conn.recv().await.expect("recv should succeed");
        assert_eq!(received.as_deref(), Some("{\"seq\":1}"));
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (conn, mut client) = connected_pair().await;

        client.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_send_not_blocked_by_pending_recv() {
        let (conn, mut client) = connected_pair().await;
        let conn = std::sync::Arc::new(conn);

        let reader = std::sync::Arc::clone(&conn);
        let pending = tokio::spawn(async move { reader.recv().await });
        tokio::task::yield_now().await;

        tokio::time::timeout(Duration::from_secs(1), conn.send("snapshot"))
            .await
            .expect("send should not wait for the reader")
            .expect("send should succeed");
        let frame = client.next().await.unwrap().unwrap();
        assert_eq!(frame, Message::text("snapshot"));

        client.send(Message::text("late")).await.unwrap();
        let received = pending.await.unwrap().unwrap();
        assert_eq!(received.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (a, _ca) = connected_pair().await;
        let (b, _cb) = connected_pair().await;
        assert_ne!(a.id(), b.id());
    }
}

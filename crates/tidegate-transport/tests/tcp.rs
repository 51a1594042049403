//! Integration tests for the TCP transport.
//!
//! These tests bind a real listener on a loopback port chosen by the OS
//! and talk to it with a plain `tokio::net::TcpStream` client.

#[cfg(feature = "tcp")]
mod tcp {
    use std::time::Duration;

    use tidegate_transport::{
        Connection, TcpConnection, TcpTransport, Transport, TransportError,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    /// Binds a transport, connects one client, and returns both ends.
    async fn pair() -> (TcpConnection, TcpStream) {
        let mut transport = TcpTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have local addr");

        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = TcpStream::connect(addr).await.expect("should connect");
        let conn = server.await.expect("task should complete");
        (conn, client)
    }

    #[tokio::test]
    async fn test_tcp_send_and_recv_bytes() {
        let (conn, mut client) = pair().await;

        conn.send(b"hello from server")
            .await
            .expect("send should succeed");
        let mut buf = [0u8; 17];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello from server");

        client.write_all(b"hello from client").await.unwrap();
        let mut received = Vec::new();
        while received.len() < 17 {
            let chunk = conn
                .recv()
                .await
                .expect("recv should succeed")
                .expect("should have data");
            received.extend_from_slice(&chunk);
        }
        assert_eq!(received, b"hello from client");

        assert_eq!(
            conn.peer_addr(),
            client.local_addr().expect("client addr")
        );
    }

    #[tokio::test]
    async fn test_tcp_recv_returns_none_on_client_close() {
        let (conn, client) = pair().await;

        drop(client);

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_tcp_close_unblocks_pending_recv() {
        let (conn, _client) = pair().await;
        let conn = std::sync::Arc::new(conn);

        let reader = {
            let conn = std::sync::Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        conn.close().await.expect("close should succeed");

        let result = tokio::time::timeout(Duration::from_secs(2), reader)
            .await
            .expect("recv should wake up after close")
            .expect("task should complete")
            .expect("recv should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_tcp_close_twice_is_noop() {
        let (conn, _client) = pair().await;

        conn.close().await.expect("first close should succeed");
        conn.close().await.expect("second close should be a no-op");
    }

    #[tokio::test]
    async fn test_tcp_close_signals_eof_to_peer() {
        let (conn, mut client) = pair().await;

        conn.close().await.unwrap();

        let mut buf = [0u8; 8];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(n, 0, "peer should observe end of stream");
    }

    #[tokio::test]
    async fn test_tcp_send_after_close_returns_error() {
        let (conn, _client) = pair().await;
        conn.close().await.unwrap();

        let result = conn.send(b"late").await;

        assert!(matches!(result, Err(TransportError::ConnectionClosed(_))));
    }

    #[tokio::test]
    async fn test_tcp_accept_after_shutdown_returns_error() {
        let mut transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        transport.shutdown().await.unwrap();

        let result = transport.accept().await;

        assert!(matches!(result, Err(TransportError::Shutdown)));
    }

    #[tokio::test]
    async fn test_tcp_close_interrupts_send_to_silent_peer() {
        // The client never reads, so the socket buffers fill up and the
        // server's writes stall.
        let (conn, _client) = pair().await;
        let conn = std::sync::Arc::new(conn);

        let writer = {
            let conn = std::sync::Arc::clone(&conn);
            tokio::spawn(async move {
                let chunk = vec![0u8; 256 * 1024];
                loop {
                    if let Err(e) = conn.send(&chunk).await {
                        return e;
                    }
                }
            })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!writer.is_finished(), "writes should be stalled by now");

        tokio::time::timeout(Duration::from_secs(3), conn.close())
            .await
            .expect("close should not wait on the stalled write")
            .expect("close should succeed");

        let err = tokio::time::timeout(Duration::from_secs(2), writer)
            .await
            .expect("stalled send should give up after close")
            .expect("task should complete");
        assert!(matches!(err, TransportError::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn test_tcp_shutdown_wakes_pending_accept() {
        let mut transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let handle = transport.shutdown_handle();

        let acceptor = tokio::spawn(async move { transport.accept().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), acceptor)
            .await
            .expect("accept should wake up after shutdown")
            .expect("task should complete");
        assert!(matches!(result, Err(TransportError::Shutdown)));
        assert!(handle.is_shut_down());
    }
}

//! Protocol Module Tests
//!
//! ## Test Scopes
//! - **Codec**: Request, peer-list and reply shapes, including malformed input.
//! - **Transport**: Size bound, timeouts and framing of the one-exchange-per-connection helpers.

#[cfg(test)]
mod tests {
    use crate::error::MembershipError;
    use crate::protocol::MAX_MESSAGE_BYTES;
    use crate::protocol::codec::*;
    use crate::protocol::transport::{exchange, read_message, read_request, write_message};
    use crate::protocol::types::{JoinReply, ProtocolError, Request};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn local() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    // ============================================================
    // REQUEST TESTS
    // ============================================================

    #[test]
    fn test_register_wire_format() {
        assert_eq!(encode_register(5001), b"REGISTER 5001".to_vec());
        assert_eq!(decode_register(b"REGISTER 5001").unwrap(), 5001);
    }

    #[test]
    fn test_join_wire_format() {
        assert_eq!(encode_join(5002), b"JOIN 5002".to_vec());
        assert_eq!(decode_join(b"JOIN 5002").unwrap(), 5002);
    }

    #[test]
    fn test_request_tolerates_surrounding_whitespace() {
        assert_eq!(decode_join(b"  JOIN\t6000\n").unwrap(), 6000);
    }

    #[test]
    fn test_malformed_requests_rejected() {
        let cases: &[&[u8]] = &[
            b"",
            b"REGISTER",
            b"REGISTER abc",
            b"REGISTER 70000",
            b"REGISTER -1",
            b"REGISTER 5001 5002",
            b"register 5001",
            b"JOIN 5001",
            &[0xff, 0xfe, 0x20, 0x31],
        ];

        for case in cases {
            match decode_register(case) {
                Err(ProtocolError::MalformedRequest(_)) => {}
                other => panic!("{:?} decoded as {:?}", case, other),
            }
        }
    }

    #[test]
    fn test_join_decoder_rejects_register() {
        assert!(matches!(
            decode_join(b"REGISTER 5001"),
            Err(ProtocolError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_request_dispatch() {
        assert_eq!(
            Request::decode(b"REGISTER 5001").unwrap(),
            Request::Register { port: 5001 }
        );
        assert_eq!(
            Request::decode(b"JOIN 5002").unwrap(),
            Request::Join { port: 5002 }
        );
        assert_eq!(Request::Join { port: 7 }.encode(), b"JOIN 7".to_vec());

        assert!(matches!(
            Request::decode(b"LEAVE 5001"),
            Err(ProtocolError::MalformedRequest(_))
        ));
        assert!(matches!(
            Request::decode(b"   "),
            Err(ProtocolError::MalformedRequest(_))
        ));
    }

    // ============================================================
    // PEER LIST TESTS
    // ============================================================

    #[test]
    fn test_empty_peer_list() {
        assert!(encode_peer_list(Vec::new()).is_empty());
        assert!(decode_peer_list(b"").unwrap().is_empty());
        assert!(decode_peer_list(b" \n").unwrap().is_empty());
    }

    #[test]
    fn test_peer_list_has_no_trailing_separator() {
        assert_eq!(encode_peer_list([5001]), b"5001".to_vec());
        assert_eq!(encode_peer_list([5001, 5003, 5002]), b"5001,5003,5002".to_vec());
    }

    #[test]
    fn test_peer_list_keeps_order_and_drops_repeats() {
        let ports = decode_peer_list(b"5003, 5001,5003,5002").unwrap();
        assert_eq!(ports, vec![5003, 5001, 5002]);
    }

    #[test]
    fn test_malformed_peer_list() {
        for case in [&b"5001,abc"[..], b"5001,", b",5001", b"5001;5002", b"99999"] {
            match decode_peer_list(case) {
                Err(ProtocolError::MalformedResponse(_)) => {}
                other => panic!("{:?} decoded as {:?}", case, other),
            }
        }
    }

    // ============================================================
    // REPLY TESTS
    // ============================================================

    #[test]
    fn test_reply_tokens() {
        assert_eq!(encode_reply(JoinReply::Allow), b"ALLOW".to_vec());
        assert_eq!(encode_reply(JoinReply::Deny), b"DENY".to_vec());
        assert_eq!(decode_reply(b"ALLOW").unwrap(), JoinReply::Allow);
        assert_eq!(decode_reply(b"DENY").unwrap(), JoinReply::Deny);
        assert_eq!(JoinReply::from(true), JoinReply::Allow);
        assert_eq!(JoinReply::from(false), JoinReply::Deny);
    }

    #[test]
    fn test_unknown_reply_is_malformed() {
        for case in [&b""[..], b"allow", b"MAYBE", b"ALLOW DENY"] {
            assert!(matches!(
                decode_reply(case),
                Err(ProtocolError::MalformedResponse(_))
            ));
        }
    }

    // ============================================================
    // TRANSPORT TESTS
    // ============================================================

    #[tokio::test]
    async fn test_read_message_rejects_oversized_payload() {
        let listener = TcpListener::bind(local()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
            let _ = stream.write_all(&vec![b'9'; MAX_MESSAGE_BYTES + 10]).await;
            let _ = stream.shutdown().await;
        });

        let (mut stream, peer) = listener.accept().await.unwrap();
        let result = read_message(&mut stream, peer, Duration::from_secs(2)).await;

        assert!(matches!(
            result,
            Err(MembershipError::Protocol(ProtocolError::MessageTooLarge { .. }))
        ));
        client.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_request_does_not_wait_for_half_close() {
        let listener = TcpListener::bind(local()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Writes and keeps its side open while it waits for the reply
        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        client.write_all(b"JOIN 5001").await.unwrap();

        let (mut stream, peer) = listener.accept().await.unwrap();
        let request = read_request(&mut stream, peer, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(request, b"JOIN 5001".to_vec());

        write_message(&mut stream, peer, b"ALLOW", Duration::from_secs(1))
            .await
            .unwrap();
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, b"ALLOW".to_vec());
    }

    #[tokio::test]
    async fn test_read_request_rejects_oversized_payload() {
        let listener = TcpListener::bind(local()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        client
            .write_all(&vec![b'9'; MAX_MESSAGE_BYTES + 10])
            .await
            .unwrap();

        let (mut stream, peer) = listener.accept().await.unwrap();
        // Let the whole payload land before the single read
        tokio::time::sleep(Duration::from_millis(50)).await;
        let result = read_request(&mut stream, peer, Duration::from_secs(1)).await;

        assert!(matches!(
            result,
            Err(MembershipError::Protocol(ProtocolError::MessageTooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn test_read_request_times_out_on_silent_client() {
        let listener = TcpListener::bind(local()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _silent = tokio::net::TcpStream::connect(addr).await.unwrap();

        let (mut stream, peer) = listener.accept().await.unwrap();
        let result = read_request(&mut stream, peer, Duration::from_millis(100)).await;

        assert!(matches!(
            result,
            Err(MembershipError::Timeout { stage: "read", .. })
        ));
    }

    #[tokio::test]
    async fn test_write_message_rejects_oversized_payload() {
        let listener = TcpListener::bind(local()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();

        let result = write_message(
            &mut stream,
            addr,
            &vec![b'1'; MAX_MESSAGE_BYTES + 1],
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(
            result,
            Err(MembershipError::Protocol(ProtocolError::MessageTooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn test_exchange_round_trip() {
        let listener = TcpListener::bind(local()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            stream.read_to_end(&mut request).await.unwrap();
            stream.write_all(b"ALLOW").await.unwrap();
            request
        });

        let response = exchange(
            addr,
            &encode_join(5002),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        assert_eq!(response, b"ALLOW".to_vec());
        assert_eq!(server.await.unwrap(), b"JOIN 5002".to_vec());
    }

    #[tokio::test]
    async fn test_exchange_with_closed_port_is_connection_error() {
        // Bind then drop to get a port nothing listens on
        let addr = TcpListener::bind(local()).await.unwrap().local_addr().unwrap();

        let result = exchange(
            addr,
            &encode_join(5002),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(MembershipError::Connection { .. })));
    }
}

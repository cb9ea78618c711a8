use std::{sync::mpsc, thread, time::Duration};

use peer_signaling::{
    message::ServerMessage, BlockingClient, ClientConfigBuilder, Error, Peer, UiCommand,
};

use crate::helper::{next_message, raw_sign_in, TestApp};

fn wait_for(rx: &mpsc::Receiver<UiCommand>, expected: UiCommand) {
    loop {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(command) if command == expected => return,
            Ok(_) => continue,
            Err(e) => panic!("Waiting for {expected:?}: {e}"),
        }
    }
}

/// Forwards rendered commands into a std channel so a plain thread can wait on them.
struct Forward(mpsc::Sender<UiCommand>);

impl peer_signaling::UiSurface for Forward {
    fn show_connect_prompt(&mut self) {
        let _ = self.0.send(UiCommand::ShowConnectPrompt);
    }

    fn show_peer_list(&mut self, peers: &[Peer]) {
        let _ = self.0.send(UiCommand::ShowPeerList(peers.to_vec()));
    }

    fn show_in_session(&mut self, peer: peer_signaling::PeerId) {
        let _ = self.0.send(UiCommand::ShowInSession(peer));
    }

    fn show_error(&mut self, kind: peer_signaling::ErrorKind, message: &str) {
        let _ = self.0.send(UiCommand::ShowError {
            kind,
            message: message.to_string(),
        });
    }
}

#[actix_web::test]
async fn blocking_client_signs_in() {
    let app = TestApp::spawn().await;
    let (address, port) = (app.address.clone(), app.port);

    // the blocking calls must stay off the test's runtime
    let result = thread::spawn(move || {
        let (tx, rx) = mpsc::channel();
        let config = ClientConfigBuilder::new()
            .address(&address)
            .port(port)
            .name("carol")
            .build();
        let client = BlockingClient::spawn(config, Forward(tx)).unwrap();
        wait_for(&rx, UiCommand::ShowConnectPrompt);

        client.login(&address, port).unwrap();
        wait_for(&rx, UiCommand::ShowPeerList(vec![]));
        assert_eq!(client.connect_to_peer(9), Err(Error::PeerUnknown(9)));

        let handle = client.handle().clone();
        client.close().unwrap();
        assert_eq!(handle.blocking_send(peer_signaling::UiIntent::Logout), Err(Error::Closed));
    });

    // keep the server's runtime turning while the thread works
    while !result.is_finished() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    result.join().unwrap();
}

#[actix_web::test]
async fn close_says_bye_before_leaving() {
    let app = TestApp::spawn().await;
    let mut bob = raw_sign_in(&app, "bob").await;
    assert_eq!(next_message(&mut bob).await, ServerMessage::SignedIn { id: 1 });
    let (address, port) = (app.address.clone(), app.port);

    let alice = thread::spawn(move || {
        let (tx, rx) = mpsc::channel();
        let config = ClientConfigBuilder::new()
            .address(&address)
            .port(port)
            .name("alice")
            .build();
        let client = BlockingClient::spawn(config, Forward(tx)).unwrap();
        client.login(&address, port).unwrap();
        wait_for(&rx, UiCommand::ShowPeerList(vec![Peer::new(1, "bob")]));
        client.connect_to_peer(1).unwrap();
        client.close().unwrap();
    });

    let mut seen = Vec::new();
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), next_message(&mut bob))
            .await
            .expect("Timed out waiting for alice to leave");
        let left = msg == ServerMessage::PeerDisconnected { id: 2 };
        seen.push(msg);
        if left {
            break;
        }
    }
    while !alice.is_finished() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    alice.join().unwrap();

    assert_eq!(
        seen,
        vec![
            ServerMessage::PeerConnected {
                id: 2,
                name: "alice".to_string()
            },
            ServerMessage::Relay {
                from: 2,
                payload: "OFFER 1".to_string()
            },
            ServerMessage::Relay {
                from: 2,
                payload: "BYE".to_string()
            },
            ServerMessage::PeerDisconnected { id: 2 },
        ]
    );
}

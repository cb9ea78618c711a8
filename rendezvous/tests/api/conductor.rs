use std::time::Duration;

use peer_signaling::{Error, ErrorKind, Peer, UiCommand};

use crate::helper::TestApp;

#[actix_web::test]
async fn two_peers_meet_and_hang_up() -> anyhow::Result<()> {
    let app = TestApp::spawn().await;
    let mut alice = app.client("alice");
    let mut bob = app.client("bob");

    alice.handle.login(&app.address, app.port).await?;
    alice
        .until(|c| *c == UiCommand::ShowPeerList(vec![]))
        .await;
    bob.handle.login(&app.address, app.port).await?;
    bob.until(|c| *c == UiCommand::ShowPeerList(vec![Peer::new(1, "alice")]))
        .await;
    alice
        .until(|c| *c == UiCommand::ShowPeerList(vec![Peer::new(2, "bob")]))
        .await;

    // both sides pick each other
    alice.handle.connect_to_peer(2).await?;
    assert_eq!(alice.handle.connect_to_peer(2).await, Err(Error::PeerBusy(2)));
    bob.handle.connect_to_peer(1).await?;
    bob.until(|c| *c == UiCommand::ShowInSession(1)).await;
    alice.until(|c| *c == UiCommand::ShowInSession(2)).await;

    bob.handle.disconnect_current_peer().await?;
    bob.until(|c| matches!(c, UiCommand::ShowPeerList(_))).await;
    alice
        .until(|c| *c == UiCommand::ShowPeerList(vec![Peer::new(2, "bob")]))
        .await;

    bob.handle.close().await?;
    alice
        .until(|c| *c == UiCommand::ShowPeerList(vec![]))
        .await;
    alice.handle.close().await?;
    Ok(())
}

#[actix_web::test]
async fn remote_sign_out_ends_the_session() -> anyhow::Result<()> {
    let app = TestApp::spawn().await;
    let mut alice = app.client("alice");
    let mut bob = app.client("bob");

    alice.handle.login(&app.address, app.port).await?;
    alice.until(|c| *c == UiCommand::ShowPeerList(vec![])).await;
    bob.handle.login(&app.address, app.port).await?;
    bob.until(|c| matches!(c, UiCommand::ShowPeerList(p) if p.len() == 1))
        .await;
    alice
        .until(|c| matches!(c, UiCommand::ShowPeerList(p) if p.len() == 1))
        .await;

    alice.handle.connect_to_peer(2).await?;
    bob.handle.connect_to_peer(1).await?;
    alice.until(|c| *c == UiCommand::ShowInSession(2)).await;

    bob.handle.logout().await?;
    bob.until(|c| *c == UiCommand::ShowConnectPrompt).await;
    alice.until(|c| *c == UiCommand::ShowPeerList(vec![])).await;

    // alice is free again
    assert_eq!(alice.handle.connect_to_peer(2).await, Err(Error::PeerUnknown(2)));
    Ok(())
}

#[actix_web::test]
async fn unreachable_server_returns_to_prompt() -> anyhow::Result<()> {
    let app = TestApp::spawn().await;
    let mut alice = app.client("alice");

    // nothing listens on port 1
    alice.handle.login(&app.address, 1).await?;
    alice.until(|c| *c == UiCommand::ShowConnectPrompt).await;
    let error = alice
        .until(|c| matches!(c, UiCommand::ShowError { .. }))
        .await;
    assert!(matches!(
        error,
        UiCommand::ShowError {
            kind: ErrorKind::TransportFailure,
            ..
        }
    ));

    // and may try again
    alice.handle.login(&app.address, app.port).await?;
    alice.until(|c| *c == UiCommand::ShowPeerList(vec![])).await;
    Ok(())
}

#[actix_web::test]
async fn logout_while_connecting_is_clean() -> anyhow::Result<()> {
    let app = TestApp::spawn().await;
    let mut alice = app.client("alice");
    alice.until(|c| *c == UiCommand::ShowConnectPrompt).await;

    alice.handle.login(&app.address, app.port).await?;
    alice.handle.logout().await?;
    alice.until(|c| *c == UiCommand::ShowConnectPrompt).await;

    // whatever the server said in between never reached the peer list
    tokio::time::sleep(Duration::from_millis(200)).await;
    while let Ok(command) = alice.ui.try_recv() {
        assert!(!matches!(command, UiCommand::ShowPeerList(_)), "{command:?}");
    }
    Ok(())
}

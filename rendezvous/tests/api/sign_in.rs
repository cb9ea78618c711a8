use futures_util::SinkExt as _;
use peer_signaling::{
    message::{ClientMessage, ServerMessage},
    Peer,
};

use crate::helper::{next_message, TestApp};

#[actix_web::test]
async fn missing_auth_is_rejected() -> anyhow::Result<()> {
    let app = TestApp::spawn().await;
    let response = reqwest::Client::new()
        .get(&app.path("sign_in"))
        .send()
        .await?;
    assert_eq!(response.status(), 401);
    assert!(response.headers().contains_key("www-authenticate"));
    Ok(())
}

#[actix_web::test]
async fn blank_name_is_rejected() -> anyhow::Result<()> {
    let app = TestApp::spawn().await;
    let response = reqwest::Client::new()
        .get(&app.path("sign_in"))
        .basic_auth("", Some(""))
        .send()
        .await?;
    assert_eq!(response.status(), 401);
    Ok(())
}

#[actix_web::test]
async fn named_http_request_is_not_an_upgrade() -> anyhow::Result<()> {
    let app = TestApp::spawn().await;
    let response = reqwest::Client::new()
        .get(&app.path("sign_in"))
        .basic_auth("alice", None::<&str>)
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    Ok(())
}

#[actix_web::test]
async fn peers_are_announced_and_relayed() -> anyhow::Result<()> {
    let app = TestApp::spawn().await;
    let url = app.ws_path("sign_in");

    let (res, mut alice) = awc::Client::new()
        .ws(url.as_str())
        .basic_auth("alice", None)
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    assert_eq!(res.status(), 101);
    assert_eq!(next_message(&mut alice).await, ServerMessage::SignedIn { id: 1 });

    let (_res, mut bob) = awc::Client::new()
        .ws(url.as_str())
        .basic_auth("bob", None)
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    assert_eq!(next_message(&mut bob).await, ServerMessage::SignedIn { id: 2 });
    assert_eq!(
        next_message(&mut bob).await,
        ServerMessage::PeerConnected {
            id: 1,
            name: "alice".to_string()
        }
    );
    assert_eq!(
        next_message(&mut alice).await,
        ServerMessage::PeerConnected {
            id: 2,
            name: "bob".to_string()
        }
    );

    let peers: Vec<Peer> = reqwest::get(&app.path("peers")).await?.json().await?;
    assert_eq!(peers, vec![Peer::new(1, "alice"), Peer::new(2, "bob")]);

    let relay = serde_json::to_string(&ClientMessage::Relay {
        to: 1,
        payload: "OFFER".to_string(),
    })?;
    bob.send(awc::ws::Message::Text(relay.into())).await?;
    assert_eq!(
        next_message(&mut alice).await,
        ServerMessage::Relay {
            from: 2,
            payload: "OFFER".to_string()
        }
    );

    bob.send(awc::ws::Message::Close(None)).await?;
    assert_eq!(
        next_message(&mut alice).await,
        ServerMessage::PeerDisconnected { id: 2 }
    );
    Ok(())
}

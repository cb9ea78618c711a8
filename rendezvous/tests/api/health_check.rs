use crate::helper::TestApp;

#[actix_web::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;
    let response = reqwest::Client::new()
        .get(&app.path("health_check"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), 200);
}

#[actix_web::test]
async fn roster_starts_empty() {
    let app = TestApp::spawn().await;
    let response = reqwest::Client::new()
        .get(&app.path("peers"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), 200);
    let peers: Vec<peer_signaling::Peer> = response.json().await.unwrap();
    assert!(peers.is_empty());
}

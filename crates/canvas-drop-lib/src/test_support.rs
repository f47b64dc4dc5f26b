//! Local HTTP servers standing in for remote APIs in tests.

use axum::Router;
use tokio::net::TcpListener;

/// Bind an ephemeral loopback port; returns the listener and its base URL.
pub(crate) async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

/// Serve `router` on `listener` in the background for the rest of the test.
pub(crate) fn serve(listener: TcpListener, router: Router) {
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
}

/// A base URL whose port was just released, so connections are refused.
pub(crate) async fn closed_port_url() -> String {
    let (listener, base) = bind().await;
    drop(listener);
    base
}

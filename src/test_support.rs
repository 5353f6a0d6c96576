use axum::Router;
use tokio::net::TcpListener;

/// Bind an ephemeral local port and return it with its base URL
pub async fn bind_upstream() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

pub fn serve_upstream(listener: TcpListener, app: Router) {
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
}

/// Serve `app` on an ephemeral local port; returns the base URL
pub async fn spawn_upstream(app: Router) -> String {
    let (listener, base) = bind_upstream().await;
    serve_upstream(listener, app);
    base
}

//! Local HTTP upstreams for source tests

use axum::Router;
use swapc_core::{get_token, EndpointConfig, PairContext};
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral port and return an endpoint pointing at it
pub(crate) async fn serve(router: Router) -> EndpointConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    EndpointConfig::new(&format!("http://{}", addr))
}

pub(crate) fn sol_usdc() -> PairContext {
    PairContext::new(
        get_token("SOL").unwrap().clone(),
        get_token("USDC").unwrap().clone(),
    )
}

//! Spawns the gateway on an ephemeral port.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use playlens::gateway::{HandlerState, create_router_with_state};
use playlens::{CatalogWriter, Embedder, RecordStore, ServiceContext};

pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url(), path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_test_server<E, S>(context: ServiceContext<E, S>) -> anyhow::Result<TestServer>
where
    E: Embedder + 'static,
    S: RecordStore + CatalogWriter + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router_with_state(HandlerState::from_context(context));

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer { addr, handle })
}

use ledger_core::{OperationService, Reply, Request, Response, Result};
use ledger_node::NodeClient;

/// Where menu operations are carried out.
pub enum Backend {
    /// An in-process ledger, gone when the CLI exits.
    Local(OperationService),
    /// A session with a running node.
    Remote(NodeClient),
}

impl Backend {
    /// Run one operation. `None` means the operation has no reply (exit).
    pub async fn send(&mut self, request: Request) -> Result<Option<Response>> {
        match self {
            Backend::Local(service) => Ok(match service.dispatch(request) {
                Reply::Respond(response) => Some(response),
                Reply::Close => None,
            }),
            Backend::Remote(client) => client.call(&request).await,
        }
    }

    /// End the session. A remote node is told to exit so it can take the
    /// next caller.
    pub async fn finish(self) -> Result<()> {
        match self {
            Backend::Local(_) => Ok(()),
            Backend::Remote(client) => client.close().await,
        }
    }
}

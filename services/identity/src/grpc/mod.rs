//! gRPC API (tonic): `identity.v1.User/GetUserByID`.

pub mod proto;

/// Generated client and server for `identity.v1.User`.
#[allow(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
pub mod user {
    include!(concat!(env!("OUT_DIR"), "/identity.v1.User.rs"));
}

use crate::auth::AuthService;
use crate::server::Protocol;
use futures::future::BoxFuture;
use proto::{UserRequest, UserResponse};
use rust_common::ShutdownSignal;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::instrument;
use user::user_server::{User, UserServer};

/// `identity.v1.User` implementation.
#[derive(Debug, Clone)]
pub struct UserGrpcService {
    auth: Arc<AuthService>,
}

impl UserGrpcService {
    /// Creates the service.
    #[must_use]
    pub const fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }
}

#[tonic::async_trait]
impl User for UserGrpcService {
    #[instrument(skip_all, fields(id = request.get_ref().id))]
    async fn get_user_by_id(
        &self,
        request: Request<UserRequest>,
    ) -> Result<Response<UserResponse>, Status> {
        let id = request.into_inner().id;
        let user = self.auth.get_by_id(id).await?;
        Ok(Response::new(user.into()))
    }
}

/// Serves [`UserGrpcService`] with tonic.
#[derive(Debug)]
pub struct GrpcProtocol {
    service: UserGrpcService,
}

impl GrpcProtocol {
    /// Wraps the service.
    #[must_use]
    pub const fn new(service: UserGrpcService) -> Self {
        Self { service }
    }
}

impl Protocol for GrpcProtocol {
    fn name(&self) -> &'static str {
        "grpc"
    }

    fn serve(
        self: Box<Self>,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> BoxFuture<'static, io::Result<()>> {
        Box::pin(async move {
            Server::builder()
                .add_service(UserServer::new(self.service))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown.recv())
                .await
                .map_err(io::Error::other)
        })
    }
}

// Connection handling module
// Serves each TCP connection on its own runtime task

use std::error::Error as StdError;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Handle a single connection in a spawned task.
///
/// On a multi-thread runtime connections are spread over the workers.
/// Requests on one connection are served in order; the file stream of an
/// in-flight response is dropped (and closed) if the client goes away.
pub fn serve_connection(stream: TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        if let Err(e) = stream.set_nodelay(true) {
            logger::log_debug(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
        }
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder
            .keep_alive(state.config.performance.keep_alive)
            .timer(TokioTimer::new())
            .header_read_timeout(state.config.performance.header_read_timeout());

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, peer_addr, Arc::clone(&state))),
        );

        if let Err(err) = conn.await {
            if is_client_disconnect(&err) {
                logger::log_debug(&format!("Client {peer_addr} went away: {err}"));
            } else {
                logger::log_connection_error(&err);
            }
        }
    });
}

/// Whether a connection error only means the peer stopped listening
fn is_client_disconnect(err: &hyper::Error) -> bool {
    if err.is_incomplete_message() || err.is_canceled() || err.is_closed() {
        return true;
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return is_disconnect_kind(io_err.kind());
        }
        source = cause.source();
    }
    false
}

const fn is_disconnect_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
    )
}

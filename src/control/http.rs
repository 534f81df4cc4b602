//! REST transport for the fault injection control surface.
//!
//! | Method | Path                   | Effect                              |
//! |--------|------------------------|-------------------------------------|
//! | GET    | `/inject_fault`        | detailed listing of active points   |
//! | POST   | `/inject_fault`        | activate (JSON [`FaultRequest`])     |
//! | DELETE | `/inject_fault`        | deactivate all                      |
//! | GET    | `/inject_fault/{name}` | `{"fault_name", "active"}`          |
//! | DELETE | `/inject_fault/{name}` | `{"fault_name", "was_active"}`      |
//!
//! An invalid fault request, including a body that does not parse, answers
//! 400 with `{"error": ...}`. Names are path-safe by construction, so path
//! segments are matched verbatim.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::warn;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use super::ControlCommand;
use super::ControlResponse;
use super::FaultController;
use super::FaultRequest;
use crate::constants::INJECT_FAULT_PATH;
use crate::Result;
use crate::SystemError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AckReply {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorReply {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct QueryReply {
    pub fault_name: String,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DeactivateReply {
    pub fault_name: String,
    pub was_active: bool,
}

pub fn routes(
    controller: Arc<FaultController>
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let with_controller = warp::any().map(move || controller.clone());

    let describe = warp::path(INJECT_FAULT_PATH)
        .and(warp::path::end())
        .and(warp::get())
        .and(with_controller.clone())
        .and_then(|ctl: Arc<FaultController>| async move {
            reply_for(&ctl, ControlCommand::Describe)
        });

    let inject = warp::path(INJECT_FAULT_PATH)
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json())
        .and(with_controller.clone())
        .and_then(|request: FaultRequest, ctl: Arc<FaultController>| async move {
            reply_for(&ctl, ControlCommand::Inject(request))
        });

    let reset = warp::path(INJECT_FAULT_PATH)
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_controller.clone())
        .and_then(|ctl: Arc<FaultController>| async move {
            reply_for(&ctl, ControlCommand::DeactivateAll)
        });

    let query = warp::path(INJECT_FAULT_PATH)
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_controller.clone())
        .and_then(|fault_name: String, ctl: Arc<FaultController>| async move {
            reply_for(&ctl, ControlCommand::Query { fault_name })
        });

    let deactivate = warp::path(INJECT_FAULT_PATH)
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_controller)
        .and_then(|fault_name: String, ctl: Arc<FaultController>| async move {
            reply_for(&ctl, ControlCommand::Deactivate { fault_name })
        });

    describe
        .or(inject)
        .unify()
        .or(reset)
        .unify()
        .or(query)
        .unify()
        .or(deactivate)
        .unify()
        .recover(recover_body_error)
        .unify()
}

/// Malformed bodies and unknown fault types get the same JSON error shape as
/// parameter validation. Other rejections keep warp's defaults.
async fn recover_body_error(rejection: Rejection) -> std::result::Result<Response, Rejection> {
    match rejection.find::<BodyDeserializeError>() {
        Some(e) => {
            warn!("rejected control request: {}", e);
            Ok(error_reply(e.to_string()))
        }
        None => Err(rejection),
    }
}

fn error_reply(error: String) -> Response {
    warp::reply::with_status(warp::reply::json(&ErrorReply { error }), StatusCode::BAD_REQUEST)
        .into_response()
}

fn reply_for(
    controller: &FaultController,
    command: ControlCommand,
) -> std::result::Result<Response, Rejection> {
    let response = match controller.handle(command) {
        Ok(ControlResponse::Ok) => warp::reply::json(&AckReply {
            status: "ok".to_string(),
        })
        .into_response(),
        Ok(ControlResponse::Points { points }) => warp::reply::json(&points).into_response(),
        Ok(ControlResponse::Active { fault_names }) => {
            warp::reply::json(&fault_names).into_response()
        }
        Ok(ControlResponse::Status { fault_name, active }) => {
            warp::reply::json(&QueryReply { fault_name, active }).into_response()
        }
        Ok(ControlResponse::Deactivated {
            fault_name,
            was_active,
        }) => warp::reply::json(&DeactivateReply {
            fault_name,
            was_active,
        })
        .into_response(),
        Err(e) => error_reply(e.to_string()),
    };
    Ok(response)
}

/// Binds the control API and returns the bound address together with the
/// server future. The future completes once `shutdown_signal` fires.
pub fn bind_server(
    addr: SocketAddr,
    controller: Arc<FaultController>,
    mut shutdown_signal: watch::Receiver<()>,
) -> Result<(SocketAddr, impl std::future::Future<Output = ()>)> {
    warp::serve(routes(controller))
        .try_bind_with_graceful_shutdown(addr, async move {
            let _ = shutdown_signal.changed().await;
        })
        .map_err(|e| {
            error!("control server failed to bind {}: {}", addr, e);
            SystemError::ServerBind {
                service: "control",
                addr,
                reason: e.to_string(),
            }
            .into()
        })
}

/// Binds, spawns the server on the current runtime and returns the bound
/// address.
pub fn start_server(
    addr: SocketAddr,
    controller: Arc<FaultController>,
    shutdown_signal: watch::Receiver<()>,
) -> Result<SocketAddr> {
    let (bound, server) = bind_server(addr, controller, shutdown_signal)?;
    info!("control server listening on {}", bound);
    tokio::spawn(server);
    Ok(bound)
}

//! Command dispatcher.
//!
//! Turns JSON frames into [`AppCommand`](crate::app::commands::AppCommand)s,
//! runs them on the [`AppService`] and encodes the reply.  Transport-free:
//! the control loop feeds frames from [`channels::CMD_CHANNEL`] via
//! [`Dispatcher::poll`], tests call [`Dispatcher::handle_frame`] directly.
//!
//! | outcome                         | code |
//! |---------------------------------|------|
//! | success                         | 200  |
//! | unknown request code            | 404  |
//! | bad JSON, location or request   | 406  |
//! | stall watchdog tripped          | 500  |

pub mod channels;
pub mod message;

use core::fmt::Write as _;

use log::{info, warn};

use crate::app::ports::{EventSink, Machine, StatusSink};
use crate::app::service::AppService;
use crate::error::Error;
use crate::identifier::Identifier;

use message::{OperatorId, Rejection, Request, ResponseBytes, ResponseFrame, TransactionId, codes};

type ReasonText = heapless::String<64>;

fn reason(args: core::fmt::Arguments<'_>) -> ReasonText {
    let mut text = ReasonText::new();
    let _ = text.write_fmt(args);
    text
}

fn respond(
    code: u16,
    transaction_id: Option<&TransactionId>,
    text: Option<&str>,
    uids: Option<&[Identifier]>,
) -> ResponseBytes {
    let frame = ResponseFrame {
        code,
        transaction_id,
        text,
        uids,
    };
    message::encode(&frame).unwrap_or_else(|| {
        warn!("Dispatch: response too large, sending bare code");
        // A bare code always fits.
        message::encode(&ResponseFrame {
            code,
            transaction_id: None,
            text: None,
            uids: None,
        })
        .unwrap_or_default()
    })
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    /// Operator logged in at the terminal.  Informational only.
    operator: Option<OperatorId>,
    frames: u32,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    pub fn frames_handled(&self) -> u32 {
        self.frames
    }

    /// Decode, execute and answer one frame.
    pub fn handle_frame(
        &mut self,
        frame: &[u8],
        app: &mut AppService,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
        sink: &mut impl EventSink,
    ) -> ResponseBytes {
        self.frames += 1;

        let decoded = match message::decode(frame) {
            Ok(d) => d,
            Err(e) => {
                warn!("Dispatch: malformed frame: {}", e);
                let text = reason(format_args!("{e}"));
                return respond(codes::NOT_ACCEPTABLE, None, Some(&text), None);
            }
        };
        let tid = decoded.transaction_id.as_ref();

        let request = match message::interpret(&decoded, app.config()) {
            Ok(r) => r,
            Err(Rejection::UnknownCode(code)) => {
                warn!("Dispatch: unknown code {}", code);
                return respond(codes::UNKNOWN, tid, None, None);
            }
            Err(rejection) => {
                warn!("Dispatch: code {} refused: {}", decoded.code, rejection);
                let text = reason(format_args!("{rejection}"));
                return respond(codes::NOT_ACCEPTABLE, tid, Some(&text), None);
            }
        };

        match request {
            Request::OperatorAuthenticated(id) => {
                info!("Dispatch: operator '{}' authenticated", id);
                self.operator = Some(id);
                respond(codes::OK, tid, None, None)
            }
            Request::OperatorDeauthenticated => {
                info!("Dispatch: operator logged out");
                self.operator = None;
                respond(codes::OK, tid, None, None)
            }
            Request::Command(cmd) => match app.handle_command(cmd, hw, status, sink) {
                Ok(Some(ids)) => respond(codes::OK, tid, None, Some(&ids[..])),
                Ok(None) => respond(codes::OK, tid, None, None),
                Err(e @ Error::Motion(_)) => {
                    let text = reason(format_args!("{e}"));
                    respond(codes::MOTION_FAULT, tid, Some(&text), None)
                }
                Err(e) => {
                    let text = reason(format_args!("{e}"));
                    respond(codes::NOT_ACCEPTABLE, tid, Some(&text), None)
                }
            },
        }
    }

    /// Handle at most one queued frame.  Returns `true` if one was handled.
    pub fn poll(
        &mut self,
        app: &mut AppService,
        hw: &mut impl Machine,
        status: &mut impl StatusSink,
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(msg) = channels::try_recv_command() else {
            return false;
        };
        let reply = self.handle_frame(&msg.frame, app, hw, status, sink);
        channels::send_response(reply);
        true
    }
}

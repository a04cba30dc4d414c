//! Outbound and inbound policies applied to every API exchange.

use reqwest::{RequestBuilder, StatusCode};
use tracing::{debug, trace};

use nextstep_core::{Generation, SessionState, TransportEvent, TransportEvents};

/// Keeps transport-level auth in step with the session state.
///
/// Outbound, it attaches the current bearer token and remembers which
/// credential generation the request carried. Inbound, a 401 to a request
/// that carried a credential is reported as a
/// [`TransportEvent::CredentialRejected`] before the response is handed
/// back; the session state subscribes to those events and ends the session
/// at most once per generation.
#[derive(Debug, Clone)]
pub struct Interceptor {
    state: SessionState,
    events: TransportEvents,
}

impl Interceptor {
    pub fn new(state: SessionState, events: TransportEvents) -> Self {
        Self { state, events }
    }

    /// Attach `Authorization: Bearer <token>` if the session holds a
    /// credential. Returns the generation of the attached credential.
    pub fn outbound(&self, request: RequestBuilder) -> (RequestBuilder, Option<Generation>) {
        match self.state.bearer() {
            Some((token, generation)) => {
                trace!(%generation, "Attaching bearer credential");
                (request.bearer_auth(token.as_str()), Some(generation))
            }
            None => (request, None),
        }
    }

    /// Observe a response status for a request sent with `sent_with`.
    pub fn inbound(&self, status: StatusCode, sent_with: Option<Generation>) {
        if status != StatusCode::UNAUTHORIZED {
            return;
        }
        match sent_with {
            Some(generation) => {
                debug!(%generation, "Service rejected the credential");
                self.events
                    .emit(TransportEvent::CredentialRejected { generation });
            }
            None => trace!("401 on an unauthenticated request"),
        }
    }
}

use std::sync::Arc;
use tandem_core::Envelope;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::{ClientConfig, ClientEvent};
use crate::controller::{ClientStatus, ControllerAction, ReconnectController};
use crate::negotiation::{
    NegotiationError, NegotiationSession, PeerEvent, PeerEventSink, PeerFactory, Role, SessionId,
    SignalingState,
};
use crate::transport::{RelayConnector, RelayEvent, RelayLink};

pub(crate) enum DriverInput {
    LinkUp {
        link: u64,
        outbound: mpsc::UnboundedSender<Envelope>,
    },
    Relay {
        link: u64,
        event: RelayEvent,
    },
    Peer {
        session: SessionId,
        event: PeerEvent,
    },
    ReconnectDue(u32),
    Command(ClientCommand),
}

pub(crate) enum ClientCommand {
    SwitchSource,
    Close(Option<oneshot::Sender<()>>),
}

/// Single consumer of every client input. Owns the session, the relay link
/// and the reconnect controller.
pub(crate) struct Driver {
    config: ClientConfig,
    connector: Arc<dyn RelayConnector>,
    factory: Arc<dyn PeerFactory>,
    input_tx: mpsc::UnboundedSender<DriverInput>,
    events: mpsc::UnboundedSender<ClientEvent>,
    controller: ReconnectController,
    session: Option<NegotiationSession>,
    next_session: u64,
    relay: Option<mpsc::UnboundedSender<Envelope>>,
    link: u64,
    welcomed: bool,
    observed: Option<(SessionId, SignalingState)>,
    last_status: ClientStatus,
}

impl Driver {
    pub(crate) fn new(
        config: ClientConfig,
        connector: Arc<dyn RelayConnector>,
        factory: Arc<dyn PeerFactory>,
        input_tx: mpsc::UnboundedSender<DriverInput>,
        events: mpsc::UnboundedSender<ClientEvent>,
        controller: ReconnectController,
    ) -> Self {
        let last_status = controller.status();
        Self {
            config,
            connector,
            factory,
            input_tx,
            events,
            controller,
            session: None,
            next_session: 0,
            relay: None,
            link: 0,
            welcomed: false,
            observed: None,
            last_status,
        }
    }

    pub(crate) async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<DriverInput>) {
        info!(room = %self.config.room, role = %self.config.role, "Peer client starting");
        self.replace_session(self.config.role).await;
        self.flush();
        self.connect();

        while let Some(input) = inputs.recv().await {
            match input {
                DriverInput::LinkUp { link, outbound } if link == self.link => {
                    self.relay = Some(outbound);
                    self.welcomed = false;
                    self.controller.on_relay_connected();
                }
                DriverInput::LinkUp { .. } => {}
                DriverInput::Relay { link, event } if link == self.link => {
                    self.on_relay_event(event).await;
                }
                DriverInput::Relay { link, .. } => {
                    debug!(link, "Dropping event from stale relay link");
                }
                DriverInput::Peer { session, event } => self.on_peer_event(session, event).await,
                DriverInput::ReconnectDue(attempt) => self.on_reconnect_due(attempt),
                DriverInput::Command(ClientCommand::SwitchSource) => {
                    match self.controller.on_manual_switch() {
                        ControllerAction::Renegotiate => self.renegotiate().await,
                        other => self.announce(other),
                    }
                }
                DriverInput::Command(ClientCommand::Close(done)) => {
                    self.shutdown().await;
                    if let Some(done) = done {
                        let _ = done.send(());
                    }
                    break;
                }
            }
            self.flush();
        }

        debug!("Peer client stopped");
    }

    /// Opens a new relay link in the background. Its events come back tagged
    /// with the link number so a superseded link is ignored.
    fn connect(&mut self) {
        self.link += 1;
        self.relay = None;

        let link = self.link;
        let connector = self.connector.clone();
        let relay_url = self.config.relay_url.clone();
        let room = self.config.room.clone();
        let tx = self.input_tx.clone();

        tokio::spawn(async move {
            let RelayLink {
                outbound,
                mut inbound,
            } = match connector.connect(&relay_url, &room).await {
                Ok(link) => link,
                Err(e) => {
                    warn!("Relay connection failed: {:#}", e);
                    let event = RelayEvent::Closed { abnormal: true };
                    let _ = tx.send(DriverInput::Relay { link, event });
                    return;
                }
            };

            if tx.send(DriverInput::LinkUp { link, outbound }).is_err() {
                return;
            }

            let mut closed = false;
            while let Some(event) = inbound.recv().await {
                closed = matches!(event, RelayEvent::Closed { .. });
                if tx.send(DriverInput::Relay { link, event }).is_err() {
                    return;
                }
            }
            if !closed {
                let event = RelayEvent::Closed { abnormal: true };
                let _ = tx.send(DriverInput::Relay { link, event });
            }
        });
    }

    async fn on_relay_event(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Envelope(envelope) => self.on_envelope(envelope).await,
            RelayEvent::Malformed(reason) => warn!("Dropping malformed relay frame: {}", reason),
            RelayEvent::Closed { abnormal } => {
                self.relay = None;
                warn!(abnormal, "Relay connection closed");
                self.emit(ClientEvent::RelayLost { abnormal });
                for action in self.controller.on_relay_closed(abnormal) {
                    self.announce(action);
                }
            }
        }
    }

    async fn on_envelope(&mut self, envelope: Envelope) {
        match &envelope {
            Envelope::Welcome { room_id, message } => {
                if self.welcomed {
                    debug!("Ignoring repeated welcome");
                    return;
                }
                self.welcomed = true;
                info!(room = %room_id, "{}", message);
                self.emit(ClientEvent::Joined(room_id.clone()));
                let switched = self.session.as_ref().is_some_and(|s| s.can_offer());
                if self.config.role == Role::Offerer || switched {
                    self.begin_offer().await;
                }
                return;
            }
            Envelope::Offer { .. } if self.needs_fresh_session() => {
                info!("Offer received, starting a fresh session");
                self.replace_session(Role::Answerer).await;
            }
            _ => {}
        }

        let Some(session) = self.session.as_mut() else {
            self.report(NegotiationError::NoSession(envelope.kind()));
            return;
        };
        if let Err(e) = session.handle_envelope(envelope).await {
            self.report(e);
        }
    }

    async fn on_peer_event(&mut self, id: SessionId, event: PeerEvent) {
        let Some(session) = self.session.as_mut().filter(|s| s.id() == id) else {
            debug!(session = %id, "Dropping event from replaced session");
            return;
        };
        match event {
            PeerEvent::LocalCandidate(candidate) => session.on_local_candidate(candidate),
            PeerEvent::StateChanged(state) => session.on_peer_state(state),
            PeerEvent::RemoteTrack(kind) => {
                info!(session = %id, "Remote {} track", kind);
                self.emit(ClientEvent::RemoteTrack(kind));
            }
        }
    }

    fn on_reconnect_due(&mut self, attempt: u32) {
        if !self.controller.retry_desired() || self.relay.is_some() {
            return;
        }
        info!(attempt, "Reconnecting to relay");
        self.connect();
    }

    /// First welcome on a link: offer from the idle session, or from a fresh
    /// one if the current session already negotiated.
    async fn begin_offer(&mut self) {
        let reusable = self.session.as_ref().is_some_and(|s| s.can_offer());
        if !reusable {
            self.replace_session(Role::Offerer).await;
        }
        self.start_offer().await;
    }

    /// Manual switch. Whichever side asked offers the new round; the other
    /// side answers it in a fresh session of its own. Without a relay the
    /// offer waits for the next welcome.
    async fn renegotiate(&mut self) {
        self.replace_session(Role::Offerer).await;
        if self.welcomed && self.relay.is_some() {
            self.start_offer().await;
        }
    }

    async fn start_offer(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = session.start_offer().await {
            self.report(e);
        }
    }

    fn needs_fresh_session(&self) -> bool {
        match &self.session {
            None => true,
            Some(session) => matches!(
                session.state(),
                SignalingState::StableConnected | SignalingState::Failed | SignalingState::Closed
            ),
        }
    }

    async fn replace_session(&mut self, role: Role) {
        if let Some(mut old) = self.session.take() {
            let was = old.state();
            old.close().await;
            if was != SignalingState::Closed {
                self.emit(ClientEvent::SessionState {
                    session: old.id(),
                    state: SignalingState::Closed,
                });
            }
        }

        self.next_session += 1;
        let id = SessionId(self.next_session);
        let sink = PeerEventSink::new(id, self.input_tx.clone());

        match self.factory.create(role, sink).await {
            Ok(peer) => {
                debug!(session = %id, %role, "Session created");
                self.session = Some(NegotiationSession::new(id, role, peer));
                self.controller.on_session_started();
            }
            Err(e) => {
                warn!(session = %id, "Failed to create peer connection: {:#}", e);
                self.emit(ClientEvent::Error(format!("{e:#}")));
                if let Some(action) = self.controller.on_session_state(SignalingState::Failed) {
                    self.announce(action);
                }
            }
        }
    }

    async fn shutdown(&mut self) {
        info!("Closing peer client");
        self.controller.stop();
        if let Some(mut session) = self.session.take() {
            session.close().await;
            self.emit(ClientEvent::SessionState {
                session: session.id(),
                state: SignalingState::Closed,
            });
        }
        self.relay = None;
    }

    /// Sends what the session queued and reports state changes.
    fn flush(&mut self) {
        if let Some(session) = self.session.as_mut() {
            let outbound = session.take_outbound();
            let observed = (session.id(), session.state());

            for envelope in outbound {
                let kind = envelope.kind();
                let delivered = self
                    .relay
                    .as_ref()
                    .is_some_and(|relay| relay.send(envelope).is_ok());
                if !delivered {
                    debug!(kind, "Relay down, dropping outbound envelope");
                }
            }

            if self.observed != Some(observed) {
                self.observed = Some(observed);
                let (session, state) = observed;
                self.emit(ClientEvent::SessionState { session, state });
                if let Some(action) = self.controller.on_session_state(state) {
                    self.announce(action);
                }
            }
        }

        let status = self.controller.status();
        if status != self.last_status {
            self.last_status = status;
            info!(%status, "Client status changed");
            self.emit(ClientEvent::Status(status));
        }
    }

    fn announce(&self, action: ControllerAction) {
        match action {
            ControllerAction::Fallback => self.emit(ClientEvent::Fallback),
            ControllerAction::GiveUp => self.emit(ClientEvent::GaveUp),
            ControllerAction::Renegotiate => {}
        }
    }

    fn report(&self, err: NegotiationError) {
        match err {
            NegotiationError::Terminated(state) => debug!("Ignored input for {} session", state),
            err => {
                warn!("Negotiation: {}", err);
                self.emit(ClientEvent::Error(err.to_string()));
            }
        }
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

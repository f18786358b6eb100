//! Controller sessions
//!
//! A session pairs a transport with the queue it delivers into and issues
//! one command at a time, waiting for its Command Complete event before the
//! next one goes out.

use crate::error::{HciError, Result};
use crate::hci::constants::{EVT_CMD_COMPLETE, EVT_CMD_STATUS};
use crate::hci::packet::{HciCommand, PacketKind, QbceSubOpcode};
use crate::hci::queue::EventQueue;
use crate::hci::socket::SocketTransport;
use crate::hci::transport::{HciCallbacks, HciTransport, PacketDispatcher};
use crate::vendor::{BdAddr, ControllerVersion, QllFeatureSet, QlmpFeatureSet, SocAddonFeatures};
use log::{debug, info, warn};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(1000);

/// Session tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long to wait for each response; `None` waits forever
    pub command_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT),
        }
    }
}

/// Open/closed state shared between a session and its transport callbacks
///
/// `None` until the transport reports initialization, then `Some(true)`
/// while open and `Some(false)` once failed or closed.
#[derive(Debug, Default)]
pub struct SessionState {
    open: Mutex<Option<bool>>,
    changed: Condvar,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<bool>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_initialized(&self) -> bool {
        *self.lock() == Some(true)
    }

    pub fn set_initialized(&self, initialized: bool) {
        *self.lock() = Some(initialized);
        self.changed.notify_all();
    }

    /// Wait until the transport reports initialization
    pub fn wait_initialized(&self, timeout: Option<Duration>) -> Result<()> {
        let pending = |open: &mut Option<bool>| open.is_none();
        let open = match timeout {
            None => *self
                .changed
                .wait_while(self.lock(), pending)
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                let (open, _) = self
                    .changed
                    .wait_timeout_while(self.lock(), timeout, pending)
                    .unwrap_or_else(PoisonError::into_inner);
                match *open {
                    Some(open) => Some(open),
                    None => return Err(HciError::Timeout(timeout)),
                }
            }
        };

        match open {
            Some(true) => Ok(()),
            _ => Err(HciError::SessionClosed),
        }
    }
}

/// A connection to one controller
#[derive(Debug)]
pub struct HciSession<T: HciTransport> {
    transport: T,
    queue: Arc<EventQueue>,
    state: Arc<SessionState>,
    config: SessionConfig,
}

impl HciSession<SocketTransport> {
    /// Open `hci<dev_id>` through a raw HCI socket
    pub fn open_socket(dev_id: u16, config: SessionConfig) -> Result<Self> {
        let queue = Arc::new(EventQueue::new());
        let state = Arc::new(SessionState::new());
        let dispatcher = PacketDispatcher::new(Arc::clone(&queue), Arc::clone(&state));

        let transport = SocketTransport::open(dev_id, dispatcher.clone())?;
        let session = Self::with_state(transport, queue, state, config);
        dispatcher.initialization_complete(true);
        info!("Opened hci{} via raw socket", dev_id);
        Ok(session)
    }
}

impl<T: HciTransport> HciSession<T> {
    /// Wrap a transport that delivers into `queue`.
    ///
    /// The session starts uninitialized; the transport (or its binding)
    /// reports readiness through [`callbacks`](Self::callbacks) or
    /// [`SessionState::set_initialized`].
    pub fn new(transport: T, queue: Arc<EventQueue>, config: SessionConfig) -> Self {
        Self::with_state(transport, queue, Arc::new(SessionState::new()), config)
    }

    fn with_state(
        transport: T,
        queue: Arc<EventQueue>,
        state: Arc<SessionState>,
        config: SessionConfig,
    ) -> Self {
        Self {
            transport,
            queue,
            state,
            config,
        }
    }

    /// Callback sink a HAL-style transport delivers into
    pub fn callbacks(&self) -> PacketDispatcher {
        PacketDispatcher::new(Arc::clone(&self.queue), Arc::clone(&self.state))
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.state.is_initialized()
    }

    /// Block until the transport reports initialization, bounded by the
    /// command timeout
    pub fn wait_initialized(&self) -> Result<()> {
        self.state.wait_initialized(self.config.command_timeout)
    }

    /// Close the transport and drop anything still queued
    pub fn close(&mut self) -> Result<()> {
        self.state.set_initialized(false);
        self.queue.clear();
        self.transport.close()
    }

    /// Send `command`. Only one command is outstanding at a time, so any
    /// event still queued answers an earlier command and is dropped.
    pub fn send_command(&mut self, command: &HciCommand) -> Result<()> {
        if !self.is_open() {
            return Err(HciError::SessionClosed);
        }

        let stale = self.queue.drain(PacketKind::Event);
        if stale > 0 {
            warn!("Dropped {} stale event(s) before opcode 0x{:04x}", stale, command.opcode());
        }

        let bytes = command.to_bytes()?;
        debug!("-> opcode 0x{:04x}: {}", command.opcode(), hex::encode(&bytes));
        self.transport.send_command(&bytes)
    }

    /// Wait for the next event, starting at its event code
    pub fn read_event(&mut self) -> Result<Vec<u8>> {
        let packet = self
            .queue
            .pop_timeout(PacketKind::Event, self.config.command_timeout)?;
        Ok(packet.into_data())
    }

    /// Send `command` and return the event that answers it.
    ///
    /// Command Complete or Command Status events for other opcodes, such as
    /// a late answer to a command that already timed out, are discarded
    /// while waiting. The whole exchange shares one command timeout.
    pub fn execute(&mut self, command: &HciCommand) -> Result<Vec<u8>> {
        self.send_command(command)?;

        let opcode = command.opcode();
        let timeout = self.config.command_timeout;
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            let event = match self.queue.pop_timeout(PacketKind::Event, remaining) {
                Ok(packet) => packet.into_data(),
                Err(HciError::Timeout(_)) => {
                    return Err(HciError::Timeout(timeout.unwrap_or_default()))
                }
                Err(e) => return Err(e),
            };

            if answered_opcode(&event) == Some(opcode) {
                debug!(
                    "opcode 0x{:04x} answered with {} bytes: {}",
                    opcode,
                    event.len(),
                    hex::encode(&event)
                );
                return Ok(event);
            }
            warn!(
                "Discarding event while waiting for opcode 0x{:04x}: {}",
                opcode,
                hex::encode(&event)
            );
        }
    }

    /// Read the public device address of the controller
    pub fn read_bd_addr(&mut self) -> Result<BdAddr> {
        let event = self.execute(&HciCommand::ReadBdAddr)?;
        BdAddr::decode(&event)
    }

    pub fn read_local_version(&mut self) -> Result<ControllerVersion> {
        let event = self.execute(&HciCommand::ReadLocalVersion)?;
        ControllerVersion::decode(&event)
    }

    pub fn read_soc_addon_features(&mut self) -> Result<SocAddonFeatures> {
        let event = self.execute(&HciCommand::GetAddonFeatures)?;
        SocAddonFeatures::decode(&event)
    }

    pub fn read_local_qlmp_features(&mut self) -> Result<QlmpFeatureSet> {
        let event = self.execute(&HciCommand::Qbce {
            sub_opcode: QbceSubOpcode::ReadLocalQlmSupportedFeatures,
        })?;
        QlmpFeatureSet::decode(&event)
    }

    pub fn read_local_qll_features(&mut self) -> Result<QllFeatureSet> {
        let event = self.execute(&HciCommand::Qbce {
            sub_opcode: QbceSubOpcode::ReadLocalQllSupportedFeatures,
        })?;
        QllFeatureSet::decode(&event)
    }
}

/// Opcode a Command Complete or Command Status event answers
fn answered_opcode(event: &[u8]) -> Option<u16> {
    let offset = match *event.first()? {
        EVT_CMD_COMPLETE => 3,
        EVT_CMD_STATUS => 4,
        _ => return None,
    };
    let opcode = event.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([opcode[0], opcode[1]]))
}

impl<T: HciTransport> Drop for HciSession<T> {
    fn drop(&mut self) {
        if self.is_open() {
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hci::constants::*;
    use crate::hci::packet::Packet;
    use crate::hci::transport::HciCallbacks;
    use crate::hci::{CommandComplete, HciStatus};
    use std::collections::VecDeque;
    use std::thread;

    /// Answers each command with the next scripted event, from another
    /// thread, the way a real controller would
    struct ScriptedController {
        queue: Arc<EventQueue>,
        responses: Mutex<VecDeque<Vec<u8>>>,
        sent: Mutex<Vec<Vec<u8>>>,
        closed: Mutex<bool>,
        delays: Mutex<VecDeque<Duration>>,
    }

    impl ScriptedController {
        fn new(queue: Arc<EventQueue>, responses: Vec<Vec<u8>>) -> Self {
            Self {
                queue,
                responses: Mutex::new(responses.into()),
                sent: Mutex::new(Vec::new()),
                closed: Mutex::new(false),
                delays: Mutex::new(VecDeque::new()),
            }
        }

        /// Answer the next commands after these delays instead of 5ms
        fn with_delays(self, delays: Vec<Duration>) -> Self {
            *self.delays.lock().unwrap() = delays.into();
            self
        }

        fn sent(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl HciTransport for ScriptedController {
        fn send_command(&self, command: &[u8]) -> Result<()> {
            self.sent.lock().unwrap().push(command.to_vec());
            let delay = self
                .delays
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Duration::from_millis(5));
            if let Some(response) = self.responses.lock().unwrap().pop_front() {
                let queue = Arc::clone(&self.queue);
                thread::spawn(move || {
                    thread::sleep(delay);
                    queue.push(Packet::event(response));
                });
            }
            Ok(())
        }

        fn close(&self) -> Result<()> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    fn complete(opcode: u16, params: Vec<u8>) -> Vec<u8> {
        CommandComplete::new(opcode, params).to_bytes().unwrap()
    }

    fn failed(opcode: u16, status: HciStatus) -> Vec<u8> {
        CommandComplete {
            num_hci_command_packets: 1,
            opcode,
            status,
            return_parameters: vec![],
        }
        .to_bytes()
        .unwrap()
    }

    fn open_session(responses: Vec<Vec<u8>>) -> HciSession<ScriptedController> {
        let queue = Arc::new(EventQueue::new());
        let controller = ScriptedController::new(Arc::clone(&queue), responses);
        let session = HciSession::new(
            controller,
            queue,
            SessionConfig {
                command_timeout: Some(Duration::from_millis(500)),
            },
        );
        session.callbacks().initialization_complete(true);
        session
    }

    fn qualcomm_version() -> Vec<u8> {
        // hci 5.1 rev 0x000c, lmp 5.1, manufacturer 0x001d, subversion 0x587b
        complete(
            HCI_READ_LOCAL_VERSION,
            vec![0x0A, 0x0C, 0x00, 0x0A, 0x1D, 0x00, 0x7B, 0x58],
        )
    }

    #[test]
    fn test_read_local_version() {
        let mut session = open_session(vec![qualcomm_version()]);

        let version = session.read_local_version().unwrap();
        assert_eq!(version.manufacturer, 0x001D);
        assert_eq!(version.hci_version, 0x0A);
        assert_eq!(version.hci_revision, 0x000C);
        assert_eq!(version.lmp_version, 0x0A);
        assert_eq!(version.lmp_subversion, 0x587B);
        assert!(version.is_qti_controller());

        assert_eq!(session.transport().sent(), vec![vec![0x01, 0x10, 0x00]]);
    }

    #[test]
    fn test_full_feature_read() {
        let mut soc_params = vec![0x34, 0x12, 0x02, 0x00];
        soc_params.extend_from_slice(&[0x00, 0x00, 0x00, 0x10, 0x00]); // QLE HCI
        let mut qlmp_params = vec![QBCE_READ_LOCAL_QLM_SUPPORTED_FEATURES];
        qlmp_params.extend_from_slice(&[0x80; 16]);

        let mut session = open_session(vec![
            qualcomm_version(),
            complete(HCI_VS_GET_ADDON_FEATURES_SUPPORT, soc_params),
            complete(HCI_VS_QBCE_OCF, qlmp_params),
        ]);

        assert!(session.read_local_version().unwrap().is_qti_controller());

        let soc = session.read_soc_addon_features().unwrap();
        assert_eq!(soc.product_id, 0x1234);
        assert_eq!(soc.response_version, 2);
        assert_eq!(soc.valid_bytes(), 5);
        assert!(soc.supports_qle_hci().is_supported());

        let qlmp = session.read_local_qlmp_features().unwrap();
        assert!(qlmp.supports_qhs_p5());
        assert!(!qlmp.supports_qhs_p6());

        let sent = session.transport().sent();
        assert_eq!(sent[1], vec![0x1D, 0xFC, 0x00]);
        assert_eq!(sent[2], vec![0x51, 0xFC, 0x01, 0x09]);
    }

    #[test]
    fn test_status_error_is_recoverable() {
        let mut qll_params = vec![QBCE_READ_LOCAL_QLL_SUPPORTED_FEATURES];
        qll_params.extend_from_slice(&[0x01, 0, 0, 0, 0, 0, 0, 0x20]);

        let mut session = open_session(vec![
            failed(HCI_VS_GET_ADDON_FEATURES_SUPPORT, HciStatus::UnknownHciCommand),
            complete(HCI_VS_QBCE_OCF, qll_params),
        ]);

        let err = session.read_soc_addon_features().unwrap_err();
        assert_eq!(err.status(), Some(HciStatus::UnknownHciCommand));
        assert!(!err.is_transport());

        let qll = session.read_local_qll_features().unwrap();
        assert!(qll.supports_qll_hs_p2_tx());
        assert!(qll.supports_qll_xpan());
    }

    #[test]
    fn test_silent_controller_times_out() {
        let queue = Arc::new(EventQueue::new());
        let controller = ScriptedController::new(Arc::clone(&queue), vec![]);
        let mut session = HciSession::new(
            controller,
            queue,
            SessionConfig {
                command_timeout: Some(Duration::from_millis(50)),
            },
        );
        session.state().set_initialized(true);

        let err = session.read_local_version().unwrap_err();
        assert!(matches!(err, HciError::Timeout(d) if d == Duration::from_millis(50)));
    }

    #[test]
    fn test_late_answer_does_not_leak_into_next_command() {
        let mut qlmp_params = vec![QBCE_READ_LOCAL_QLM_SUPPORTED_FEATURES];
        qlmp_params.extend_from_slice(&[0x09; 16]);
        let soc_params = vec![0x34, 0x12, 0x01, 0x00, 0x01];

        let queue = Arc::new(EventQueue::new());
        let controller = ScriptedController::new(
            Arc::clone(&queue),
            vec![
                complete(HCI_VS_QBCE_OCF, qlmp_params),
                complete(HCI_VS_GET_ADDON_FEATURES_SUPPORT, soc_params),
            ],
        )
        .with_delays(vec![Duration::from_millis(140), Duration::from_millis(70)]);
        let mut session = HciSession::new(
            controller,
            queue,
            SessionConfig {
                command_timeout: Some(Duration::from_millis(100)),
            },
        );
        session.state().set_initialized(true);

        let err = session.read_local_qlmp_features().unwrap_err();
        assert!(matches!(err, HciError::Timeout(_)));

        // The QLMP answer shows up while the SoC read is outstanding
        let soc = session.read_soc_addon_features().unwrap();
        assert_eq!(soc.product_id, 0x1234);
        assert_eq!(soc.response_version, 1);
        assert!(soc.supports_wipower().is_supported());
    }

    #[test]
    fn test_queued_events_dropped_before_send() {
        let mut session = open_session(vec![qualcomm_version()]);
        session
            .queue()
            .push(Packet::event(complete(HCI_VS_GET_ADDON_FEATURES_SUPPORT, vec![0xAB; 8])));
        session.queue().push(Packet::event(vec![0x05, 0x04, 0x00, 0x01, 0x00, 0x13]));

        let version = session.read_local_version().unwrap();
        assert_eq!(version.lmp_subversion, 0x587B);
        assert!(session.queue().is_empty(PacketKind::Event));
    }

    #[test]
    fn test_command_status_for_other_opcode_ignored() {
        let queue = Arc::new(EventQueue::new());
        let controller = ScriptedController::new(Arc::clone(&queue), vec![qualcomm_version()])
            .with_delays(vec![Duration::from_millis(40)]);
        let mut session = HciSession::new(controller, queue, SessionConfig::default());
        session.state().set_initialized(true);

        let stray = thread::spawn({
            let queue = Arc::clone(session.queue());
            move || {
                thread::sleep(Duration::from_millis(10));
                queue.push(Packet::event(vec![EVT_CMD_STATUS, 0x04, 0x00, 0x01, 0x05, 0x04]));
            }
        });

        assert!(session.read_local_version().unwrap().is_qti_controller());
        stray.join().unwrap();
    }

    #[test]
    fn test_read_bd_addr() {
        let mut session = open_session(vec![complete(
            HCI_READ_BD_ADDR,
            vec![0x13, 0x71, 0xDA, 0x7D, 0x1A, 0x00],
        )]);

        let addr = session.read_bd_addr().unwrap();
        assert_eq!(addr.0, [0x13, 0x71, 0xDA, 0x7D, 0x1A, 0x00]);
        assert_eq!(addr.to_string(), "00:1A:7D:DA:71:13");
        assert_eq!(session.transport().sent(), vec![vec![0x09, 0x10, 0x00]]);
    }

    #[test]
    fn test_transport_loss_closes_session() {
        let mut session = open_session(vec![qualcomm_version()]);
        assert!(session.is_open());

        let err = HciError::ReceiveError(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        session.callbacks().transport_lost(&err);

        assert!(!session.is_open());
        let err = session.read_local_version().unwrap_err();
        assert!(matches!(err, HciError::SessionClosed));
        assert!(err.is_transport());
        assert!(session.transport().sent().is_empty());
    }

    #[test]
    fn test_commands_require_initialization() {
        let queue = Arc::new(EventQueue::new());
        let controller = ScriptedController::new(Arc::clone(&queue), vec![qualcomm_version()]);
        let mut session = HciSession::new(controller, queue, SessionConfig::default());

        let err = session.read_local_version().unwrap_err();
        assert!(matches!(err, HciError::SessionClosed));
        assert!(session.transport().sent().is_empty());

        let callbacks = session.callbacks();
        let init = thread::spawn(move || callbacks.initialization_complete(true));
        session.wait_initialized().unwrap();
        init.join().unwrap();

        assert!(session.read_local_version().is_ok());
    }

    #[test]
    fn test_failed_initialization() {
        let queue = Arc::new(EventQueue::new());
        let controller = ScriptedController::new(Arc::clone(&queue), vec![]);
        let session = HciSession::new(controller, queue, SessionConfig::default());

        session.callbacks().initialization_complete(false);
        assert!(matches!(session.wait_initialized(), Err(HciError::SessionClosed)));
        assert!(!session.is_open());
    }

    #[test]
    fn test_close_ends_session() {
        let mut session = open_session(vec![qualcomm_version()]);
        session.queue().push(Packet::event(vec![0x0E]));

        session.close().unwrap();

        assert!(!session.is_open());
        assert!(*session.transport().closed.lock().unwrap());
        assert!(session.queue().is_empty(PacketKind::Event));
        assert!(matches!(
            session.read_local_version(),
            Err(HciError::SessionClosed)
        ));
    }

    #[test]
    fn test_dispatcher_routes_by_kind() {
        let session = open_session(vec![]);
        let callbacks = session.callbacks();

        callbacks.acl_data_received(&[0x01, 0x02]);
        callbacks.sco_data_received(&[0x03]);
        callbacks.iso_data_received(&[0x04]);
        callbacks.hci_event_received(&[0x0E, 0x00]);

        let queue = session.queue();
        assert_eq!(queue.try_pop(PacketKind::Acl).unwrap().data(), &[0x01, 0x02]);
        assert_eq!(queue.try_pop(PacketKind::Sco).unwrap().data(), &[0x03]);
        assert_eq!(queue.try_pop(PacketKind::Iso).unwrap().data(), &[0x04]);
        assert_eq!(queue.try_pop(PacketKind::Event).unwrap().data(), &[0x0E, 0x00]);
    }
}

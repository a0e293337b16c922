//! Session coordination
//!
//! The coordinator owns the authoritative speech session and the menu
//! visibility projection. It consumes menu clicks, surface lifecycle
//! events and speaker status messages, and issues commands to the
//! speaker over the message channel. No failure escapes an event
//! handler: every error path ends with the session reset to idle.

pub mod menu;

use crate::config::Config;
use crate::message::{Command, Status};
use crate::store::Store;
use crate::{LeitorError, Result};
use crossbeam_channel::Sender;
use log::{debug, error, info, warn};
use menu::{MenuCommand, MenuHost, MenuVisibility, MENU_ITEMS};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Notification title shown to the user
const NOTIFY_TITLE: &str = "Leitor de Texto Simples";

/// Identifier of the surface (document/tab) where text was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

/// Session phase, the coordinator's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Speaking,
    Paused,
}

/// The coordinator's record of active speech
///
/// Invariant: when `active` is false the other fields are all unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Whether speech is currently active
    pub active: bool,
    /// Surface where speech is playing
    pub surface: Option<SurfaceId>,
    /// Text being spoken
    pub text: Option<String>,
    /// When the session started
    pub started_at: Option<SystemTime>,
}

impl Session {
    /// Empty session, the startup state
    pub fn idle() -> Self {
        Self {
            active: false,
            surface: None,
            text: None,
            started_at: None,
        }
    }

    /// Session for speech starting now on the given surface
    fn begin(surface: SurfaceId, text: String) -> Self {
        Self {
            active: true,
            surface: Some(surface),
            text: Some(text),
            started_at: Some(SystemTime::now()),
        }
    }

    /// Reset to the empty state
    pub fn clear(&mut self) {
        *self = Self::idle();
    }
}

/// Events consumed by the coordinator
///
/// Callback registrations (menu host, surface listeners, the status
/// channel) all funnel into this enum, keeping the transition logic
/// independent of the delivery mechanism.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A menu item was clicked on a surface
    MenuClicked {
        command: MenuCommand,
        surface: SurfaceId,
        /// Selected text, present for speak clicks
        selection: Option<String>,
    },
    /// Status message from the speaker
    Status(Status),
    /// The surface navigated to a new document
    SurfaceNavigated(SurfaceId),
    /// The surface was closed
    SurfaceClosed(SurfaceId),
}

/// Host service that displays user-facing notifications
///
/// Best-effort: implementations swallow their own failures.
pub trait Notifier {
    fn notify(&mut self, title: &str, message: &str);
}

/// Coordinator for the speech session and menu state
pub struct Coordinator<M: MenuHost, N: Notifier> {
    phase: Phase,
    session: Session,
    menu: M,
    notifier: N,
    /// Command channel to the speaker
    commands: Sender<Command>,
    /// Best-effort session snapshot storage
    store: Store,
    show_notifications: bool,
    auto_stop_on_new_selection: bool,
}

impl<M: MenuHost, N: Notifier> Coordinator<M, N> {
    /// Create the coordinator, register menu items and render the idle menu
    pub fn new(
        mut menu: M,
        notifier: N,
        commands: Sender<Command>,
        store: Store,
        config: &Config,
    ) -> Result<Self> {
        menu.create_items(&MENU_ITEMS)?;
        menu.apply(MenuVisibility::IDLE)?;

        // The previous snapshot is informational only; a fresh process
        // always starts idle.
        match store.load_session() {
            Ok(Some(prev)) if prev.active => {
                info!("Previous session did not finish: {:?}", prev.text);
            }
            Ok(_) => {}
            Err(e) => debug!("No usable session snapshot: {}", e),
        }

        Ok(Self {
            phase: Phase::Idle,
            session: Session::idle(),
            menu,
            notifier,
            commands,
            store,
            show_notifications: config.show_notifications(),
            auto_stop_on_new_selection: config.auto_stop_on_new_selection(),
        })
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current session record
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Menu visibility derived from the current phase
    pub fn visibility(&self) -> MenuVisibility {
        MenuVisibility::for_phase(self.phase)
    }

    /// Handle one event
    ///
    /// Never propagates a failure: any error is logged and collapses the
    /// session back to idle.
    pub fn handle(&mut self, event: Event) {
        if let Err(e) = self.dispatch(event) {
            error!("Event handling failed: {}", e);
            self.force_idle();
        }
    }

    /// Reset on process startup
    pub fn startup(&mut self) {
        info!("{}: startup, resetting session", crate::APP_NAME);
        self.force_idle();
    }

    /// Reset on process suspend/shutdown
    pub fn suspend(&mut self) {
        info!("{}: suspending, resetting session", crate::APP_NAME);
        self.force_idle();
    }

    fn dispatch(&mut self, event: Event) -> Result<()> {
        match event {
            Event::MenuClicked {
                command,
                surface,
                selection,
            } => self.on_menu_clicked(command, surface, selection),
            Event::Status(status) => self.on_status(status),
            Event::SurfaceNavigated(id) | Event::SurfaceClosed(id) => {
                self.on_surface_gone(id)
            }
        }
    }

    fn on_menu_clicked(
        &mut self,
        command: MenuCommand,
        surface: SurfaceId,
        selection: Option<String>,
    ) -> Result<()> {
        match command {
            MenuCommand::Speak => {
                let text = match selection.filter(|t| !t.trim().is_empty()) {
                    Some(t) => t,
                    None => {
                        warn!("Speak clicked without selected text");
                        return Ok(());
                    }
                };

                if self.phase != Phase::Idle && !self.auto_stop_on_new_selection {
                    debug!("Speech active and auto-stop disabled, ignoring new selection");
                    return Ok(());
                }

                debug!(
                    "Starting session on surface {:?}: {:.50}",
                    surface, text
                );
                self.session = Session::begin(surface, text.clone());
                self.transition(Phase::Speaking)?;
                self.snapshot();
                self.send(Command::Speak {
                    text,
                    options: None,
                })?;
            }
            MenuCommand::Stop => {
                // Reset immediately; the stopped status that follows is a
                // no-op. The send may fail if the surface is gone, which
                // is the same outcome.
                if self.send(Command::Stop).is_err() {
                    debug!("Stop command not delivered, resetting anyway");
                }
                self.reset()?;
            }
            MenuCommand::Pause => {
                if self.phase != Phase::Speaking {
                    debug!("Pause clicked while not speaking, ignoring");
                    return Ok(());
                }
                self.send(Command::Pause)?;
                self.transition(Phase::Paused)?;
            }
            MenuCommand::Resume => {
                if self.phase != Phase::Paused {
                    debug!("Resume clicked while not paused, ignoring");
                    return Ok(());
                }
                self.send(Command::Resume)?;
                self.transition(Phase::Speaking)?;
            }
        }
        Ok(())
    }

    fn on_status(&mut self, status: Status) -> Result<()> {
        match status {
            Status::Started => {
                debug!("Speaker confirmed start");
            }
            Status::Finished => {
                debug!("Speech finished naturally");
                self.reset()?;
            }
            Status::Stopped => {
                debug!("Speech stopped");
                self.reset()?;
            }
            Status::Paused => {
                if self.phase == Phase::Speaking {
                    self.transition(Phase::Paused)?;
                }
            }
            Status::Resumed => {
                if self.phase == Phase::Paused {
                    self.transition(Phase::Speaking)?;
                }
            }
            Status::Error { error } => {
                error!("Speech error: {}", error);
                self.reset()?;
                if self.show_notifications {
                    self.notifier
                        .notify(NOTIFY_TITLE, &format!("Erro na leitura: {}", error));
                }
            }
        }
        Ok(())
    }

    /// The surface carrying the session navigated away or closed
    ///
    /// Collapses to idle without waiting for a status message; the
    /// speaker context is gone along with the surface.
    fn on_surface_gone(&mut self, id: SurfaceId) -> Result<()> {
        if self.session.active && self.session.surface == Some(id) {
            info!("Surface {:?} gone during speech, resetting", id);
            self.reset()?;
        }
        Ok(())
    }

    /// Move to a phase and apply the matching menu tuple in one step
    fn transition(&mut self, phase: Phase) -> Result<()> {
        self.phase = phase;
        self.menu.apply(MenuVisibility::for_phase(phase))
    }

    /// Clear the session and return the menu to the idle tuple
    fn reset(&mut self) -> Result<()> {
        self.session.clear();
        self.transition(Phase::Idle)?;
        self.snapshot();
        debug!("Session reset");
        Ok(())
    }

    /// Reset that cannot fail, used from catch paths
    fn force_idle(&mut self) {
        self.phase = Phase::Idle;
        self.session.clear();
        if let Err(e) = self.menu.apply(MenuVisibility::IDLE) {
            error!("Menu reset failed: {}", e);
        }
        self.snapshot();
    }

    /// Best-effort session snapshot; failures stay silent
    fn snapshot(&self) {
        if let Err(e) = self.store.save_session(&self.session) {
            debug!("Session snapshot failed: {}", e);
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| LeitorError::Other("speaker channel closed".to_string()))
    }
}

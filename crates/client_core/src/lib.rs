//! Client side of the sprint session protocol.
//!
//! [`transport`] moves frames, [`decoder`] narrows them into
//! [`SessionEvent`]s, [`state`] folds them into the view model and
//! [`controller`] ties one session's lifecycle together for the UI.

pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod export;
pub mod health;
pub mod state;
pub mod transport;

pub use config::{load_settings, ClientSettings};
pub use controller::SessionController;
pub use decoder::{decode, SessionEvent};
pub use error::{DecodeError, SessionError, TransportError};
pub use state::{SessionPhase, SessionState};
pub use transport::{WsTransport, WsTransportFactory};

//! Transport boundary.
//!
//! The crate never speaks a wire protocol itself. A host plugs in:
//! - a [`Dialer`] that opens [`Channel`]s (TLS, keepalive and per-call
//!   [`Credentials`] are its business);
//! - [`Channel`]s exposing the three collector calls: unary host registration,
//!   the client-streaming [`StateSink`] and the bidirectional [`TaskStream`].
//!
//! [`SessionDialer`] wraps the dialer with the dial/registration timeouts.

mod channel;
mod credentials;
mod dialer;

pub use channel::{Channel, ChannelState, StateSink, TaskStream};
pub use credentials::{Credentials, SecretAuth};
pub use dialer::{DialTarget, Dialer, SessionDialer};

//! Client side of the query console: the submission controller, the view seam
//! it drives, escaping, settings and the HTTP transport.

pub mod config;
pub mod controller;
pub mod error;
pub mod markup;
pub mod transport;
pub mod view;

pub use config::{load_settings, ClientSettings, SettingsOverrides};
pub use controller::{Applied, PendingQuery, QueryController};
pub use error::{ConfigError, QueryError};
pub use transport::{HttpQueryTransport, QueryTransport};
pub use view::{PanelState, QueryView, StatusIndicator, StatusUpdate};

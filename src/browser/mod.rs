//! Browser boundary: trait seam, HTTP implementation, timing profiles.

pub mod http;
pub mod tab;
pub mod timing;

pub use http::HttpBrowser;
pub use tab::{Browser, BrowserTab, ClickOutcome, TabError, TabId};
pub use timing::{SpeedMode, TimingProfile};

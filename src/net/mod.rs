//! Networking core: link lifecycle, broker session, and the event
//! plumbing between ESP-IDF callbacks and their owners.

pub mod channels;
pub mod connectivity;
pub mod credentials;
pub mod dispatch;
pub mod session;

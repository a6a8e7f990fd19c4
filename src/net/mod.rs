//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! [server.tls] configured?
//!     no  → tokio TcpListener → axum::serve
//!     yes → tls.rs (load PEM cert/key) → axum_server::bind_rustls
//! ```

pub mod tls;

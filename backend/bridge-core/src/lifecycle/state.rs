//! Handshake state machines, one enum per side.
//!
//! Transitions are driven by message arrival and local readiness events
//! and are logged on every change. States only ever move forward.

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Backend-side handshake progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendHandshakeState {
    Created,
    /// All component init() futures are outstanding.
    BackendsInitializing,
    /// Waiting for the page to announce itself via onPageInit.
    WaitingForPage,
    /// Calling onBackendInitialized on the frontend.
    NotifyingFrontend,
    Ready,
}

impl Display for BackendHandshakeState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            BackendHandshakeState::Created => "Created",
            BackendHandshakeState::BackendsInitializing => "BackendsInitializing",
            BackendHandshakeState::WaitingForPage => "WaitingForPage",
            BackendHandshakeState::NotifyingFrontend => "NotifyingFrontend",
            BackendHandshakeState::Ready => "Ready",
        };
        write!(formatter, "{name}")
    }
}

/// Frontend-side handshake progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendHandshakeState {
    Created,
    /// Waiting for the hosting page to report DOM readiness.
    WaitingForDom,
    /// Calling onPageInit and awaiting onBackendInitialized.
    NotifyingBackend,
    Ready,
}

impl Display for FrontendHandshakeState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            FrontendHandshakeState::Created => "Created",
            FrontendHandshakeState::WaitingForDom => "WaitingForDom",
            FrontendHandshakeState::NotifyingBackend => "NotifyingBackend",
            FrontendHandshakeState::Ready => "Ready",
        };
        write!(formatter, "{name}")
    }
}

//! Integration Tests Module
//!
//! End-to-end scenarios for the bridge: the action wire format, pagination,
//! and the gateway driving selection, relaying and navigation through
//! recording adapters.

// Shared recording adapters
mod support;

// Action codec and directory paging
mod codec_test;

// Gateway scenarios through the control and source adapters
mod bridge_flow_test;

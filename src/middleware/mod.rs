// ABOUTME: HTTP middleware for CORS and request tracing
// ABOUTME: Layers applied around every route by the server builder
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Foodgram Contributors

/// Cross-origin resource sharing
pub mod cors;
/// Request ids and request spans
pub mod tracing;

pub use self::cors::setup_cors;
pub use self::tracing::{
    create_request_span, MakeRequestUuid, RecordResponse, RequestSpan, REQUEST_ID_HEADER,
};

// tracehub-providers/src/lib.rs
// ============================================================================
// Module: TraceHub Providers Library
// Description: Concrete drivers for the engine's outbound adapter seams.
// Purpose: Expose carrier, classifier, blob, and mailer implementations.
// Dependencies: aws-sdk-s3, reqwest, tracehub-core
// ============================================================================

//! ## Overview
//! `tracehub-providers` implements the outbound adapter interfaces defined in
//! `tracehub-core`: an HTTP carrier client with a host policy, an HTTP
//! classifier with a keyword fallback, local-directory and S3 blob drivers,
//! and mailer implementations for development and tests. Every driver treats
//! remote content as untrusted and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod blob;
pub mod carrier;
pub mod classifier;
pub mod mailer;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use blob::local::LocalBlobStore;
pub use blob::s3::S3BlobStore;
pub use carrier::HttpCarrierClient;
pub use carrier::HttpCarrierPolicy;
pub use classifier::HttpClassifier;
pub use classifier::KeywordClassifier;
pub use mailer::CaptureMailer;
pub use mailer::LogMailer;

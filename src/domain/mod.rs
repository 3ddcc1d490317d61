//! Domain layer - pure logic with no I/O beyond reading a document file.
//!
//! This layer contains the core concepts of the submission client:
//! - Registration documents and their wire mapping
//! - JSON encoding of documents
//! - Fixed-window permit accounting
//!
//! All types in this layer are pure and easily testable.

pub mod codec;
pub mod document;
pub mod window;

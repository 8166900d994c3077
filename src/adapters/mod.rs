//! External integrations
//!
//! Everything behind these modules is a collaborator the export core talks
//! to through a trait: the remote transfer channel, the record document
//! provider and the image derivative writer.

pub mod imaging;
pub mod metadata;
pub mod transfer;

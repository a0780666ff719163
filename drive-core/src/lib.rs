mod client;

pub use client::{ChildKind, DriveClient, DriveError, DriveFile, FileList};

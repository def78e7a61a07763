//! HTTP collaborator interface.
//!
//! The host application serves the initial data and history over HTTP. This
//! trait is all the engine knows about it; implementations deal with URLs,
//! authentication and record shapes.

use std::future::Future;

use parley_core::{Conversation, DirectoryUser, Message, UserId};

/// The host's chat endpoints.
///
/// Implementations are cheap to clone so the runtime can run several requests
/// concurrently, each owning its handle.
pub trait ChatApi: Clone + 'static {
    /// Request failure.
    type Error: std::error::Error + 'static;

    /// The authenticated user.
    fn fetch_self(&self) -> impl Future<Output = Result<DirectoryUser, Self::Error>>;

    /// Every conversation of the local user, in display order.
    fn fetch_dialogs(&self) -> impl Future<Output = Result<Vec<Conversation>, Self::Error>>;

    /// Message history with `user`. Order is not guaranteed.
    fn fetch_history(&self, user: UserId) -> impl Future<Output = Result<Vec<Message>, Self::Error>>;

    /// Users the local user can chat with.
    fn fetch_users(&self) -> impl Future<Output = Result<Vec<DirectoryUser>, Self::Error>>;

    /// Mark every message from `user` as read.
    fn mark_all_read(&self, user: UserId) -> impl Future<Output = Result<(), Self::Error>>;
}

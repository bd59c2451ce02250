/// Router Module Index
///
/// Organizes the routing into public infrastructure endpoints and the post
/// submission endpoint. Authorization for posts is decided inside the handler rather
/// than by a router layer, because an empty title must be rejected before any session
/// lookup happens.

/// Routes accessible to all clients (health checks).
pub mod public;

/// Post submission routes.
pub mod posts;

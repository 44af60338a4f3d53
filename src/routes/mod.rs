/// Router Module Index
///
/// Routes are split by access tier. The tier decides which layers wrap them in
/// `create_router`; finer role rules are enforced inside the handlers.

/// Routes reachable without credentials: health check and login.
pub mod public;

/// Every other `/api` route, behind the `AuthUser` middleware.
pub mod authenticated;

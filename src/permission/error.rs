use derive_more::Display;

/// Why a client may not perform a request.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Denial {
    /// No credentials were presented for a write.
    #[display(fmt = "Authentication credentials were not provided.")]
    NotAuthenticated,
    /// Credentials are valid but do not grant this write.
    #[display(fmt = "You do not have permission to perform this action.")]
    PermissionDenied,
}

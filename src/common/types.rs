/// A generic boxed error type.
///
/// Used on the resolver side, where failures are logged and dropped rather
/// than matched on.
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result alias returning `AnyError`.
pub type AnyResult<T> = std::result::Result<T, AnyError>;

//! Panic payload formatting helpers.
//!
//! Step bodies and extensions are polled under `catch_unwind`, so a caught
//! payload has to be turned into a message before it is stored in a result.

use std::any::Any;

/// Formats a panic payload into a readable message.
///
/// String payloads are extracted directly, common scalar payloads are
/// rendered with `Display`, and everything else falls back to `Debug`.
///
/// # Examples
///
/// ```
/// use stepwise::panic_message;
/// use std::any::Any;
///
/// let payload: Box<dyn Any + Send> = Box::new("boom");
/// assert_eq!(panic_message(payload.as_ref()), "boom");
/// ```
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .or_else(|| payload.downcast_ref::<i32>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<i64>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<u32>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<u64>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<usize>().map(ToString::to_string))
        .unwrap_or_else(|| format!("{payload:?}"))
}

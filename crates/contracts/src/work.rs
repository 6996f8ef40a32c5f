//! WorkHandler trait and WorkParam - Dispatch Queue input interface

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::ProfileEvent;

/// Parameter block owned by a queued work item
///
/// Ownership moves enqueuer -> queue -> worker; the worker drops it once,
/// after the handler returns.
pub enum WorkParam {
    /// Private copy of a raw parameter block
    Bytes(Box<[u8]>),
    /// Typed profile event
    Profile(ProfileEvent),
    /// Caller-defined payload
    Custom(Box<dyn Any + Send>),
}

impl WorkParam {
    /// Raw bytes, if this is a byte parameter
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Profile event, if this is a typed parameter
    pub fn as_profile(&self) -> Option<&ProfileEvent> {
        match self {
            Self::Profile(event) => Some(event),
            _ => None,
        }
    }

    /// Downcast a custom payload
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for WorkParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Profile(event) => f.debug_tuple("Profile").field(event).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Deferred event handler
///
/// Invoked on the dispatch worker thread, one item at a time.
pub trait WorkHandler: Send + Sync {
    fn handle(&self, event_id: u16, param: Option<&WorkParam>);
}

impl<F> WorkHandler for F
where
    F: Fn(u16, Option<&WorkParam>) + Send + Sync,
{
    fn handle(&self, event_id: u16, param: Option<&WorkParam>) {
        self(event_id, param)
    }
}

/// Shared handler reference held by queued work items
pub type SharedHandler = Arc<dyn WorkHandler>;

/// Fix-up hook for the raw byte path: `(dest, src)`, run once after the copy
pub type CopyHook = dyn Fn(&mut [u8], &[u8]) + Send + Sync;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::A2dpEvent;
    use std::sync::atomic::{AtomicU16, Ordering};

    #[test]
    fn test_closure_is_handler() {
        let seen = Arc::new(AtomicU16::new(0));
        let seen_clone = seen.clone();
        let handler: SharedHandler = Arc::new(move |event_id: u16, _: Option<&WorkParam>| {
            seen_clone.store(event_id, Ordering::SeqCst);
        });

        handler.handle(7, None);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_param_accessors() {
        let bytes = WorkParam::Bytes(vec![1, 2, 3].into_boxed_slice());
        assert_eq!(bytes.as_bytes(), Some(&[1u8, 2, 3][..]));
        assert!(bytes.as_profile().is_none());

        let profile = WorkParam::Profile(ProfileEvent::A2dp(A2dpEvent::ProfileState {
            initialized: true,
        }));
        assert!(profile.as_profile().is_some());

        let custom = WorkParam::Custom(Box::new(5u32));
        assert_eq!(custom.downcast_ref::<u32>(), Some(&5));
        assert_eq!(custom.downcast_ref::<u8>(), None);
    }
}

//! PointReader trait: the one capability the poll scheduler needs from
//! the remote side. Synchronous; implementations own their timeout and
//! retry policy.

use obixgw_core::PointReading;

use crate::error::RemoteReadError;

/// Reads the current value of a remote point. Enables mock injection
/// for testing.
pub trait PointReader: Send + Sync {
    fn read(&self, remote_id: &str) -> Result<PointReading, RemoteReadError>;
}

impl<T: PointReader + ?Sized> PointReader for &T {
    fn read(&self, remote_id: &str) -> Result<PointReading, RemoteReadError> {
        (**self).read(remote_id)
    }
}

impl<T: PointReader + ?Sized> PointReader for std::sync::Arc<T> {
    fn read(&self, remote_id: &str) -> Result<PointReading, RemoteReadError> {
        (**self).read(remote_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obixgw_core::PointValue;
    use std::sync::Arc;

    struct Fixed;

    impl PointReader for Fixed {
        fn read(&self, remote_id: &str) -> Result<PointReading, RemoteReadError> {
            if remote_id == "bad" {
                return Err(RemoteReadError::Gateway("bad point".to_string()));
            }
            Ok(PointReading::new(PointValue::Number(1.0)))
        }
    }

    #[test]
    fn blanket_ref_impl() {
        let reader = Fixed;
        let r: &Fixed = &reader;
        assert_eq!(
            r.read("x").expect("ok").value,
            PointValue::Number(1.0)
        );
        assert!(r.read("bad").is_err());
    }

    #[test]
    fn blanket_arc_impl() {
        let reader: Arc<dyn PointReader> = Arc::new(Fixed);
        assert!(reader.read("x").is_ok());
    }
}

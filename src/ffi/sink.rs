use std::{
    ffi::{c_int, c_void},
    io,
};

use crate::KernelError;

/// Receives serialized bytes. Returns 0 to continue; any other value aborts
/// the serialization.
pub type btck_WriteBytes =
    Option<unsafe extern "C" fn(bytes: *const c_void, size: usize, userdata: *mut c_void) -> c_int>;

/// Adapts a C write callback to [`io::Write`].
pub(crate) struct SinkWriter {
    write: unsafe extern "C" fn(*const c_void, usize, *mut c_void) -> c_int,
    userdata: *mut c_void,
}

impl SinkWriter {
    pub(crate) fn new(write: btck_WriteBytes, userdata: *mut c_void) -> Result<Self, KernelError> {
        let write = write
            .ok_or_else(|| KernelError::InvalidArgument("null write callback".to_string()))?;
        Ok(SinkWriter { write, userdata })
    }
}

impl io::Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let rc = unsafe { (self.write)(buf.as_ptr() as *const c_void, buf.len(), self.userdata) };
        if rc != 0 {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("write callback returned {}", rc),
            ));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Streams an object through a C write callback. Any failure of the
/// callback is reported as [`KernelError::SerializationFailed`].
pub(crate) fn serialize_to<F>(
    write: btck_WriteBytes,
    userdata: *mut c_void,
    f: F,
) -> Result<(), KernelError>
where
    F: FnOnce(&mut SinkWriter) -> Result<(), KernelError>,
{
    let mut sink = SinkWriter::new(write, userdata)?;
    f(&mut sink).map_err(|err| {
        log::debug!("Serialization aborted: {}", err);
        KernelError::SerializationFailed
    })
}


#[cfg(test)]
mod tests {
    use super::testing::{collect, reject};
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bytes_reach_the_callback() {
        let mut out: Vec<u8> = Vec::new();
        let userdata = &mut out as *mut Vec<u8> as *mut c_void;
        serialize_to(Some(collect), userdata, |sink| {
            sink.write_all(b"abc")?;
            sink.write_all(b"def")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, b"abcdef");
    }

    #[test]
    fn test_callback_failure() {
        let result = serialize_to(Some(reject), std::ptr::null_mut(), |sink| {
            sink.write_all(b"abc")?;
            Ok(())
        });
        match result {
            Err(err @ KernelError::SerializationFailed) => {
                assert_eq!(err.domain(), "IoError");
                assert_eq!(err.code(), 5);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            serialize_to(None, std::ptr::null_mut(), |_| Ok(())),
            Err(KernelError::InvalidArgument(_))
        ));
    }
}

//! Linux POSIX shared memory primitives

use crate::error::{ShmError, ShmResult};
use memmap2::{MmapMut, MmapOptions};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;
use std::fs::File;

/// Longest accepted object name, leading slash included.
const NAME_MAX: usize = 255;

/// Check POSIX object naming rules: one leading slash, nothing else.
pub fn validate_name(name: &str) -> ShmResult<()> {
    let valid = name.len() > 1
        && name.len() <= NAME_MAX
        && name.starts_with('/')
        && !name[1..].contains('/')
        && !name.contains('\0');
    if valid {
        Ok(())
    } else {
        Err(ShmError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Open (optionally creating) a named shared memory object read-write.
pub fn open_object(name: &str, create: bool) -> ShmResult<File> {
    let mut flags = OFlag::O_RDWR;
    if create {
        flags |= OFlag::O_CREAT;
    }

    // Owner read/write only
    let mode = Mode::S_IRUSR | Mode::S_IWUSR;

    match shm_open(name, flags, mode) {
        Ok(fd) => Ok(File::from(fd)),
        Err(Errno::ENOENT) => Err(ShmError::NotFound {
            name: name.to_string(),
        }),
        Err(Errno::EACCES) => Err(ShmError::PermissionDenied {
            name: name.to_string(),
        }),
        Err(source) => Err(ShmError::CreateFailed {
            name: name.to_string(),
            source,
        }),
    }
}

/// Size the object to exactly `size` bytes.
pub fn resize_object(name: &str, file: &File, size: usize) -> ShmResult<()> {
    file.set_len(size as u64)
        .map_err(|source| ShmError::ResizeFailed {
            name: name.to_string(),
            source,
        })
}

/// Current size of the object in bytes.
pub fn object_size(file: &File) -> ShmResult<usize> {
    Ok(file.metadata()?.len() as usize)
}

/// Map `size` bytes of the object read-write.
pub fn map_object(name: &str, file: &File, size: usize) -> ShmResult<MmapMut> {
    // SAFETY: the mapping is shared with the companion process by contract;
    // concurrent modification is confined to plain numeric fields and atomics.
    unsafe { MmapOptions::new().len(size).map_mut(file) }.map_err(|source| ShmError::MapFailed {
        name: name.to_string(),
        source,
    })
}

/// Remove the object name. Existing mappings stay valid.
pub fn unlink_object(name: &str) -> ShmResult<()> {
    match shm_unlink(name) {
        Ok(()) | Err(Errno::ENOENT) => Ok(()),
        Err(source) => Err(ShmError::CreateFailed {
            name: name.to_string(),
            source,
        }),
    }
}

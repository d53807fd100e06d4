//! Typed shared memory region

use crate::error::{ShmError, ShmResult};
use crate::platform::{
    map_object, object_size, open_object, resize_object, unlink_object, validate_name,
};
use axisd_common::shm::layout::ShmLayout;
use memmap2::MmapMut;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

/// A named POSIX shared memory object mapped as one `T`.
///
/// The creating side owns the name and unlinks it on drop; attached handles
/// only unmap.
pub struct SharedRegion<T: ShmLayout> {
    name: String,
    mmap: MmapMut,
    owner: bool,
    _layout: PhantomData<T>,
}

impl<T: ShmLayout> SharedRegion<T> {
    /// Create (or take over a stale) object, size it to `T` and zero it.
    pub fn create(name: &str) -> ShmResult<Self> {
        validate_name(name)?;
        let size = size_of::<T>();

        let file = open_object(name, true)?;
        resize_object(name, &file, size)?;
        let mut mmap = map_object(name, &file, size)?;
        mmap.fill(0);

        info!(segment = name, size, "shared region created");
        Ok(Self {
            name: name.to_string(),
            mmap,
            owner: true,
            _layout: PhantomData,
        })
    }

    /// Attach to an object created by another process.
    pub fn attach(name: &str) -> ShmResult<Self> {
        validate_name(name)?;
        let expected = size_of::<T>();

        let file = open_object(name, false)?;
        let size = object_size(&file)?;
        if size < expected {
            return Err(ShmError::InvalidSize {
                name: name.to_string(),
                size,
                expected,
            });
        }
        let mmap = map_object(name, &file, expected)?;

        debug!(segment = name, "shared region attached");
        Ok(Self {
            name: name.to_string(),
            mmap,
            owner: false,
            _layout: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this handle unlinks the object on drop.
    pub fn is_owner(&self) -> bool {
        self.owner
    }

    #[inline]
    pub fn get(&self) -> &T {
        // SAFETY: the mapping is page-aligned, at least size_of::<T>() long,
        // and T is valid for any bit pattern written by ShmLayout peers.
        unsafe { &*(self.mmap.as_ptr() as *const T) }
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: as in `get`; &mut self guarantees no other in-process alias.
        unsafe { &mut *(self.mmap.as_mut_ptr() as *mut T) }
    }
}

impl<T: ShmLayout> Drop for SharedRegion<T> {
    fn drop(&mut self) {
        if !self.owner {
            return;
        }
        match unlink_object(&self.name) {
            Ok(()) => debug!(segment = %self.name, "shared region unlinked"),
            Err(e) => warn!(segment = %self.name, "failed to unlink shared region: {e}"),
        }
    }
}

impl<T: ShmLayout> std::fmt::Debug for SharedRegion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegion")
            .field("name", &self.name)
            .field("size", &self.mmap.len())
            .field("owner", &self.owner)
            .finish()
    }
}

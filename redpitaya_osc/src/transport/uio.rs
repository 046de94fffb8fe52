//! "UIO" transport where the oscilloscope's register block and sample buffer are mapped from a
//! userspace IO device node like `/dev/uio/osc0`

// Register and sample slots are naturally aligned by the hardware
#![allow(clippy::cast_ptr_alignment)]

use super::{
    Region,
    Transport,
    TransportResult,
};
use crate::core::{
    N,
    REGSET_SIZE,
};
use memmap2::{
    MmapMut,
    MmapOptions,
};
use nix::{
    fcntl::{
        Flock,
        FlockArg,
    },
    libc::O_SYNC,
    unistd::{
        sysconf,
        SysconfVar,
    },
};
use std::{
    fs::File,
    os::unix::fs::OpenOptionsExt,
    path::{
        Path,
        PathBuf,
    },
};
use tracing::debug;

// Used when the kernel doesn't report a page size
const FALLBACK_PAGE_SIZE: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Opening {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Locking {}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },
    #[error("Mapping ({region}) {}", path.display())]
    Map {
        path: PathBuf,
        region: Region,
        #[source]
        source: std::io::Error,
    },
}

/// A local connection to the oscilloscope through its UIO device node.
///
/// The device is held under an exclusive advisory lock for as long as this value lives, so only
/// one process drives a given module at a time.
pub struct Uio {
    registers: MmapMut,
    buffer: MmapMut,
    // Dropped last so the mappings go away before the lock is released
    _device: Flock<File>,
}

impl std::fmt::Debug for Uio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uio")
            .field("registers", &self.registers)
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

fn page_size() -> usize {
    sysconf(SysconfVar::PAGE_SIZE)
        .ok()
        .flatten()
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(FALLBACK_PAGE_SIZE)
}

impl Uio {
    /// Open, lock and map the device node at `path`. The register block is the first page of the
    /// device and the sample buffer starts on the page after it.
    /// # Errors
    /// Returns errors if the device can't be opened, is locked by someone else, or can't be mapped
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::options()
            .read(true)
            .write(true)
            .custom_flags(O_SYNC)
            .open(path)
            .map_err(|source| Error::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let device = Flock::lock(file, FlockArg::LockExclusiveNonblock).map_err(|(_, errno)| {
            Error::Lock {
                path: path.to_path_buf(),
                source: errno,
            }
        })?;
        let page = page_size();
        let map_err = |region| {
            move |source| Error::Map {
                path: path.to_path_buf(),
                region,
                source,
            }
        };
        // Safety: the device node is exclusively locked by us and both mappings are kept alive
        // no longer than the lock
        let registers = unsafe { MmapOptions::new().len(page).map_mut(&*device) }
            .map_err(map_err(Region::Registers))?;
        // Safety: as above
        let buffer = unsafe {
            MmapOptions::new()
                .offset(page as u64)
                .len(N * std::mem::size_of::<i16>())
                .map_mut(&*device)
        }
        .map_err(map_err(Region::Buffer))?;
        debug!(path = %path.display(), page, "Mapped oscilloscope device");
        Ok(Self {
            registers,
            buffer,
            _device: device,
        })
    }

    fn word_ptr(&mut self, offset: usize) -> TransportResult<*mut u32> {
        if offset % 4 != 0 {
            return Err(super::Error::Misaligned(offset));
        }
        if offset + 4 > REGSET_SIZE.min(self.registers.len()) {
            return Err(super::Error::OutOfBounds {
                region: Region::Registers,
                offset,
            });
        }
        // Safety: bounds and alignment were checked above and the mapping is page aligned
        Ok(unsafe { self.registers.as_mut_ptr().add(offset) }.cast::<u32>())
    }
}

impl Transport for Uio {
    fn read_word(&mut self, offset: usize) -> TransportResult<u32> {
        let ptr = self.word_ptr(offset)?;
        // Safety: `ptr` points to a valid, aligned word inside the mapping. The access has to be
        // volatile as the hardware updates status registers behind our back.
        Ok(unsafe { ptr.read_volatile() })
    }

    fn write_word(&mut self, offset: usize, word: u32) -> TransportResult<()> {
        let ptr = self.word_ptr(offset)?;
        // Safety: as in `read_word`
        unsafe { ptr.write_volatile(word) };
        Ok(())
    }

    fn read_samples(&mut self, index: usize, samples: &mut [i16]) -> TransportResult<()> {
        let slots = self.buffer.len() / std::mem::size_of::<i16>();
        if index + samples.len() > slots {
            return Err(super::Error::OutOfBounds {
                region: Region::Buffer,
                offset: 2 * (index + samples.len()),
            });
        }
        let base = self.buffer.as_ptr().cast::<i16>();
        for (i, sample) in samples.iter_mut().enumerate() {
            // Safety: every slot in `index..index + samples.len()` was bounds checked above
            *sample = unsafe { base.add(index + i).read_volatile() };
        }
        Ok(())
    }
}

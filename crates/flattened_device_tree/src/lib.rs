//! Flattened device tree
//!
//! A narrow wrapper over `fdt-rs`, exposing only the lookups the firmware needs: finding a node by
//! compatible string and reading its properties as lists of 32-bit cells.

#![cfg_attr(not(test), no_std)]

pub mod error;

use error::FdtError;
use fdt_rs::base::{DevTree, DevTreeNode, DevTreeProp};
use fdt_rs::prelude::{FallibleIterator, PropReader};

/// FDT blobs must be aligned on 8 bytes.
const FDT_ALIGNMENT: usize = 8;

pub struct FlattenedDeviceTree<'dt> {
    pub inner: DevTree<'dt>,
}

impl<'dt> FlattenedDeviceTree<'dt> {
    /// Parses the device tree located at `address`.
    ///
    /// # Safety
    ///
    /// `address` must point to a valid FDT blob that lives (and is not modified) for `'dt`.
    pub unsafe fn from_raw_pointer(address: *const u8) -> Result<Self, FdtError> {
        if address.align_offset(FDT_ALIGNMENT) != 0 {
            return Err(FdtError::FdtPointerNotAligned());
        }
        let inner = unsafe { DevTree::from_raw_pointer(address)? };
        Ok(Self { inner })
    }

    /// Parses the device tree contained in `blob`.
    pub fn from_slice(blob: &'dt [u8]) -> Result<Self, FdtError> {
        if blob.as_ptr().align_offset(FDT_ALIGNMENT) != 0 {
            return Err(FdtError::FdtPointerNotAligned());
        }
        // SAFETY: the header and structure offsets are checked by fdt-rs against the slice.
        let inner = unsafe { DevTree::new(blob)? };
        Ok(Self { inner })
    }

    /// Returns the base address of the blob.
    pub fn base_addr(&self) -> *const u8 {
        self.inner.buf().as_ptr()
    }

    /// Returns the first node whose compatible string matches `compatible`.
    pub fn compatible_node(&self, compatible: &str) -> Result<Option<DevTreeNode<'_, 'dt>>, FdtError> {
        Ok(self.inner.compatible_nodes(compatible).next()?)
    }
}

/// Returns the property `name` of `node`, if any.
pub fn find_prop<'a, 'dt>(
    node: &DevTreeNode<'a, 'dt>,
    name: &str,
) -> Result<Option<DevTreeProp<'a, 'dt>>, FdtError> {
    Ok(node
        .props()
        .find(|p| Ok(p.name().unwrap_or("") == name))?)
}

/// Number of 32-bit cells in a property.
pub fn cell_count(prop: &DevTreeProp) -> usize {
    prop.length() / core::mem::size_of::<u32>()
}

/// Reads the `index`-th 32-bit cell of a property (big endian on the wire).
pub fn read_cell(prop: &DevTreeProp, index: usize) -> Result<u32, FdtError> {
    Ok(prop.u32(index)?)
}

/// Returns the offset of the property header (the FDT_PROP token) within the blob.
pub fn prop_header_offset(fdt: &FlattenedDeviceTree, prop: &DevTreeProp) -> usize {
    const PROP_HEADER_SIZE: usize = 3 * core::mem::size_of::<u32>();
    let value = prop.propbuf().as_ptr() as usize;
    value - fdt.base_addr() as usize - PROP_HEADER_SIZE
}

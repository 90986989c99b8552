use std::collections::HashMap;

use tracing::info;

use crate::{
    error::{Error, Result},
    image::{MemoryImage, Span},
    patch::Patch,
};

/// Supplies the contents of the blobs named by [`Patch::InsertBlob`] and
/// [`Patch::AppendBlob`].
pub trait BlobSource {
    fn blob(&self, name: &str) -> Result<&[u8]>;
}

impl<V: AsRef<[u8]>> BlobSource for HashMap<String, V> {
    fn blob(&self, name: &str) -> Result<&[u8]> {
        self.get(name).map(AsRef::as_ref).ok_or_else(|| Error::Input {
            name: name.to_owned(),
            reason: "no such payload".to_owned(),
        })
    }
}

/// An ordered list of patches, applied front to back exactly once each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchScript {
    patches: Vec<Patch>,
}

impl PatchScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, patch: Patch) -> &mut Self {
        self.patches.push(patch);
        self
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Names of the blobs the script reads, in order of first use.
    pub fn blob_names(&self) -> impl Iterator<Item = &str> + '_ {
        let mut seen = Vec::new();
        self.patches.iter().filter_map(move |patch| match patch {
            Patch::InsertBlob { name, .. } | Patch::AppendBlob { name }
                if !seen.contains(name) =>
            {
                seen.push(name.clone());
                Some(name.as_str())
            }
            _ => None,
        })
    }

    /// Apply every patch in order. The first failure aborts the script and
    /// leaves `image` partially patched; callers must not persist it then.
    pub fn apply(&self, image: &mut MemoryImage, blobs: &impl BlobSource) -> Result<Vec<Span>> {
        let spans = self
            .patches
            .iter()
            .map(|patch| apply_one(image, patch, blobs))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "applied {} patches, image is now {} bytes",
            spans.len(),
            image.len()
        );
        Ok(spans)
    }
}

fn apply_one(image: &mut MemoryImage, patch: &Patch, blobs: &impl BlobSource) -> Result<Span> {
    match patch {
        Patch::InsertBytes { address, bytes } => image.insert_bytes(*address, bytes),
        Patch::InsertBlob { address, name } => {
            let blob = blobs.blob(name)?;
            info!("insert file {} at 0x{:04X}", name, address);
            image.insert_blob(*address, blob)
        }
        Patch::InsertFiller { address, count } => image.insert_filler(*address, *count),
        Patch::ShiftBlock { source, dest, len } => image.shift_block(*source, *dest, *len),
        Patch::AppendBlob { name } => {
            let blob = blobs.blob(name)?;
            info!("append file {}", name);
            Ok(image.append(blob))
        }
    }
}

impl FromIterator<Patch> for PatchScript {
    fn from_iter<T: IntoIterator<Item = Patch>>(iter: T) -> Self {
        Self {
            patches: iter.into_iter().collect(),
        }
    }
}

impl Extend<Patch> for PatchScript {
    fn extend<T: IntoIterator<Item = Patch>>(&mut self, iter: T) {
        self.patches.extend(iter)
    }
}

use bytes::Bytes;
use img_parts::{jpeg::Jpeg, png::Png, webp::WebP, ImageEXIF};

const ORIENTATION_TAG: u16 = 0x0112;
const TIFF_SHORT: u16 = 3;
const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// EXIF block handling for encoded images
pub struct ImageMetadata;

impl ImageMetadata {
    /// Extract the raw EXIF block from JPEG, PNG or WebP data.
    pub fn read_exif(data: &Bytes) -> Option<Bytes> {
        if let Ok(jpeg) = Jpeg::from_bytes(data.clone()) {
            return jpeg.exif();
        }
        if let Ok(png) = Png::from_bytes(data.clone()) {
            return png.exif();
        }
        if let Ok(webp) = WebP::from_bytes(data.clone()) {
            return webp.exif();
        }
        None
    }

    /// Attach `exif` to encoded output. Unsupported containers are returned untouched.
    pub fn write_exif(encoded: Bytes, exif: Bytes) -> Bytes {
        if let Ok(mut jpeg) = Jpeg::from_bytes(encoded.clone()) {
            jpeg.set_exif(Some(exif));
            return jpeg.encoder().bytes();
        }
        if let Ok(mut png) = Png::from_bytes(encoded.clone()) {
            png.set_exif(Some(exif));
            return png.encoder().bytes();
        }
        if let Ok(mut webp) = WebP::from_bytes(encoded.clone()) {
            webp.set_exif(Some(exif));
            return webp.encoder().bytes();
        }
        encoded
    }

    /// Carry the EXIF block of `source` over to `encoded`, if there is one.
    ///
    /// With `reset_orientation` the copied block says "normal" orientation, for output
    /// whose pixels were already auto-rotated.
    pub fn preserve(source: &Bytes, encoded: Bytes, reset_orientation: bool) -> Bytes {
        match Self::read_exif(source) {
            Some(exif) => {
                tracing::debug!(
                    exif_bytes = exif.len(),
                    reset_orientation = reset_orientation,
                    "Preserving EXIF metadata"
                );
                let exif = if reset_orientation {
                    Self::reset_orientation(exif)
                } else {
                    exif
                };
                Self::write_exif(encoded, exif)
            }
            None => encoded,
        }
    }

    /// Rewrite the IFD0 orientation tag of a raw EXIF block to 1.
    ///
    /// Blocks without the tag, or that cannot be walked, are returned unchanged.
    pub fn reset_orientation(exif: Bytes) -> Bytes {
        let start = if exif.starts_with(EXIF_PREFIX) {
            EXIF_PREFIX.len()
        } else {
            0
        };
        let Some((offset, big_endian)) = orientation_value_offset(&exif[start..]) else {
            return exif;
        };

        let normal = if big_endian {
            1u16.to_be_bytes()
        } else {
            1u16.to_le_bytes()
        };
        let mut block = exif.to_vec();
        let at = start + offset;
        block[at..at + 2].copy_from_slice(&normal);
        Bytes::from(block)
    }
}

/// Position of the orientation value inside a TIFF structure, and its byte order.
fn orientation_value_offset(tiff: &[u8]) -> Option<(usize, bool)> {
    let big_endian = if tiff.starts_with(b"MM") {
        true
    } else if tiff.starts_with(b"II") {
        false
    } else {
        return None;
    };

    let read_u16 = |at: usize| -> Option<u16> {
        let bytes: [u8; 2] = tiff.get(at..at.checked_add(2)?)?.try_into().ok()?;
        Some(if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    };
    let read_u32 = |at: usize| -> Option<u32> {
        let bytes: [u8; 4] = tiff.get(at..at.checked_add(4)?)?.try_into().ok()?;
        Some(if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    };

    let ifd = usize::try_from(read_u32(4)?).ok()?;
    let entries = usize::from(read_u16(ifd)?);
    for index in 0..entries {
        let entry = ifd.checked_add(2 + index * 12)?;
        if read_u16(entry)? != ORIENTATION_TAG {
            continue;
        }
        if read_u16(entry + 2)? != TIFF_SHORT {
            return None;
        }
        // Value must be inline and in bounds
        read_u16(entry + 8)?;
        return Some((entry + 8, big_endian));
    }
    None
}

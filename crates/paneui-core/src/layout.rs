//! Sizing hooks a layout engine relies on.

/// Smallest size, in pixels, content can be laid out in.
pub trait MinSizer {
    fn min_size(&self) -> (u32, u32);
}

/// Largest size, in pixels, content wants to occupy.
pub trait MaxSizer {
    fn max_size(&self) -> (u32, u32);
}
